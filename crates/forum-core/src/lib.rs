//! # Forum Core
//!
//! 포럼 서버의 핵심 도메인 모델 및 정책을 제공합니다.
//!
//! - 사용자/토론 모델과 라이프사이클 불변식
//! - 리소스 및 필드 단위 접근 제어 (ACL)
//! - 비밀번호 해싱 및 확인 키
//! - 추가 전용 검사를 위한 구조적 diff
//! - 설정 관리
//! - 로깅 인프라

pub mod acl;
pub mod config;
pub mod credential;
pub mod diff;
pub mod domain;
pub mod error;
pub mod logging;

pub use acl::{Caller, CallerRoles, FieldAcl, Operation, ResourceAcl, Role};
pub use config::*;
pub use domain::*;
pub use error::*;
pub use logging::*;
