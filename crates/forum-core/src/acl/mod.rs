//! 접근 제어 (ACL).
//!
//! # 구성 요소
//!
//! - [`Role`]: ACL 테이블에 사용되는 역할 (`self`, `#그룹` 포함)
//! - [`Caller`]: 토큰에서 복원한 호출자 신원
//! - [`ResourceAcl`]: 역할 → 허용 작업 (리소스 게이트)
//! - [`FieldAcl`]: 필드 → 읽기/쓰기 허용 역할 (필드 가시성)

mod field;
mod resource;
mod role;

pub use field::FieldAcl;
pub use resource::{Operation, ResourceAcl};
pub use role::{Caller, CallerRoles, Role};
