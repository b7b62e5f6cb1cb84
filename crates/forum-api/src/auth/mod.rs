//! 인증.
//!
//! HS256 JWT 기반 토큰 발급/갱신과 요청 호출자 추출을 제공합니다.
//!
//! # 구성 요소
//!
//! - [`Claims`]: JWT 페이로드 구조체
//! - [`TokenIssuer`]: 자격증명 검증 및 토큰 발급/갱신
//! - [`CallerIdentity`], [`JwtAuth`]: Axum 추출기

mod issuer;
mod jwt;
mod middleware;

pub use issuer::{Credentials, TokenIssuer, TokenResponse};
pub use jwt::{decode_token, encode_token, Claims, JwtError, Subject, SubjectAttributes};
pub use middleware::{CallerIdentity, JwtAuth};
