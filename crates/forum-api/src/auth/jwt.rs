//! JWT 토큰 처리.
//!
//! 클레임 구조와 HS256 인코딩/디코딩을 담당합니다.

use chrono::{Duration, Utc};
use forum_core::{Caller, ForumError};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;
use uuid::Uuid;

/// 토큰에 노출되는 주체 속성.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SubjectAttributes {
    /// 사용자 이름
    pub username: String,
}

/// 토큰의 주체 데이터.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Subject {
    /// 사용자 ID
    pub id: Uuid,
    /// 소속 그룹
    pub groups: Vec<String>,
    /// 하위 서비스용 범위 정보
    #[serde(default)]
    #[schema(value_type = Object)]
    pub scope: Map<String, Value>,
    /// 공개 속성
    pub attributes: SubjectAttributes,
}

/// JWT 페이로드.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Claims {
    /// Issued At (Unix timestamp)
    pub iat: i64,
    /// Not Before (Unix timestamp)
    pub nbf: i64,
    /// Expiration (Unix timestamp)
    pub exp: i64,
    /// 주체 데이터
    pub data: Subject,
}

impl Claims {
    /// 현재 시각부터 `lifetime` 동안 유효한 클레임 생성.
    pub fn new(data: Subject, lifetime: Duration) -> Self {
        let now = Utc::now();
        Self {
            iat: now.timestamp(),
            nbf: now.timestamp(),
            exp: (now + lifetime).timestamp(),
            data,
        }
    }

    /// 같은 주체 데이터로 유효 기간만 새로 계산한 클레임.
    pub fn renewed(&self, lifetime: Duration) -> Self {
        Self::new(self.data.clone(), lifetime)
    }

    /// 유효 기간 (초).
    pub fn lifetime_secs(&self) -> i64 {
        self.exp - self.iat
    }

    /// 토큰 주체를 호출자 신원으로 변환.
    pub fn caller(&self) -> Caller {
        Caller::authenticated(self.data.id, self.data.groups.clone())
    }
}

/// JWT 처리 에러.
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("토큰 인코딩 실패: {0}")]
    Encoding(#[from] jsonwebtoken::errors::Error),
    #[error("Token has expired.")]
    Expired,
    #[error("Token is not valid yet.")]
    Immature,
    #[error("Invalid token.")]
    Invalid,
}

impl From<JwtError> for ForumError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::Encoding(e) => ForumError::Internal(e.to_string()),
            other => ForumError::Authentication(other.to_string()),
        }
    }
}

/// 클레임을 서명된 토큰 문자열로 인코딩.
pub fn encode_token(claims: &Claims, secret: &str) -> Result<String, JwtError> {
    encode(
        &Header::new(Algorithm::HS256),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(JwtError::from)
}

/// 토큰을 검증하고 클레임을 복원.
///
/// 서명, `exp`, `nbf`를 모두 검사하며 시계 오차는 허용하지 않습니다.
pub fn decode_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    validation.validate_nbf = true;
    validation.leeway = 0;

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
        jsonwebtoken::errors::ErrorKind::ImmatureSignature => JwtError::Immature,
        _ => JwtError::Invalid,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_SECRET: &str = "test-secret-key-for-jwt-testing-minimum-32-chars";

    fn subject() -> Subject {
        Subject {
            id: Uuid::new_v4(),
            groups: vec!["users".to_string()],
            scope: Map::new(),
            attributes: SubjectAttributes {
                username: "alice".to_string(),
            },
        }
    }

    #[test]
    fn test_encode_and_decode() {
        let claims = Claims::new(subject(), Duration::minutes(5));
        let token = encode_token(&claims, TEST_SECRET).unwrap();

        let decoded = decode_token(&token, TEST_SECRET).unwrap();
        assert_eq!(decoded, claims);
        assert_eq!(decoded.lifetime_secs(), 300);
        assert_eq!(decoded.nbf, decoded.iat);
    }

    #[test]
    fn test_wrong_secret() {
        let claims = Claims::new(subject(), Duration::minutes(5));
        let token = encode_token(&claims, TEST_SECRET).unwrap();

        let result = decode_token(&token, "another-secret-key-for-testing-minimum-32");
        assert!(matches!(result, Err(JwtError::Invalid)));
    }

    #[test]
    fn test_expired_token() {
        let mut claims = Claims::new(subject(), Duration::minutes(5));
        claims.iat -= 600;
        claims.nbf -= 600;
        claims.exp -= 600;
        let token = encode_token(&claims, TEST_SECRET).unwrap();

        assert!(matches!(
            decode_token(&token, TEST_SECRET),
            Err(JwtError::Expired)
        ));
    }

    #[test]
    fn test_not_yet_valid_token() {
        let mut claims = Claims::new(subject(), Duration::minutes(5));
        claims.nbf += 120;
        let token = encode_token(&claims, TEST_SECRET).unwrap();

        assert!(matches!(
            decode_token(&token, TEST_SECRET),
            Err(JwtError::Immature)
        ));
    }

    #[test]
    fn test_garbage_token() {
        assert!(matches!(
            decode_token("invalid.token.here", TEST_SECRET),
            Err(JwtError::Invalid)
        ));
    }

    #[test]
    fn test_claims_to_caller() {
        let claims = Claims::new(subject(), Duration::minutes(5));
        let caller = claims.caller();
        assert_eq!(caller.id, Some(claims.data.id));
        assert_eq!(caller.groups, claims.data.groups);
    }
}
