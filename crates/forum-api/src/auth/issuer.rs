//! 토큰 발급/갱신.
//!
//! - 발급: 사용자 이름과 비밀번호 다이제스트가 일치하는 사용자를 찾아
//!   로그인 시각을 기록하고 클레임을 발급합니다.
//! - 갱신: 유효한 토큰의 주체가 아직 존재하면 같은 주체 데이터로
//!   유효 기간만 새로 계산합니다. 재인증은 요구하지 않습니다.

use chrono::{Duration, Utc};
use forum_core::credential::password_digest;
use forum_core::{AuthConfig, ForumError, ForumResult, User};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{info, warn};
use utoipa::ToSchema;

use super::jwt::{decode_token, encode_token, Claims, Subject, SubjectAttributes};
use crate::repository::DocumentStore;

/// 토큰 발급 요청.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct Credentials {
    /// 사용자 이름
    #[serde(default)]
    pub username: Option<String>,
    /// 비밀번호 (평문)
    #[serde(default)]
    pub password: Option<String>,
}

/// 발급된 토큰.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TokenResponse {
    /// 서명된 JWT
    pub token: String,
    /// 토큰에 담긴 클레임
    pub claims: Claims,
}

/// 토큰 발급기.
#[derive(Debug, Clone)]
pub struct TokenIssuer {
    secret: String,
    lifetime: Duration,
    scope: Map<String, Value>,
}

impl TokenIssuer {
    /// 새 발급기 생성.
    pub fn new(secret: impl Into<String>, lifetime: Duration) -> Self {
        Self {
            secret: secret.into(),
            lifetime,
            scope: Map::new(),
        }
    }

    /// 발급 토큰의 `scope` 값을 설정합니다.
    pub fn with_scope(mut self, scope: Map<String, Value>) -> Self {
        self.scope = scope;
        self
    }

    /// 인증 설정에서 생성.
    ///
    /// 토큰 수명이 허용 범위를 벗어나면 설정 에러를 반환합니다.
    pub fn from_config(config: &AuthConfig) -> ForumResult<Self> {
        let lifetime = config.token_lifetime()?;
        let scope = config
            .scope
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect();

        Ok(Self::new(config.jwt_secret.clone(), lifetime).with_scope(scope))
    }

    /// 토큰 유효 기간.
    pub fn lifetime(&self) -> Duration {
        self.lifetime
    }

    /// 자격증명으로 토큰을 발급합니다.
    pub async fn issue(
        &self,
        users: &dyn DocumentStore<User>,
        credentials: &Credentials,
    ) -> ForumResult<TokenResponse> {
        let username = credentials
            .username
            .as_deref()
            .filter(|u| !u.is_empty())
            .ok_or_else(|| ForumError::Authentication("No username provided.".to_string()))?;

        let password = credentials
            .password
            .as_deref()
            .filter(|p| !p.is_empty())
            .ok_or_else(|| ForumError::Authentication("No password provided.".to_string()))?;

        let digest = password_digest(password);
        let mut user = users
            .find_one(&[("username", username), ("password", digest.as_str())])
            .await?
            .ok_or_else(|| {
                warn!(username = %username, "Login failed");
                ForumError::Authentication("Invalid username and/or password.".to_string())
            })?;

        user.login = Some(Utc::now());
        users.save(&user).await?;

        let claims = Claims::new(
            Subject {
                id: user.id,
                groups: user.groups.clone(),
                scope: self.scope.clone(),
                attributes: SubjectAttributes {
                    username: user.username.clone(),
                },
            },
            self.lifetime,
        );

        info!(user_id = %user.id, "Token issued");
        self.sign(claims)
    }

    /// 유효한 토큰의 클레임으로 새 토큰을 발급합니다.
    pub async fn refresh(
        &self,
        users: &dyn DocumentStore<User>,
        claims: &Claims,
    ) -> ForumResult<TokenResponse> {
        if !users.exists(claims.data.id).await? {
            warn!(user_id = %claims.data.id, "Refresh for missing user");
            return Err(ForumError::Authentication(
                "User not found for token ID.".to_string(),
            ));
        }

        let renewed = claims.renewed(self.lifetime);
        info!(user_id = %renewed.data.id, "Token refreshed");
        self.sign(renewed)
    }

    /// 토큰 문자열을 검증하고 클레임을 복원합니다.
    pub fn verify(&self, token: &str) -> ForumResult<Claims> {
        Ok(decode_token(token, &self.secret)?)
    }

    fn sign(&self, claims: Claims) -> ForumResult<TokenResponse> {
        let token = encode_token(&claims, &self.secret)?;
        Ok(TokenResponse { token, claims })
    }
}
