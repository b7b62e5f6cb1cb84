//! Axum용 인증 추출기.
//!
//! - [`CallerIdentity`]: 토큰이 없으면 익명 호출자, 있으면 검증된 호출자
//! - [`JwtAuth`]: 유효한 토큰을 요구하는 추출기

use std::sync::Arc;

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use forum_core::{Caller, ForumError};
use tracing::debug;

use super::jwt::Claims;
use crate::error::ApiError;
use crate::state::AppState;

/// 검증된 JWT 클레임.
///
/// ```rust,ignore
/// async fn refresh(JwtAuth(claims): JwtAuth) -> impl IntoResponse {
///     format!("Authenticated user: {}", claims.data.attributes.username)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct JwtAuth(pub Claims);

/// 요청 호출자 신원.
///
/// Authorization 헤더가 없으면 익명 호출자가 됩니다. 헤더가 있는데
/// 형식이 틀리거나 토큰이 유효하지 않으면 요청이 거부됩니다.
#[derive(Debug, Clone)]
pub struct CallerIdentity(pub Caller);

/// Authorization 헤더에서 Bearer 토큰 추출.
///
/// 헤더가 없으면 `Ok(None)`.
fn bearer_token(parts: &Parts) -> Result<Option<&str>, ApiError> {
    let Some(header) = parts.headers.get(AUTHORIZATION) else {
        return Ok(None);
    };

    let value = header.to_str().map_err(|_| invalid_header())?;
    value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(Some)
        .ok_or_else(invalid_header)
}

fn invalid_header() -> ApiError {
    ForumError::Authentication("Invalid Authorization header.".to_string()).into()
}

impl FromRequestParts<Arc<AppState>> for JwtAuth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?.ok_or_else(|| {
            ApiError::from(ForumError::Authentication(
                "Authentication token required.".to_string(),
            ))
        })?;

        let claims = state.tokens.verify(token).map_err(|e| {
            debug!(error = %e, "Token rejected");
            ApiError::from(e)
        })?;

        Ok(JwtAuth(claims))
    }
}

impl FromRequestParts<Arc<AppState>> for CallerIdentity {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        if parts.headers.get(AUTHORIZATION).is_none() {
            return Ok(CallerIdentity(Caller::anonymous()));
        }

        let JwtAuth(claims) = JwtAuth::from_request_parts(parts, state).await?;
        Ok(CallerIdentity(claims.caller()))
    }
}
