//! 인증 토큰 endpoint.
//!
//! - `POST /v1/authentication` - 자격증명으로 토큰 발급
//! - `PATCH /v1/authentication` - 유효한 토큰으로 갱신

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};

use crate::auth::{Credentials, JwtAuth, TokenResponse};
use crate::error::{ApiErrorResponse, ApiResult};
use crate::metrics::record_token;
use crate::state::AppState;

/// 토큰 발급.
#[utoipa::path(
    post,
    path = "/v1/authentication",
    tag = "authentication",
    request_body = Credentials,
    responses(
        (status = 201, description = "토큰 발급됨", body = TokenResponse),
        (status = 401, description = "인증 실패", body = ApiErrorResponse)
    )
)]
pub async fn issue_token(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<Credentials>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<TokenResponse>)> {
    let Json(credentials) = payload?;

    let result = state.tokens.issue(&*state.users, &credentials).await;
    record_token("issue", outcome(&result));

    Ok((StatusCode::CREATED, Json(result?)))
}

/// 토큰 갱신.
///
/// 주체 데이터는 그대로 두고 유효 기간만 새로 계산합니다.
#[utoipa::path(
    patch,
    path = "/v1/authentication",
    tag = "authentication",
    responses(
        (status = 200, description = "토큰 갱신됨", body = TokenResponse),
        (status = 401, description = "토큰 없음, 무효 또는 주체 삭제됨", body = ApiErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn refresh_token(
    State(state): State<Arc<AppState>>,
    JwtAuth(claims): JwtAuth,
) -> ApiResult<Json<TokenResponse>> {
    let result = state.tokens.refresh(&*state.users, &claims).await;
    record_token("refresh", outcome(&result));

    Ok(Json(result?))
}

fn outcome<T>(result: &forum_core::ForumResult<T>) -> &'static str {
    match result {
        Ok(_) => "success",
        Err(err) => err.code(),
    }
}

/// 인증 라우터 생성.
pub fn authentication_router() -> Router<Arc<AppState>> {
    Router::new().route("/", post(issue_token).patch(refresh_token))
}
