//! 사용자 리소스 endpoint.
//!
//! - `POST /v1/users` - 가입 (익명 또는 관리자)
//! - `GET /v1/users` - 목록 (관리자)
//! - `GET /v1/users/{id}` - 조회
//! - `PATCH /v1/users/{id}` - 수정 (본인 또는 관리자)
//! - `DELETE /v1/users/{id}` - 삭제 (본인 또는 관리자)

use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    routing::get,
    Json, Router,
};
use uuid::Uuid;

use super::resource::{self, Attributes, ResourceDocument, ResourceList};
use crate::auth::CallerIdentity;
use crate::error::{ApiErrorResponse, ApiResult};
use crate::state::AppState;

/// 사용자 생성.
#[utoipa::path(
    post,
    path = "/v1/users",
    tag = "users",
    request_body = Attributes,
    responses(
        (status = 201, description = "사용자 생성됨", body = ResourceDocument),
        (status = 400, description = "잘못된 입력", body = ApiErrorResponse),
        (status = 403, description = "권한 없음", body = ApiErrorResponse),
        (status = 409, description = "사용자 이름 또는 이메일 중복", body = ApiErrorResponse),
        (status = 502, description = "확인 메일 발송 실패", body = ApiErrorResponse)
    ),
    security((), ("bearer_auth" = []))
)]
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    CallerIdentity(caller): CallerIdentity,
    payload: Result<Json<Attributes>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<ResourceDocument>)> {
    let Json(Attributes(input)) = payload?;
    let doc = resource::create(&*state.users, &state.mailer, &caller, input).await?;
    Ok((StatusCode::CREATED, Json(doc)))
}

/// 사용자 목록.
#[utoipa::path(
    get,
    path = "/v1/users",
    tag = "users",
    responses(
        (status = 200, description = "사용자 목록", body = ResourceList),
        (status = 403, description = "권한 없음", body = ApiErrorResponse)
    ),
    security((), ("bearer_auth" = []))
)]
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    CallerIdentity(caller): CallerIdentity,
) -> ApiResult<Json<ResourceList>> {
    Ok(Json(resource::list(&*state.users, &caller).await?))
}

/// 사용자 조회.
#[utoipa::path(
    get,
    path = "/v1/users/{id}",
    tag = "users",
    params(("id" = Uuid, Path, description = "사용자 ID")),
    responses(
        (status = 200, description = "사용자", body = ResourceDocument),
        (status = 404, description = "사용자 없음", body = ApiErrorResponse)
    ),
    security((), ("bearer_auth" = []))
)]
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    CallerIdentity(caller): CallerIdentity,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Json<ResourceDocument>> {
    let Path(id) = id?;
    Ok(Json(resource::read(&*state.users, &caller, id).await?))
}

/// 사용자 수정.
///
/// 이메일이 바뀌면 비밀 값이 교체되고 새 주소로 확인 메일이 발송됩니다.
/// `key`에 `$action-resend-key`를 보내면 기존 비밀 값으로 재발송합니다.
#[utoipa::path(
    patch,
    path = "/v1/users/{id}",
    tag = "users",
    params(("id" = Uuid, Path, description = "사용자 ID")),
    request_body = Attributes,
    responses(
        (status = 200, description = "수정된 사용자", body = ResourceDocument),
        (status = 400, description = "잘못된 입력", body = ApiErrorResponse),
        (status = 403, description = "권한 없음", body = ApiErrorResponse),
        (status = 404, description = "사용자 없음", body = ApiErrorResponse),
        (status = 409, description = "사용자 이름 또는 이메일 중복", body = ApiErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_user(
    State(state): State<Arc<AppState>>,
    CallerIdentity(caller): CallerIdentity,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<Attributes>, JsonRejection>,
) -> ApiResult<Json<ResourceDocument>> {
    let Path(id) = id?;
    let Json(Attributes(input)) = payload?;
    let doc = resource::update(&*state.users, &state.mailer, &caller, id, input).await?;
    Ok(Json(doc))
}

/// 사용자 삭제.
#[utoipa::path(
    delete,
    path = "/v1/users/{id}",
    tag = "users",
    params(("id" = Uuid, Path, description = "사용자 ID")),
    responses(
        (status = 204, description = "삭제됨"),
        (status = 403, description = "권한 없음", body = ApiErrorResponse),
        (status = 404, description = "사용자 없음", body = ApiErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    CallerIdentity(caller): CallerIdentity,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<StatusCode> {
    let Path(id) = id?;
    resource::delete(&*state.users, &caller, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// 사용자 라우터 생성.
pub fn users_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/{id}", get(get_user).patch(update_user).delete(delete_user))
}
