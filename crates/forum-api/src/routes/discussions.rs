//! 토론 리소스 endpoint.
//!
//! 토론은 공개 로그입니다. 누구나 읽을 수 있고, 생성과 삭제는 관리자만,
//! 수정은 `users` 그룹 구성원이 댓글과 참여자를 추가하는 형태로만 가능합니다.

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
use forum_core::Discussion;
use uuid::Uuid;

use super::resource::{self, Attributes, ResourceDocument, ResourceList};
use crate::auth::CallerIdentity;
use crate::error::{ApiErrorResponse, ApiResult};
use crate::state::AppState;

/// 토론 생성.
#[utoipa::path(
    post,
    path = "/v1/discussions",
    tag = "discussions",
    request_body = Discussion,
    responses(
        (status = 201, description = "토론 생성됨", body = ResourceDocument),
        (status = 400, description = "잘못된 입력", body = ApiErrorResponse),
        (status = 403, description = "권한 없음", body = ApiErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_discussion(
    State(state): State<Arc<AppState>>,
    CallerIdentity(caller): CallerIdentity,
    payload: Result<Json<Attributes>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<ResourceDocument>)> {
    let Json(Attributes(input)) = payload?;
    let doc = resource::create(&*state.discussions, &state.mailer, &caller, input).await?;
    Ok((StatusCode::CREATED, Json(doc)))
}

/// 토론 목록.
#[utoipa::path(
    get,
    path = "/v1/discussions",
    tag = "discussions",
    responses(
        (status = 200, description = "토론 목록", body = ResourceList)
    ),
    security((), ("bearer_auth" = []))
)]
pub async fn list_discussions(
    State(state): State<Arc<AppState>>,
    CallerIdentity(caller): CallerIdentity,
) -> ApiResult<Json<ResourceList>> {
    Ok(Json(resource::list(&*state.discussions, &caller).await?))
}

/// 토론 조회.
#[utoipa::path(
    get,
    path = "/v1/discussions/{id}",
    tag = "discussions",
    params(("id" = Uuid, Path, description = "토론 ID")),
    responses(
        (status = 200, description = "토론", body = ResourceDocument),
        (status = 404, description = "토론 없음", body = ApiErrorResponse)
    ),
    security((), ("bearer_auth" = []))
)]
pub async fn get_discussion(
    State(state): State<Arc<AppState>>,
    CallerIdentity(caller): CallerIdentity,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Json<ResourceDocument>> {
    let Path(id) = id?;
    Ok(Json(resource::read(&*state.discussions, &caller, id).await?))
}

/// 토론 수정.
///
/// 입력 속성을 저장된 속성 위에 병합한 결과가 추가만 포함해야 합니다.
#[utoipa::path(
    patch,
    path = "/v1/discussions/{id}",
    tag = "discussions",
    params(("id" = Uuid, Path, description = "토론 ID")),
    request_body = Attributes,
    responses(
        (status = 200, description = "수정된 토론", body = ResourceDocument),
        (status = 400, description = "추가 외의 변경", body = ApiErrorResponse),
        (status = 403, description = "권한 없음", body = ApiErrorResponse),
        (status = 404, description = "토론 없음", body = ApiErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_discussion(
    State(state): State<Arc<AppState>>,
    CallerIdentity(caller): CallerIdentity,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<Attributes>, JsonRejection>,
) -> ApiResult<Json<ResourceDocument>> {
    let Path(id) = id?;
    let Json(Attributes(input)) = payload?;
    let doc = resource::update(&*state.discussions, &state.mailer, &caller, id, input).await?;
    Ok(Json(doc))
}

/// 토론 삭제.
#[utoipa::path(
    delete,
    path = "/v1/discussions/{id}",
    tag = "discussions",
    params(("id" = Uuid, Path, description = "토론 ID")),
    responses(
        (status = 204, description = "삭제됨"),
        (status = 403, description = "권한 없음", body = ApiErrorResponse),
        (status = 404, description = "토론 없음", body = ApiErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_discussion(
    State(state): State<Arc<AppState>>,
    CallerIdentity(caller): CallerIdentity,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<StatusCode> {
    let Path(id) = id?;
    resource::delete(&*state.discussions, &caller, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// 토론 라우터 생성.
pub fn discussions_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_discussions).post(create_discussion))
        .route(
            "/{id}",
            get(get_discussion)
                .patch(update_discussion)
                .delete(delete_discussion),
        )
}
