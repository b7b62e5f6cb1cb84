//! API 에러 응답.
//!
//! 도메인 에러([`ForumError`])를 HTTP 상태 코드와 일관된 JSON 본문으로 변환합니다.
//!
//! ```json
//! {
//!   "code": "CONFLICT_ERROR",
//!   "message": "Username alice already exists.",
//!   "timestamp": 1738300800
//! }
//! ```

use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use forum_core::ForumError;
use forum_notification::NotificationError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

/// 통합 API 에러 응답 본문.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiErrorResponse {
    /// 에러 코드 (예: "VALIDATION_ERROR", "NOT_FOUND")
    pub code: String,
    /// 사람이 읽을 수 있는 에러 메시지
    pub message: String,
    /// 추가 에러 상세 정보
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    /// 에러 발생 타임스탬프 (Unix timestamp)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

impl ApiErrorResponse {
    /// 타임스탬프를 포함한 에러 생성.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
            timestamp: Some(chrono::Utc::now().timestamp()),
        }
    }

    /// 상세 정보를 추가합니다.
    #[must_use]
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }
}

impl std::fmt::Display for ApiErrorResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

/// 핸들러 에러.
///
/// [`ForumError`]를 감싸 axum 응답으로 변환합니다.
#[derive(Debug)]
pub struct ApiError(pub ForumError);

impl ApiError {
    /// 도메인 에러에 대응하는 HTTP 상태 코드.
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            ForumError::Validation(_) | ForumError::InvalidCredential(_) => StatusCode::BAD_REQUEST,
            ForumError::Authentication(_) => StatusCode::UNAUTHORIZED,
            ForumError::Authorization(_) => StatusCode::FORBIDDEN,
            ForumError::Conflict(_) => StatusCode::CONFLICT,
            ForumError::NotFound(_) => StatusCode::NOT_FOUND,
            ForumError::Dependency(_) => StatusCode::BAD_GATEWAY,
            ForumError::Storage(_)
            | ForumError::Config(_)
            | ForumError::Serialization(_)
            | ForumError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// 내부 도메인 에러.
    pub fn inner(&self) -> &ForumError {
        &self.0
    }
}

impl From<ForumError> for ApiError {
    fn from(err: ForumError) -> Self {
        Self(err)
    }
}

impl From<NotificationError> for ApiError {
    fn from(err: NotificationError) -> Self {
        Self(err.into())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(ForumError::Validation(rejection.body_text()))
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self(ForumError::Validation(rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        if self.0.is_client_error() {
            tracing::debug!(code = self.0.code(), error = %self.0, "Request rejected");
        } else {
            tracing::error!(code = self.0.code(), error = %self.0, "Request failed");
        }

        let body = ApiErrorResponse::new(self.0.code(), self.0.to_string());
        (status, Json(body)).into_response()
    }
}

/// API 핸들러 Result 타입.
pub type ApiResult<T> = Result<T, ApiError>;
