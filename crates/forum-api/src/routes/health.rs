//! 서버 상태 endpoint.
//!
//! `/health`는 프로세스 생존 여부만, `/health/ready`는 저장소와
//! 메일 채널 상태까지 보고합니다.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::state::AppState;

/// 준비 상태 보고서.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// 저장소가 응답하면 "healthy", 아니면 "degraded"
    pub status: String,
    pub version: String,
    pub uptime_secs: i64,
    pub timestamp: DateTime<Utc>,
    pub components: ComponentHealth,
}

/// 구성 요소별 상태.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ComponentHealth {
    /// 문서 저장소 (`postgres` 또는 `memory`)
    pub store: ComponentStatus,
    /// 확인 메일 전송기
    pub mail: ComponentStatus,
}

/// 구성 요소 상태 값.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ComponentState {
    Up,
    Down,
    NotConfigured,
}

/// 단일 구성 요소 상태.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ComponentStatus {
    pub status: ComponentState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ComponentStatus {
    fn new(status: ComponentState, detail: Option<&str>) -> Self {
        Self {
            status,
            detail: detail.map(str::to_string),
        }
    }
}

/// 생존 확인.
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses((status = 200, description = "서버 응답 가능", body = String))
)]
pub async fn health_check() -> &'static str {
    "OK"
}

/// 준비 상태 확인.
///
/// 저장소 ping이 실패하면 503. 메일 전송기가 없어도 가입은 진행되므로
/// 상태에만 표시합니다.
#[utoipa::path(
    get,
    path = "/health/ready",
    tag = "health",
    responses(
        (status = 200, description = "요청 처리 가능", body = HealthResponse),
        (status = 503, description = "저장소 응답 없음", body = HealthResponse)
    )
)]
pub async fn health_ready(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<HealthResponse>) {
    let store_up = state.is_store_healthy().await;
    let report = readiness(&state, store_up);

    let code = if store_up {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (code, Json(report))
}

fn readiness(state: &AppState, store_up: bool) -> HealthResponse {
    let backend = if state.db_pool.is_some() {
        "postgres"
    } else {
        "memory"
    };

    let store = if store_up {
        ComponentStatus::new(ComponentState::Up, Some(backend))
    } else {
        ComponentStatus::new(ComponentState::Down, Some("store did not answer ping"))
    };

    let mail = if state.mailer.is_enabled() {
        ComponentStatus::new(ComponentState::Up, None)
    } else {
        ComponentStatus::new(ComponentState::NotConfigured, None)
    };

    HealthResponse {
        status: if store_up { "healthy" } else { "degraded" }.to_string(),
        version: state.version.clone(),
        uptime_secs: state.uptime_secs(),
        timestamp: Utc::now(),
        components: ComponentHealth { store, mail },
    }
}

pub fn health_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(health_check))
        .route("/ready", get(health_ready))
}
