//! API 라우트.
//!
//! # 라우트 구조
//!
//! - `/health` - 헬스 체크 (liveness)
//! - `/health/ready` - 상세 헬스 체크 (readiness)
//! - `/v1/authentication` - 토큰 발급/갱신
//! - `/v1/users` - 사용자 (초당 5회 제한)
//! - `/v1/discussions` - 토론 (초당 10회 제한)

pub mod authentication;
pub mod discussions;
pub mod health;
pub mod resource;
pub mod users;

pub use authentication::authentication_router;
pub use discussions::discussions_router;
pub use health::{health_router, ComponentHealth, ComponentState, ComponentStatus, HealthResponse};
pub use resource::{Attributes, ResourceDocument, ResourceList};
pub use users::users_router;

use std::sync::Arc;

use axum::{middleware::from_fn_with_state, Router};
use forum_core::{Discussion, Model, RateLimitSettings, User};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::middleware::{rate_limit_middleware, spawn_cleanup, RateLimitConfig, RateLimitState};
use crate::openapi::swagger_ui_router;
use crate::state::AppState;

/// 리소스별 요청 한도.
#[derive(Clone)]
pub struct ResourceLimits {
    pub users: RateLimitState,
    pub discussions: RateLimitState,
}

impl ResourceLimits {
    /// 설정에서 생성. 비활성화되어 있으면 `None`.
    pub fn from_settings(settings: &RateLimitSettings) -> Option<Self> {
        if settings.disabled {
            return None;
        }

        Some(Self {
            users: RateLimitState::new(
                User::RESOURCE,
                RateLimitConfig::per_second(settings.users_per_second),
            )
            .with_trusted_proxies(settings.trusted_proxies.clone()),
            discussions: RateLimitState::new(
                Discussion::RESOURCE,
                RateLimitConfig::per_second(settings.discussions_per_second),
            )
            .with_trusted_proxies(settings.trusted_proxies.clone()),
        })
    }

    /// 버킷 정리 태스크 시작.
    pub fn spawn_cleanup(&self, shutdown: CancellationToken) -> Vec<JoinHandle<()>> {
        [&self.users, &self.discussions]
            .into_iter()
            .map(|state| spawn_cleanup(state.limiter().clone(), shutdown.clone()))
            .collect()
    }
}

/// 상태와 요청 한도, Swagger UI를 적용한 애플리케이션 라우터.
pub fn build_router(state: Arc<AppState>, limits: Option<&ResourceLimits>) -> Router {
    let (users, discussions) = match limits {
        Some(limits) => (
            users_router().route_layer(from_fn_with_state(
                limits.users.clone(),
                rate_limit_middleware,
            )),
            discussions_router().route_layer(from_fn_with_state(
                limits.discussions.clone(),
                rate_limit_middleware,
            )),
        ),
        None => (users_router(), discussions_router()),
    };

    Router::new()
        .nest("/health", health_router())
        .nest("/v1/authentication", authentication_router())
        .nest("/v1/users", users)
        .nest("/v1/discussions", discussions)
        .with_state(state)
        .merge(swagger_ui_router())
}
