//! 포럼 REST API 서버.
//!
//! 이 크레이트는 다음을 제공합니다:
//! - Axum 기반 REST API (`/v1/authentication`, `/v1/users`, `/v1/discussions`)
//! - JWT 토큰 발급/갱신 및 호출자 추출
//! - 모델 라이프사이클 훅 (유일성, 추가 전용, 확인 메일)
//! - 메모리/PostgreSQL 문서 저장소
//! - 헬스 체크, Prometheus 메트릭, 리소스별 요청 한도
//!
//! # 모듈 구성
//!
//! - [`state`]: 애플리케이션 공유 상태 (AppState)
//! - [`routes`]: REST API 엔드포인트
//! - [`auth`]: JWT 인증
//! - [`lifecycle`]: 모델별 생성/수정 훅
//! - [`repository`]: 문서 저장소 포트와 어댑터
//! - [`metrics`]: Prometheus 메트릭 수집
//! - [`middleware`]: HTTP 미들웨어
//! - [`openapi`]: OpenAPI 문서 및 Swagger UI

pub mod auth;
pub mod error;
pub mod lifecycle;
pub mod metrics;
pub mod middleware;
pub mod openapi;
pub mod repository;
pub mod routes;
pub mod state;

pub use auth::{CallerIdentity, Claims, JwtAuth, TokenIssuer, TokenResponse};
pub use error::{ApiError, ApiErrorResponse, ApiResult};
pub use metrics::setup_metrics_recorder;
pub use middleware::metrics_layer;
pub use routes::{build_router, ResourceLimits};
pub use state::AppState;
