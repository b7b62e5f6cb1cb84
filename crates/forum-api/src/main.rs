//! 포럼 API 서버.
//!
//! 설정을 로드하고 저장소와 메일 채널을 구성한 뒤 Axum 서버를 시작합니다.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::{http::StatusCode, middleware, routing::get, Router};
use clap::Parser;
use metrics_exporter_prometheus::PrometheusHandle;
use sqlx::postgres::PgPoolOptions;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use forum_api::{
    build_router, metrics_layer, setup_metrics_recorder, AppState, ResourceLimits, TokenIssuer,
};
use forum_core::{init_logging, AppConfig, AuthConfig, DatabaseConfig, LogConfig};
use forum_notification::{ConfirmationMailer, DEFAULT_ENV_PREFIX};

/// 명령줄 인자.
#[derive(Debug, Parser)]
#[command(name = "forum-api", version, about = "Forum REST API server")]
struct Args {
    /// 바인딩할 호스트 주소 (기본: 0.0.0.0)
    #[arg(long)]
    host: Option<String>,

    /// 바인딩할 포트 (기본: 8001)
    #[arg(long)]
    port: Option<u16>,

    /// 워커 스레드 수 (기본: 1)
    #[arg(long)]
    workers: Option<usize>,

    /// 디버그 로깅
    #[arg(long)]
    debug: bool,

    /// 설정 파일 경로
    #[arg(long, default_value = "config/default.toml")]
    config: String,
}

impl Args {
    /// 명령줄 값을 설정 위에 덮어씁니다.
    fn apply(&self, config: &mut AppConfig) {
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(workers) = self.workers {
            config.server.workers = workers;
        }
        config.server.workers = config.server.workers.max(1);
        config.server.debug |= self.debug;
    }
}

fn main() -> anyhow::Result<()> {
    // .env 파일 로드 (있는 경우)
    let _ = dotenvy::dotenv();

    let args = Args::parse();
    let mut config = AppConfig::load(&args.config)
        .with_context(|| format!("failed to load configuration from {}", args.config))?;
    args.apply(&mut config);

    init_logging(LogConfig::from_settings(&config.logging).with_debug(config.server.debug))
        .map_err(|e| anyhow::anyhow!("failed to initialize logging: {e}"))?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.server.workers)
        .enable_all()
        .build()
        .context("failed to build tokio runtime")?;

    runtime.block_on(run(config))
}

async fn run(config: AppConfig) -> anyhow::Result<()> {
    info!(
        version = env!("CARGO_PKG_VERSION"),
        workers = config.server.workers,
        "Starting Forum API server..."
    );

    let metrics_handle = setup_metrics_recorder().context("failed to install metrics recorder")?;
    info!("Prometheus metrics recorder initialized");

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .map_err(|e| {
            error!(
                host = %config.server.host,
                port = config.server.port,
                error = %e,
                "Invalid bind address. Check --host and --port."
            );
            e
        })?;

    check_jwt_secret(&config.auth, config.server.debug)?;
    let tokens =
        TokenIssuer::from_config(&config.auth).context("invalid authentication settings")?;
    let mailer = ConfirmationMailer::from_env(DEFAULT_ENV_PREFIX);
    let state = Arc::new(create_app_state(&config.database, tokens, mailer).await?);

    let shutdown_token = CancellationToken::new();

    let limits = ResourceLimits::from_settings(&config.rate_limit);
    let cleanup_tasks = match &limits {
        Some(limits) => {
            info!(
                users_per_second = config.rate_limit.users_per_second,
                discussions_per_second = config.rate_limit.discussions_per_second,
                "Rate limiting configured"
            );
            limits.spawn_cleanup(shutdown_token.clone())
        }
        None => {
            info!("Rate limiting DISABLED");
            Vec::new()
        }
    };

    let app = create_router(state, limits.as_ref(), metrics_handle);

    info!(%addr, "API server listening");
    info!("Swagger UI available at http://{}/swagger-ui", addr);
    info!("Metrics available at http://{}/metrics", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal(shutdown_token.clone()))
    .await?;

    info!("Server shutdown initiated, cleaning up...");
    shutdown_token.cancel();

    let cleanup = tokio::time::timeout(Duration::from_secs(10), async {
        for task in cleanup_tasks {
            if let Err(e) = task.await {
                warn!(error = %e, "Background task ended abnormally");
            }
        }
    })
    .await;

    if cleanup.is_err() {
        warn!("Cleanup timeout, forcing shutdown");
    }

    info!("Server shutdown complete");
    Ok(())
}

/// 서명 키 확인.
///
/// 기본 키는 디버그 모드에서만 경고와 함께 허용합니다.
fn check_jwt_secret(auth: &AuthConfig, debug: bool) -> anyhow::Result<()> {
    if !auth.uses_default_secret() {
        return Ok(());
    }
    if debug {
        warn!("JWT secret not set, using default (INSECURE, development only)");
        return Ok(());
    }
    anyhow::bail!(
        "JWT secret not set. Set FORUM__AUTH__JWT_SECRET (or auth.jwt_secret) \
         or run with --debug to use the development default"
    )
}

/// 저장소 구성.
///
/// 데이터베이스 URL이 있으면 PostgreSQL을, 없으면 메모리 저장소를 사용합니다.
async fn create_app_state(
    database: &DatabaseConfig,
    tokens: TokenIssuer,
    mailer: ConfirmationMailer,
) -> anyhow::Result<AppState> {
    let Some(url) = &database.url else {
        warn!("Database URL not set, using in-memory store (data is lost on restart)");
        return Ok(AppState::in_memory(tokens, mailer));
    };

    let pool = PgPoolOptions::new()
        .max_connections(database.max_connections)
        .acquire_timeout(Duration::from_secs(database.acquire_timeout_secs))
        .connect(url)
        .await
        .context("failed to connect to database")?;

    let state = AppState::with_postgres(pool, tokens, mailer)
        .await
        .context("failed to prepare database schema")?;
    info!("Connected to PostgreSQL store");

    Ok(state)
}

/// CORS 레이어.
///
/// `CORS_ORIGINS` 환경 변수(쉼표 구분)가 있으면 해당 origin만 허용합니다.
fn cors_layer() -> CorsLayer {
    let allow_origin = match std::env::var("CORS_ORIGINS") {
        Ok(origins) if !origins.is_empty() => {
            let origins: Vec<_> = origins
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();

            if origins.is_empty() {
                warn!("CORS_ORIGINS is set but contains no valid origins, allowing any");
                AllowOrigin::any()
            } else {
                info!("CORS configured with {} allowed origins", origins.len());
                AllowOrigin::list(origins)
            }
        }
        _ => {
            warn!("CORS_ORIGINS not set, allowing any origin (development mode)");
            AllowOrigin::any()
        }
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::PATCH,
            axum::http::Method::DELETE,
            axum::http::Method::OPTIONS,
        ])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
            axum::http::header::ACCEPT,
        ])
        .expose_headers([axum::http::header::RETRY_AFTER])
        .max_age(Duration::from_secs(3600))
}

/// Prometheus 메트릭 endpoint.
async fn metrics_handler(
    axum::extract::State(handle): axum::extract::State<PrometheusHandle>,
) -> String {
    handle.render()
}

/// 전체 라우터 생성.
fn create_router(
    state: Arc<AppState>,
    limits: Option<&ResourceLimits>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(metrics_handler))
        .with_state(metrics_handle);

    build_router(state, limits)
        .merge(metrics_router)
        .layer(middleware::from_fn(metrics_layer))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(30),
        ))
        .layer(cors_layer())
}

/// 종료 시그널 대기 (Ctrl+C 또는 SIGTERM).
async fn shutdown_signal(shutdown_token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            warn!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            warn!("Received SIGTERM, initiating graceful shutdown...");
        }
    }

    shutdown_token.cancel();
    info!("Shutdown signal propagated to background tasks");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_override_config() {
        let args = Args::parse_from([
            "forum-api", "--host", "127.0.0.1", "--port", "9000", "--workers", "0", "--debug",
        ]);
        let mut config = AppConfig::default();
        args.apply(&mut config);

        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.workers, 1);
        assert!(config.server.debug);
    }

    #[test]
    fn test_args_keep_config_values() {
        let args = Args::parse_from(["forum-api"]);
        let mut config = AppConfig::default();
        config.server.port = 8100;
        args.apply(&mut config);

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8100);
        assert_eq!(config.server.workers, 1);
        assert_eq!(args.config, "config/default.toml");
        assert!(!config.server.debug);
    }

    #[test]
    fn test_default_secret_refused_outside_debug() {
        let auth = AuthConfig::default();
        let err = check_jwt_secret(&auth, false).unwrap_err();
        assert!(err.to_string().contains("FORUM__AUTH__JWT_SECRET"));

        let blank = AuthConfig {
            jwt_secret: String::new(),
            ..AuthConfig::default()
        };
        assert!(check_jwt_secret(&blank, false).is_err());
    }

    #[test]
    fn test_default_secret_allowed_in_debug() {
        assert!(check_jwt_secret(&AuthConfig::default(), true).is_ok());
    }

    #[test]
    fn test_configured_secret_accepted() {
        let auth = AuthConfig {
            jwt_secret: "a-deployment-specific-signing-secret".to_string(),
            ..AuthConfig::default()
        };
        assert!(check_jwt_secret(&auth, false).is_ok());
    }
}
