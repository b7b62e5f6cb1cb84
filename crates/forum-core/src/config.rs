//! 설정 관리.
//!
//! 기본값 → 설정 파일(선택) → `FORUM__` 접두사 환경 변수 순으로 병합합니다.

use std::collections::BTreeMap;
use std::net::IpAddr;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ForumError, ForumResult};

/// 비밀 키가 설정되지 않았을 때 쓰는 개발용 값.
pub const DEFAULT_JWT_SECRET: &str = "dev-secret-key-change-in-production";

/// 토큰 수명 상한 (분). 하루.
pub const MAX_TOKEN_LIFETIME_MINUTES: i64 = 24 * 60;

/// 애플리케이션 설정.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    /// 서버 설정
    #[serde(default)]
    pub server: ServerConfig,
    /// 데이터베이스 설정
    #[serde(default)]
    pub database: DatabaseConfig,
    /// 인증 토큰 설정
    #[serde(default)]
    pub auth: AuthConfig,
    /// 요청 한도 설정
    #[serde(default)]
    pub rate_limit: RateLimitSettings,
    /// 로깅 설정
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// 서버 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// 바인딩할 호스트
    pub host: String,
    /// 리스닝할 포트
    pub port: u16,
    /// 워커 스레드 수
    pub workers: usize,
    /// 디버그 모드
    pub debug: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8001,
            workers: 1,
            debug: false,
        }
    }
}

/// 데이터베이스 설정.
///
/// `url`이 없으면 메모리 저장소로 동작합니다.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// PostgreSQL 연결 URL
    #[serde(default)]
    pub url: Option<String>,
    /// 최대 연결 수
    pub max_connections: u32,
    /// 연결 획득 타임아웃 (초)
    pub acquire_timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: 10,
            acquire_timeout_secs: 10,
        }
    }
}

/// 인증 토큰 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    /// 토큰 서명 비밀 키
    pub jwt_secret: String,
    /// 토큰 수명 (분)
    pub token_lifetime_minutes: i64,
    /// 토큰 `scope` 클레임에 담을 값
    #[serde(default)]
    pub scope: BTreeMap<String, String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: DEFAULT_JWT_SECRET.to_string(),
            token_lifetime_minutes: 5,
            scope: BTreeMap::new(),
        }
    }
}

impl AuthConfig {
    /// 개발용 기본 키나 빈 키를 쓰는지 여부.
    pub fn uses_default_secret(&self) -> bool {
        let secret = self.jwt_secret.trim();
        secret.is_empty() || secret == DEFAULT_JWT_SECRET
    }

    /// 토큰 수명.
    ///
    /// `1..=MAX_TOKEN_LIFETIME_MINUTES` 범위를 벗어나면 설정 에러.
    pub fn token_lifetime(&self) -> ForumResult<chrono::Duration> {
        let minutes = self.token_lifetime_minutes;
        if !(1..=MAX_TOKEN_LIFETIME_MINUTES).contains(&minutes) {
            return Err(ForumError::Config(format!(
                "auth.token_lifetime_minutes must be between 1 and {MAX_TOKEN_LIFETIME_MINUTES}, got {minutes}"
            )));
        }
        chrono::Duration::try_minutes(minutes).ok_or_else(|| {
            ForumError::Config(format!("auth.token_lifetime_minutes out of range: {minutes}"))
        })
    }
}

/// 리소스별 요청 한도 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RateLimitSettings {
    /// 사용자 리소스 초당 요청 수
    pub users_per_second: u32,
    /// 토론 리소스 초당 요청 수
    pub discussions_per_second: u32,
    /// 요청 한도 비활성화
    pub disabled: bool,
    /// `X-Forwarded-For`를 신뢰할 프록시 주소
    ///
    /// 비어 있으면 전달 헤더를 무시하고 연결 주소로 클라이언트를 구분합니다.
    #[serde(default)]
    pub trusted_proxies: Vec<IpAddr>,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            users_per_second: 5,
            discussions_per_second: 10,
            disabled: false,
            trusted_proxies: Vec::new(),
        }
    }
}

/// 로깅 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// 로그 레벨
    pub level: String,
    /// 로그 형식 (pretty, json, compact)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl AppConfig {
    /// 파일과 환경 변수에서 설정을 로드합니다.
    ///
    /// 파일이 없으면 기본값과 환경 변수만 사용합니다.
    pub fn load<P: AsRef<Path>>(path: P) -> ForumResult<Self> {
        let defaults = AppConfig::default();

        let builder = config::Config::builder()
            // 기본값으로 시작
            .set_default("server.host", defaults.server.host)?
            .set_default("server.port", i64::from(defaults.server.port))?
            .set_default("server.workers", defaults.server.workers as i64)?
            .set_default("server.debug", defaults.server.debug)?
            .set_default("database.max_connections", i64::from(defaults.database.max_connections))?
            .set_default("database.acquire_timeout_secs", defaults.database.acquire_timeout_secs as i64)?
            .set_default("auth.jwt_secret", defaults.auth.jwt_secret)?
            .set_default("auth.token_lifetime_minutes", defaults.auth.token_lifetime_minutes)?
            .set_default("rate_limit.users_per_second", i64::from(defaults.rate_limit.users_per_second))?
            .set_default(
                "rate_limit.discussions_per_second",
                i64::from(defaults.rate_limit.discussions_per_second),
            )?
            .set_default("rate_limit.disabled", defaults.rate_limit.disabled)?
            .set_default("logging.level", defaults.logging.level)?
            .set_default("logging.format", defaults.logging.format)?
            // 파일에서 로드
            .add_source(config::File::from(path.as_ref()).required(false))
            // 환경 변수로 오버라이드
            .add_source(
                config::Environment::with_prefix("FORUM")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("rate_limit.trusted_proxies"),
            );

        let config: AppConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// 로드 후 값 범위 검증.
    pub fn validate(&self) -> ForumResult<()> {
        self.auth.token_lifetime()?;
        Ok(())
    }
}
