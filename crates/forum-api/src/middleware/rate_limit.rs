//! Rate limiting middleware.
//!
//! 리소스별, 클라이언트 IP별 Token Bucket 기반 rate limiting을 제공합니다.

use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{header::RETRY_AFTER, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::ApiErrorResponse;
use crate::metrics::record_rate_limited;

/// Rate Limiter 설정.
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// 초당 최대 요청 수
    pub requests_per_second: u32,
    /// 버스트 허용량 (순간적으로 허용되는 추가 요청)
    pub burst_size: u32,
    /// 버킷 정리 간격
    pub cleanup_interval: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_second: 10,
            burst_size: 0,
            cleanup_interval: Duration::from_secs(60),
        }
    }
}

impl RateLimitConfig {
    /// 버스트 없는 초당 한도 설정.
    pub fn per_second(requests_per_second: u32) -> Self {
        Self {
            requests_per_second,
            ..Default::default()
        }
    }
}

/// Token Bucket 구조체.
#[derive(Debug)]
struct TokenBucket {
    /// 현재 토큰 수
    tokens: f64,
    /// 마지막 리필 시간
    last_refill: Instant,
    /// 최대 토큰 수 (버킷 용량)
    max_tokens: f64,
    /// 초당 리필되는 토큰 수
    refill_rate: f64,
}

impl TokenBucket {
    fn new(config: &RateLimitConfig) -> Self {
        let refill_rate = f64::from(config.requests_per_second.max(1));
        let max_tokens = refill_rate + f64::from(config.burst_size);

        Self {
            tokens: max_tokens,
            last_refill: Instant::now(),
            max_tokens,
            refill_rate,
        }
    }

    /// 토큰 소비 시도.
    fn try_acquire(&mut self) -> bool {
        self.refill();

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    fn refill(&mut self) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_refill).as_secs_f64();

        self.tokens = (self.tokens + elapsed * self.refill_rate).min(self.max_tokens);
        self.last_refill = now;
    }

    /// 다음 토큰까지 대기 시간 (초, 최소 1).
    fn retry_after_secs(&self) -> u64 {
        let wait = (1.0 - self.tokens).max(0.0) / self.refill_rate;
        (wait.ceil() as u64).max(1)
    }
}

/// IP 주소별 Rate Limiter.
#[derive(Clone)]
pub struct RateLimiter {
    config: RateLimitConfig,
    buckets: Arc<RwLock<HashMap<IpAddr, TokenBucket>>>,
}

impl RateLimiter {
    /// 새 Rate Limiter 생성.
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            buckets: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// 요청 허용 여부 확인.
    pub async fn check(&self, ip: IpAddr) -> RateLimitResult {
        let mut buckets = self.buckets.write().await;

        let bucket = buckets
            .entry(ip)
            .or_insert_with(|| TokenBucket::new(&self.config));

        if bucket.try_acquire() {
            RateLimitResult::Allowed
        } else {
            RateLimitResult::Limited {
                retry_after: bucket.retry_after_secs(),
            }
        }
    }

    /// 오래된 버킷 정리.
    pub async fn cleanup(&self) {
        let mut buckets = self.buckets.write().await;
        let Some(threshold) = Instant::now().checked_sub(self.config.cleanup_interval) else {
            return;
        };

        buckets.retain(|_, bucket| bucket.last_refill > threshold);
    }

    /// 현재 추적 중인 IP 수 반환.
    pub async fn tracked_ips(&self) -> usize {
        self.buckets.read().await.len()
    }

    /// 정리 간격.
    pub fn cleanup_interval(&self) -> Duration {
        self.config.cleanup_interval
    }
}

/// 정리 간격마다 오래된 버킷을 지우는 백그라운드 태스크.
pub fn spawn_cleanup(limiter: RateLimiter, shutdown: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(limiter.cleanup_interval());
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => limiter.cleanup().await,
            }
        }
    })
}

/// Rate Limit 확인 결과.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RateLimitResult {
    /// 요청 허용됨
    Allowed,
    /// Rate limit 초과
    Limited {
        /// 재시도까지 대기 시간 (초)
        retry_after: u64,
    },
}

/// 리소스 하나에 대한 Rate Limit 미들웨어 상태.
#[derive(Clone)]
pub struct RateLimitState {
    resource: &'static str,
    limiter: RateLimiter,
    trusted_proxies: Arc<[IpAddr]>,
}

impl RateLimitState {
    pub fn new(resource: &'static str, config: RateLimitConfig) -> Self {
        Self {
            resource,
            limiter: RateLimiter::new(config),
            trusted_proxies: Arc::from(Vec::new()),
        }
    }

    /// 전달 헤더를 신뢰할 프록시 주소를 설정합니다.
    pub fn with_trusted_proxies(mut self, proxies: Vec<IpAddr>) -> Self {
        self.trusted_proxies = Arc::from(proxies);
        self
    }

    /// 리소스 이름.
    pub fn resource(&self) -> &'static str {
        self.resource
    }

    /// 내부 limiter.
    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }
}

/// Rate Limiting 미들웨어 함수.
pub async fn rate_limit_middleware(
    State(state): State<RateLimitState>,
    request: Request,
    next: Next,
) -> Response {
    let ip = extract_client_ip(&request, &state.trusted_proxies);

    match state.limiter.check(ip).await {
        RateLimitResult::Allowed => next.run(request).await,
        RateLimitResult::Limited { retry_after } => {
            record_rate_limited(state.resource);
            tracing::warn!(
                client_ip = %ip,
                resource = state.resource,
                retry_after,
                "Rate limit exceeded"
            );

            let body = ApiErrorResponse::new(
                "RATE_LIMITED",
                "Rate limit exceeded. Please try again later.",
            )
            .with_details(json!({ "retry_after": retry_after }));

            let mut response = (StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response();
            response
                .headers_mut()
                .insert(RETRY_AFTER, HeaderValue::from(retry_after));
            response
        }
    }
}

/// 요청에서 클라이언트 IP 추출.
///
/// 연결 주소가 신뢰 프록시일 때만 전달 헤더를 봅니다. `X-Forwarded-For`는
/// 오른쪽부터 읽어 신뢰 프록시가 아닌 첫 주소를 클라이언트로 봅니다.
fn extract_client_ip(request: &Request, trusted_proxies: &[IpAddr]) -> IpAddr {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST));

    if !trusted_proxies.contains(&peer) {
        return peer;
    }

    let hops: Vec<&str> = request
        .headers()
        .get_all("x-forwarded-for")
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .collect();

    let mut outermost_proxy = None;
    for hop in hops.iter().rev() {
        match hop.trim().parse::<IpAddr>() {
            Ok(ip) if trusted_proxies.contains(&ip) => outermost_proxy = Some(ip),
            Ok(ip) => return ip,
            // 형식이 깨진 항목 너머는 위조 가능
            Err(_) => break,
        }
    }
    if let Some(ip) = outermost_proxy {
        return ip;
    }

    request
        .headers()
        .get("x-real-ip")
        .and_then(|v| v.to_str().ok())
        .and_then(|ip| ip.trim().parse().ok())
        .unwrap_or(peer)
}
