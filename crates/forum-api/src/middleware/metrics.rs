//! 요청 단위 HTTP 메트릭 수집.

use std::time::Instant;

use axum::{extract::Request, middleware::Next, response::Response};

use crate::metrics::{
    normalize_path, record_http_duration, record_http_request, record_http_response,
};

/// 요청 수, 응답 상태, 처리 시간을 기록합니다.
///
/// 경로의 레코드 ID는 `:id`로 정규화되어 라벨 수가 늘지 않습니다.
pub async fn metrics_layer(request: Request, next: Next) -> Response {
    let method = request.method().as_str().to_owned();
    let path = normalize_path(request.uri().path());
    record_http_request(&method, &path);

    let started = Instant::now();
    let response = next.run(request).await;
    let elapsed = started.elapsed().as_secs_f64();

    record_http_response(&method, &path, response.status().as_u16());
    record_http_duration(&method, &path, elapsed);
    response
}
