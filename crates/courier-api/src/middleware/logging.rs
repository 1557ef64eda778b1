use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;

pub const HTTP_REQUESTS_TOTAL: &str = "courier_http_requests_total";
pub const HTTP_LATENCY_SECONDS: &str = "courier_http_request_duration_seconds";

/// Log and count every request with its status and latency
pub async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let started = Instant::now();

    let response = next.run(request).await;

    let status = response.status();
    let elapsed = started.elapsed();
    let latency_ms = elapsed.as_millis() as u64;

    metrics::counter!(
        HTTP_REQUESTS_TOTAL,
        "method" => method.to_string(),
        "status" => status.as_u16().to_string()
    )
    .increment(1);
    metrics::histogram!(HTTP_LATENCY_SECONDS, "method" => method.to_string())
        .record(elapsed.as_secs_f64());

    if status.is_server_error() {
        tracing::error!(%method, %path, status = status.as_u16(), latency_ms, "request");
    } else if status.is_client_error() {
        tracing::warn!(%method, %path, status = status.as_u16(), latency_ms, "request");
    } else {
        tracing::info!(%method, %path, status = status.as_u16(), latency_ms, "request");
    }

    response
}
