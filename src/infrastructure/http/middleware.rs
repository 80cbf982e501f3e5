//! HTTP Middleware
//!
//! 请求耗时与 HTTP 状态码错误日志

use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;

/// 超过该耗时的请求记录警告（生成接口除外）
const SLOW_REQUEST_MS: u128 = 1000;

/// 请求日志中间件
///
/// 4xx/5xx 状态码按级别记录；业务错误（errno != 0）在 ApiError::into_response() 中记录
pub async fn error_logging_middleware(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let started = Instant::now();

    let response = next.run(request).await;
    let status = response.status();
    let latency_ms = started.elapsed().as_millis();

    if status.is_server_error() {
        tracing::error!(
            method = %method,
            uri = %uri,
            status = %status.as_u16(),
            latency_ms = latency_ms as u64,
            "HTTP server error"
        );
    } else if status.is_client_error() {
        tracing::warn!(
            method = %method,
            uri = %uri,
            status = %status.as_u16(),
            latency_ms = latency_ms as u64,
            "HTTP client error"
        );
    } else if latency_ms > SLOW_REQUEST_MS && !uri.path().ends_with("/generate") {
        tracing::warn!(
            method = %method,
            uri = %uri,
            latency_ms = latency_ms as u64,
            "Slow HTTP request"
        );
    }

    response
}
