//! HTTP Middleware
//!
//! HTTP 状态码错误日志中间件

use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;

/// 超过该耗时的请求记录警告（WebSocket 升级除外）
const SLOW_REQUEST_MS: u128 = 2000;

/// 记录 4xx/5xx 响应与慢请求
///
/// 业务错误（errno != 0）在 `ApiError::into_response()` 中记录
pub async fn error_logging_middleware(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let started = Instant::now();

    let response = next.run(request).await;
    let status = response.status();
    let elapsed_ms = started.elapsed().as_millis();

    if status.is_server_error() {
        tracing::error!(
            method = %method,
            uri = %uri,
            status = %status.as_u16(),
            elapsed_ms,
            "HTTP server error"
        );
    } else if status.is_client_error() {
        tracing::warn!(
            method = %method,
            uri = %uri,
            status = %status.as_u16(),
            elapsed_ms,
            "HTTP client error"
        );
    } else if elapsed_ms > SLOW_REQUEST_MS && !status.is_informational() {
        tracing::warn!(method = %method, uri = %uri, elapsed_ms, "Slow HTTP request");
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request as HttpRequest, StatusCode},
        routing::{get, post},
        Json, Router,
    };
    use tower::util::ServiceExt;

    async fn status_handler() -> &'static str {
        "idle"
    }

    async fn json_handler(Json(body): Json<serde_json::Value>) -> Json<serde_json::Value> {
        Json(body)
    }

    async fn error_handler() -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }

    fn create_test_router() -> Router {
        Router::new()
            .route("/status", get(status_handler))
            .route("/play", post(json_handler))
            .route("/error", get(error_handler))
            .layer(axum::middleware::from_fn(error_logging_middleware))
    }

    async fn send(request: HttpRequest<Body>) -> StatusCode {
        create_test_router().oneshot(request).await.unwrap().status()
    }

    #[tokio::test]
    async fn test_ok_response_passes_through() {
        let request = HttpRequest::builder()
            .uri("/status")
            .body(Body::empty())
            .unwrap();
        assert_eq!(send(request).await, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_malformed_json_is_client_error() {
        let request = HttpRequest::builder()
            .method("POST")
            .uri("/play")
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        assert!(send(request).await.is_client_error());
    }

    #[tokio::test]
    async fn test_server_error_passes_through() {
        let request = HttpRequest::builder()
            .uri("/error")
            .body(Body::empty())
            .unwrap();
        assert_eq!(send(request).await, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
