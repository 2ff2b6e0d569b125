use axum::body::Body;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;

/// Middleware for logging HTTP requests
///
/// Logs method, path, status and time to first byte. Bodies are not read:
/// exports are streamed and must not be buffered here.
pub async fn request_logger(req: Request<Body>, next: Next) -> Response {
    let start = std::time::Instant::now();
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let response = next.run(req).await;

    let status = response.status().as_u16();
    let elapsed_ms = start.elapsed().as_millis();
    if response.status().is_server_error() {
        tracing::warn!("{} {:>6} {} | {:>5}ms", status, method, path, elapsed_ms);
    } else {
        tracing::info!("{} {:>6} {} | {:>5}ms", status, method, path, elapsed_ms);
    }

    response
}
