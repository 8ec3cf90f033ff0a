use axum::{
    extract::Request,
    http::HeaderValue,
    middleware::Next,
    response::Response,
};
use std::time::Instant;
use tracing::info;

pub const PROCESS_TIME_HEADER: &str = "x-process-time";

/// Stamp every response with its handling time in seconds and log the request.
pub async fn process_time(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let start = Instant::now();

    let mut response = next.run(req).await;

    let elapsed = start.elapsed().as_secs_f64();
    if let Ok(value) = HeaderValue::from_str(&elapsed.to_string()) {
        response.headers_mut().insert(PROCESS_TIME_HEADER, value);
    }

    info!(
        "{} {} -> {} in {:.4}s",
        method,
        path,
        response.status().as_u16(),
        elapsed
    );
    response
}
