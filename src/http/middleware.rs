//! Request-id and timing middleware.
//!
//! Every request gets a UUID, a start/end log line pair, and an
//! `X-Request-ID` response header so a client-reported failure can be matched
//! to server logs. Requests slower than [`SLOW_REQUEST_SECS`] are flagged at
//! WARN — with a vision-model call in the path, that is the early signal the
//! upstream is degrading.

use axum::extract::Request;
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::Response;
use std::time::{Duration, Instant};
use tracing::{info, warn};
use uuid::Uuid;

/// Elapsed time after which a request is logged as critically slow.
const SLOW_REQUEST_SECS: u64 = 30;

/// Attach a request id, log start/end with timing, flag slow requests.
pub async fn request_context(req: Request, next: Next) -> Response {
    let request_id = Uuid::new_v4().to_string();
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let start = Instant::now();

    info!(%request_id, %method, %path, "Request started");

    let mut response = next.run(req).await;
    let elapsed = start.elapsed();

    if elapsed > Duration::from_secs(SLOW_REQUEST_SECS) {
        warn!(
            %request_id,
            elapsed_secs = %format!("{:.2}", elapsed.as_secs_f64()),
            "Critical processing time"
        );
    }

    info!(
        %request_id,
        status = response.status().as_u16(),
        elapsed_ms = elapsed.as_millis() as u64,
        "Request finished"
    );

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert("x-request-id", value);
    }

    response
}
