use crate::AppState;
use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use std::sync::{Mutex, PoisonError};
use std::time::Instant;

#[derive(Debug)]
struct Bucket {
    refreshed_at: Instant,
    tokens: f32,
}

/// Global token bucket shared by every client of the service.
///
/// Refills at `rate_per_sec` up to `burst_size`; each admitted request spends
/// one token.
#[derive(Debug)]
pub struct RequestRateLimiter {
    bucket: Mutex<Bucket>,
    rate_per_sec: f32,
    burst_size: f32,
}

impl RequestRateLimiter {
    pub fn new(rate_per_sec: f32, burst_size: f32) -> Self {
        Self {
            bucket: Mutex::new(Bucket {
                refreshed_at: Instant::now(),
                tokens: burst_size,
            }),
            rate_per_sec,
            burst_size,
        }
    }

    /// Spend a token if one is available.
    pub fn try_acquire(&self) -> bool {
        let mut bucket = self.bucket.lock().unwrap_or_else(PoisonError::into_inner);
        let now = Instant::now();
        let elapsed = now.duration_since(bucket.refreshed_at).as_secs_f32();

        let available = (bucket.tokens + elapsed * self.rate_per_sec).min(self.burst_size);
        bucket.refreshed_at = now;

        if available >= 1.0 {
            bucket.tokens = available - 1.0;
            true
        } else {
            bucket.tokens = available;
            false
        }
    }
}

/// Reject requests with 429 once the bucket is empty.
pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    if state.config.resilience.rate_limit_enabled && !state.rate_limiter.try_acquire() {
        tracing::warn!(
            name: "http.rate_limited",
            path = %req.uri().path(),
            "Request rejected by rate limiter"
        );
        return Err(StatusCode::TOO_MANY_REQUESTS);
    }
    Ok(next.run(req).await)
}
