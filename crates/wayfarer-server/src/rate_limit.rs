use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use governor::clock::{Clock, DefaultClock};
use governor::state::keyed::DashMapStateStore;
use governor::{Quota, RateLimiter};
use http::HeaderValue;
use wayfarer_config::RateLimitConfig;
use wayfarer_core::{AppError, ErrorKind};

use crate::error::HandlerError;
use crate::request_context::ClientIpResolver;

type KeyedLimiter = RateLimiter<String, DashMapStateStore<String>, DefaultClock>;

/// Only API routes are metered
const METERED_PREFIX: &str = "/api/";

const EXCEEDED_MESSAGE: &str = "Too many requests from this IP, please try again later.";

/// Per-IP request limiter backed by governor
pub struct RequestLimiter {
    limiter: KeyedLimiter,
    clock: DefaultClock,
}

impl RequestLimiter {
    /// Allow `requests` per `window` for each client, replenished evenly
    ///
    /// # Errors
    ///
    /// Returns an error if the window is invalid or zero
    pub fn new(config: &RateLimitConfig) -> anyhow::Result<Self> {
        let window = config.window_duration()?;
        if window.is_zero() {
            anyhow::bail!("rate limit window must be > 0");
        }

        let burst = NonZeroU32::new(config.requests).ok_or_else(|| anyhow::anyhow!("requests must be > 0"))?;
        let replenish_interval = window / burst.get();

        let quota = Quota::with_period(replenish_interval.max(Duration::from_nanos(1)))
            .ok_or_else(|| anyhow::anyhow!("invalid rate limit period"))?
            .allow_burst(burst);

        Ok(Self {
            limiter: RateLimiter::dashmap(quota),
            clock: DefaultClock::default(),
        })
    }

    /// Check one request for `key`
    ///
    /// # Errors
    ///
    /// Returns the seconds to wait before retrying once the quota is spent
    pub fn check(&self, key: &str) -> Result<(), u64> {
        self.limiter.check_key(&key.to_owned()).map_err(|not_until| {
            let wait = not_until.wait_time_from(self.clock.now());
            wait.as_secs().max(1)
        })
    }
}

/// Reject API requests over the per-IP quota
pub async fn rate_limit_middleware(
    limiter: Arc<RequestLimiter>,
    client_ip: ClientIpResolver,
    request: Request,
    next: Next,
) -> Response {
    if !request.uri().path().starts_with(METERED_PREFIX) {
        return next.run(request).await;
    }

    let ip = client_ip.resolve(&request).unwrap_or_else(|| "unknown".to_owned());

    match limiter.check(&ip) {
        Ok(()) => next.run(request).await,
        Err(retry_after) => {
            tracing::debug!(%ip, retry_after, "rate limit exceeded");

            let mut response =
                HandlerError::from(AppError::new(ErrorKind::RateLimited, EXCEEDED_MESSAGE)).into_response();
            response
                .headers_mut()
                .insert(http::header::RETRY_AFTER, HeaderValue::from(retry_after));
            response
        }
    }
}
