//! Rate limiting middleware.

use axum::{
    body::Body,
    extract::ConnectInfo,
    http::{Method, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use std::{
    collections::HashMap,
    net::SocketAddr,
    num::NonZeroU32,
    sync::{Arc, PoisonError, RwLock},
    time::Duration,
};

use crate::web::error::ApiError;

/// Per-IP rate limiter using Governor.
pub type IpRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

type LimiterMap = RwLock<HashMap<String, Arc<IpRateLimiter>>>;

/// State for rate limiting.
#[derive(Clone)]
pub struct RateLimitState {
    /// Per-IP rate limiters for every request.
    api_limiters: Arc<LimiterMap>,
    /// Per-IP rate limiters for uploads.
    upload_limiters: Arc<LimiterMap>,
    /// API rate limit (requests per minute).
    api_rate_limit: u32,
    /// Upload rate limit (requests per minute).
    upload_rate_limit: u32,
}

impl RateLimitState {
    /// Create a new rate limit state.
    pub fn new(api_rate_limit: u32, upload_rate_limit: u32) -> Self {
        Self {
            api_limiters: Arc::new(RwLock::new(HashMap::new())),
            upload_limiters: Arc::new(RwLock::new(HashMap::new())),
            api_rate_limit,
            upload_rate_limit,
        }
    }

    /// Get or create a rate limiter for the given IP.
    fn get_or_create_limiter(
        limiters: &LimiterMap,
        ip: &str,
        requests_per_minute: u32,
    ) -> Arc<IpRateLimiter> {
        {
            let read_guard = limiters.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(limiter) = read_guard.get(ip) {
                return limiter.clone();
            }
        }

        let mut write_guard = limiters.write().unwrap_or_else(PoisonError::into_inner);

        // Double-check after acquiring write lock
        if let Some(limiter) = write_guard.get(ip) {
            return limiter.clone();
        }

        let quota =
            Quota::per_minute(NonZeroU32::new(requests_per_minute).unwrap_or(NonZeroU32::MIN));
        let limiter = Arc::new(RateLimiter::direct(quota));
        write_guard.insert(ip.to_string(), limiter.clone());
        limiter
    }

    /// Check if a request is allowed under the general limit.
    pub fn check_api(&self, ip: &str) -> bool {
        Self::get_or_create_limiter(&self.api_limiters, ip, self.api_rate_limit)
            .check()
            .is_ok()
    }

    /// Check if an upload is allowed.
    pub fn check_upload(&self, ip: &str) -> bool {
        Self::get_or_create_limiter(&self.upload_limiters, ip, self.upload_rate_limit)
            .check()
            .is_ok()
    }

    /// Drop limiters that no request currently holds.
    pub fn cleanup(&self) {
        for limiters in [&self.api_limiters, &self.upload_limiters] {
            limiters
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .retain(|_, v| Arc::strong_count(v) > 1);
        }
    }

    /// Start a background task to periodically clean up old entries.
    pub fn start_cleanup_task(self: Arc<Self>) {
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(Duration::from_secs(300)).await;
                self.cleanup();
            }
        });
    }
}

/// Extract client IP from request.
fn get_client_ip(req: &Request<Body>) -> String {
    // Take the first IP in a proxy chain
    if let Some(forwarded) = req
        .headers()
        .get("X-Forwarded-For")
        .and_then(|v| v.to_str().ok())
    {
        if let Some(ip) = forwarded.split(',').next() {
            return ip.trim().to_string();
        }
    }

    if let Some(real_ip) = req
        .headers()
        .get("X-Real-IP")
        .and_then(|v| v.to_str().ok())
    {
        return real_ip.to_string();
    }

    if let Some(ConnectInfo(addr)) = req.extensions().get::<ConnectInfo<SocketAddr>>() {
        return addr.ip().to_string();
    }

    "unknown".to_string()
}

/// Uploads are `POST /documents` and the HTML form `POST /`.
fn is_upload(req: &Request<Body>) -> bool {
    req.method() == Method::POST && matches!(req.uri().path(), "/documents" | "/")
}

/// Rate limiting middleware.
///
/// Every request counts against the general limit; uploads also count
/// against the upload limit.
pub async fn rate_limit(state: Arc<RateLimitState>, req: Request<Body>, next: Next) -> Response {
    let ip = get_client_ip(&req);

    if is_upload(&req) && !state.check_upload(&ip) {
        tracing::warn!(ip = %ip, "Upload rate limit exceeded");
        return ApiError::too_many_requests("Too many uploads. Please try again later.")
            .into_response();
    }

    if !state.check_api(&ip) {
        tracing::warn!(ip = %ip, "API rate limit exceeded");
        return ApiError::too_many_requests("Too many requests. Please try again later.")
            .into_response();
    }

    next.run(req).await
}
