//! API key authentication for the `/documents` routes.

use axum::{
    body::Body,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::sync::Arc;

use crate::web::error::ApiError;
use crate::{DocvaultError, Result};

/// Header carrying the API key.
pub const API_KEY_HEADER: &str = "X-API-Key";

type HmacSha256 = Hmac<Sha256>;

const KEY_DOMAIN: &[u8] = b"docvault-api-key";

/// Configured API key. An empty key disables the check.
#[derive(Clone)]
pub struct ApiKeyState {
    /// Tag of the configured key, or `None` when authentication is off.
    expected_tag: Option<Vec<u8>>,
}

impl ApiKeyState {
    pub fn new(api_key: &str) -> Result<Self> {
        let expected_tag = if api_key.is_empty() {
            None
        } else {
            Some(key_tag(api_key)?)
        };
        Ok(Self { expected_tag })
    }

    /// Whether a key is required.
    pub fn is_enabled(&self) -> bool {
        self.expected_tag.is_some()
    }

    /// Check a presented key.
    ///
    /// Both keys are reduced to HMAC tags and compared in constant time, so
    /// neither the content nor the length of the configured key leaks.
    pub fn verify(&self, presented: Option<&str>) -> bool {
        let Some(expected) = &self.expected_tag else {
            return true;
        };
        let Some(presented) = presented else {
            return false;
        };
        match HmacSha256::new_from_slice(presented.as_bytes()) {
            Ok(mut mac) => {
                mac.update(KEY_DOMAIN);
                mac.verify_slice(expected).is_ok()
            }
            Err(_) => false,
        }
    }
}

fn key_tag(key: &str) -> Result<Vec<u8>> {
    let mut mac = HmacSha256::new_from_slice(key.as_bytes())
        .map_err(|e| DocvaultError::Config(format!("invalid API key: {e}")))?;
    mac.update(KEY_DOMAIN);
    Ok(mac.finalize().into_bytes().to_vec())
}

/// Middleware rejecting requests without a valid `X-API-Key` header.
pub async fn require_api_key(state: Arc<ApiKeyState>, req: Request<Body>, next: Next) -> Response {
    let presented = req
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok());

    if !state.verify(presented) {
        tracing::warn!(path = %req.uri().path(), "Rejected request with missing or invalid API key");
        return ApiError::unauthorized("Invalid or missing API key").into_response();
    }

    next.run(req).await
}
