//! Middleware for the HTTP layer.

pub mod api_key;
pub mod cors;
pub mod rate_limit;
pub mod security;

pub use api_key::{require_api_key, ApiKeyState, API_KEY_HEADER};
pub use cors::create_cors_layer;
pub use rate_limit::{rate_limit, RateLimitState};
pub use security::security_headers;
