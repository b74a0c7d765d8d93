//! HTTP layer for docvault.
//!
//! Exposes the `/documents` JSON API, the HTML upload page, a health
//! check, and the OpenAPI document.

pub mod csrf;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod openapi;
pub mod router;
pub mod server;
pub mod ui;

pub use error::{ApiError, ErrorCode};
pub use handlers::AppState;
pub use router::{create_health_router, create_router};
pub use server::WebServer;
