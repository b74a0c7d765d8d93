//! Web server for docvault.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;

use crate::config::Config;
use crate::{DocvaultError, Result};

use super::handlers::AppState;
use super::middleware::RateLimitState;
use super::router::create_router;

/// HTTP server.
pub struct WebServer {
    /// Server address.
    addr: SocketAddr,
    /// Application state.
    app_state: Arc<AppState>,
    /// Full configuration.
    config: Config,
}

impl WebServer {
    /// Create a new web server.
    pub fn new(config: &Config, app_state: AppState) -> Result<Self> {
        let addr = format!("{}:{}", config.server.host, config.server.port)
            .parse()
            .map_err(|e| DocvaultError::Config(format!("invalid server address: {e}")))?;

        Ok(Self {
            addr,
            app_state: Arc::new(app_state),
            config: config.clone(),
        })
    }

    /// Run the web server until it fails.
    pub async fn run(self) -> Result<()> {
        let rate_limit_state = Arc::new(RateLimitState::new(
            self.config.web.api_rate_limit,
            self.config.web.upload_rate_limit,
        ));
        let router = create_router(self.app_state, rate_limit_state.clone(), &self.config.web)?;

        let listener = TcpListener::bind(self.addr).await?;
        let local_addr = listener.local_addr()?;

        rate_limit_state.start_cleanup_task();

        tracing::info!("Web server listening on http://{}", local_addr);
        if self.config.web.serve_docs {
            tracing::info!("API documentation at http://{}/swagger-ui", local_addr);
        }

        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await?;

        Ok(())
    }
}
