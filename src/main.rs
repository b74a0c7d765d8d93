use tracing::{error, info};

use docvault::document::{reconcile, ReconcileOptions};
use docvault::{AppState, Config, Database, WebServer};

#[tokio::main]
async fn main() {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.toml".to_string());

    // Load configuration
    let config = match Config::load_with_env(&config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load {config_path}: {e}");
            eprintln!("Using default configuration.");
            let mut config = Config::default();
            config.apply_env_overrides();
            config
        }
    };

    // Initialize logging
    if let Err(e) = docvault::logging::init(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        docvault::logging::init_console_only(&config.logging.level);
    }

    if let Err(e) = run(config).await {
        error!("Fatal error: {}", e);
        std::process::exit(1);
    }
}

async fn run(config: Config) -> docvault::Result<()> {
    config.validate()?;

    info!("docvault - document storage service");
    info!(
        "Server configured on {}:{}",
        config.server.host, config.server.port
    );

    let db = Database::open(&config.database.path).await?;
    info!("Index database opened at: {}", config.database.path);

    let state = AppState::from_config(&config, db)?;

    if config.reconcile.on_startup {
        let repo = state.repository();
        reconcile(
            &state.storage,
            &repo,
            ReconcileOptions::from(&config.reconcile),
        )
        .await?;
    }

    WebServer::new(&config, state)?.run().await
}
