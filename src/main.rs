mod config;
mod demo;
mod web;

use anyhow::{Context, Result};
use chrono::Utc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use ccmon_core::store::UsageStore;

use config::{Cli, Settings};
use web::WebServer;

#[tokio::main]
async fn main() {
    // Parse CLI arguments
    let cli = Cli::parse_args();

    // Setup logging
    setup_logging(cli.debug);

    if let Err(e) = run(cli).await {
        tracing::error!("{:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    // Load settings
    let mut settings = Settings::load(cli.config.as_ref())?;
    settings.merge_cli(&cli);

    // Open the usage history store
    let store = UsageStore::open(&settings.store.db_path)
        .with_context(|| format!("Failed to open usage store at {:?}", settings.store.db_path))?;
    tracing::info!(
        "Usage history database initialized at {:?}",
        settings.store.db_path
    );
    tracing::info!("Watching agent todo files in {:?}", settings.todos_dir());

    // Open the dashboard once the server has had a moment to come up
    if settings.web.open_browser {
        spawn_browser_open(settings.web.port);
    }

    let server = WebServer::new(settings, store, Utc::now());
    server.run().await
}

fn setup_logging(debug: bool) {
    let filter = if debug {
        EnvFilter::new("ccmon=debug")
    } else {
        EnvFilter::new("ccmon=info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}

/// Open the dashboard in the default browser, in a background task.
fn spawn_browser_open(port: u16) {
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(2)).await;

        let url = format!("http://localhost:{}", port);
        #[cfg(target_os = "macos")]
        let command = "open";
        #[cfg(not(target_os = "macos"))]
        let command = "xdg-open";

        match std::process::Command::new(command).arg(&url).spawn() {
            Ok(_) => tracing::debug!("Opened dashboard at {}", url),
            Err(e) => tracing::warn!("Could not open browser for {}: {}", url, e),
        }
    });
}
