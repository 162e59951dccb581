//! Web server implementation using axum

use anyhow::{anyhow, Result};
use axum::http::{HeaderName, Method};
use axum::{routing::get, Router};
use chrono::{DateTime, Utc};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use ccmon_core::store::UsageStore;

use crate::config::Settings;

use super::api::{self, ApiState};
use super::files;
use super::static_files;

/// Monitoring web server
pub struct WebServer {
    settings: Settings,
    store: UsageStore,
    /// Explicit server-start instant, threaded into session-time
    /// calculations instead of a process-wide global
    started_at: DateTime<Utc>,
}

impl WebServer {
    /// Create a new web server
    pub fn new(settings: Settings, store: UsageStore, started_at: DateTime<Utc>) -> Self {
        Self {
            settings,
            store,
            started_at,
        }
    }

    /// Build the application router
    pub fn router(state: Arc<ApiState>) -> Router {
        // Local dashboard use; the browser UI may be opened from file:// or
        // another port during development, so any origin may read.
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET])
            .allow_headers([HeaderName::from_static("content-type")]);

        Router::new()
            .route("/api/claude-status", get(api::claude_status))
            .route("/api/token-usage", get(api::token_usage))
            .route("/api/usage-history", get(api::usage_history))
            .route("/api/file-changes", get(files::file_changes))
            .route("/", get(static_files::unified))
            .route("/individual", get(static_files::individual))
            .route("/world-class", get(static_files::world_class))
            .route("/{*path}", get(static_files::asset))
            .with_state(state)
            .layer(cors)
    }

    /// Run the web server until shutdown
    pub async fn run(self) -> Result<()> {
        let port = self.settings.web.port;
        let addr = SocketAddr::from(([127, 0, 0, 1], port));

        let state = Arc::new(ApiState {
            settings: self.settings,
            store: self.store,
            started_at: self.started_at,
        });

        let app = Self::router(state);

        let listener = match tokio::net::TcpListener::bind(addr).await {
            Ok(listener) => listener,
            Err(e) if e.kind() == std::io::ErrorKind::AddrInUse => {
                return Err(anyhow!(
                    "Port {} is already in use. Stop the other process \
                     (e.g. `lsof -ti:{} | xargs kill`) or pass --port",
                    port,
                    port
                ));
            }
            Err(e) => return Err(e.into()),
        };

        tracing::info!("Dashboard URL: http://localhost:{}", port);
        axum::serve(listener, app).await?;

        Ok(())
    }
}
