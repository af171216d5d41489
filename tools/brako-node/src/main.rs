use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use brako_common::tracking::SystemClock;
use brako_node::api::{self, AppState};
use brako_node::config::Cli;
use brako_node::session::{AdminCredentials, SessionStore};
use brako_node::store::{MemoryStore, PostgresStore, ShipmentStore};
use brako_node::ShipmentRepository;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let store: Arc<dyn ShipmentStore> = match cli.database_url() {
        Some(url) => {
            let store = PostgresStore::connect(url, cli.pool_size)
                .context("failed to configure PostgreSQL pool")?;
            store
                .init_schema()
                .await
                .context("failed to create shipment tables")?;
            info!(pool_size = cli.pool_size, "using PostgreSQL store");
            Arc::new(store)
        }
        None => {
            info!("using in-memory store; data is lost on exit");
            Arc::new(MemoryStore::new())
        }
    };

    let credentials = AdminCredentials::new(cli.admin_user.clone(), &cli.admin_password_sha256)
        .context("invalid --admin-password-sha256")?;
    let sessions = SessionStore::new(credentials, cli.session_ttl());
    let repository = ShipmentRepository::new(store, Arc::new(SystemClock));

    let app = api::router(AppState::shared(repository, sessions));

    let listener = tokio::net::TcpListener::bind(cli.listen)
        .await
        .with_context(|| format!("failed to bind {}", cli.listen))?;
    info!(addr = %cli.listen, "brako-node listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("shutting down"),
        Err(e) => {
            warn!(error = %e, "cannot listen for ctrl-c; running until killed");
            std::future::pending::<()>().await;
        }
    }
}
