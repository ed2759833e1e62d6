//! storage-pools server entry point.
//!
//! Starts the Axum HTTP server with REST and WebSocket endpoints.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::routing::get;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::EnvFilter;

use storage_pools::api;
use storage_pools::app_state::AppState;
use storage_pools::config::GatewayConfig;
use storage_pools::custody::{InMemoryTokenLedger, TokenLedger};
use storage_pools::domain::EventBus;
use storage_pools::governance::{Capability, PauseSwitch, StaticRoleAuthority, SystemClock};
use storage_pools::persistence::{PostgresPersistence, spawn_event_writer};
use storage_pools::service::{Collaborators, PoolService};
use storage_pools::ws::handler::ws_handler;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = GatewayConfig::from_env().map_err(|e| anyhow::anyhow!(e))?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if config.log_json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
    tracing::info!(addr = %config.listen_addr, "starting storage-pools");

    // Collaborators
    let ledger = Arc::new(InMemoryTokenLedger::new(config.ledger.custody_account.clone()));
    let roles = StaticRoleAuthority::new()
        .with_grants(Capability::Admin, config.ledger.admin_accounts.iter().cloned())
        .with_grants(
            Capability::PoolAdmin,
            config.ledger.pool_admin_accounts.iter().cloned(),
        );
    let collaborators = Collaborators {
        token_ledger: Arc::clone(&ledger) as Arc<dyn TokenLedger>,
        roles: Arc::new(roles),
        pause: Arc::new(PauseSwitch::new()),
        clock: Arc::new(SystemClock),
    };

    // Build service layer
    let event_bus = EventBus::new(config.event_bus_capacity);
    let pool_service = Arc::new(PoolService::new(
        config.ledger.clone(),
        collaborators,
        event_bus.clone(),
    ));

    // Optional event log
    let writer = if config.persistence_enabled {
        let pg = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .min_connections(config.database_min_connections)
            .acquire_timeout(Duration::from_secs(config.database_connect_timeout_secs))
            .connect(&config.database_url)
            .await
            .context("connecting to PostgreSQL")?;
        let persistence = PostgresPersistence::new(pg);
        persistence.migrate().await.context("running migrations")?;
        tracing::info!("event log enabled");
        Some(spawn_event_writer(persistence, &event_bus))
    } else {
        None
    };

    // Build application state
    let app_state = AppState {
        pool_service,
        event_bus,
        dev_ledger: Some(ledger),
    };

    // Build router
    let app = api::with_middleware(
        api::build_router().route("/ws", get(ws_handler)),
        Duration::from_secs(config.request_timeout_secs),
    )
    .with_state(app_state);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("binding {}", config.listen_addr))?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app).await?;

    if let Some(handle) = writer {
        handle.abort();
    }
    Ok(())
}
