//! Offer flow - tool-call controller for a speed-upgrade sales conversation
//!
//! Guides an agent through authentication, profile download, offer
//! preparation and submission, enforcing the order of those steps.

mod api;
mod config;
mod db;
mod runtime;
mod services;
mod state_machine;
mod tools;

use api::{create_router, AppState};
use config::FlowConfig;
use db::Database;
use runtime::{DatabaseStorage, FlowMachine, FlowServices, SessionRegistry};
use services::identity::default_customers;
use services::{DatabaseSink, FixedUpgradeOffers, MockIdentityProvider};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "offer_flow=info,tower_http=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    let config = FlowConfig::from_env();

    // Ensure database directory exists
    if let Some(parent) = config.db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    tracing::info!(path = %config.db_path.display(), "Opening database");
    let db = Database::open(&config.db_path)?;

    let registry = Arc::new(SessionRegistry::new());
    let _sweeper = registry.spawn_sweeper(config.session_ttl, config.sweep_interval);

    let services = FlowServices {
        registry: registry.clone(),
        durable: Arc::new(DatabaseStorage::new(db.clone())),
        identities: Arc::new(MockIdentityProvider::new(default_customers(
            &config.reference_phone,
        ))),
        offers: Arc::new(FixedUpgradeOffers::default()),
        sink: Arc::new(DatabaseSink::new(db)),
    };
    let flow = Arc::new(FlowMachine::new(services, &config.reference_phone));

    let state = AppState::new(flow);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = create_router(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!(
        session_ttl_secs = config.session_ttl.as_secs(),
        "Offer flow server listening on {}",
        addr
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
