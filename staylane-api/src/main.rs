use staylane_api::{
    app,
    state::{AppState, AuthConfig},
};
use staylane_store::{
    MemoryBookings, MemoryDirectory, MemoryListings, MemoryMirror, MemoryThreads,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "staylane_api=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = staylane_store::Config::load().expect("Failed to load config");
    tracing::info!("Starting Staylane API on port {}", config.server.port);

    // In-memory stores stand in for the hosted document store and identity
    // provider during local development.
    let app_state = AppState {
        bookings: Arc::new(MemoryBookings::new()),
        mirror: Arc::new(MemoryMirror::new()),
        threads: Arc::new(MemoryThreads::new()),
        listings: Arc::new(MemoryListings::new()),
        directory: Arc::new(MemoryDirectory::new()),
        policy: config.policy,
        auth: AuthConfig {
            secret: config.auth.jwt_secret.clone(),
        },
    };

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
