use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use hotel_api::{
    app,
    auth::bootstrap_admin,
    state::{AppState, AuthConfig},
};
use hotel_core::repository::{AdminRepository, ReservationRepository, RoomRepository};
use hotel_store::app_config::{Config, StorageBackend};
use hotel_store::{DbClient, MemoryStore, StoreAdminRepository, StoreReservationRepository, StoreRoomRepository};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

type Stores = (Arc<dyn RoomRepository>, Arc<dyn ReservationRepository>, Arc<dyn AdminRepository>);

async fn open_stores(config: &Config) -> anyhow::Result<Stores> {
    match config.database.backend {
        StorageBackend::Postgres => {
            let url = config
                .database
                .url
                .as_deref()
                .context("database.url is required for the postgres backend")?;
            let db = DbClient::new(url, config.database.max_connections)
                .await
                .context("Failed to connect to PostgreSQL")?;
            db.migrate().await.context("Failed to run migrations")?;

            let rooms: Arc<dyn RoomRepository> = Arc::new(StoreRoomRepository::new(db.pool.clone()));
            let reservations: Arc<dyn ReservationRepository> =
                Arc::new(StoreReservationRepository::new(db.pool.clone()));
            let admins: Arc<dyn AdminRepository> = Arc::new(StoreAdminRepository::new(db.pool));
            Ok((rooms, reservations, admins))
        }
        StorageBackend::Memory => {
            tracing::warn!("Using the in-memory store; data is lost on restart");
            let store = Arc::new(MemoryStore::new());
            let rooms: Arc<dyn RoomRepository> = store.clone();
            let reservations: Arc<dyn ReservationRepository> = store.clone();
            let admins: Arc<dyn AdminRepository> = store;
            Ok((rooms, reservations, admins))
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hotel_api=debug,hotel_booking=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("Failed to load config")?;
    tracing::info!("Starting hotel API on port {}", config.server.port);

    let (rooms, reservations, admins) = open_stores(&config).await?;

    bootstrap_admin(
        admins.as_ref(),
        config.auth.bootstrap_email.as_deref(),
        config.auth.bootstrap_password.as_deref(),
    )
    .await?;

    let app_state = AppState::new(
        rooms,
        reservations,
        admins,
        AuthConfig {
            secret: config.auth.jwt_secret.clone(),
            expiration: config.auth.jwt_expiration_seconds,
        },
        config.paging.clone(),
    );

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
