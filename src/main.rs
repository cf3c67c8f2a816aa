use public_library::{
    adapters::{
        memory::MemoryStore,
        postgres::{self, PostgresBookRepository, PostgresLoanRepository, PostgresUserRepository},
    },
    api::{AppState, create_router},
    application::Usecases,
    config::{AppConfig, StorageKind},
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "public_library=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;
    tracing::info!(?config, "configuration loaded");

    let hasher = config.hasher.build()?;

    // Initialize adapters
    let usecases = match config.storage {
        StorageKind::Postgres => {
            let pool = postgres::connect(&config.database_url, config.max_connections).await?;
            postgres::migrate(&pool).await?;

            Usecases::new(
                Arc::new(PostgresBookRepository::new(pool.clone())),
                Arc::new(PostgresUserRepository::new(pool.clone())),
                Arc::new(PostgresLoanRepository::new(pool)),
                hasher,
            )
        }
        StorageKind::Memory => {
            tracing::warn!("using in-memory storage; data is lost on shutdown");
            let store = Arc::new(MemoryStore::new());
            Usecases::new(store.clone(), store.clone(), store, hasher)
        }
    };

    let app_state = Arc::new(AppState {
        usecases,
        request_timeout: config.request_timeout,
    });

    let app = create_router(app_state);

    let addr = config.server_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}
