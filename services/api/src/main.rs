use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use api::{
    config::{AppConfig, AppMode},
    create_router,
    middleware::cors_layer,
    payment::SimulatedGateway,
    repositories::{MemoryStore, PgStore, Store},
    seed::build_seed,
    state::AppState,
};
use auth::{
    jwt::{JwtConfig, JwtService},
    password::{PasswordConfig, PasswordService},
    tokens::TokenAuthority,
};
use common::database::{DatabaseConfig, init_pool};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,tower_http=info")),
        )
        .init();

    let config = AppConfig::from_env()?;
    let mode = config.mode()?;

    info!("Starting Eventsphere API in {} mode", mode);

    let passwords = PasswordService::new(PasswordConfig::default())
        .context("Failed to initialize password hashing")?;

    let (store, tokens): (Arc<dyn Store>, TokenAuthority) = match mode {
        AppMode::Demo => {
            let seed = build_seed(&passwords)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to build demo data: {}", e))?;
            warn!("Demo mode: data lives in memory and tokens are not verified");
            (Arc::new(MemoryStore::with_data(seed)), TokenAuthority::Demo)
        }
        AppMode::Database => {
            let db_config = DatabaseConfig::from_env()?;
            let pool = init_pool(&db_config).await?;
            let store = PgStore::new(pool);
            store.migrate().await?;

            let jwt = JwtService::new(JwtConfig::new(
                config.jwt_secret()?,
                config.jwt_expiry_seconds,
            )?);
            (Arc::new(store), TokenAuthority::Signed(jwt))
        }
    };

    if !config.seed_enabled() {
        info!("Seeding endpoint disabled");
    }

    let payments = Arc::new(SimulatedGateway::new(config.payment_success_rate));
    let state = AppState::new(store, tokens, passwords, payments)
        .with_login_limiter(config.rate_limiter_config())
        .with_seed_enabled(config.seed_enabled())
        .with_error_details(!config.is_production());

    let app = create_router(state, cors_layer(config.cors_origins()));

    let address = config.bind_address();
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;
    info!("API service listening on {}", address);

    axum::serve(listener, app).await?;

    Ok(())
}
