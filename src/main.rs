use jobvault::{
    api::{AppState, create_router},
    config::{database, settings},
    core::vendor,
    errors::Result,
};
use dotenvy::dotenv;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file; env vars can also be set externally
    dotenv().ok();

    // 3. Load config.toml (defaults when missing)
    let config = settings::load_default_config()
        .inspect_err(|e| error!("Failed to load configuration: {}", e))?;

    // 4. Connect and create tables
    let database_url = database::get_database_url();
    let db = database::create_connection(&database_url)
        .await
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    database::create_tables(&db)
        .await
        .inspect(|_| info!("Database initialized successfully."))?;

    // 5. Seed approved vendors
    vendor::seed_vendors(&db, &config.vendors).await?;

    // 6. Serve
    let listen_addr = config.server.listen_addr.clone();
    let app = create_router(AppState::new(db, config));
    let listener = tokio::net::TcpListener::bind(&listen_addr)
        .await
        .inspect_err(|e| error!("Failed to bind {}: {}", listen_addr, e))?;
    info!(addr = %listen_addr, "JobVault listening");

    axum::serve(listener, app).await?;
    Ok(())
}
