use std::net::SocketAddr;
use std::str::FromStr;

use anyhow::Context;
use tracing::{Level, info};

use hki_server::config::AppConfig;
use hki_server::state::AppState;
use hki_server::{build_router, database, seed, storage};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load().context("Failed to load configuration")?;

    let level = Level::from_str(&config.log.level).unwrap_or(Level::INFO);
    tracing_subscriber::fmt().with_max_level(level).init();

    let db = database::init_db(&config.database.url)
        .await
        .context("Failed to connect to the database")?;
    info!("Database connected and schema synced");

    seed::seed_filing_statuses(&db).await?;
    seed::seed_super_admin(&db, &config.auth).await?;
    seed::ensure_indexes(&db).await?;

    let download_signer = storage::download_signer(&config);
    let blob_store = storage::build_blob_store(&config, download_signer.clone())
        .await
        .context("Failed to initialise blob storage")?;

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server.host/server.port")?;

    let state = AppState {
        db,
        config,
        blob_store,
        download_signer,
    };
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Server running at http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
