use std::env;

use anyhow::Result;
use civic_api::{build_app, ApiConfig};
use civic_observability::init_tracing;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing("civic_api");

    let config = ApiConfig::from_env();
    let bind = env::var("CIVIC_BIND").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
    let catalog = config
        .catalog_dir
        .as_ref()
        .map(|dir| dir.display().to_string())
        .unwrap_or_else(|| "built-in".to_string());

    let app = build_app(config).await?;

    let listener = tokio::net::TcpListener::bind(&bind).await?;
    tracing::info!(bind = %bind, catalog = %catalog, "civic assistant api started");

    axum::serve(listener, app).await?;
    Ok(())
}
