use onestream_api::api::{create_router, AppState};
use onestream_api::config::Config;
use onestream_api::store::{FeatureStore, MetadataStore};

use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env()?;

    // Both tables load before the listener binds; a broken catalogue is a
    // startup failure, not a per-request one.
    let features = FeatureStore::load(&config.features_csv)?;
    let metadata = MetadataStore::load(&config.metadata_csv)?;
    tracing::info!(
        titles = features.len(),
        dimensions = features.dimensions(),
        metadata_rows = metadata.len(),
        "Catalogue loaded"
    );

    let state = AppState::new(features, metadata);
    let app = create_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "Server running");
    axum::serve(listener, app).await?;

    Ok(())
}
