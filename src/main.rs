use anyhow::Context;
use std::path::PathBuf;
use std::sync::Arc;
use tower::Layer;
use tower_http::normalize_path::NormalizePathLayer;
use tracing::info;
use wisdom_lenses::api::{self, app_state::AppState};
use wisdom_lenses::config::loader::ConfigLoader;
use wisdom_lenses::observability::{
    AppMetrics, ObservabilityState, create_observability_router, init_tracing,
};
use wisdom_lenses::storage::{Repositories, StorageFactory};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 可选的配置文件路径
    let config = match std::env::args().nth(1) {
        Some(path) => ConfigLoader::load_from(PathBuf::from(path)),
        None => ConfigLoader::load(),
    }
    .context("failed to load configuration")?;

    let _log_guard = init_tracing(&config.logging);
    info!(
        app = %config.app_name,
        environment = %config.environment,
        "Starting Wisdom Lenses..."
    );

    ConfigLoader::validate(&config).context("invalid configuration")?;
    info!("Configuration loaded successfully");

    let repositories = StorageFactory::create(&config.database)
        .await
        .context("failed to initialize storage")?;
    info!(backend = ?config.database.backend, "Storage initialized");

    if config.database.seed_on_startup {
        seed_if_empty(&repositories).await?;
    }

    let metrics = Arc::new(AppMetrics::new());
    let app_state = AppState::build(&config, repositories.clone(), metrics.clone())
        .context("failed to create application state")?;
    info!(model = %config.ai.model, "Application state created");

    let observability_state = Arc::new(ObservabilityState::new(metrics, repositories));
    let router = create_observability_router(observability_state)
        .merge(api::create_router(app_state, &config.server));
    let app = NormalizePathLayer::trim_trailing_slash().layer(router);
    info!("API router created with observability endpoints");

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Server listening on {}", addr);

    axum::serve(listener, axum::ServiceExt::<axum::extract::Request>::into_make_service(app))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

/// 卦库为空时写入内置目录
async fn seed_if_empty(repositories: &Repositories) -> anyhow::Result<()> {
    let existing = repositories.hexagrams.count().await?;
    if existing > 0 {
        info!(existing, "Hexagram catalog already present, skipping seed");
        return Ok(());
    }

    let catalog = wisdom_lenses::models::catalog::seed_catalog()?;
    let inserted = repositories.hexagrams.insert_many(&catalog).await?;
    info!(inserted, "Hexagram catalog seeded");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    info!("Shutdown signal received");
}
