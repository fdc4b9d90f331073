/// Light curve analysis service entry point
mod classify;
mod clients;
mod config;
mod domain;
mod errors;
mod handlers;
mod render;
mod routes;
mod scoring;
mod services;
mod stats;
mod utils;

use crate::clients::{ExoplanetArchiveClient, LightCurveClient};
use crate::config::AppConfig;
use crate::handlers::AppState;
use crate::routes::build_router;
use crate::services::{LightCurveService, PipelineSettings, SeriesFetcher};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);

    // Load configuration
    let config = AppConfig::from_env()?;
    info!("Configuration loaded successfully");

    // Initialize clients
    let lightcurve_client =
        LightCurveClient::new(config.lightcurve_api_url.clone(), config.http_timeout)?;
    let ephemeris_client =
        ExoplanetArchiveClient::new(config.ephemeris_api_url.clone(), config.http_timeout)?;
    info!("Light curve provider: {}", lightcurve_client.base_url());

    // Initialize services
    let lightcurve_service = Arc::new(LightCurveService::new(
        SeriesFetcher::new(Arc::new(lightcurve_client)),
        Arc::new(ephemeris_client),
        PipelineSettings {
            catalog_prefix: config.catalog_prefix.clone(),
            baseline_habitability: config.baseline_habitability.clone(),
        },
    ));

    // Initialize application state
    let state = AppState {
        lightcurve_service,
        default_fetch_mode: config.default_fetch_mode,
    };

    // Build router
    let app = build_router(state, config.transports, config.cors_enabled);
    info!(
        "Transports: json={} html={} cors={}",
        config.transports.json, config.transports.html, config.cors_enabled
    );

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!("lightcurve_api listening on {}", config.bind_addr);

    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}
