use anyhow::{Context, Result};
use rtls_hub::api::create_app;
use rtls_hub::catalog::ObjectCatalog;
use rtls_hub::config::{load_config, RtlsConfig};
use rtls_hub::simulation::{model_rng, SimulationClock};
use rtls_hub::state::StateHub;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rtls_hub=info,tower_http=info".into()),
        )
        .init();

    info!("RTLS hub starting...");

    let config_path =
        std::env::var("RTLS_CONFIG").unwrap_or_else(|_| "config.toml".to_string());
    let mut config = if Path::new(&config_path).exists() {
        load_config(&config_path)
            .with_context(|| format!("Failed to load config from {}", config_path))?
    } else {
        info!(path = %config_path, "No config file, using defaults");
        RtlsConfig::default()
    };
    config.apply_env_overrides();

    let population = config.simulation.population;
    info!(
        population = population,
        width = config.area.width,
        height = config.area.height,
        tick_ms = config.simulation.tick_interval().as_millis() as u64,
        seeded = config.simulation.seed.is_some(),
        "Configuration loaded"
    );

    // Catalog draws from stream 0; models use 1..=population
    let catalog = Arc::new(ObjectCatalog::generate(
        population,
        &mut model_rng(config.simulation.seed, 0),
    ));
    info!(objects = catalog.len(), "Object catalog generated");

    let hub = Arc::new(StateHub::new(config.stream.buffer_for(population)));
    let clock = SimulationClock::from_config(&config, &catalog, Arc::clone(&hub)).start();

    let app = create_app(&config, Arc::clone(&hub), catalog);

    let listener = tokio::net::TcpListener::bind(&config.server.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.server.bind_addr))?;
    info!(addr = %config.server.bind_addr, static_dir = %config.server.static_dir.display(), "HTTP server listening");
    info!("Endpoints: /api/objects, /api/object?id=X, /api/positions, /api/position?id=X, /api/positions/stream, /api/ws, /api/stats");

    let shutdown_hub = Arc::clone(&hub);
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for ctrl_c signal");
            }
            info!("Shutdown signal received");
            // Open streams end once their channels close
            shutdown_hub.shutdown();
        })
        .await
        .context("HTTP server error")?;

    clock.stop().await;
    info!("RTLS hub stopped");

    Ok(())
}
