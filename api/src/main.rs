mod routes;

use std::path::PathBuf;
use std::sync::Arc;

use region_watch_common::config::Config;
use region_watch_engine::capture::ScreenSource;
use region_watch_engine::{CaptureEngine, EngineHandle};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.toml"));

    let config = match Config::load(&config_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config from {}: {e}", config_path.display());
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.level.parse().unwrap_or_default()),
        )
        .init();

    // Validated by Config::load.
    let settings = match config.capture.settings() {
        Ok(s) => s,
        Err(e) => {
            error!(error = %e, "invalid capture settings");
            std::process::exit(1);
        }
    };

    info!(
        capacity = settings.capacity(),
        threshold = settings.threshold(),
        interval_ms = settings.interval_ms(),
        region = ?config.capture.region,
        autostart = config.capture.autostart,
        "starting region-watch"
    );

    let mut engine = CaptureEngine::new(Arc::new(ScreenSource::new()), settings);
    if let Some(region) = config.capture.region {
        engine.set_region(region);
    }
    if config.capture.autostart {
        engine.start_capture();
    }
    let (handle, engine_task) = EngineHandle::spawn(engine);

    let app = routes::router(handle);

    let addr = format!("{}:{}", config.api.host, config.api.port);
    info!(addr, "region-watch control server starting");

    let listener = tokio::net::TcpListener::bind(&addr).await.unwrap_or_else(|e| {
        eprintln!("Failed to bind to {addr}: {e}");
        std::process::exit(1);
    });
    if let Err(e) = axum::serve(listener, app).await {
        error!(error = %e, "server exited with error");
    }
    engine_task.abort();
}
