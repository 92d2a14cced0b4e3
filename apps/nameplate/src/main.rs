mod config;
mod errors;
mod layout;
mod printing;
mod routes;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::layout::{FileFontSource, FontSource, LayoutEngine};
use crate::printing::{SettingsStore, SpoolDirSink};
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on malformed env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Nameplate v{}", env!("CARGO_PKG_VERSION"));

    // Font search list. Faces load per request, so a font installed later is picked up.
    let fonts = FileFontSource::new(config.font_paths.clone());
    match fonts.load_face() {
        Some(face) => info!("Font available: {}", face.name()),
        None => info!("No font file found, using built-in font"),
    }

    let engine = LayoutEngine::new(config.canvas, config.sizes, Arc::new(fonts));
    info!(
        "Canvas {}x{}, font sizes {}..{} step {}",
        config.canvas.width, config.canvas.height, config.sizes.min, config.sizes.max, config.sizes.step
    );

    // Printer settings and spool
    let settings = Arc::new(SettingsStore::open(&config.settings_path));
    info!(
        "Settings at {} (printer: {:?})",
        settings.path().display(),
        settings.printer()
    );
    let sink = Arc::new(SpoolDirSink::new(&config.spool_dir));
    info!("Spooling print jobs to {}", config.spool_dir.display());

    // Build app state
    let state = AppState {
        config: config.clone(),
        engine,
        settings,
        sink,
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
