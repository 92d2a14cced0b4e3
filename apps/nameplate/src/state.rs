use std::sync::Arc;

use crate::config::Config;
use crate::layout::LayoutEngine;
use crate::printing::{ImageSink, SettingsStore};

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Default canvas, size range, and font source. Requests may override the canvas.
    pub engine: LayoutEngine,
    /// Persisted key-value settings (selected printer).
    pub settings: Arc<SettingsStore>,
    /// Pluggable destination for finished pages. Default: SpoolDirSink.
    pub sink: Arc<dyn ImageSink>,
}
