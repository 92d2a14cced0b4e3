//! Image sink — where finished pages go once rendered.
//!
//! Talking to a spooler is out of scope: the default sink drops each job as a PNG in a
//! spool directory, named by job id, for whatever dispatches to the printer.

use std::io::Write;
use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::layout::{LayoutError, RenderedImage};

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("Spool I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Encoding error: {0}")]
    Encode(#[from] LayoutError),

    #[error("Spool persist error: {0}")]
    Persist(#[from] tempfile::PersistError),

    #[error("Sink task failed: {0}")]
    Task(String),
}

/// One page handed to a sink.
#[derive(Debug, Clone, Serialize)]
pub struct PrintJob {
    pub id: Uuid,
    pub printer: String,
    pub created_at: DateTime<Utc>,
    pub font_size: u32,
}

impl PrintJob {
    pub fn new(printer: impl Into<String>, font_size: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            printer: printer.into(),
            created_at: Utc::now(),
            font_size,
        }
    }
}

/// Accepts rendered pages. Implement this to swap the hand-off without touching handlers.
///
/// Carried in `AppState` as `Arc<dyn ImageSink>`.
#[async_trait]
pub trait ImageSink: Send + Sync {
    /// Takes ownership of `image` and returns where it was stored.
    async fn submit(&self, job: &PrintJob, image: RenderedImage) -> Result<PathBuf, SinkError>;
}

/// Writes `<dir>/<job id>.png`, atomically.
#[derive(Debug, Clone)]
pub struct SpoolDirSink {
    dir: PathBuf,
}

impl SpoolDirSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn job_path(&self, id: Uuid) -> PathBuf {
        self.dir.join(format!("{id}.png"))
    }
}

#[async_trait]
impl ImageSink for SpoolDirSink {
    async fn submit(&self, job: &PrintJob, image: RenderedImage) -> Result<PathBuf, SinkError> {
        let dir = self.dir.clone();
        let path = self.job_path(job.id);
        let target = path.clone();

        // PNG encoding of a full page is CPU-bound.
        tokio::task::spawn_blocking(move || -> Result<(), SinkError> {
            let png = image.to_png()?;
            std::fs::create_dir_all(&dir)?;
            let mut tmp = tempfile::Builder::new()
                .prefix(".job-")
                .suffix(".png")
                .tempfile_in(&dir)?;
            tmp.write_all(&png)?;
            tmp.persist(&target)?;
            Ok(())
        })
        .await
        .map_err(|e| SinkError::Task(e.to_string()))??;

        info!(
            job_id = %job.id,
            printer = %job.printer,
            path = %path.display(),
            "Spooled print job"
        );
        Ok(path)
    }
}
