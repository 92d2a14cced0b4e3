//! Axum route handlers for the Render, Preview, Print, and Printer APIs.

use axum::{
    body::Body,
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::layout::preview::{build_preview, PrintPreview};
use crate::layout::{CanvasSpec, LayoutEngine, LayoutSummary, NameCard, RenderOutcome};
use crate::printing::PrintJob;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RenderRequest {
    #[serde(flatten)]
    pub card: NameCard,
    /// Replaces the configured canvas for this request only.
    #[serde(default)]
    pub canvas: Option<CanvasSpec>,
}

#[derive(Debug, Serialize)]
pub struct PreviewResponse {
    pub preview: PrintPreview,
    pub layout: Option<LayoutSummary>,
}

#[derive(Debug, Serialize)]
pub struct PrintJobResponse {
    pub job: PrintJob,
    pub path: String,
    pub layout: LayoutSummary,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PrinterSelection {
    pub printer: Option<String>,
}

pub const FONT_SIZE_HEADER: &str = "x-font-size";

// ────────────────────────────────────────────────────────────────────────────
// Helpers
// ────────────────────────────────────────────────────────────────────────────

/// The shared engine, with the request's canvas swapped in when one was sent.
/// Overrides larger than the configured pixel cap are rejected before any allocation.
fn engine_for(state: &AppState, canvas: Option<CanvasSpec>) -> Result<LayoutEngine, AppError> {
    let mut engine = state.engine.clone();
    if let Some(canvas) = canvas {
        let max = state.config.max_canvas_pixels;
        if canvas.pixel_count() > max {
            return Err(AppError::Validation(format!(
                "canvas {}x{} exceeds the limit of {max} pixels",
                canvas.width, canvas.height
            )));
        }
        engine.canvas = canvas;
    }
    Ok(engine)
}

/// Runs CPU-bound layout work off the async executor.
async fn run_blocking<T, F>(f: F) -> Result<T, AppError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("spawn_blocking failed in render: {e}")))
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/render
///
/// Renders the name card and returns it as `image/png`. Returns 204 when both names
/// are blank.
pub async fn handle_render(
    State(state): State<AppState>,
    Json(request): Json<RenderRequest>,
) -> Result<Response, AppError> {
    let engine = engine_for(&state, request.canvas)?;
    let card = request.card;

    let rendered = run_blocking(move || -> Result<Option<(bytes::Bytes, u32)>, AppError> {
        match engine.render_card(&card)? {
            RenderOutcome::NoContent => Ok(None),
            RenderOutcome::Rendered { image, layout } => Ok(Some((image.to_png()?, layout.size()))),
        }
    })
    .await??;

    let Some((png, font_size)) = rendered else {
        return Ok(StatusCode::NO_CONTENT.into_response());
    };

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "image/png")
        .header(FONT_SIZE_HEADER, font_size)
        .body(Body::from(png))
        .map_err(|e| AppError::Internal(e.into()))
}

/// POST /api/v1/preview
///
/// Describes what would be printed: normalized lines, the governing line, and the
/// chosen font size. Nothing is painted.
pub async fn handle_preview(
    State(state): State<AppState>,
    Json(request): Json<RenderRequest>,
) -> Result<Json<PreviewResponse>, AppError> {
    let engine = engine_for(&state, request.canvas)?;
    let card = request.card;

    let response = run_blocking(move || -> Result<PreviewResponse, AppError> {
        let layout = engine.plan(&card)?;
        Ok(PreviewResponse {
            preview: build_preview(&card, layout.as_ref(), &engine.canvas),
            layout: layout.as_ref().map(|l| l.summary()),
        })
    })
    .await??;

    Ok(Json(response))
}

/// POST /api/v1/print
///
/// Renders the card and hands the page to the image sink for the selected printer.
pub async fn handle_print(
    State(state): State<AppState>,
    Json(request): Json<RenderRequest>,
) -> Result<Json<PrintJobResponse>, AppError> {
    let printer = state
        .settings
        .printer()
        .ok_or_else(|| AppError::Conflict("Please select a printer first".to_string()))?;

    if request.card.lines().is_empty() {
        return Err(AppError::Validation(
            "Please enter at least first name or last name".to_string(),
        ));
    }

    let engine = engine_for(&state, request.canvas)?;
    let card = request.card;
    let outcome = run_blocking(move || engine.render_card(&card)).await??;

    let (image, layout) = match outcome {
        RenderOutcome::Rendered { image, layout } => (image, layout),
        RenderOutcome::NoContent => {
            return Err(AppError::Validation(
                "Please enter at least first name or last name".to_string(),
            ))
        }
    };

    let job = PrintJob::new(printer, layout.size());
    let path = state.sink.submit(&job, image).await?;

    Ok(Json(PrintJobResponse {
        job,
        path: path.display().to_string(),
        layout: layout.summary(),
    }))
}

/// GET /api/v1/printer
pub async fn handle_get_printer(State(state): State<AppState>) -> Json<PrinterSelection> {
    Json(PrinterSelection {
        printer: state.settings.printer(),
    })
}

/// PUT /api/v1/printer
///
/// Saves (or clears, with `null`) the selected printer.
pub async fn handle_set_printer(
    State(state): State<AppState>,
    Json(request): Json<PrinterSelection>,
) -> Result<Json<PrinterSelection>, AppError> {
    let printer = match request.printer {
        Some(name) if name.trim().is_empty() => {
            return Err(AppError::Validation("printer cannot be empty".to_string()))
        }
        Some(name) => Some(name.trim().to_string()),
        None => None,
    };

    let settings = state.settings.clone();
    let saved = printer.clone();
    run_blocking(move || settings.set_printer(saved.as_deref())).await??;

    Ok(Json(PrinterSelection { printer }))
}
