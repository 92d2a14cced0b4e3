pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::printing::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Name card API
        .route("/api/v1/render", post(handlers::handle_render))
        .route("/api/v1/preview", post(handlers::handle_preview))
        .route("/api/v1/print", post(handlers::handle_print))
        // Printer selection
        .route(
            "/api/v1/printer",
            get(handlers::handle_get_printer).put(handlers::handle_set_printer),
        )
        .with_state(state)
}
