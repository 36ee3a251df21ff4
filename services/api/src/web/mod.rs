pub mod rest;
pub mod state;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

pub use rest::ApiDoc;
use rest::{
    archive_path_handler, ask_handler, create_path_handler, delete_path_handler,
    get_path_handler, job_market_handler, list_paths_handler, record_progress_handler,
};
use state::AppState;

/// All REST routes of the service, bound to the shared state.
pub fn router(app_state: Arc<AppState>) -> Router {
    Router::new()
        .route("/paths", post(create_path_handler).get(list_paths_handler))
        .route("/paths/{id}", get(get_path_handler).delete(delete_path_handler))
        .route("/paths/{id}/progress", post(record_progress_handler))
        .route("/paths/{id}/archive", post(archive_path_handler))
        .route("/ask", post(ask_handler))
        .route("/job-market", get(job_market_handler))
        .with_state(app_state)
}
