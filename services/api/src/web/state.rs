//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use learning_path_core::{JobMarketService, LearningPathPlanner, PathRepository};
use std::sync::Arc;

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub planner: Arc<LearningPathPlanner>,
    pub repository: Arc<dyn PathRepository>,
    pub job_market: Arc<dyn JobMarketService>,
}
