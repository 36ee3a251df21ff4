//! crates/learning_path_core/src/ports.rs
//!
//! Defines the service contracts (traits) the core depends on.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to stay independent of specific model providers, databases or HTTP clients.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{JobMarketData, LearningPath, MilestoneProgress, SavedPath};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    /// The remote call failed: network, authentication, rate limiting.
    #[error("Transport failure: {0}")]
    Transport(String),
    #[error("Call timed out after {0:?}")]
    Timeout(std::time::Duration),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// Anything that can turn a prompt into raw model text.
///
/// Implementations own provider-specific concerns such as authentication and
/// transport retries; the core only sees the text or a `PortError`.
#[async_trait]
pub trait TextCompletionProvider: Send + Sync {
    /// Completes `prompt`, asking the model to follow `schema_instructions`.
    async fn complete(
        &self,
        prompt: &str,
        schema_instructions: &str,
        temperature: f32,
    ) -> PortResult<String>;
}

#[async_trait]
pub trait JobMarketService: Send + Sync {
    /// Current hiring snapshot for a skill or role.
    async fn market_snapshot(&self, skill_or_role: &str) -> PortResult<JobMarketData>;

    /// Job titles that make use of the given skills.
    async fn related_roles(&self, skills: &[String]) -> PortResult<Vec<String>>;
}

#[async_trait]
pub trait PathRepository: Send + Sync {
    // --- Saved Paths ---
    async fn save_path(&self, user_id: Uuid, path: &LearningPath) -> PortResult<SavedPath>;

    async fn get_path(&self, user_id: Uuid, path_id: Uuid) -> PortResult<SavedPath>;

    /// All paths of a user, newest first.
    async fn list_paths(&self, user_id: Uuid, archived: bool) -> PortResult<Vec<SavedPath>>;

    async fn set_archived(&self, user_id: Uuid, path_id: Uuid, archived: bool) -> PortResult<()>;

    async fn delete_path(&self, user_id: Uuid, path_id: Uuid) -> PortResult<()>;

    // --- Progress Tracking ---
    async fn record_progress(
        &self,
        path_id: Uuid,
        milestone: &str,
        completed: bool,
    ) -> PortResult<()>;

    async fn get_progress(&self, path_id: Uuid) -> PortResult<Vec<MilestoneProgress>>;
}
