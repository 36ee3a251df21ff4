pub mod domain;
pub mod generation;
pub mod market;
pub mod planner;
pub mod ports;
pub mod preferences;
pub mod progress;
pub mod repair;
pub mod schedule;
pub mod schema;

pub use domain::{
    JobMarketData, LearningPath, Milestone, MilestoneProgress, ResearchSummary, ResourceItem,
    SavedPath, Schedule, TopicAllocation,
};
pub use generation::{GenerationError, GenerationSettings, StructuredGenerator};
pub use planner::{LearningPathPlanner, PathRequest, PlanError};
pub use ports::{JobMarketService, PathRepository, PortError, PortResult, TextCompletionProvider};
pub use preferences::{ExpertiseLevel, LearningStyle, TimeCommitment};
pub use progress::ProgressSummary;
pub use schema::{SchemaKind, SchemaViolation, StructuredSchema};
