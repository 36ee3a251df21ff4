//! crates/learning_path_core/src/domain.rs
//!
//! Defines the core data structures for the application: the learning path
//! itself, its milestones and resources, the computed study schedule and the
//! records the service keeps about saved paths.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// URL used by the synthesized resource of a milestone that arrived without any.
pub const PLACEHOLDER_RESOURCE_URL: &str = "https://example.com/default-resource";

//=========================================================================================
// Learning Path
//=========================================================================================

/// A single learning resource recommended for a milestone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceItem {
    #[serde(rename = "type")]
    pub kind: String,
    pub url: String,
    pub description: String,
}

impl ResourceItem {
    /// The resource substituted into a milestone whose resource list is empty.
    pub fn placeholder() -> Self {
        Self {
            kind: "article".to_string(),
            url: PLACEHOLDER_RESOURCE_URL.to_string(),
            description: "Default resource - please explore additional materials for this milestone"
                .to_string(),
        }
    }
}

/// Job market snapshot attached to a milestone after generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobMarketData {
    pub open_positions: String,
    pub trending_employers: Vec<String>,
    pub average_salary: String,
    pub related_roles: Vec<String>,
    /// 0-100, how in demand the skill currently is.
    pub demand_score: u32,
    pub region: Option<String>,
    /// Set when the snapshot could not be fetched and defaults were used instead.
    pub error: Option<String>,
}

impl Default for JobMarketData {
    fn default() -> Self {
        Self {
            open_positions: "N/A".to_string(),
            trending_employers: Vec::new(),
            average_salary: "N/A".to_string(),
            related_roles: Vec::new(),
            demand_score: 0,
            region: None,
            error: None,
        }
    }
}

impl JobMarketData {
    /// The packaged snapshot shown when live market data is unavailable.
    pub fn fallback_snapshot(error: impl Into<String>) -> Self {
        Self {
            open_positions: "5,000+".to_string(),
            trending_employers: vec![
                "Big Tech Co".to_string(),
                "Innovative Startup".to_string(),
                "Data Insights Inc".to_string(),
            ],
            average_salary: "$120,000 - $160,000".to_string(),
            error: Some(error.into()),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Milestone {
    pub title: String,
    pub description: String,
    pub estimated_hours: u32,
    pub resources: Vec<ResourceItem>,
    pub skills_gained: Vec<String>,
    #[serde(default)]
    pub job_market_data: JobMarketData,
}

/// A personalized learning plan as produced by the generation pipeline.
///
/// `total_hours` is always the sum of the milestone hours; it is recomputed
/// whenever a path is validated and never trusted from model output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningPath {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub topic: String,
    pub expertise_level: String,
    pub learning_style: String,
    pub time_commitment: String,
    pub duration_weeks: u32,
    pub goals: Vec<String>,
    pub milestones: Vec<Milestone>,
    pub prerequisites: Vec<String>,
    pub total_hours: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule: Option<Schedule>,
    pub created_at: DateTime<Utc>,
}

impl LearningPath {
    /// Sum of the estimated hours of every milestone.
    pub fn milestone_hours(&self) -> u32 {
        self.milestones
            .iter()
            .fold(0u32, |acc, m| acc.saturating_add(m.estimated_hours))
    }
}

//=========================================================================================
// Study Schedule
//=========================================================================================

/// The slot a single topic occupies in a study schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicAllocation {
    pub topic: String,
    pub hours: u32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Share of the requested budget, rounded to one decimal place.
    pub percentage: f64,
}

/// A week-by-week hour allocation across topics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    pub total_hours: u32,
    pub hours_per_week: u32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub topics: Vec<TopicAllocation>,
}

impl Schedule {
    /// Hours actually handed out, which may exceed `total_hours` once the
    /// one-hour floor kicks in.
    pub fn allocated_hours(&self) -> u32 {
        self.topics
            .iter()
            .fold(0u32, |acc, t| acc.saturating_add(t.hours))
    }
}

//=========================================================================================
// Free-form Structured Answers
//=========================================================================================

/// A structured answer to an open question about a topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResearchSummary {
    pub summary: String,
    pub key_concepts: Vec<String>,
    pub learning_path: Vec<String>,
    pub resources: Vec<serde_json::Value>,
    pub code_examples: Vec<serde_json::Value>,
    pub advanced_topics: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_details: Option<String>,
}

//=========================================================================================
// Saved Paths
//=========================================================================================

/// A learning path stored on behalf of a user.
#[derive(Debug, Clone)]
pub struct SavedPath {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub topic: String,
    pub path: LearningPath,
    pub is_archived: bool,
    pub created_at: DateTime<Utc>,
}

/// Completion state of one milestone within a saved path.
#[derive(Debug, Clone, PartialEq)]
pub struct MilestoneProgress {
    pub path_id: Uuid,
    pub milestone: String,
    pub completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
}
