//! crates/learning_path_core/src/progress.rs
//!
//! Milestone completion tracking for saved paths.

use serde::Serialize;

use crate::domain::{LearningPath, MilestoneProgress};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProgressSummary {
    pub completed: usize,
    pub total: usize,
    /// Whole percent, rounded down. Zero for a path without milestones.
    pub percentage: u32,
}

impl ProgressSummary {
    pub fn new(completed: usize, total: usize) -> Self {
        let percentage = if total == 0 {
            0
        } else {
            (completed * 100 / total) as u32
        };
        Self {
            completed,
            total,
            percentage,
        }
    }

    /// Combines per-path summaries into a dashboard-wide one.
    pub fn overall<'a>(summaries: impl IntoIterator<Item = &'a ProgressSummary>) -> Self {
        let (completed, total) = summaries
            .into_iter()
            .fold((0, 0), |(c, t), s| (c + s.completed, t + s.total));
        Self::new(completed, total)
    }
}

/// Progress of `path` given the recorded entries. Milestones are matched by
/// title; entries for milestones the path no longer has are ignored.
pub fn summarize(path: &LearningPath, entries: &[MilestoneProgress]) -> ProgressSummary {
    let completed = path
        .milestones
        .iter()
        .filter(|m| {
            entries
                .iter()
                .any(|e| e.completed && e.milestone == m.title)
        })
        .count();
    ProgressSummary::new(completed, path.milestones.len())
}

/// Whether `milestone` names one of the milestones of `path`.
pub fn has_milestone(path: &LearningPath, milestone: &str) -> bool {
    path.milestones.iter().any(|m| m.title == milestone)
}
