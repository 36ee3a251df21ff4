//! crates/learning_path_core/src/preferences.rs
//!
//! The vocabulary a learner uses to describe themselves: expertise level,
//! learning style and weekly time commitment, plus the tables derived from them.

use crate::domain::ResourceItem;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of weeks a moderately paced beginner path is planned for.
const BASE_DURATION_WEEKS: f64 = 8.0;

/// Returned when a request names a level, style or commitment we do not know.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("Invalid {field} '{value}'. Choose from: {choices}")]
pub struct UnknownChoice {
    pub field: &'static str,
    pub value: String,
    pub choices: String,
}

macro_rules! choice_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $field:literal {
            $($variant:ident => $key:literal, $desc:literal;)+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "lowercase")]
        pub enum $name {
            $($variant,)+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant,)+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $key,)+
                }
            }

            /// Human readable explanation used when prompting the model.
            pub fn description(&self) -> &'static str {
                match self {
                    $($name::$variant => $desc,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = UnknownChoice;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let wanted = s.trim().to_lowercase();
                Self::ALL
                    .iter()
                    .copied()
                    .find(|choice| choice.as_str() == wanted)
                    .ok_or_else(|| UnknownChoice {
                        field: $field,
                        value: s.to_string(),
                        choices: Self::ALL
                            .iter()
                            .map(|c| c.as_str())
                            .collect::<Vec<_>>()
                            .join(", "),
                    })
            }
        }
    };
}

choice_enum! {
    /// How much the learner already knows about the topic.
    ExpertiseLevel, "expertise level" {
        Beginner => "beginner", "No prior knowledge in the subject";
        Intermediate => "intermediate", "Some familiarity with basic concepts";
        Advanced => "advanced", "Solid understanding of core principles";
        Expert => "expert", "Deep knowledge and specialization";
    }
}

choice_enum! {
    /// The medium the learner absorbs material through best.
    LearningStyle, "learning style" {
        Visual => "visual", "Learns best through images, diagrams, and spatial understanding";
        Auditory => "auditory", "Learns best through listening and speaking";
        Reading => "reading", "Learns best through written materials and note-taking";
        Kinesthetic => "kinesthetic", "Learns best through hands-on activities and physical interaction";
    }
}

choice_enum! {
    /// How much time the learner can set aside each week.
    TimeCommitment, "time commitment" {
        Minimal => "minimal", "1-2 hours per week";
        Moderate => "moderate", "3-5 hours per week";
        Substantial => "substantial", "6-10 hours per week";
        Intensive => "intensive", "10+ hours per week";
    }
}

impl ExpertiseLevel {
    /// Multiplier applied to the base duration; deeper material takes longer.
    pub fn complexity_factor(&self) -> f64 {
        match self {
            ExpertiseLevel::Beginner => 1.0,
            ExpertiseLevel::Intermediate => 1.2,
            ExpertiseLevel::Advanced => 1.5,
            ExpertiseLevel::Expert => 2.0,
        }
    }
}

impl TimeCommitment {
    pub fn hours_per_week(&self) -> u32 {
        match self {
            TimeCommitment::Minimal => 2,
            TimeCommitment::Moderate => 5,
            TimeCommitment::Substantial => 8,
            TimeCommitment::Intensive => 15,
        }
    }

    /// Multiplier applied to the base duration; fewer hours a week stretch the plan.
    pub fn intensity_factor(&self) -> f64 {
        match self {
            TimeCommitment::Minimal => 2.0,
            TimeCommitment::Moderate => 1.5,
            TimeCommitment::Substantial => 1.0,
            TimeCommitment::Intensive => 0.75,
        }
    }
}

/// Planned length of a path in whole weeks, truncated toward zero.
pub fn duration_weeks(commitment: TimeCommitment, level: ExpertiseLevel) -> u32 {
    (BASE_DURATION_WEEKS * commitment.intensity_factor() * level.complexity_factor()) as u32
}

/// How well a resource type suits a learning style, higher is better.
/// Types outside the table score 1.
pub fn style_score(resource_type: &str, style: LearningStyle) -> u32 {
    use LearningStyle::*;
    let (visual, auditory, reading, kinesthetic) = match resource_type.to_lowercase().as_str() {
        "video" => (5, 4, 2, 3),
        "article" => (3, 2, 5, 1),
        "book" => (3, 2, 5, 1),
        "interactive" => (4, 3, 3, 5),
        "course" => (4, 4, 4, 3),
        "documentation" => (3, 1, 5, 1),
        "podcast" => (1, 5, 2, 1),
        "project" => (3, 2, 3, 5),
        _ => return 1,
    };
    match style {
        Visual => visual,
        Auditory => auditory,
        Reading => reading,
        Kinesthetic => kinesthetic,
    }
}

/// Orders resources so the best fit for `style` comes first. The sort is
/// stable, so equally scored resources keep the order the model gave them.
pub fn order_resources_for_style(resources: &mut [ResourceItem], style: LearningStyle) {
    resources.sort_by_key(|r| std::cmp::Reverse(style_score(&r.kind, style)));
}
