//! crates/learning_path_core/src/planner.rs
//!
//! End-to-end learning path generation: prompt construction, structured
//! generation, job market enrichment, scheduling and final bookkeeping.

use std::sync::{Arc, LazyLock};

use regex::Regex;
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::{JobMarketData, LearningPath, Milestone, ResearchSummary};
use crate::generation::{GenerationError, StructuredGenerator};
use crate::ports::JobMarketService;
use crate::preferences::{
    duration_weeks, order_resources_for_style, ExpertiseLevel, LearningStyle, TimeCommitment,
    UnknownChoice,
};
use crate::schedule;

const MAX_INPUT_CHARS: usize = 1000;

static MARKUP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("markup pattern is valid"));

/// Removes markup from user text, trims it and caps its length.
pub fn sanitize_input(text: &str) -> String {
    MARKUP
        .replace_all(text, "")
        .trim()
        .chars()
        .take(MAX_INPUT_CHARS)
        .collect()
}

//=========================================================================================
// Requests and Errors
//=========================================================================================

#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    #[error(transparent)]
    InvalidChoice(#[from] UnknownChoice),
    #[error("A topic is required")]
    EmptyTopic,
    #[error(transparent)]
    Generation(#[from] GenerationError),
}

/// What the learner asked for.
#[derive(Debug, Clone)]
pub struct PathRequest {
    pub topic: String,
    pub expertise_level: ExpertiseLevel,
    pub learning_style: LearningStyle,
    pub time_commitment: TimeCommitment,
    pub goals: Vec<String>,
    pub additional_info: Option<String>,
    /// Extra reference material appended to the prompt.
    pub context: Vec<String>,
}

impl PathRequest {
    /// Builds a request from raw form values, rejecting unknown choices.
    pub fn parse(
        topic: &str,
        expertise_level: &str,
        learning_style: &str,
        time_commitment: &str,
    ) -> Result<Self, PlanError> {
        let topic = sanitize_input(topic);
        if topic.is_empty() {
            return Err(PlanError::EmptyTopic);
        }
        Ok(Self {
            topic,
            expertise_level: expertise_level.parse()?,
            learning_style: learning_style.parse()?,
            time_commitment: time_commitment.parse()?,
            goals: Vec::new(),
            additional_info: None,
            context: Vec::new(),
        })
    }

    pub fn with_goals(mut self, goals: Vec<String>) -> Self {
        self.goals = goals
            .iter()
            .map(|g| sanitize_input(g))
            .filter(|g| !g.is_empty())
            .collect();
        self
    }

    pub fn with_additional_info(mut self, info: Option<String>) -> Self {
        self.additional_info = info
            .map(|i| sanitize_input(&i))
            .filter(|i| !i.is_empty());
        self
    }

    pub fn with_context(mut self, context: Vec<String>) -> Self {
        self.context = context;
        self
    }

    /// The learner's goals, or generic ones when none were given.
    pub fn effective_goals(&self) -> Vec<String> {
        if self.goals.is_empty() {
            vec![
                format!("Master {}", self.topic),
                format!("Build practical skills in {}", self.topic),
            ]
        } else {
            self.goals.clone()
        }
    }

    pub fn duration_weeks(&self) -> u32 {
        duration_weeks(self.time_commitment, self.expertise_level)
    }

    pub fn prompt(&self) -> String {
        let mut prompt = format!(
            "Generate a detailed personalized learning path for the following:\n\n\
             Topic: {topic}\n\
             Expertise Level: {level} - {level_desc}\n\
             Learning Style: {style} - {style_desc}\n\
             Time Commitment: {time} - {time_desc}\n\
             Learning Goals: {goals}\n\
             Additional Information: {info}\n\n\
             The learning path should include:\n\
             1. A comprehensive description of the path\n\
             2. 3-7 learning milestones that represent major stages of progress\n\
             3. For each milestone, provide specific resources tailored to the {style} learning style\n\
             4. Each milestone should include estimated hours and skills gained\n\
             5. List any prerequisites for starting this learning path\n\n\
             Response should match the LearningPath schema.",
            topic = self.topic,
            level = self.expertise_level,
            level_desc = self.expertise_level.description(),
            style = self.learning_style,
            style_desc = self.learning_style.description(),
            time = self.time_commitment,
            time_desc = self.time_commitment.description(),
            goals = self.effective_goals().join(", "),
            info = self.additional_info.as_deref().unwrap_or("None provided"),
        );
        if !self.context.is_empty() {
            prompt.push_str("\n\nAdditional Context:\n");
            prompt.push_str(&self.context.join("\n"));
        }
        prompt
    }
}

//=========================================================================================
// The Planner
//=========================================================================================

pub struct LearningPathPlanner {
    generator: StructuredGenerator,
    job_market: Arc<dyn JobMarketService>,
    region: String,
}

impl LearningPathPlanner {
    pub fn new(
        generator: StructuredGenerator,
        job_market: Arc<dyn JobMarketService>,
        region: String,
    ) -> Self {
        Self {
            generator,
            job_market,
            region,
        }
    }

    /// Generates, enriches and schedules a learning path for `request`.
    pub async fn generate_path(&self, request: &PathRequest) -> Result<LearningPath, PlanError> {
        info!(topic = %request.topic, level = %request.expertise_level, "Generating learning path");

        let mut path: LearningPath = self.generator.generate(&request.prompt()).await?;

        for milestone in path.milestones.iter_mut() {
            self.enrich_milestone(milestone).await;
        }

        let weeks = request.duration_weeks();
        let weights: Vec<(String, f64)> = path
            .milestones
            .iter()
            .map(|m| (m.title.clone(), f64::from(m.estimated_hours)))
            .collect();
        path.schedule = Some(schedule::allocate(
            weeks,
            request.time_commitment.hours_per_week(),
            &weights,
        ));

        for milestone in path.milestones.iter_mut() {
            order_resources_for_style(&mut milestone.resources, request.learning_style);
        }

        path.total_hours = path.milestone_hours();
        path.duration_weeks = weeks;
        path.id = Uuid::new_v4();

        info!(path_id = %path.id, milestones = path.milestones.len(), "Learning path ready");
        Ok(path)
    }

    /// Answers an open question about a topic as a structured summary.
    pub async fn research(
        &self,
        question: &str,
        context: &[String],
    ) -> Result<ResearchSummary, GenerationError> {
        let mut prompt = format!("Question: {}", sanitize_input(question));
        if !context.is_empty() {
            prompt.push_str("\n\nRelevant information:\n");
            prompt.push_str(&context.join("\n\n"));
        }
        self.generator.generate(&prompt).await
    }

    /// Attaches market data for the milestone's first skill. Failures never
    /// abort generation; they leave a default snapshot tagged with the error.
    async fn enrich_milestone(&self, milestone: &mut Milestone) {
        let Some(skill) = milestone.skills_gained.first() else {
            return;
        };

        let mut data = match self.job_market.market_snapshot(skill).await {
            Ok(data) => data,
            Err(e) => {
                warn!(skill = %skill, error = %e, "Job market lookup failed, using fallback snapshot");
                JobMarketData::fallback_snapshot(e.to_string())
            }
        };
        data.region = Some(self.region.clone());
        data.related_roles = match self.job_market.related_roles(&milestone.skills_gained).await {
            Ok(roles) => roles,
            Err(e) => {
                warn!(error = %e, "Related role lookup failed");
                Vec::new()
            }
        };
        milestone.job_market_data = data;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitizes_markup_and_length() {
        assert_eq!(sanitize_input("  <b>Rust</b> <script>x</script> "), "Rust x");
        assert_eq!(sanitize_input(&"a".repeat(1500)).len(), MAX_INPUT_CHARS);
    }

    #[test]
    fn parse_rejects_unknown_choices() {
        let err = PathRequest::parse("Rust", "beginner", "smell", "moderate").unwrap_err();
        assert!(matches!(err, PlanError::InvalidChoice(ref c) if c.field == "learning style"));
        assert!(matches!(
            PathRequest::parse("<p></p>", "beginner", "visual", "moderate"),
            Err(PlanError::EmptyTopic)
        ));
    }

    #[test]
    fn default_goals_mention_topic() {
        let request = PathRequest::parse("Rust", "beginner", "visual", "moderate").unwrap();
        assert_eq!(
            request.effective_goals(),
            vec!["Master Rust".to_string(), "Build practical skills in Rust".to_string()]
        );
        let request = request.with_goals(vec!["Ship a CLI".into(), "  ".into()]);
        assert_eq!(request.effective_goals(), vec!["Ship a CLI".to_string()]);
    }

    #[test]
    fn prompt_carries_preferences_and_context() {
        let request = PathRequest::parse("Rust", "advanced", "kinesthetic", "intensive")
            .unwrap()
            .with_additional_info(Some("Embedded focus".into()))
            .with_context(vec!["Doc snippet".into()]);
        let prompt = request.prompt();
        assert!(prompt.contains("Expertise Level: advanced - Solid understanding of core principles"));
        assert!(prompt.contains("tailored to the kinesthetic learning style"));
        assert!(prompt.contains("Additional Information: Embedded focus"));
        assert!(prompt.ends_with("Additional Context:\nDoc snippet"));
        assert_eq!(request.duration_weeks(), 9);
    }
}
