//! crates/learning_path_core/src/schema.rs
//!
//! Typed validation of model output. A candidate arrives as a parsed
//! `serde_json::Value` and leaves either as a domain struct or as a
//! `SchemaViolation` naming the offending field.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::{Map, Value};
use tracing::debug;
use uuid::Uuid;

use crate::domain::{
    JobMarketData, LearningPath, Milestone, ResearchSummary, ResourceItem, Schedule,
};

//=========================================================================================
// Errors and Schema Descriptors
//=========================================================================================

/// A structural rule broken by a candidate object.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("schema violation at `{path}`: {message}")]
pub struct SchemaViolation {
    /// Dotted path to the field, e.g. `milestones[1].resources[0].url`.
    pub path: String,
    pub message: String,
}

impl SchemaViolation {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// The shapes the repairer knows how to default and fall back for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaKind {
    LearningPath,
    ResearchSummary,
}

/// A typed target for structured generation.
pub trait StructuredSchema: Sized {
    const KIND: SchemaKind;

    /// Instructions handed to the model alongside the prompt.
    fn instructions() -> &'static str;

    /// Checks a parsed candidate and converts it into the typed object.
    fn validate(value: &Value) -> Result<Self, SchemaViolation>;
}

pub const LEARNING_PATH_INSTRUCTIONS: &str = r#"Return a single JSON object matching the LearningPath schema.

IMPORTANT: Your response MUST include ALL of these required fields:
- title: String title of the learning path
- description: Detailed description of the learning path
- topic: Main topic of study
- expertise_level: Starting expertise level
- learning_style: Preferred learning style
- time_commitment: Weekly time commitment
- duration_weeks: Total duration in weeks (integer)
- goals: List of learning goals and objectives (non-empty list of strings)
- milestones: List of learning milestones (non-empty)
- prerequisites: List of prerequisites for this path
- total_hours: Total estimated hours (integer)

For each milestone, you MUST include:
- title: Short title for the milestone
- description: Detailed description
- estimated_hours: Estimated hours to complete (integer)
- resources: List of recommended learning resources, each with "type", "url" and "description"
- skills_gained: List of skills gained after completion

Please provide a valid JSON response that strictly follows this schema.
Do not include any explanatory text outside the JSON structure."#;

pub const RESEARCH_SUMMARY_INSTRUCTIONS: &str = r#"Return a single JSON object with these fields:
- summary: A concise answer to the question
- key_concepts: List of the key concepts involved
- learning_path: Ordered list of steps for learning the topic
- resources: List of recommended resources
- code_examples: List of illustrative code examples (may be empty)
- advanced_topics: List of topics to explore afterwards

Do not include any explanatory text outside the JSON structure."#;

//=========================================================================================
// Field Access Helpers
//=========================================================================================

/// A JSON object together with the path it was found at.
struct Fields<'a> {
    obj: &'a Map<String, Value>,
    at: String,
}

impl<'a> Fields<'a> {
    fn of(value: &'a Value, at: impl Into<String>) -> Result<Self, SchemaViolation> {
        let at = at.into();
        match value.as_object() {
            Some(obj) => Ok(Self { obj, at }),
            None => Err(SchemaViolation::new(
                if at.is_empty() { "$".to_string() } else { at },
                "expected an object",
            )),
        }
    }

    fn path(&self, key: &str) -> String {
        if self.at.is_empty() {
            key.to_string()
        } else {
            format!("{}.{}", self.at, key)
        }
    }

    /// A present, non-null field.
    fn get(&self, key: &str) -> Option<&'a Value> {
        self.obj.get(key).filter(|v| !v.is_null())
    }

    fn required(&self, key: &str) -> Result<&'a Value, SchemaViolation> {
        self.get(key)
            .ok_or_else(|| SchemaViolation::new(self.path(key), "required field is missing"))
    }

    fn string(&self, key: &str) -> Result<String, SchemaViolation> {
        match self.required(key)? {
            Value::String(s) => Ok(s.clone()),
            _ => Err(SchemaViolation::new(self.path(key), "expected a string")),
        }
    }

    fn optional_string(&self, key: &str) -> Result<Option<String>, SchemaViolation> {
        match self.get(key) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(_) => Err(SchemaViolation::new(self.path(key), "expected a string")),
        }
    }

    fn integer(&self, key: &str) -> Result<u32, SchemaViolation> {
        as_hours(self.required(key)?)
            .ok_or_else(|| SchemaViolation::new(self.path(key), "expected a non-negative integer"))
    }

    fn optional_integer(&self, key: &str) -> Result<Option<u32>, SchemaViolation> {
        self.get(key)
            .map(|v| {
                as_hours(v).ok_or_else(|| {
                    SchemaViolation::new(self.path(key), "expected a non-negative integer")
                })
            })
            .transpose()
    }

    fn list(&self, key: &str) -> Result<&'a Vec<Value>, SchemaViolation> {
        self.required(key)?
            .as_array()
            .ok_or_else(|| SchemaViolation::new(self.path(key), "expected a list"))
    }

    fn string_list(&self, key: &str) -> Result<Vec<String>, SchemaViolation> {
        self.list(key)?
            .iter()
            .enumerate()
            .map(|(i, item)| match item {
                Value::String(s) => Ok(s.clone()),
                _ => Err(SchemaViolation::new(
                    format!("{}[{}]", self.path(key), i),
                    "expected a string",
                )),
            })
            .collect()
    }
}

/// Accepts integers, integral floats and numeric strings, the way models
/// tend to emit hour counts.
fn as_hours(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| {
                n.as_f64()
                    .filter(|f| *f >= 0.0 && f.fract() == 0.0)
                    .map(|f| f as u64)
            })
            .and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse::<u32>().ok(),
        _ => None,
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|naive| naive.and_utc())
        })
}

//=========================================================================================
// Learning Path Validation
//=========================================================================================

fn validate_resource(value: &Value, at: String) -> Result<ResourceItem, SchemaViolation> {
    let fields = Fields::of(value, at)?;
    Ok(ResourceItem {
        kind: fields.string("type")?,
        url: fields.string("url")?,
        description: fields.string("description")?,
    })
}

fn validate_milestone(value: &Value, at: String) -> Result<Milestone, SchemaViolation> {
    let fields = Fields::of(value, at)?;

    let mut resources = fields
        .list("resources")?
        .iter()
        .enumerate()
        .map(|(i, r)| validate_resource(r, format!("{}[{}]", fields.path("resources"), i)))
        .collect::<Result<Vec<_>, _>>()?;
    // An empty resource list is repaired in place rather than rejected.
    if resources.is_empty() {
        resources.push(ResourceItem::placeholder());
    }

    // Market data is replaced during enrichment, so a malformed snapshot is
    // dropped rather than rejected.
    let job_market_data = match fields.get("job_market_data") {
        None => JobMarketData::default(),
        Some(raw) => serde_json::from_value(raw.clone()).unwrap_or_else(|e| {
            debug!(field = %fields.path("job_market_data"), error = %e, "Ignoring malformed job market data");
            JobMarketData {
                error: Some(e.to_string()),
                ..JobMarketData::default()
            }
        }),
    };

    Ok(Milestone {
        title: fields.string("title")?,
        description: fields.string("description")?,
        estimated_hours: fields.integer("estimated_hours")?,
        resources,
        skills_gained: fields.string_list("skills_gained")?,
        job_market_data,
    })
}

impl StructuredSchema for LearningPath {
    const KIND: SchemaKind = SchemaKind::LearningPath;

    fn instructions() -> &'static str {
        LEARNING_PATH_INSTRUCTIONS
    }

    fn validate(value: &Value) -> Result<Self, SchemaViolation> {
        let fields = Fields::of(value, "")?;

        let goals = fields.string_list("goals")?;
        if goals.is_empty() {
            return Err(SchemaViolation::new("goals", "must contain at least one goal"));
        }
        if let Some(i) = goals.iter().position(|g| g.trim().is_empty()) {
            return Err(SchemaViolation::new(
                format!("goals[{}]", i),
                "goals must be non-empty strings",
            ));
        }

        let raw_milestones = fields.list("milestones")?;
        if raw_milestones.is_empty() {
            return Err(SchemaViolation::new(
                "milestones",
                "must contain at least one milestone",
            ));
        }
        let milestones = raw_milestones
            .iter()
            .enumerate()
            .map(|(i, m)| validate_milestone(m, format!("milestones[{}]", i)))
            .collect::<Result<Vec<_>, _>>()?;

        // Type-checked when present, but always recomputed from the milestones.
        fields.optional_integer("total_hours")?;
        let total_hours = milestones
            .iter()
            .fold(0u32, |acc, m| acc.saturating_add(m.estimated_hours));

        // The schedule is recomputed by the allocator; one that does not parse is dropped.
        let schedule = fields.get("schedule").and_then(|raw| {
            serde_json::from_value::<Schedule>(raw.clone())
                .map_err(|e| debug!(error = %e, "Ignoring malformed schedule"))
                .ok()
        });

        let id = fields
            .optional_string("id")?
            .and_then(|raw| Uuid::parse_str(&raw).ok())
            .unwrap_or_else(Uuid::new_v4);
        let created_at = fields
            .optional_string("created_at")?
            .and_then(|raw| parse_timestamp(&raw))
            .unwrap_or_else(Utc::now);

        Ok(LearningPath {
            id,
            title: fields.string("title")?,
            description: fields.string("description")?,
            topic: fields.string("topic")?,
            expertise_level: fields.string("expertise_level")?,
            learning_style: fields.string("learning_style")?,
            time_commitment: fields.string("time_commitment")?,
            duration_weeks: fields.optional_integer("duration_weeks")?.unwrap_or(0),
            goals,
            milestones,
            prerequisites: fields.string_list("prerequisites")?,
            total_hours,
            schedule,
            created_at,
        })
    }
}

//=========================================================================================
// Research Summary Validation
//=========================================================================================

impl StructuredSchema for ResearchSummary {
    const KIND: SchemaKind = SchemaKind::ResearchSummary;

    fn instructions() -> &'static str {
        RESEARCH_SUMMARY_INSTRUCTIONS
    }

    fn validate(value: &Value) -> Result<Self, SchemaViolation> {
        let fields = Fields::of(value, "")?;
        Ok(ResearchSummary {
            summary: fields.string("summary")?,
            key_concepts: fields.string_list("key_concepts")?,
            learning_path: fields.string_list("learning_path")?,
            resources: fields.list("resources")?.clone(),
            code_examples: fields.list("code_examples")?.clone(),
            advanced_topics: fields.string_list("advanced_topics")?,
            error_details: fields.optional_string("error_details")?,
        })
    }
}
