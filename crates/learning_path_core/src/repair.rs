//! crates/learning_path_core/src/repair.rs
//!
//! Turns raw model text into a JSON object of the requested shape.
//!
//! Extraction tries, in order: a fenced code block, the whole trimmed text,
//! the text with a known leading prefix removed, and finally every
//! brace-delimited span. When nothing parses, a complete fallback object is
//! returned instead. Parsed learning paths get their missing required fields
//! filled with fixed defaults. Nothing in this module fails.

use std::sync::LazyLock;

use chrono::Utc;
use regex::Regex;
use serde_json::{json, Map, Value};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::domain::PLACEHOLDER_RESOURCE_URL;
use crate::schema::SchemaKind;

/// Leading noise models sometimes put in front of a JSON body.
const KNOWN_PREFIXES: [&str; 6] = ["+", "-", "*", "#", "Response:", "JSON:"];

/// Outermost brace span, tried before the individual spans.
static OUTER_BRACES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\{.*\}").expect("outer brace pattern is valid"));

static BRACE_SPANS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\{.*?\}").expect("brace span pattern is valid"));

//=========================================================================================
// Extraction
//=========================================================================================

/// Raised when no strategy yields JSON. Absorbed by [`repair`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("model output could not be parsed as JSON")]
pub struct ParseFailure;

/// Which extraction strategy produced the value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extraction {
    Fenced,
    Direct,
    PrefixStripped,
    BraceScan,
}

fn fenced_body(raw: &str) -> Option<&str> {
    let start = match raw.find("```json") {
        Some(pos) => pos + "```json".len(),
        None => raw.find("```")? + "```".len(),
    };
    let rest = &raw[start..];
    let end = rest.find("```").unwrap_or(rest.len());
    Some(rest[..end].trim())
}

fn strip_known_prefixes(raw: &str) -> &str {
    let mut cleaned = raw.trim();
    for prefix in KNOWN_PREFIXES {
        if let Some(rest) = cleaned.strip_prefix(prefix) {
            cleaned = rest.trim();
        }
    }
    cleaned
}

/// Pulls the first JSON value out of `raw` using the strategies in order.
pub fn extract_json(raw: &str) -> Result<(Value, Extraction), ParseFailure> {
    if let Some(body) = fenced_body(raw) {
        if let Ok(value) = serde_json::from_str(body) {
            return Ok((value, Extraction::Fenced));
        }
    }

    let trimmed = raw.trim();
    if let Ok(value) = serde_json::from_str(trimmed) {
        return Ok((value, Extraction::Direct));
    }

    let stripped = strip_known_prefixes(trimmed);
    if stripped.len() != trimmed.len() {
        if let Ok(value) = serde_json::from_str(stripped) {
            return Ok((value, Extraction::PrefixStripped));
        }
    }

    OUTER_BRACES
        .find(raw)
        .into_iter()
        .chain(BRACE_SPANS.find_iter(raw))
        .find_map(|m| serde_json::from_str::<Value>(m.as_str()).ok())
        .map(|value| (value, Extraction::BraceScan))
        .ok_or(ParseFailure)
}

//=========================================================================================
// Repair Entry Point
//=========================================================================================

/// Converts raw model text into an object carrying every required field of `kind`.
///
/// Unparseable text and non-object JSON both degrade to [`fallback`].
pub fn repair(raw: &str, kind: SchemaKind) -> Value {
    let mut object = match extract_json(raw) {
        Ok((Value::Object(object), strategy)) => {
            debug!(?strategy, ?kind, "Extracted JSON object from model output");
            object
        }
        Ok((other, strategy)) => {
            warn!(?strategy, ?kind, kind_found = json_type(&other), "Model output is not a JSON object, using fallback");
            return fallback(kind);
        }
        Err(ParseFailure) => {
            warn!(?kind, preview = %preview(raw), "Model output could not be parsed, using fallback");
            return fallback(kind);
        }
    };

    match kind {
        SchemaKind::LearningPath => fill_learning_path_defaults(&mut object),
        SchemaKind::ResearchSummary => fill_research_summary_defaults(&mut object),
    }
    Value::Object(object)
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn preview(raw: &str) -> String {
    raw.chars().take(100).collect()
}

//=========================================================================================
// Default Filling
//=========================================================================================

/// Absent and explicit `null` both count as missing.
fn is_missing(object: &Map<String, Value>, key: &str) -> bool {
    object.get(key).map_or(true, Value::is_null)
}

fn str_field<'a>(object: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    object.get(key).and_then(Value::as_str)
}

fn placeholder_resource(kind: &str, description: &str) -> Value {
    json!({
        "type": kind,
        "url": PLACEHOLDER_RESOURCE_URL,
        "description": description,
    })
}

/// Fills missing top-level and per-milestone fields of a learning path.
///
/// Fields are visited in a fixed order, so later defaults may use earlier
/// ones (a missing `goals` uses the topic, which may itself be a default).
pub fn fill_learning_path_defaults(object: &mut Map<String, Value>) {
    const REQUIRED: [&str; 11] = [
        "title",
        "description",
        "topic",
        "expertise_level",
        "learning_style",
        "time_commitment",
        "duration_weeks",
        "goals",
        "milestones",
        "prerequisites",
        "total_hours",
    ];

    let missing: Vec<&str> = REQUIRED
        .into_iter()
        .filter(|key| is_missing(object, key))
        .collect();
    if !missing.is_empty() {
        debug!(?missing, "Filling missing learning path fields with defaults");
    }

    for key in missing {
        let topic = str_field(object, "topic").map(str::to_string);
        let subject = topic.clone().unwrap_or_else(|| "the subject".to_string());
        let default = match key {
            "title" => match &topic {
                Some(topic) => json!(format!("{} Learning Path", topic)),
                None => json!("Learning Path"),
            },
            "description" => json!(format!(
                "A comprehensive learning path for {}.",
                topic.as_deref().unwrap_or("the requested topic")
            )),
            "topic" => match str_field(object, "title").map(|t| t.replace(" Learning Path", "")) {
                Some(topic) if !topic.trim().is_empty() && topic != "Learning Path" => json!(topic),
                _ => json!("General Learning"),
            },
            "expertise_level" => json!("beginner"),
            "learning_style" => json!("visual"),
            "time_commitment" => json!("moderate"),
            "duration_weeks" => json!(8),
            "goals" => json!([format!("Master {}", subject)]),
            "milestones" => json!([{
                "title": "Getting Started",
                "description": format!("Introduction to {}", subject),
                "estimated_hours": 10,
                "resources": [placeholder_resource("documentation", "Online Documentation")],
                "skills_gained": [format!("Basic {} knowledge", subject)],
            }]),
            "prerequisites" => json!(["None"]),
            _ => json!(40),
        };
        object.insert(key.to_string(), default);
    }

    let subject = str_field(object, "topic")
        .unwrap_or("the subject")
        .to_string();
    if let Some(Value::Array(milestones)) = object.get_mut("milestones") {
        for (i, milestone) in milestones.iter_mut().enumerate() {
            if let Value::Object(milestone) = milestone {
                fill_milestone_defaults(milestone, i, &subject);
            }
        }
    }
}

fn fill_milestone_defaults(milestone: &mut Map<String, Value>, index: usize, subject: &str) {
    if is_missing(milestone, "title") {
        milestone.insert("title".into(), json!(format!("Milestone {}", index + 1)));
    }
    if is_missing(milestone, "description") {
        milestone.insert(
            "description".into(),
            json!("A key learning milestone in this path."),
        );
    }
    if is_missing(milestone, "estimated_hours") {
        milestone.insert("estimated_hours".into(), json!(10));
    }
    if is_missing(milestone, "resources") {
        milestone.insert(
            "resources".into(),
            json!([placeholder_resource("article", "Online Resource")]),
        );
    }
    if is_missing(milestone, "skills_gained") {
        milestone.insert(
            "skills_gained".into(),
            json!([format!("Skills related to {}", subject)]),
        );
    }

    if let Some(Value::Array(resources)) = milestone.get_mut("resources") {
        for resource in resources.iter_mut() {
            if let Value::Object(resource) = resource {
                fill_resource_defaults(resource);
            }
        }
    }
}

/// Models often name a resource instead of describing it.
fn fill_resource_defaults(resource: &mut Map<String, Value>) {
    if is_missing(resource, "type") {
        resource.insert("type".into(), json!("article"));
    }
    if is_missing(resource, "url") {
        resource.insert("url".into(), json!(PLACEHOLDER_RESOURCE_URL));
    }
    if is_missing(resource, "description") {
        let description = str_field(resource, "name")
            .or_else(|| str_field(resource, "title"))
            .unwrap_or("Learning resource")
            .to_string();
        resource.insert("description".into(), json!(description));
    }
}

/// Fills missing fields of a free-form research summary.
pub fn fill_research_summary_defaults(object: &mut Map<String, Value>) {
    if is_missing(object, "summary") {
        object.insert("summary".into(), json!("No summary was provided."));
    }
    for key in [
        "key_concepts",
        "learning_path",
        "resources",
        "code_examples",
        "advanced_topics",
    ] {
        if is_missing(object, key) {
            object.insert(key.into(), json!([]));
        }
    }
}

//=========================================================================================
// Fallback Objects
//=========================================================================================

/// A complete, valid object of `kind` used when the model output is unusable.
pub fn fallback(kind: SchemaKind) -> Value {
    match kind {
        SchemaKind::LearningPath => fallback_learning_path(),
        SchemaKind::ResearchSummary => json!({
            "summary": "Failed to parse the AI's response. The content might not be in the expected JSON format.",
            "key_concepts": ["JSON parsing error"],
            "learning_path": ["Please try a different query or check the AI provider's output directly if possible."],
            "resources": [],
            "code_examples": [],
            "advanced_topics": [],
            "error_details": "The AI's response could not be successfully parsed as JSON after multiple attempts.",
        }),
    }
}

fn fallback_learning_path() -> Value {
    json!({
        "id": Uuid::new_v4().to_string(),
        "title": "General Learning Path",
        "description": "A default learning path created when specific generation failed.",
        "topic": "General Topic",
        "expertise_level": "beginner",
        "learning_style": "visual",
        "time_commitment": "moderate",
        "duration_weeks": 8,
        "goals": ["Build foundational knowledge", "Develop practical skills"],
        "milestones": [
            {
                "title": "Getting Started",
                "description": "Introduction to the fundamentals.",
                "estimated_hours": 10,
                "resources": [placeholder_resource("documentation", "Online Documentation")],
                "skills_gained": ["Basic knowledge"],
            },
            {
                "title": "Core Concepts",
                "description": "Understanding core principles and practices.",
                "estimated_hours": 15,
                "resources": [placeholder_resource("tutorial", "Online Tutorial")],
                "skills_gained": ["Fundamental concepts"],
            }
        ],
        "prerequisites": ["None"],
        "total_hours": 25,
        "created_at": Utc::now().to_rfc3339(),
    })
}
