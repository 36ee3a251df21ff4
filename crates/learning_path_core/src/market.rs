//! crates/learning_path_core/src/market.rs
//!
//! Prompts and response parsing for job market enrichment. The HTTP side
//! lives in the service's adapter; everything here is pure.

use serde_json::Value;

use crate::domain::JobMarketData;
use crate::ports::{PortError, PortResult};
use crate::repair::extract_json;

const SNAPSHOT_KEYS: [&str; 3] = ["open_positions", "average_salary", "trending_employers"];

pub fn snapshot_prompt(skill_or_role: &str) -> String {
    format!(
        "Provide current US job-market snapshot for the role '{}'. \
         Return ONLY valid JSON with keys: open_positions (string), \
         average_salary (string), trending_employers (array of 3 company names).",
        skill_or_role
    )
}

pub fn related_roles_prompt(skills: &[String]) -> String {
    format!(
        "Based on the following skills: {}, what are some relevant job titles or roles \
         that utilize these skills?\n\
         Please provide a list of job titles. Return the answer as a JSON array of strings.\n\
         For example: [\"Data Scientist\", \"Machine Learning Engineer\", \"Business Analyst\"]",
        skills.join(", ")
    )
}

/// Reads a snapshot out of model text; all three snapshot keys must be present.
pub fn parse_snapshot(raw: &str) -> PortResult<JobMarketData> {
    let (value, _) = extract_json(raw).map_err(|e| PortError::Unexpected(e.to_string()))?;
    let missing: Vec<&str> = SNAPSHOT_KEYS
        .into_iter()
        .filter(|key| value.get(key).is_none())
        .collect();
    if !missing.is_empty() {
        return Err(PortError::Unexpected(format!(
            "job market snapshot is missing keys: {}",
            missing.join(", ")
        )));
    }
    serde_json::from_value(value).map_err(|e| PortError::Unexpected(e.to_string()))
}

/// Reads a list of role titles out of model text.
///
/// A JSON array is taken as is; otherwise the text between the outermost
/// brackets is split on commas. Text with no list at all yields a single
/// explanatory entry.
pub fn parse_related_roles(raw: &str) -> Vec<String> {
    let trimmed = raw.trim();
    match serde_json::from_str::<Value>(trimmed) {
        Ok(Value::Array(items)) => items
            .into_iter()
            .map(|item| match item {
                Value::String(s) => s,
                other => other.to_string(),
            })
            .collect(),
        Ok(_) => Vec::new(),
        Err(_) => match (trimmed.find('['), trimmed.rfind(']')) {
            (Some(open), Some(close)) if open < close => trimmed[open + 1..close]
                .split(',')
                .map(|role| role.trim().trim_matches(|c| c == '"' || c == '\'').to_string())
                .filter(|role| !role.is_empty())
                .collect(),
            _ => vec!["Could not determine roles".to_string()],
        },
    }
}
