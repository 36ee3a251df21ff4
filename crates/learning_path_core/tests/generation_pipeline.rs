mod common;

use std::sync::Arc;

use common::{ScriptedProvider, EMPTY_GOALS_PATH, VALID_PATH};
use learning_path_core::generation::CORRECTIVE_INSTRUCTION;
use learning_path_core::repair::{fallback, repair};
use learning_path_core::{
    GenerationError, GenerationSettings, LearningPath, ResearchSummary, SchemaKind,
    StructuredGenerator, StructuredSchema,
};
use pretty_assertions::assert_eq;
use serde_json::Value;

fn generator(provider: Arc<ScriptedProvider>) -> StructuredGenerator {
    StructuredGenerator::new(provider, GenerationSettings::default())
}

#[test]
fn validation_is_idempotent() {
    let once = LearningPath::validate(&repair(VALID_PATH, SchemaKind::LearningPath)).unwrap();
    let again = LearningPath::validate(&serde_json::to_value(&once).unwrap()).unwrap();
    assert_eq!(again, once);
}

#[test]
fn every_milestone_keeps_at_least_one_resource() {
    let raw = r#"{"topic": "Go", "milestones": [
        {"title": "A", "resources": []},
        {"title": "B"},
        {"title": "C", "resources": [{"name": "Go by Example"}]}
    ]}"#;
    let path = LearningPath::validate(&repair(raw, SchemaKind::LearningPath)).unwrap();
    assert_eq!(path.milestones.len(), 3);
    assert!(path.milestones.iter().all(|m| !m.resources.is_empty()));
}

#[test]
fn valid_paths_have_goals_and_milestones() {
    for raw in [VALID_PATH, "{}", "garbage", "```json\n{\"topic\": \"SQL\"}\n```"] {
        let path = LearningPath::validate(&repair(raw, SchemaKind::LearningPath)).unwrap();
        assert!(!path.goals.is_empty());
        assert!(!path.milestones.is_empty());
    }
}

#[test]
fn repairing_valid_json_changes_nothing() {
    let original: Value = serde_json::from_str(VALID_PATH).unwrap();
    assert_eq!(repair(VALID_PATH, SchemaKind::LearningPath), original);

    let fenced = format!("Here is the plan:\n```json\n{}\n```", VALID_PATH);
    assert_eq!(repair(&fenced, SchemaKind::LearningPath), original);
}

#[test]
fn garbage_yields_a_valid_fallback() {
    for garbage in ["", "I cannot help with that.", "{{{ not json", "[1, 2", "null"] {
        let repaired = repair(garbage, SchemaKind::LearningPath);
        let fallback_shape = fallback(SchemaKind::LearningPath);
        assert_eq!(repaired["title"], fallback_shape["title"]);

        let path = LearningPath::validate(&repaired).unwrap();
        // Nothing had to be substituted during validation.
        assert_eq!(serde_json::to_value(&path.milestones[0].resources).unwrap(), repaired["milestones"][0]["resources"]);
        assert_eq!(Some(u64::from(path.total_hours)), repaired["total_hours"].as_u64());
        assert_eq!(path.goals.len(), 2);
    }
}

#[test]
fn research_fallback_is_valid() {
    let summary = ResearchSummary::validate(&repair("???", SchemaKind::ResearchSummary)).unwrap();
    assert!(summary.error_details.is_some());
}

#[tokio::test]
async fn persistent_schema_violations_exhaust_attempts() {
    let provider = Arc::new(ScriptedProvider::new(&[EMPTY_GOALS_PATH]));
    let result = generator(provider.clone())
        .generate_structured::<LearningPath>("Plan Rust", 3)
        .await;

    match result {
        Err(GenerationError::Exhausted { attempts, last }) => {
            assert_eq!(attempts, 3);
            assert_eq!(last.path, "goals");
        }
        other => panic!("expected exhaustion, got {:?}", other.map(|p| p.title)),
    }
    assert_eq!(provider.calls(), 3);
}

#[tokio::test]
async fn first_valid_reply_wins_without_augmenting_the_prompt() {
    let provider = Arc::new(ScriptedProvider::new(&[VALID_PATH]));
    let path = generator(provider.clone())
        .generate_structured::<LearningPath>("Plan Rust", 3)
        .await
        .unwrap();

    assert_eq!(path.title, "Rust Learning Path");
    assert_eq!(path.total_hours, 60);
    assert_eq!(provider.calls(), 1);
    assert_eq!(provider.prompts.lock().unwrap()[0], "Plan Rust");
}

#[tokio::test]
async fn recovers_on_a_later_attempt() {
    let provider = Arc::new(ScriptedProvider::new(&[EMPTY_GOALS_PATH, VALID_PATH]));
    let path = generator(provider.clone())
        .generate::<LearningPath>("Plan Rust")
        .await
        .unwrap();

    assert_eq!(path.goals, vec!["Write idiomatic Rust".to_string()]);
    let prompts = provider.prompts.lock().unwrap();
    assert_eq!(prompts.len(), 2);
    assert!(prompts[1].ends_with(CORRECTIVE_INSTRUCTION));
}

#[tokio::test]
async fn unparseable_output_degrades_instead_of_retrying() {
    let provider = Arc::new(ScriptedProvider::new(&["The service is overloaded, sorry."]));
    let path = generator(provider.clone())
        .generate::<LearningPath>("Plan Rust")
        .await
        .unwrap();

    assert_eq!(path.title, "General Learning Path");
    assert_eq!(provider.calls(), 1);
}
