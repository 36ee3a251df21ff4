mod common;

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use common::{ScriptedProvider, StubJobMarket, VALID_PATH};
use learning_path_core::schedule::{allocate_from, MIN_TOPIC_HOURS};
use learning_path_core::{
    GenerationSettings, LearningPathPlanner, PathRequest, StructuredGenerator,
};
use pretty_assertions::assert_eq;

fn planner(provider: Arc<ScriptedProvider>, market_fails: bool) -> LearningPathPlanner {
    LearningPathPlanner::new(
        StructuredGenerator::new(provider, GenerationSettings::default()),
        Arc::new(StubJobMarket { fail: market_fails }),
        "Europe".to_string(),
    )
}

#[tokio::test]
async fn generates_an_enriched_scheduled_path() {
    let provider = Arc::new(ScriptedProvider::new(&[VALID_PATH]));
    let request = PathRequest::parse("Rust", "beginner", "reading", "moderate").unwrap();

    let path = planner(provider.clone(), false).generate_path(&request).await.unwrap();

    assert_eq!(path.total_hours, 60);
    assert_eq!(path.duration_weeks, request.duration_weeks());

    let foundations = &path.milestones[0];
    assert_eq!(foundations.job_market_data.open_positions, "Ownership openings");
    assert_eq!(foundations.job_market_data.region.as_deref(), Some("Europe"));
    assert_eq!(foundations.job_market_data.related_roles, vec!["Ownership Engineer".to_string()]);
    // Reading learners see the book ahead of the video.
    assert_eq!(foundations.resources[0].kind, "book");

    let schedule = path.schedule.expect("schedule is attached");
    let titles: Vec<&str> = schedule.topics.iter().map(|t| t.topic.as_str()).collect();
    assert_eq!(titles, vec!["Foundations", "Async Services"]);
    assert_eq!(schedule.hours_per_week, 5);
    assert_eq!(schedule.total_hours, request.duration_weeks() * 5);
    assert!(provider.prompts.lock().unwrap()[0].contains("Topic: Rust"));
}

#[tokio::test]
async fn market_outage_falls_back_to_packaged_snapshot() {
    let provider = Arc::new(ScriptedProvider::new(&[VALID_PATH]));
    let request = PathRequest::parse("Rust", "intermediate", "visual", "minimal").unwrap();

    let path = planner(provider, true).generate_path(&request).await.unwrap();

    for milestone in &path.milestones {
        let data = &milestone.job_market_data;
        assert_eq!(data.open_positions, "5,000+");
        assert!(data.error.as_deref().unwrap_or_default().contains("market offline"));
        assert!(data.related_roles.is_empty());
    }
}

#[tokio::test]
async fn research_answers_degrade_to_an_explanatory_summary() {
    let provider = Arc::new(ScriptedProvider::new(&["no json here"]));
    let summary = planner(provider, false)
        .research("What is borrowing?", &["Chapter 4".to_string()])
        .await
        .unwrap();
    assert!(summary.error_details.is_some());
    assert_eq!(summary.key_concepts, vec!["JSON parsing error".to_string()]);
}

#[test]
fn schedule_hours_follow_weights_with_a_floor() {
    let start = Utc.with_ymd_and_hms(2024, 3, 4, 9, 0, 0).unwrap();
    let weights = vec![
        ("Heavy".to_string(), 97.0),
        ("Light".to_string(), 2.0),
        ("Tiny".to_string(), 0.1),
    ];
    let schedule = allocate_from(2, 5, &weights, start);

    assert_eq!(schedule.total_hours, 10);
    let hours: Vec<u32> = schedule.topics.iter().map(|t| t.hours).collect();
    assert_eq!(hours, vec![10, MIN_TOPIC_HOURS, MIN_TOPIC_HOURS]);
    // The floor is honoured at the cost of the budget.
    assert_eq!(schedule.allocated_hours(), 12);

    for pair in schedule.topics.windows(2) {
        assert_eq!(pair[0].end_date, pair[1].start_date);
    }
    assert_eq!(schedule.topics[0].start_date, start.date_naive());
}
