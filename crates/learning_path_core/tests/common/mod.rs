#![allow(dead_code)]

use std::sync::Mutex;

use async_trait::async_trait;
use learning_path_core::{JobMarketData, JobMarketService, PortError, PortResult, TextCompletionProvider};

/// Replies with the scripted texts in order, repeating the last one.
pub struct ScriptedProvider {
    replies: Vec<String>,
    pub prompts: Mutex<Vec<String>>,
}

impl ScriptedProvider {
    pub fn new(replies: &[&str]) -> Self {
        Self {
            replies: replies.iter().map(|r| r.to_string()).collect(),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl TextCompletionProvider for ScriptedProvider {
    async fn complete(&self, prompt: &str, _schema: &str, _temperature: f32) -> PortResult<String> {
        let mut prompts = self.prompts.lock().unwrap();
        let index = prompts.len().min(self.replies.len() - 1);
        prompts.push(prompt.to_string());
        Ok(self.replies[index].clone())
    }
}

pub struct StubJobMarket {
    pub fail: bool,
}

#[async_trait]
impl JobMarketService for StubJobMarket {
    async fn market_snapshot(&self, skill_or_role: &str) -> PortResult<JobMarketData> {
        if self.fail {
            return Err(PortError::Transport("market offline".to_string()));
        }
        Ok(JobMarketData {
            open_positions: format!("{} openings", skill_or_role),
            demand_score: 70,
            ..JobMarketData::default()
        })
    }

    async fn related_roles(&self, skills: &[String]) -> PortResult<Vec<String>> {
        if self.fail {
            return Err(PortError::Transport("market offline".to_string()));
        }
        Ok(skills.iter().map(|s| format!("{} Engineer", s)).collect())
    }
}

pub const VALID_PATH: &str = r#"{
    "title": "Rust Learning Path",
    "description": "From basics to async services.",
    "topic": "Rust",
    "expertise_level": "beginner",
    "learning_style": "reading",
    "time_commitment": "moderate",
    "duration_weeks": 12,
    "goals": ["Write idiomatic Rust"],
    "milestones": [
        {
            "title": "Foundations",
            "description": "Ownership, borrowing and the type system.",
            "estimated_hours": 20,
            "resources": [
                {"type": "video", "url": "https://example.com/intro", "description": "Intro talk"},
                {"type": "book", "url": "https://doc.rust-lang.org/book/", "description": "The Book"}
            ],
            "skills_gained": ["Ownership"]
        },
        {
            "title": "Async Services",
            "description": "Tokio and friends.",
            "estimated_hours": 40,
            "resources": [
                {"type": "documentation", "url": "https://tokio.rs", "description": "Tokio docs"}
            ],
            "skills_gained": ["Async", "Networking"]
        }
    ],
    "prerequisites": ["Basic programming"],
    "total_hours": 60
}"#;

pub const EMPTY_GOALS_PATH: &str = r#"{
    "title": "Rust Learning Path",
    "description": "Missing goals.",
    "topic": "Rust",
    "expertise_level": "beginner",
    "learning_style": "reading",
    "time_commitment": "moderate",
    "duration_weeks": 12,
    "goals": [],
    "milestones": [
        {"title": "Only", "description": "d", "estimated_hours": 5, "resources": [], "skills_gained": []}
    ],
    "prerequisites": [],
    "total_hours": 5
}"#;
