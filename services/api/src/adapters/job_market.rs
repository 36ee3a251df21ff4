//! services/api/src/adapters/job_market.rs
//!
//! Job market lookups answered by the configured model. Implements the
//! `JobMarketService` port on top of any `TextCompletionProvider`.

use std::sync::Arc;

use async_trait::async_trait;
use learning_path_core::market::{
    parse_related_roles, parse_snapshot, related_roles_prompt, snapshot_prompt,
};
use learning_path_core::{JobMarketData, JobMarketService, PortResult, TextCompletionProvider};

#[derive(Clone)]
pub struct LlmJobMarketAdapter {
    provider: Arc<dyn TextCompletionProvider>,
    temperature: f32,
}

impl LlmJobMarketAdapter {
    pub fn new(provider: Arc<dyn TextCompletionProvider>, temperature: f32) -> Self {
        Self {
            provider,
            temperature,
        }
    }
}

#[async_trait]
impl JobMarketService for LlmJobMarketAdapter {
    async fn market_snapshot(&self, skill_or_role: &str) -> PortResult<JobMarketData> {
        let raw = self
            .provider
            .complete(&snapshot_prompt(skill_or_role), "", self.temperature)
            .await?;
        parse_snapshot(&raw)
    }

    async fn related_roles(&self, skills: &[String]) -> PortResult<Vec<String>> {
        if skills.is_empty() {
            return Ok(Vec::new());
        }
        let raw = self
            .provider
            .complete(&related_roles_prompt(skills), "", self.temperature)
            .await?;
        Ok(parse_related_roles(&raw))
    }
}
