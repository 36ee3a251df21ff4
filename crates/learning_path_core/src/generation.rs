//! crates/learning_path_core/src/generation.rs
//!
//! The bounded retry loop that turns a prompt into a schema-valid object.
//!
//! Each attempt calls the model, repairs its output and validates the result.
//! Schema violations are retried with a warmer temperature and a corrective
//! note appended to the prompt; transport failures end the loop at once.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::ports::{PortError, TextCompletionProvider};
use crate::repair::repair;
use crate::schema::{SchemaViolation, StructuredSchema};

/// Appended to the prompt once an attempt has been rejected.
pub const CORRECTIVE_INSTRUCTION: &str = "\n\nIMPORTANT: Your last response did NOT match the schema and was therefore rejected. \
You MUST return a COMPLETE JSON object that follows the exact schema with ALL required fields.";

//=========================================================================================
// Settings and Errors
//=========================================================================================

#[derive(Debug, Clone)]
pub struct GenerationSettings {
    /// Temperature of the first attempt.
    pub base_temperature: f32,
    /// Added to the temperature for every retry.
    pub temperature_step: f32,
    pub max_attempts: u32,
    /// Upper bound on a single model call. A call that runs past it fails
    /// the whole generation as a transport error.
    pub call_timeout: Option<Duration>,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            base_temperature: 0.6,
            temperature_step: 0.1,
            max_attempts: 3,
            call_timeout: None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    /// Every attempt produced an object that broke the schema.
    #[error("Generation failed after {attempts} attempts: {last}")]
    Exhausted {
        attempts: u32,
        last: SchemaViolation,
    },
    /// The model call itself failed. Never retried here.
    #[error("Model call failed: {0}")]
    Transport(#[from] PortError),
}

//=========================================================================================
// The Generator
//=========================================================================================

/// Drives a [`TextCompletionProvider`] until it yields a valid `T`.
#[derive(Clone)]
pub struct StructuredGenerator {
    provider: Arc<dyn TextCompletionProvider>,
    settings: GenerationSettings,
}

impl StructuredGenerator {
    pub fn new(provider: Arc<dyn TextCompletionProvider>, settings: GenerationSettings) -> Self {
        Self { provider, settings }
    }

    /// Generates a `T` using the configured number of attempts.
    pub async fn generate<T: StructuredSchema>(&self, prompt: &str) -> Result<T, GenerationError> {
        self.generate_structured(prompt, self.settings.max_attempts)
            .await
    }

    /// Generates a `T`, making at most `max_attempts` model calls (at least one).
    pub async fn generate_structured<T: StructuredSchema>(
        &self,
        prompt: &str,
        max_attempts: u32,
    ) -> Result<T, GenerationError> {
        let max_attempts = max_attempts.max(1);
        let mut prompt = prompt.to_string();
        let mut last_violation: Option<SchemaViolation> = None;

        for attempt in 0..max_attempts {
            let temperature =
                self.settings.base_temperature + self.settings.temperature_step * attempt as f32;
            if attempt > 0 {
                info!(attempt = attempt + 1, temperature, "Retrying structured generation");
            }

            let raw = self.call_model(&prompt, T::instructions(), temperature).await?;
            let candidate = repair(&raw, T::KIND);

            match T::validate(&candidate) {
                Ok(object) => {
                    debug!(attempt = attempt + 1, "Model output passed validation");
                    return Ok(object);
                }
                Err(violation) => {
                    warn!(
                        attempt = attempt + 1,
                        field = %violation.path,
                        reason = %violation.message,
                        "Model output rejected by schema validation"
                    );
                    if last_violation.is_none() {
                        prompt.push_str(CORRECTIVE_INSTRUCTION);
                    }
                    last_violation = Some(violation);
                }
            }
        }

        Err(GenerationError::Exhausted {
            attempts: max_attempts,
            last: last_violation.unwrap_or_else(|| {
                SchemaViolation::new("$", "no attempt produced a valid object")
            }),
        })
    }

    async fn call_model(
        &self,
        prompt: &str,
        instructions: &str,
        temperature: f32,
    ) -> Result<String, PortError> {
        let call = self.provider.complete(prompt, instructions, temperature);
        match self.settings.call_timeout {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .map_err(|_| PortError::Timeout(limit))?,
            None => call.await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::LearningPath;
    use crate::ports::PortResult;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Records every call and answers with a fixed reply.
    struct Recorder {
        reply: Result<String, fn() -> PortError>,
        calls: Mutex<Vec<(String, f32)>>,
        delay: Option<Duration>,
    }

    impl Recorder {
        fn replying(reply: &str) -> Self {
            Self {
                reply: Ok(reply.to_string()),
                calls: Mutex::new(Vec::new()),
                delay: None,
            }
        }
    }

    #[async_trait]
    impl TextCompletionProvider for Recorder {
        async fn complete(&self, prompt: &str, _schema: &str, temperature: f32) -> PortResult<String> {
            self.calls.lock().unwrap().push((prompt.to_string(), temperature));
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.reply.clone().map_err(|make| make())
        }
    }

    const EMPTY_GOALS: &str = r#"{"title": "T", "description": "D", "topic": "Rust",
        "expertise_level": "beginner", "learning_style": "visual", "time_commitment": "moderate",
        "duration_weeks": 4, "goals": [], "prerequisites": [], "total_hours": 5,
        "milestones": [{"title": "M", "description": "d", "estimated_hours": 5,
        "resources": [], "skills_gained": []}]}"#;

    #[tokio::test]
    async fn temperature_widens_on_each_retry() {
        let provider = Arc::new(Recorder::replying(EMPTY_GOALS));
        let generator = StructuredGenerator::new(provider.clone(), GenerationSettings::default());

        let result = generator.generate::<LearningPath>("plan").await;
        assert!(matches!(result, Err(GenerationError::Exhausted { attempts: 3, .. })));

        let temps: Vec<f32> = provider.calls.lock().unwrap().iter().map(|(_, t)| *t).collect();
        assert_eq!(temps.len(), 3);
        assert!((temps[0] - 0.6).abs() < 1e-6);
        assert!((temps[1] - 0.7).abs() < 1e-6);
        assert!((temps[2] - 0.8).abs() < 1e-6);
    }

    #[tokio::test]
    async fn corrective_note_is_added_once() {
        let provider = Arc::new(Recorder::replying(EMPTY_GOALS));
        let generator = StructuredGenerator::new(provider.clone(), GenerationSettings::default());
        let _ = generator.generate::<LearningPath>("plan").await;

        let calls = provider.calls.lock().unwrap();
        assert_eq!(calls[0].0, "plan");
        assert_eq!(calls[1].0, format!("plan{}", CORRECTIVE_INSTRUCTION));
        assert_eq!(calls[2].0, calls[1].0);
    }

    #[tokio::test]
    async fn transport_errors_are_not_retried() {
        let provider = Arc::new(Recorder {
            reply: Err(|| PortError::Transport("rate limited".to_string())),
            calls: Mutex::new(Vec::new()),
            delay: None,
        });
        let generator = StructuredGenerator::new(provider.clone(), GenerationSettings::default());

        let result = generator.generate::<LearningPath>("plan").await;
        assert!(matches!(result, Err(GenerationError::Transport(PortError::Transport(_)))));
        assert_eq!(provider.calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn slow_calls_time_out_as_transport_failures() {
        let provider = Arc::new(Recorder {
            reply: Ok("{}".to_string()),
            calls: Mutex::new(Vec::new()),
            delay: Some(Duration::from_millis(200)),
        });
        let settings = GenerationSettings {
            call_timeout: Some(Duration::from_millis(10)),
            ..GenerationSettings::default()
        };
        let generator = StructuredGenerator::new(provider.clone(), settings);

        let result = generator.generate::<LearningPath>("plan").await;
        assert!(matches!(result, Err(GenerationError::Transport(PortError::Timeout(_)))));
        assert_eq!(provider.calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn zero_attempts_still_calls_once() {
        let provider = Arc::new(Recorder::replying(EMPTY_GOALS));
        let generator = StructuredGenerator::new(provider.clone(), GenerationSettings::default());
        let result = generator.generate_structured::<LearningPath>("plan", 0).await;
        match result {
            Err(GenerationError::Exhausted { attempts, last }) => {
                assert_eq!(attempts, 1);
                assert_eq!(last.path, "goals");
            }
            other => panic!("unexpected result: {:?}", other.map(|p| p.title)),
        }
        assert_eq!(provider.calls.lock().unwrap().len(), 1);
    }
}
