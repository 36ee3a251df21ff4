//! services/api/src/adapters/chat_llm.rs
//!
//! The adapter that turns prompts into model text through any
//! OpenAI-compatible chat completion endpoint. It implements the
//! `TextCompletionProvider` port from the `core` crate.

use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use learning_path_core::{PortError, PortResult, TextCompletionProvider};
use tracing::debug;

use crate::config::ProviderConfig;

const SYSTEM_INSTRUCTIONS: &str = "You are an expert educational AI assistant that designs \
personalized learning paths and explains technical topics. Answer with the requested JSON only.";

/// An adapter that implements `TextCompletionProvider` using an OpenAI-compatible LLM.
#[derive(Clone)]
pub struct ChatCompletionAdapter {
    client: Client<OpenAIConfig>,
    model: String,
    max_tokens: u32,
}

impl ChatCompletionAdapter {
    pub fn new(client: Client<OpenAIConfig>, model: String, max_tokens: u32) -> Self {
        Self {
            client,
            model,
            max_tokens,
        }
    }

    /// Builds a client pointed at the provider's own base URL.
    pub fn from_provider(provider: &ProviderConfig, max_tokens: u32) -> Self {
        let openai_config = OpenAIConfig::new()
            .with_api_key(provider.api_key.clone())
            .with_api_base(provider.kind.api_base());
        Self::new(
            Client::with_config(openai_config),
            provider.model.clone(),
            max_tokens,
        )
    }

    fn system_message(schema_instructions: &str) -> String {
        if schema_instructions.trim().is_empty() {
            SYSTEM_INSTRUCTIONS.to_string()
        } else {
            format!("{}\n\n{}", SYSTEM_INSTRUCTIONS, schema_instructions)
        }
    }
}

#[async_trait]
impl TextCompletionProvider for ChatCompletionAdapter {
    async fn complete(
        &self,
        prompt: &str,
        schema_instructions: &str,
        temperature: f32,
    ) -> PortResult<String> {
        let messages = vec![
            ChatCompletionRequestMessage::System(
                ChatCompletionRequestSystemMessageArgs::default()
                    .content(Self::system_message(schema_instructions))
                    .build()
                    .map_err(|e| PortError::Unexpected(e.to_string()))?,
            ),
            ChatCompletionRequestMessage::User(
                ChatCompletionRequestUserMessageArgs::default()
                    .content(prompt)
                    .build()
                    .map_err(|e| PortError::Unexpected(e.to_string()))?,
            ),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .max_tokens(self.max_tokens)
            .temperature(temperature)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        debug!(model = %self.model, temperature, "Calling chat completion");
        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| PortError::Transport(e.to_string()))?;

        response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or_else(|| PortError::Unexpected("The model returned no content".to_string()))
    }
}
