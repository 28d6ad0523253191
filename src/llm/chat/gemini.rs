use async_trait::async_trait;
use log::info;
use rllm::builder::LLMBackend;
use rllm::LLMProvider;
use std::error::Error as StdError;

use super::{ build_provider, chat_once, ChatClient, CompletionResponse };
use crate::llm::LlmConfig;

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";

pub struct GeminiChatClient {
    llm: Box<dyn LLMProvider + Send + Sync>,
    model: String,
}

impl GeminiChatClient {
    pub fn new(
        api_key: String,
        model: Option<String>,
        base_url: Option<String>
    ) -> Result<Self, Box<dyn StdError + Send + Sync>> {
        let model = model.unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string());
        let llm = build_provider(LLMBackend::Google, &api_key, &model, base_url.as_deref())?;
        Ok(Self { llm, model })
    }

    pub fn from_config(config: &LlmConfig) -> Result<Self, Box<dyn StdError + Send + Sync>> {
        let api_key = config.api_key
            .clone()
            .ok_or_else(|| "Google API key is required for GeminiChatClient".to_string())?;
        Self::new(api_key, config.completion_model.clone(), config.base_url.clone())
    }
}

#[async_trait]
impl ChatClient for GeminiChatClient {
    async fn complete(
        &self,
        prompt: &str
    ) -> Result<CompletionResponse, Box<dyn StdError + Send + Sync>> {
        info!("GeminiChatClient::complete() → model={}", self.model);
        chat_once(self.llm.as_ref(), prompt).await
    }

    fn get_model(&self) -> String {
        self.model.clone()
    }
}
