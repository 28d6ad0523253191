use async_trait::async_trait;
use log::info;
use rllm::builder::LLMBackend;
use rllm::LLMProvider;
use std::error::Error as StdError;

use super::{ build_provider, chat_once, ChatClient, CompletionResponse };
use crate::llm::LlmConfig;

pub struct OpenAIChatClient {
    llm: Box<dyn LLMProvider + Send + Sync>,
    model: String,
    base_url: Option<String>,
}

impl OpenAIChatClient {
    pub fn new(
        api_key: String,
        model: Option<String>,
        base_url: Option<String>
    ) -> Result<Self, Box<dyn StdError + Send + Sync>> {
        let model = model.unwrap_or_else(|| "gpt-4o-mini".to_string());
        let llm = build_provider(LLMBackend::OpenAI, &api_key, &model, base_url.as_deref())?;
        Ok(Self { llm, model, base_url })
    }

    pub fn from_config(config: &LlmConfig) -> Result<Self, Box<dyn StdError + Send + Sync>> {
        let api_key = config.api_key
            .clone()
            .ok_or_else(|| "OpenAI API key is required for OpenAIChatClient".to_string())?;
        Self::new(api_key, config.completion_model.clone(), config.base_url.clone())
    }
}

#[async_trait]
impl ChatClient for OpenAIChatClient {
    async fn complete(
        &self,
        prompt: &str
    ) -> Result<CompletionResponse, Box<dyn StdError + Send + Sync>> {
        info!("OpenAIChatClient::complete() → model={} base_url={:?}", self.model, self.base_url);
        chat_once(self.llm.as_ref(), prompt).await
    }

    fn get_model(&self) -> String {
        self.model.clone()
    }
}
