use async_trait::async_trait;
use log::info;
use reqwest::Client as HttpClient;
use serde::Serialize;
use std::error::Error as StdError;

use super::{ ChatClient, CompletionResponse };
use crate::llm::{ LlmConfig, LlmType };

#[derive(Debug)]
pub struct OllamaClient {
    http: HttpClient,
    base_url: String,
    completion_model: String,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

impl OllamaClient {
    pub fn new(base_url: Option<String>, completion_model: Option<String>) -> Self {
        Self {
            http: HttpClient::new(),
            base_url: base_url.unwrap_or_else(|| "http://localhost:11434".into()),
            completion_model: completion_model.unwrap_or_else(|| "llama3.2".to_string()),
        }
    }

    pub fn from_config(config: &LlmConfig) -> Result<Self, Box<dyn StdError + Send + Sync>> {
        if config.llm_type != LlmType::Ollama {
            return Err("Invalid config type for OllamaClient".into());
        }
        Ok(Self::new(config.base_url.clone(), config.completion_model.clone()))
    }
}

#[async_trait]
impl ChatClient for OllamaClient {
    async fn complete(
        &self,
        prompt: &str
    ) -> Result<CompletionResponse, Box<dyn StdError + Send + Sync>> {
        let url = format!("{}/api/generate", self.base_url.trim_end_matches('/'));
        info!("OllamaClient::complete() → model={} url={}", self.completion_model, url);
        let req = GenerateRequest {
            model: &self.completion_model,
            prompt,
            stream: false,
        };
        let resp = self.http.post(&url).json(&req).send().await?.error_for_status()?;
        Ok(resp.json::<CompletionResponse>().await?)
    }

    fn get_model(&self) -> String {
        self.completion_model.clone()
    }
}
