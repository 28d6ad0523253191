pub mod gemini;
pub mod ollama;
pub mod openai;

use async_trait::async_trait;
use serde::Deserialize;
use std::error::Error as StdError;
use std::sync::Arc;
use rllm::builder::{ LLMBackend, LLMBuilder };
use rllm::chat::{ ChatMessage, ChatRole, MessageType };
use rllm::LLMProvider;
use super::{ LlmConfig, LlmType };
use self::gemini::GeminiChatClient;
use self::ollama::OllamaClient;
use self::openai::OpenAIChatClient;

#[derive(Deserialize, Debug, Clone)]
pub struct CompletionResponse {
    pub response: String,
}

/// Single-shot text completion. No streaming and no server-side conversation state;
/// callers re-send everything they need in the prompt.
#[async_trait]
pub trait ChatClient: Send + Sync {
    async fn complete(
        &self,
        prompt: &str
    ) -> Result<CompletionResponse, Box<dyn StdError + Send + Sync>>;

    fn get_model(&self) -> String;
}

pub fn new_client(
    config: &LlmConfig
) -> Result<Arc<dyn ChatClient>, Box<dyn StdError + Send + Sync>> {
    let client: Arc<dyn ChatClient> = match config.llm_type {
        LlmType::Gemini => Arc::new(GeminiChatClient::from_config(config)?),
        LlmType::OpenAI => Arc::new(OpenAIChatClient::from_config(config)?),
        LlmType::Ollama => Arc::new(OllamaClient::from_config(config)?),
    };
    Ok(client)
}

pub(crate) fn build_provider(
    backend: LLMBackend,
    api_key: &str,
    model: &str,
    base_url: Option<&str>
) -> Result<Box<dyn LLMProvider + Send + Sync>, Box<dyn StdError + Send + Sync>> {
    let mut builder = LLMBuilder::new()
        .backend(backend)
        .api_key(api_key.to_string())
        .model(model)
        .stream(false);

    if let Some(url) = base_url {
        builder = builder.base_url(url);
    }

    let provider: Box<dyn LLMProvider + Send + Sync> = builder.build()?;
    Ok(provider)
}

pub(crate) async fn chat_once(
    llm: &(dyn LLMProvider + Send + Sync),
    prompt: &str
) -> Result<CompletionResponse, Box<dyn StdError + Send + Sync>> {
    let messages = vec![ChatMessage {
        role: ChatRole::User,
        content: prompt.to_string(),
        message_type: MessageType::Text,
    }];
    let resp = llm.chat(&messages).await?;
    let text = resp
        .text()
        .map(|s| s.to_string())
        .unwrap_or_else(|| resp.to_string());
    Ok(CompletionResponse { response: text })
}

#[cfg(test)]
pub(crate) mod scripted {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays canned replies in order and records every prompt it was given.
    #[derive(Default)]
    pub(crate) struct ScriptedChatClient {
        replies: Mutex<VecDeque<Result<String, String>>>,
        pub prompts: Mutex<Vec<String>>,
    }

    impl ScriptedChatClient {
        pub fn replying(replies: &[&str]) -> Self {
            let client = Self::default();
            for reply in replies {
                client.replies.lock().unwrap().push_back(Ok(reply.to_string()));
            }
            client
        }

        pub fn failing(message: &str) -> Self {
            let client = Self::default();
            client.replies.lock().unwrap().push_back(Err(message.to_string()));
            client
        }

        pub fn last_prompt(&self) -> Option<String> {
            self.prompts.lock().unwrap().last().cloned()
        }
    }

    #[async_trait]
    impl ChatClient for ScriptedChatClient {
        async fn complete(
            &self,
            prompt: &str
        ) -> Result<CompletionResponse, Box<dyn StdError + Send + Sync>> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            match self.replies.lock().unwrap().pop_front() {
                Some(Ok(response)) => Ok(CompletionResponse { response }),
                Some(Err(message)) => Err(message.into()),
                None => Err("no scripted reply left".into()),
            }
        }

        fn get_model(&self) -> String {
            "scripted".to_string()
        }
    }
}
