pub mod command;

use log::{ info, warn };
use std::sync::Arc;
use tokio::sync::RwLock;
use crate::config::prompt::{
    self,
    get_added_reply,
    get_assistant_prompt,
    get_confirm_reply,
    get_not_found_reply,
    AssistantContext,
    PromptConfig,
    PromptError,
};
use crate::llm::chat::ChatClient;
use crate::models::catalog::{ find_by_name, Product };
use crate::models::order::OrderRecord;
use crate::session::{ PendingCommand, Session };
use self::command::{ interpret_reply, CartCommand, ParsedReply };

pub const DEFAULT_HISTORY_WINDOW: usize = 5;
const SUGGESTION_THRESHOLD: f64 = 0.85;

/// How a valid cart command from the model is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandPolicy {
    Immediate,
    Confirm,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssistantReply {
    Text(String),
    Added {
        item_name: String,
        qty: u32,
        message: String,
    },
    NotFound {
        message: String,
    },
    AwaitingConfirmation {
        item_name: String,
        qty: u32,
        message: String,
    },
    Fallback(String),
}

impl AssistantReply {
    /// What the user sees.
    pub fn message(&self) -> &str {
        match self {
            AssistantReply::Text(text) | AssistantReply::Fallback(text) => text,
            | AssistantReply::Added { message, .. }
            | AssistantReply::NotFound { message }
            | AssistantReply::AwaitingConfirmation { message, .. } => message,
        }
    }
}

pub struct AssistantBridge {
    chat_client: Arc<dyn ChatClient>,
    prompt_config: RwLock<Arc<PromptConfig>>,
    prompts_path: Option<String>,
    history_window: usize,
    policy: CommandPolicy,
}

impl AssistantBridge {
    pub fn new(
        chat_client: Arc<dyn ChatClient>,
        prompt_config: Arc<PromptConfig>,
        prompts_path: Option<String>,
        history_window: usize,
        policy: CommandPolicy
    ) -> Self {
        info!(
            "Assistant configured: model={}, history_window={}, policy={:?}",
            chat_client.get_model(),
            history_window,
            policy
        );
        Self {
            chat_client,
            prompt_config: RwLock::new(prompt_config),
            prompts_path,
            history_window,
            policy,
        }
    }

    pub async fn prompts(&self) -> Arc<PromptConfig> {
        self.prompt_config.read().await.clone()
    }

    pub async fn reload_prompts_if_changed(&self) -> Result<bool, PromptError> {
        let Some(path) = self.prompts_path.as_deref() else {
            return Ok(false);
        };
        let current = self.prompts().await;
        match prompt::reload_prompts_if_changed(path, &current)? {
            Some(updated) => {
                *self.prompt_config.write().await = updated;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// One assistant turn. Never fails: generation errors become the fallback reply.
    pub async fn send(
        &self,
        session: &mut Session,
        catalog: &[Product],
        history: &[OrderRecord],
        query: &str
    ) -> AssistantReply {
        session.transcript_mut().push("user", query);
        let prompts = self.prompts().await;
        let prompt = self.build_prompt(&prompts, session, catalog, history, query);

        let reply = match self.chat_client.complete(&prompt).await {
            Ok(resp) => self.apply_reply(&prompts, session, catalog, &resp.response),
            Err(e) => {
                warn!("Assistant generation failed for session {}: {}", session.id(), e);
                AssistantReply::Fallback(prompts.fallback_reply.clone())
            }
        };

        session.transcript_mut().push("assistant", reply.message());
        reply
    }

    pub fn build_prompt(
        &self,
        prompts: &PromptConfig,
        session: &Session,
        catalog: &[Product],
        history: &[OrderRecord],
        query: &str
    ) -> String {
        let cart = if session.cart().is_empty() {
            "Empty".to_string()
        } else {
            to_json(session.cart().lines())
        };
        let history = to_json(history);
        let catalog = to_json(catalog);
        let conversation = session.transcript().window(self.history_window);

        get_assistant_prompt(
            prompts,
            &(AssistantContext {
                cart: &cart,
                history: &history,
                catalog: &catalog,
                conversation: &conversation,
                message: query,
            })
        )
    }

    /// Interprets raw model output and applies any cart command it carries.
    pub fn apply_reply(
        &self,
        prompts: &PromptConfig,
        session: &mut Session,
        catalog: &[Product],
        raw: &str
    ) -> AssistantReply {
        let (item_name, qty) = match interpret_reply(raw) {
            ParsedReply::Text(text) => {
                return AssistantReply::Text(text);
            }
            ParsedReply::Command(CartCommand::AddToCart { item_name, qty }) => (item_name, qty),
        };

        let Some(product) = find_by_name(catalog, &item_name) else {
            info!("Assistant asked for unknown product '{}'", item_name);
            let suggestion = closest_name(catalog, &item_name);
            return AssistantReply::NotFound {
                message: get_not_found_reply(prompts, suggestion),
            };
        };

        match self.policy {
            CommandPolicy::Immediate => {
                session.add_to_cart(product, qty);
                info!("Assistant added {} x {} for session {}", qty, product.name, session.id());
                AssistantReply::Added {
                    message: get_added_reply(prompts, qty, &product.name),
                    item_name: product.name.clone(),
                    qty,
                }
            }
            CommandPolicy::Confirm => {
                session.set_pending(PendingCommand {
                    product_id: product.id,
                    item_name: product.name.clone(),
                    qty,
                });
                AssistantReply::AwaitingConfirmation {
                    message: get_confirm_reply(prompts, qty, &product.name),
                    item_name: product.name.clone(),
                    qty,
                }
            }
        }
    }

    /// Applies the pending command, if any. The product is looked up again by id.
    pub async fn confirm_pending(
        &self,
        session: &mut Session,
        catalog: &[Product]
    ) -> Option<AssistantReply> {
        let pending = session.take_pending()?;
        let prompts = self.prompts().await;
        let reply = match catalog.iter().find(|p| p.id == pending.product_id) {
            Some(product) => {
                session.add_to_cart(product, pending.qty);
                AssistantReply::Added {
                    message: get_added_reply(&prompts, pending.qty, &product.name),
                    item_name: product.name.clone(),
                    qty: pending.qty,
                }
            }
            None =>
                AssistantReply::NotFound {
                    message: get_not_found_reply(&prompts, None),
                },
        };
        session.transcript_mut().push("assistant", reply.message());
        Some(reply)
    }

    pub async fn reject_pending(&self, session: &mut Session) -> Option<String> {
        session.take_pending()?;
        let message = self.prompts().await.rejected_reply.clone();
        session.transcript_mut().push("assistant", &message);
        Some(message)
    }
}

fn to_json<T: serde::Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|e| {
        warn!("Failed to serialize prompt section: {}", e);
        "[]".to_string()
    })
}

fn closest_name<'a>(catalog: &'a [Product], wanted: &str) -> Option<&'a str> {
    let wanted = wanted.to_lowercase();
    catalog
        .iter()
        .map(|p| (p.name.as_str(), strsim::jaro_winkler(&wanted, &p.name.to_lowercase())))
        .filter(|(_, score)| *score >= SUGGESTION_THRESHOLD)
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(name, _)| name)
}
