use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::SystemTime;
use log::{ info, warn };
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PromptError {
    #[error("Prompt file IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Prompt JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),
}

const DEFAULT_ASSISTANT_TEMPLATE: &str =
    "{persona}
Cart: {cart}
History: {history}
Catalog: {catalog}
Current Conversation History: {conversation}

*** IMPORTANT CART INSTRUCTIONS ***
1. If the user asks about a product, describe it briefly and ask: \"Do you want to add this to your cart?\"
2. If the user says \"Yes\" or agrees, ask: \"How many would you like?\"
3. If the user provides a number (Quantity) for a specific item discussed, YOU MUST OUTPUT ONLY JSON.

JSON FORMAT FOR ADDING TO CART:
{ \"action\": \"add_to_cart\", \"item_name\": \"Exact Product Name from Catalog\", \"qty\": Integer }

Example: User says \"2\", you output: { \"action\": \"add_to_cart\", \"item_name\": \"Heavenly Hues\", \"qty\": 2 }

For all other normal conversation, just reply with text (no JSON).

User Input: {message}";

/// Persona, canned replies and the assistant prompt template.
#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct PromptConfig {
    pub persona: String,
    pub greeting: String,
    pub cleared_greeting: String,
    pub fallback_reply: String,
    /// `{qty}` and `{name}` are substituted.
    pub added_reply: String,
    pub not_found_reply: String,
    /// `{suggestion}` is substituted.
    pub suggestion_reply: String,
    /// Asked before applying a command when confirmation is required. `{qty}` and `{name}` are substituted.
    pub confirm_reply: String,
    pub rejected_reply: String,
    pub assistant_template: String,
    #[serde(skip)]
    pub last_loaded: Option<SystemTime>,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            persona: "You are Aura, the AI agent for Dream Spells.\nUser: Ishara Stanley.".to_string(),
            greeting: "Welcome back, Ishara! Ask me about dreamcatchers.".to_string(),
            cleared_greeting: "Chat cleared. How can I help?".to_string(),
            fallback_reply: "The spirits are quiet today.".to_string(),
            added_reply: "✨ I have added **{qty} x {name}** to your cart!".to_string(),
            not_found_reply: "I couldn't find that item in the catalog.".to_string(),
            suggestion_reply: "Did you mean {suggestion}?".to_string(),
            confirm_reply: "Shall I add **{qty} x {name}** to your cart?".to_string(),
            rejected_reply: "No problem, I left your cart as it was.".to_string(),
            assistant_template: DEFAULT_ASSISTANT_TEMPLATE.to_string(),
            last_loaded: None,
        }
    }
}

/// Everything the assistant prompt embeds, already serialized.
pub struct AssistantContext<'a> {
    pub cart: &'a str,
    pub history: &'a str,
    pub catalog: &'a str,
    pub conversation: &'a str,
    pub message: &'a str,
}

pub fn load_prompts(path: &str) -> Result<Arc<PromptConfig>, PromptError> {
    let file_content = fs::read_to_string(path)?;
    let mut config: PromptConfig = serde_json::from_str(&file_content)?;
    config.last_loaded = Some(SystemTime::now());
    Ok(Arc::new(config))
}

/// Falls back to the built-in prompts when the file is absent or unreadable.
pub fn load_prompts_or_default(path: &str) -> Arc<PromptConfig> {
    if !Path::new(path).exists() {
        info!("No prompts file at '{}', using built-in prompts", path);
        return Arc::new(PromptConfig::default());
    }
    match load_prompts(path) {
        Ok(config) => {
            info!("Loaded prompts from '{}'", path);
            config
        }
        Err(e) => {
            warn!("Failed to load prompts from '{}', using built-in prompts: {}", path, e);
            Arc::new(PromptConfig::default())
        }
    }
}

pub fn reload_prompts_if_changed<P: AsRef<Path>>(
    path: P,
    current_config: &Arc<PromptConfig>
) -> Result<Option<Arc<PromptConfig>>, PromptError> {
    let path = path.as_ref();
    let metadata = fs::metadata(path)?;
    let modified = metadata.modified()?;

    let stale = match current_config.last_loaded {
        Some(last_loaded) => modified > last_loaded,
        None => true,
    };
    if !stale {
        return Ok(None);
    }

    info!("Prompts file changed, reloading...");
    let file_content = fs::read_to_string(path)?;
    let mut config: PromptConfig = serde_json::from_str(&file_content)?;
    config.last_loaded = Some(SystemTime::now());
    Ok(Some(Arc::new(config)))
}

pub fn get_assistant_prompt(config: &PromptConfig, ctx: &AssistantContext<'_>) -> String {
    config.assistant_template
        .replace("{persona}", &config.persona)
        .replace("{cart}", ctx.cart)
        .replace("{history}", ctx.history)
        .replace("{catalog}", ctx.catalog)
        .replace("{conversation}", ctx.conversation)
        .replace("{message}", ctx.message)
}

pub fn get_added_reply(config: &PromptConfig, qty: u32, name: &str) -> String {
    config.added_reply.replace("{qty}", &qty.to_string()).replace("{name}", name)
}

pub fn get_confirm_reply(config: &PromptConfig, qty: u32, name: &str) -> String {
    config.confirm_reply.replace("{qty}", &qty.to_string()).replace("{name}", name)
}

pub fn get_not_found_reply(config: &PromptConfig, suggestion: Option<&str>) -> String {
    match suggestion {
        Some(name) =>
            format!(
                "{} {}",
                config.not_found_reply,
                config.suggestion_reply.replace("{suggestion}", name)
            ),
        None => config.not_found_reply.clone(),
    }
}
