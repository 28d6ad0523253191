use log::debug;
use serde::Deserialize;
use thiserror::Error;
use crate::models::cart::{ MAX_QTY, MIN_QTY };

pub const ADD_TO_CART: &str = "add_to_cart";

/// A validated cart mutation requested by the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartCommand {
    AddToCart {
        item_name: String,
        qty: u32,
    },
}

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("reply is not a JSON object")]
    NotAnObject,
    #[error("malformed command: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("unknown action '{0}'")]
    UnknownAction(String),
    #[error("command has no item_name")]
    MissingItemName,
    #[error("quantity {0} must be at least 1")]
    InvalidQuantity(i64),
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawCommand {
    action: String,
    #[serde(default)]
    item_name: Option<String>,
    #[serde(default)]
    qty: Option<i64>,
}

/// What a model reply turned out to be.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedReply {
    Text(String),
    Command(CartCommand),
}

/// Removes markdown code fences the model likes to wrap JSON in.
pub fn strip_code_fences(reply: &str) -> String {
    reply.replace("```json", "").replace("```", "").trim().to_string()
}

/// Strict parse of an already fence-stripped reply.
pub fn parse_command(clean: &str) -> Result<CartCommand, CommandError> {
    if !clean.starts_with('{') {
        return Err(CommandError::NotAnObject);
    }
    let raw: RawCommand = serde_json::from_str(clean)?;
    if raw.action != ADD_TO_CART {
        return Err(CommandError::UnknownAction(raw.action));
    }
    let item_name = raw.item_name
        .filter(|n| !n.trim().is_empty())
        .ok_or(CommandError::MissingItemName)?;
    let qty = raw.qty.unwrap_or(MIN_QTY as i64);
    if qty < (MIN_QTY as i64) {
        return Err(CommandError::InvalidQuantity(qty));
    }

    Ok(CartCommand::AddToCart {
        item_name,
        qty: qty.min(MAX_QTY as i64) as u32,
    })
}

/// Anything that is not a valid command is conversational text, returned verbatim.
pub fn interpret_reply(reply: &str) -> ParsedReply {
    let clean = strip_code_fences(reply);
    if !clean.starts_with('{') {
        return ParsedReply::Text(reply.to_string());
    }
    match parse_command(&clean) {
        Ok(command) => ParsedReply::Command(command),
        Err(e) => {
            debug!("Reply looked like a command but was rejected: {}", e);
            ParsedReply::Text(reply.to_string())
        }
    }
}
