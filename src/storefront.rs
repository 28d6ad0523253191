use log::{ info, warn };
use std::error::Error as StdError;
use std::sync::Arc;
use thiserror::Error;

use crate::analytics::{ spending_stats, SpendingStats };
use crate::assistant::{ AssistantBridge, AssistantReply, CommandPolicy };
use crate::catalog::CatalogStore;
use crate::cli::Args;
use crate::config::prompt::{ load_prompts_or_default, PromptError };
use crate::ledger::{ create_ledger_store, CancelOutcome, Ledger };
use crate::llm::chat::new_client as new_chat_client;
use crate::llm::LlmConfig;
use crate::models::cart::{ clamp_qty, CartLine };
use crate::models::catalog::{ self, find_by_id, Product };
use crate::models::order::{ order_rows, OrderRow, OrderStatus };
use crate::session::Session;
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum StorefrontError {
    #[error("Your cart is empty.")]
    EmptyCart,
    #[error("Product {0} is not in the catalog.")]
    UnknownProduct(u32),
    #[error("There is no cart line at position {0}.")]
    NoSuchLine(usize),
    #[error("Order {0} was not found.")]
    OrderNotFound(String),
    #[error("Order {order_id} is {status} and can no longer be cancelled.")]
    NotCancellable {
        order_id: String,
        status: OrderStatus,
    },
    #[error("There is nothing waiting for confirmation.")]
    NoPendingCommand,
    #[error("Failed to save: {0}")]
    Store(#[from] StoreError),
}

/// Everything the presentation layer can ask of the shop. Shared by all sessions;
/// per-user state lives in [`Session`].
pub struct Storefront {
    catalog: CatalogStore,
    ledger: Ledger,
    assistant: AssistantBridge,
    transcript_limit: usize,
}

impl Storefront {
    pub fn new(
        catalog: CatalogStore,
        ledger: Ledger,
        assistant: AssistantBridge,
        transcript_limit: usize
    ) -> Self {
        Self { catalog, ledger, assistant, transcript_limit }
    }

    pub fn from_args(args: &Args) -> Result<Self, Box<dyn StdError + Send + Sync>> {
        let chat_config = LlmConfig {
            llm_type: args.chat_llm_type.parse()?,
            base_url: args.chat_base_url.clone(),
            api_key: Some(args.chat_api_key.clone()).filter(|k| !k.is_empty()),
            completion_model: args.chat_model.clone(),
        };
        let chat_client = new_chat_client(&chat_config)?;
        info!(
            "Chat client configured: Type={}, Model={}, BaseURL={:?}",
            chat_config.llm_type,
            chat_client.get_model(),
            chat_config.base_url.as_deref().unwrap_or("adapter default")
        );

        let policy = if args.confirm_assistant_commands {
            CommandPolicy::Confirm
        } else {
            CommandPolicy::Immediate
        };
        let assistant = AssistantBridge::new(
            chat_client,
            load_prompts_or_default(&args.prompts_path),
            Some(args.prompts_path.clone()),
            args.history_window,
            policy
        );

        let ledger = Ledger::new(create_ledger_store(args)?);
        info!("Order ledger: {} at {}", args.ledger_type, args.ledger_path);

        Ok(Self::new(CatalogStore::from_file(&args.catalog_path), ledger, assistant, args.transcript_limit))
    }

    pub async fn new_session(&self) -> Session {
        let greeting = self.assistant.prompts().await.greeting.clone();
        Session::new(self.transcript_limit, &greeting)
    }

    pub async fn products(&self, category: Option<&str>) -> Vec<Product> {
        catalog::filter_by_category(self.catalog.load().await, category)
    }

    pub async fn categories(&self) -> Vec<String> {
        catalog::categories(&self.catalog.load().await)
    }

    pub async fn adjust_quantity(
        &self,
        session: &mut Session,
        product_id: u32,
        delta: i32
    ) -> Result<u32, StorefrontError> {
        self.product(product_id).await?;
        Ok(session.adjust_qty(product_id, delta))
    }

    /// Manual add. Without an explicit quantity the one picked on the product card is used.
    pub async fn add_to_cart(
        &self,
        session: &mut Session,
        product_id: u32,
        qty: Option<u32>
    ) -> Result<CartLine, StorefrontError> {
        let product = self.product(product_id).await?;
        let qty = match qty {
            Some(q) => clamp_qty(q as i64),
            None => session.selected_qty(product_id),
        };
        session.add_to_cart(&product, qty);
        info!("Added {} x {} to cart of session {}", qty, product.name, session.id());

        session
            .cart()
            .lines()
            .iter()
            .find(|l| l.id == product_id)
            .cloned()
            .ok_or(StorefrontError::UnknownProduct(product_id))
    }

    pub fn remove_from_cart(&self, session: &mut Session, index: usize) -> Result<(), StorefrontError> {
        if session.remove_from_cart(index) {
            Ok(())
        } else {
            Err(StorefrontError::NoSuchLine(index))
        }
    }

    pub fn clear_cart(&self, session: &mut Session) {
        session.clear_cart();
    }

    pub fn open_cart(&self, session: &mut Session) {
        session.open_cart();
    }

    pub fn close_cart(&self, session: &mut Session) {
        session.close_cart();
    }

    /// Persists the cart as one order. The cart is only emptied once the write succeeded.
    pub async fn checkout(&self, session: &mut Session) -> Result<String, StorefrontError> {
        if session.cart().is_empty() {
            return Err(StorefrontError::EmptyCart);
        }
        session.open_cart();

        match self.ledger.save(session.cart().lines()).await {
            Ok(order_id) => {
                session.complete_checkout();
                Ok(order_id)
            }
            Err(e) => {
                warn!("Checkout failed for session {}: {}", session.id(), e);
                Err(e.into())
            }
        }
    }

    pub async fn orders(&self) -> Vec<OrderRow> {
        order_rows(&self.ledger.list().await)
    }

    pub async fn cancel_order(&self, order_id: &str) -> Result<usize, StorefrontError> {
        match self.ledger.cancel(order_id).await? {
            CancelOutcome::Cancelled(removed) => Ok(removed),
            CancelOutcome::NotFound => Err(StorefrontError::OrderNotFound(order_id.to_string())),
            CancelOutcome::NotCancellable(status) =>
                Err(StorefrontError::NotCancellable { order_id: order_id.to_string(), status }),
        }
    }

    pub async fn stats(&self) -> SpendingStats {
        spending_stats(&self.ledger.list().await)
    }

    pub async fn chat(&self, session: &mut Session, query: &str) -> AssistantReply {
        let catalog = self.catalog.load().await;
        let history = self.ledger.list().await;
        self.assistant.send(session, &catalog, &history, query).await
    }

    pub async fn clear_chat(&self, session: &mut Session) {
        let greeting = self.assistant.prompts().await.cleared_greeting.clone();
        session.transcript_mut().reset(&greeting);
    }

    pub async fn confirm_command(&self, session: &mut Session) -> Result<AssistantReply, StorefrontError> {
        let catalog = self.catalog.load().await;
        self.assistant
            .confirm_pending(session, &catalog).await
            .ok_or(StorefrontError::NoPendingCommand)
    }

    pub async fn reject_command(&self, session: &mut Session) -> Result<String, StorefrontError> {
        self.assistant.reject_pending(session).await.ok_or(StorefrontError::NoPendingCommand)
    }

    pub async fn reload_prompts_if_changed(&self) -> Result<bool, PromptError> {
        self.assistant.reload_prompts_if_changed().await
    }

    async fn product(&self, product_id: u32) -> Result<Product, StorefrontError> {
        let products = self.catalog.load().await;
        find_by_id(&products, product_id).cloned().ok_or(StorefrontError::UnknownProduct(product_id))
    }
}
