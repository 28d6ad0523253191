use std::collections::HashMap;
use uuid::Uuid;
use crate::models::cart::{ Cart, MAX_QTY, MIN_QTY };
use crate::models::catalog::Product;
use crate::models::chat::Transcript;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutState {
    Browsing,
    CartOpen,
    CheckedOut,
}

/// An assistant command waiting for the user to confirm it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingCommand {
    pub product_id: u32,
    pub item_name: String,
    pub qty: u32,
}

/// State owned by one connection. Created on connect, dropped on disconnect.
pub struct Session {
    id: String,
    cart: Cart,
    transcript: Transcript,
    selected_qty: HashMap<u32, u32>,
    state: CheckoutState,
    pending: Option<PendingCommand>,
}

impl Session {
    pub fn new(transcript_limit: usize, greeting: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            cart: Cart::new(),
            transcript: Transcript::new(transcript_limit, greeting),
            selected_qty: HashMap::new(),
            state: CheckoutState::Browsing,
            pending: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn transcript_mut(&mut self) -> &mut Transcript {
        &mut self.transcript
    }

    pub fn state(&self) -> CheckoutState {
        self.state
    }

    /// Shared by the manual and assistant add paths.
    pub fn add_to_cart(&mut self, product: &Product, qty: u32) {
        self.leave_checked_out();
        self.cart.add(product, qty);
    }

    pub fn remove_from_cart(&mut self, index: usize) -> bool {
        self.leave_checked_out();
        self.cart.remove(index).is_some()
    }

    pub fn clear_cart(&mut self) {
        self.leave_checked_out();
        self.cart.clear();
    }

    /// Quantity picked on the product card, 1 until adjusted.
    pub fn selected_qty(&self, product_id: u32) -> u32 {
        self.selected_qty.get(&product_id).copied().unwrap_or(MIN_QTY)
    }

    /// Steps the picked quantity; steps that would leave 1..=10 are ignored.
    pub fn adjust_qty(&mut self, product_id: u32, delta: i32) -> u32 {
        let current = self.selected_qty(product_id) as i64;
        let next = current + (delta as i64);
        if (i64::from(MIN_QTY)..=i64::from(MAX_QTY)).contains(&next) {
            self.selected_qty.insert(product_id, next as u32);
        }
        self.selected_qty(product_id)
    }

    pub fn open_cart(&mut self) {
        self.state = CheckoutState::CartOpen;
    }

    pub fn close_cart(&mut self) {
        self.state = CheckoutState::Browsing;
    }

    /// Called only after the order was persisted.
    pub fn complete_checkout(&mut self) {
        self.cart.clear();
        self.state = CheckoutState::CheckedOut;
    }

    pub fn set_pending(&mut self, pending: PendingCommand) {
        self.pending = Some(pending);
    }

    pub fn take_pending(&mut self) -> Option<PendingCommand> {
        self.pending.take()
    }

    pub fn pending(&self) -> Option<&PendingCommand> {
        self.pending.as_ref()
    }

    fn leave_checked_out(&mut self) {
        if self.state == CheckoutState::CheckedOut {
            self.state = CheckoutState::Browsing;
        }
    }
}
