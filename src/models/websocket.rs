use serde::{ Serialize, Deserialize };
use crate::analytics::SpendingStats;
use super::cart::CartLine;
use super::catalog::Product;
use super::chat::ChatMessage;
use super::order::OrderRow;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    Chat {
        content: String,
    },
    ClearChat,
    ListProducts {
        #[serde(default)]
        category: Option<String>,
    },
    ListCategories,
    AdjustQuantity {
        product_id: u32,
        delta: i32,
    },
    AddToCart {
        product_id: u32,
        #[serde(default)]
        qty: Option<u32>,
    },
    RemoveFromCart {
        index: usize,
    },
    ClearCart,
    ViewCart,
    CloseCart,
    Checkout,
    ListOrders,
    CancelOrder {
        order_id: String,
    },
    Stats,
    ConfirmCommand,
    RejectCommand,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    Processing,
    Response {
        content: String,
        timestamp: i64,
    },
    Transcript {
        messages: Vec<ChatMessage>,
    },
    Products {
        products: Vec<Product>,
    },
    Categories {
        categories: Vec<String>,
    },
    Quantity {
        product_id: u32,
        qty: u32,
    },
    Cart {
        lines: Vec<CartLine>,
        total: u64,
        item_count: u32,
    },
    PendingCommand {
        item_name: String,
        qty: u32,
    },
    OrderPlaced {
        order_id: String,
    },
    Orders {
        orders: Vec<OrderRow>,
    },
    OrderCancelled {
        order_id: String,
    },
    Stats {
        stats: SpendingStats,
    },
    Error {
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_messages_use_snake_case_tags() {
        let msg: ClientMessage = serde_json
            ::from_str(r#"{"type": "add_to_cart", "product_id": 3}"#)
            .unwrap();
        assert_eq!(msg, ClientMessage::AddToCart { product_id: 3, qty: None });

        let msg: ClientMessage = serde_json::from_str(r#"{"type": "checkout"}"#).unwrap();
        assert_eq!(msg, ClientMessage::Checkout);
    }

    #[test]
    fn server_error_shape() {
        let json = serde_json
            ::to_value(ServerMessage::Error { message: "nope".into() })
            .unwrap();
        assert_eq!(json["type"], "error");
        assert_eq!(json["message"], "nope");
    }
}
