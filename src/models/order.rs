use serde::{ Serialize, Deserialize };
use std::fmt;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    #[default]
    Processing,
    Shipped,
    Delivered,
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderStatus::Processing => write!(f, "Processing"),
            OrderStatus::Shipped => write!(f, "Shipped"),
            OrderStatus::Delivered => write!(f, "Delivered"),
        }
    }
}

/// One persisted line of a placed order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRecord {
    pub order_id: String,
    pub item: String,
    pub date: String,
    pub price: u64,
    #[serde(default)]
    pub status: OrderStatus,
}

impl OrderRecord {
    pub fn can_cancel(&self) -> bool {
        self.status == OrderStatus::Processing
    }
}

/// Row of the order table, newest first.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OrderRow {
    #[serde(flatten)]
    pub record: OrderRecord,
    pub can_cancel: bool,
}

pub fn order_rows(history: &[OrderRecord]) -> Vec<OrderRow> {
    history
        .iter()
        .rev()
        .map(|r| OrderRow { record: r.clone(), can_cancel: r.can_cancel() })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_status_defaults_to_processing() {
        let r: OrderRecord = serde_json
            ::from_str(
                r#"{"order_id": "ORD-1", "item": "Heavenly Hues (x1)", "date": "2025-01-02", "price": 2500}"#
            )
            .unwrap();
        assert_eq!(r.status, OrderStatus::Processing);
        assert!(r.can_cancel());
    }

    #[test]
    fn status_serializes_as_plain_words() {
        let json = serde_json::to_string(&OrderStatus::Shipped).unwrap();
        assert_eq!(json, "\"Shipped\"");
    }

    #[test]
    fn rows_are_newest_first_with_cancel_flag() {
        let history = vec![
            OrderRecord {
                order_id: "ORD-1".into(),
                item: "A (x1)".into(),
                date: "2025-01-01".into(),
                price: 10,
                status: OrderStatus::Delivered,
            },
            OrderRecord {
                order_id: "ORD-2".into(),
                item: "B (x1)".into(),
                date: "2025-01-02".into(),
                price: 20,
                status: OrderStatus::Processing,
            }
        ];
        let rows = order_rows(&history);
        assert_eq!(rows[0].record.order_id, "ORD-2");
        assert!(rows[0].can_cancel);
        assert!(!rows[1].can_cancel);
    }
}
