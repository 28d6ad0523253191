use serde::{ Serialize, Deserialize };
use std::collections::BTreeMap;
use crate::models::order::OrderRecord;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailySpend {
    pub date: String,
    pub amount: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemSpend {
    pub name: String,
    pub amount: u64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpendingStats {
    pub total_spent: u64,
    /// Number of ledger lines, not distinct order ids.
    pub total_orders: usize,
    pub timeline: Vec<DailySpend>,
    /// Spend per product name, sorted by name.
    pub by_item: Vec<ItemSpend>,
}

/// Product name of a ledger line, without the `" (x<qty>)"` suffix.
pub fn item_name(item: &str) -> &str {
    item.split_once(" (x").map_or(item, |(name, _)| name)
}

pub fn spending_stats(history: &[OrderRecord]) -> SpendingStats {
    let mut by_date: BTreeMap<&str, u64> = BTreeMap::new();
    let mut by_item: BTreeMap<&str, u64> = BTreeMap::new();
    for record in history {
        *by_date.entry(record.date.as_str()).or_insert(0) += record.price;
        *by_item.entry(item_name(&record.item)).or_insert(0) += record.price;
    }

    SpendingStats {
        total_spent: history
            .iter()
            .map(|r| r.price)
            .sum(),
        total_orders: history.len(),
        timeline: by_date
            .into_iter()
            .map(|(date, amount)| DailySpend { date: date.to_string(), amount })
            .collect(),
        by_item: by_item
            .into_iter()
            .map(|(name, amount)| ItemSpend { name: name.to_string(), amount })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::order::OrderStatus;

    fn record(id: &str, date: &str, price: u64) -> OrderRecord {
        line(id, "Item (x1)", date, price)
    }

    fn line(id: &str, item: &str, date: &str, price: u64) -> OrderRecord {
        OrderRecord {
            order_id: id.to_string(),
            item: item.to_string(),
            date: date.to_string(),
            price,
            status: OrderStatus::Processing,
        }
    }

    #[test]
    fn empty_history_has_zero_stats() {
        assert_eq!(spending_stats(&[]), SpendingStats::default());
    }

    #[test]
    fn totals_and_timeline_grouped_by_date() {
        let history = vec![
            record("ORD-2", "2025-03-02", 300),
            record("ORD-1", "2025-03-01", 100),
            record("ORD-1", "2025-03-01", 50),
        ];
        let stats = spending_stats(&history);
        assert_eq!(stats.total_spent, 450);
        assert_eq!(stats.total_orders, 3);
        assert_eq!(
            stats.timeline,
            vec![
                DailySpend { date: "2025-03-01".into(), amount: 150 },
                DailySpend { date: "2025-03-02".into(), amount: 300 }
            ]
        );
    }

    #[test]
    fn spend_by_product_merges_quantities() {
        let history = vec![
            line("ORD-1", "Heavenly Hues (x2)", "2025-03-01", 5000),
            line("ORD-1", "Moonlit Chime (x1)", "2025-03-01", 1800),
            line("ORD-2", "Heavenly Hues (x1)", "2025-03-02", 2500),
            line("ORD-3", "Loose Feathers", "2025-03-02", 300),
        ];
        let stats = spending_stats(&history);
        assert_eq!(
            stats.by_item,
            vec![
                ItemSpend { name: "Heavenly Hues".into(), amount: 7500 },
                ItemSpend { name: "Loose Feathers".into(), amount: 300 },
                ItemSpend { name: "Moonlit Chime".into(), amount: 1800 }
            ]
        );
    }
}
