mod json;
mod memory;

pub use json::JsonLedgerStore;
pub use memory::MemoryLedgerStore;

use async_trait::async_trait;
use chrono::{ DateTime, Local };
use log::{ info, warn };
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;
use crate::cli::Args;
use crate::models::cart::CartLine;
use crate::models::order::{ OrderRecord, OrderStatus };
use crate::store::StoreError;

/// Raw persistence for the order history. Implementations load and store the whole
/// collection; [`Ledger`] serializes access around them.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    async fn load(&self) -> Result<Vec<OrderRecord>, StoreError>;

    async fn store(&self, records: &[OrderRecord]) -> Result<(), StoreError>;
}

pub fn create_ledger_store(args: &Args) -> Result<Arc<dyn LedgerStore>, StoreError> {
    match args.ledger_type.to_lowercase().as_str() {
        "json" => Ok(Arc::new(JsonLedgerStore::new(&args.ledger_path))),
        "memory" => Ok(Arc::new(MemoryLedgerStore::default())),
        other => Err(StoreError::UnsupportedType(other.to_string())),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CancelOutcome {
    Cancelled(usize),
    NotFound,
    NotCancellable(OrderStatus),
}

/// Order history with one writer at a time.
pub struct Ledger {
    store: Arc<dyn LedgerStore>,
    write_lock: Mutex<()>,
}

impl Ledger {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store, write_lock: Mutex::new(()) }
    }

    /// Current history; unreadable stores come back empty.
    pub async fn list(&self) -> Vec<OrderRecord> {
        match self.store.load().await {
            Ok(records) => records,
            Err(e) => {
                warn!("Order history not loaded, using empty history: {}", e);
                Vec::new()
            }
        }
    }

    pub async fn save(&self, lines: &[CartLine]) -> Result<String, StoreError> {
        self.save_at(lines, Local::now()).await
    }

    /// Writes one `Processing` record per line, all under a fresh order id.
    pub async fn save_at(
        &self,
        lines: &[CartLine],
        now: DateTime<Local>
    ) -> Result<String, StoreError> {
        if lines.is_empty() {
            return Err(StoreError::EmptyOrder);
        }
        let _guard = self.write_lock.lock().await;

        let mut history = self.list().await;
        let taken: HashSet<&str> = history
            .iter()
            .map(|r| r.order_id.as_str())
            .collect();
        let order_id = unique_order_id(now.timestamp(), &taken);
        let date = now.format("%Y-%m-%d").to_string();

        history.extend(
            lines.iter().map(|line| OrderRecord {
                order_id: order_id.clone(),
                item: format!("{} (x{})", line.name, line.qty),
                date: date.clone(),
                price: line.line_total(),
                status: OrderStatus::Processing,
            })
        );

        self.store.store(&history).await?;
        info!("Saved order {} with {} line(s)", order_id, lines.len());
        Ok(order_id)
    }

    /// Removes every record of `order_id` regardless of status. Returns how many went.
    pub async fn delete(&self, order_id: &str) -> Result<usize, StoreError> {
        let _guard = self.write_lock.lock().await;
        let history = self.list().await;
        self.remove_order(history, order_id).await
    }

    /// Like [`Ledger::delete`], but only while every record of the order is still processing.
    pub async fn cancel(&self, order_id: &str) -> Result<CancelOutcome, StoreError> {
        let _guard = self.write_lock.lock().await;

        let history = self.list().await;
        let statuses: Vec<OrderStatus> = history
            .iter()
            .filter(|r| r.order_id == order_id)
            .map(|r| r.status)
            .collect();
        if statuses.is_empty() {
            return Ok(CancelOutcome::NotFound);
        }
        if let Some(blocking) = statuses.into_iter().find(|s| *s != OrderStatus::Processing) {
            return Ok(CancelOutcome::NotCancellable(blocking));
        }

        let removed = self.remove_order(history, order_id).await?;
        Ok(CancelOutcome::Cancelled(removed))
    }

    /// Caller must hold `write_lock`.
    async fn remove_order(
        &self,
        history: Vec<OrderRecord>,
        order_id: &str
    ) -> Result<usize, StoreError> {
        let before = history.len();
        let remaining: Vec<OrderRecord> = history
            .into_iter()
            .filter(|r| r.order_id != order_id)
            .collect();
        let removed = before - remaining.len();
        if removed > 0 {
            self.store.store(&remaining).await?;
            info!("Removed order {} ({} line(s))", order_id, removed);
        }
        Ok(removed)
    }
}

fn unique_order_id(mut secs: i64, taken: &HashSet<&str>) -> String {
    loop {
        let id = format!("ORD-{}", secs);
        if !taken.contains(id.as_str()) {
            return id;
        }
        secs += 1;
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::TimeZone;
    use crate::models::cart::Cart;
    use crate::models::catalog::sample_products;

    /// Store whose writes always fail.
    #[derive(Default)]
    pub(crate) struct FailingLedgerStore {
        pub records: Vec<OrderRecord>,
    }

    #[async_trait]
    impl LedgerStore for FailingLedgerStore {
        async fn load(&self) -> Result<Vec<OrderRecord>, StoreError> {
            Ok(self.records.clone())
        }

        async fn store(&self, _records: &[OrderRecord]) -> Result<(), StoreError> {
            Err(StoreError::Io {
                path: "purchase_history.json".into(),
                source: std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
            })
        }
    }

    fn cart_with_two_lines() -> Cart {
        let products = sample_products();
        let mut cart = Cart::new();
        cart.add(&products[0], 2);
        cart.add(&products[2], 1);
        cart
    }

    fn fixed_now() -> DateTime<Local> {
        Local.with_ymd_and_hms(2025, 6, 14, 10, 30, 0).unwrap()
    }

    #[tokio::test]
    async fn save_writes_one_record_per_line_with_shared_id() {
        let ledger = Ledger::new(Arc::new(MemoryLedgerStore::default()));
        let cart = cart_with_two_lines();

        let order_id = ledger.save_at(cart.lines(), fixed_now()).await.unwrap();
        let history = ledger.list().await;

        assert_eq!(order_id, format!("ORD-{}", fixed_now().timestamp()));
        assert_eq!(history.len(), 2);
        assert!(history.iter().all(|r| r.order_id == order_id));
        assert!(history.iter().all(|r| r.status == OrderStatus::Processing));
        assert!(history.iter().all(|r| r.date == "2025-06-14"));
        assert_eq!(history[0].item, "Heavenly Hues (x2)");
        assert_eq!(history[0].price, 5000);
    }

    #[tokio::test]
    async fn same_second_orders_get_distinct_ids() {
        let ledger = Ledger::new(Arc::new(MemoryLedgerStore::default()));
        let cart = cart_with_two_lines();

        let first = ledger.save_at(cart.lines(), fixed_now()).await.unwrap();
        let second = ledger.save_at(cart.lines(), fixed_now()).await.unwrap();
        assert_ne!(first, second);
        assert_eq!(ledger.list().await.len(), 4);
    }

    #[tokio::test]
    async fn empty_order_is_rejected() {
        let ledger = Ledger::new(Arc::new(MemoryLedgerStore::default()));
        let result = ledger.save(&[]).await;
        assert!(matches!(result, Err(StoreError::EmptyOrder)));
    }

    #[tokio::test]
    async fn cancel_removes_only_matching_records() {
        let ledger = Ledger::new(Arc::new(MemoryLedgerStore::default()));
        let cart = cart_with_two_lines();
        let first = ledger.save_at(cart.lines(), fixed_now()).await.unwrap();
        let second = ledger.save(cart.lines()).await.unwrap();

        let outcome = ledger.cancel(&first).await.unwrap();
        assert_eq!(outcome, CancelOutcome::Cancelled(2));

        let history = ledger.list().await;
        assert_eq!(history.len(), 2);
        assert!(history.iter().all(|r| r.order_id == second));
    }

    #[tokio::test]
    async fn cancel_runs_on_a_spawned_task() {
        let ledger = Arc::new(Ledger::new(Arc::new(MemoryLedgerStore::default())));
        let cart = cart_with_two_lines();
        let order_id = ledger.save_at(cart.lines(), fixed_now()).await.unwrap();

        let task_ledger = ledger.clone();
        let outcome = tokio::spawn(async move { task_ledger.cancel(&order_id).await })
            .await
            .unwrap()
            .unwrap();
        assert_eq!(outcome, CancelOutcome::Cancelled(2));
        assert!(ledger.list().await.is_empty());
    }

    #[tokio::test]
    async fn cancel_unknown_or_shipped_order_is_refused() {
        let store = Arc::new(
            MemoryLedgerStore::with_records(
                vec![OrderRecord {
                    order_id: "ORD-7".into(),
                    item: "Moonlit Chime (x1)".into(),
                    date: "2025-01-01".into(),
                    price: 1800,
                    status: OrderStatus::Shipped,
                }]
            )
        );
        let ledger = Ledger::new(store);

        assert_eq!(ledger.cancel("ORD-404").await.unwrap(), CancelOutcome::NotFound);
        assert_eq!(
            ledger.cancel("ORD-7").await.unwrap(),
            CancelOutcome::NotCancellable(OrderStatus::Shipped)
        );
        assert_eq!(ledger.list().await.len(), 1);
    }

    #[tokio::test]
    async fn delete_ignores_status_and_spares_other_orders() {
        let shipped = OrderRecord {
            order_id: "ORD-7".into(),
            item: "Moonlit Chime (x1)".into(),
            date: "2025-01-01".into(),
            price: 1800,
            status: OrderStatus::Shipped,
        };
        let other = OrderRecord { order_id: "ORD-8".into(), ..shipped.clone() };
        let ledger = Ledger::new(
            Arc::new(MemoryLedgerStore::with_records(vec![shipped.clone(), shipped, other]))
        );

        assert_eq!(ledger.delete("ORD-7").await.unwrap(), 2);
        assert_eq!(ledger.delete("ORD-404").await.unwrap(), 0);
        let history = ledger.list().await;
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].order_id, "ORD-8");
    }

    #[tokio::test]
    async fn write_failure_is_surfaced() {
        let ledger = Ledger::new(Arc::new(FailingLedgerStore::default()));
        let cart = cart_with_two_lines();
        assert!(ledger.save(cart.lines()).await.is_err());
    }
}
