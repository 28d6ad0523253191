use async_trait::async_trait;
use std::path::PathBuf;
use crate::ledger::LedgerStore;
use crate::models::order::OrderRecord;
use crate::store::{ read_json_collection, write_json_collection, StoreError };

/// Order history kept as a pretty-printed JSON array on disk.
pub struct JsonLedgerStore {
    path: PathBuf,
}

impl JsonLedgerStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl LedgerStore for JsonLedgerStore {
    async fn load(&self) -> Result<Vec<OrderRecord>, StoreError> {
        read_json_collection(&self.path).await
    }

    async fn store(&self, records: &[OrderRecord]) -> Result<(), StoreError> {
        write_json_collection(&self.path, records).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::tempdir;
    use crate::ledger::Ledger;
    use crate::models::cart::Cart;
    use crate::models::catalog::sample_products;

    #[tokio::test]
    async fn orders_survive_a_new_store_instance() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("purchase_history.json");
        let mut cart = Cart::new();
        cart.add(&sample_products()[1], 3);

        let ledger = Ledger::new(Arc::new(JsonLedgerStore::new(&path)));
        let order_id = ledger.save(cart.lines()).await.unwrap();

        let reopened = Ledger::new(Arc::new(JsonLedgerStore::new(&path)));
        let history = reopened.list().await;
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].order_id, order_id);
        assert_eq!(history[0].price, 9600);
    }

    #[tokio::test]
    async fn corrupt_history_reads_as_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("purchase_history.json");
        std::fs::write(&path, "not json").unwrap();

        let ledger = Ledger::new(Arc::new(JsonLedgerStore::new(&path)));
        assert!(ledger.list().await.is_empty());
    }

    #[tokio::test]
    async fn concurrent_saves_do_not_lose_updates() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("purchase_history.json");
        let ledger = Arc::new(Ledger::new(Arc::new(JsonLedgerStore::new(&path))));
        let mut cart = Cart::new();
        cart.add(&sample_products()[0], 1);

        let mut handles = Vec::new();
        for _ in 0..8 {
            let ledger = ledger.clone();
            let lines = cart.lines().to_vec();
            handles.push(tokio::spawn(async move { ledger.save(&lines).await }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(ledger.list().await.len(), 8);
    }
}
