use async_trait::async_trait;
use tokio::sync::RwLock;
use crate::ledger::LedgerStore;
use crate::models::order::OrderRecord;
use crate::store::StoreError;

/// Process-lifetime history, for `LEDGER_TYPE=memory` and tests.
#[derive(Default)]
pub struct MemoryLedgerStore {
    records: RwLock<Vec<OrderRecord>>,
}

impl MemoryLedgerStore {
    pub fn with_records(records: Vec<OrderRecord>) -> Self {
        Self { records: RwLock::new(records) }
    }
}

#[async_trait]
impl LedgerStore for MemoryLedgerStore {
    async fn load(&self) -> Result<Vec<OrderRecord>, StoreError> {
        Ok(self.records.read().await.clone())
    }

    async fn store(&self, records: &[OrderRecord]) -> Result<(), StoreError> {
        *self.records.write().await = records.to_vec();
        Ok(())
    }
}
