//! Staging records for orders awaiting a gateway redirect round-trip
//!
//! The order is written under `pendingOrder:{gatewayOrderId}` right before the browser
//! leaves for the gateway and consumed when it comes back. Records older than the TTL
//! count as absent and are purged whenever they are read.

use crate::client::storage::{ClientStorage, StorageError};
use crate::services::NewOrder;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

pub const PENDING_ORDER_PREFIX: &str = "pendingOrder:";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingOrder {
    pub order: NewOrder,
    pub staged_at: DateTime<Utc>,
}

pub fn pending_order_key(order_id: &str) -> String {
    format!("{}{}", PENDING_ORDER_PREFIX, order_id)
}

pub struct PendingOrderStore {
    storage: Arc<dyn ClientStorage>,
    ttl: Duration,
}

impl PendingOrderStore {
    pub fn new(storage: Arc<dyn ClientStorage>, ttl: Duration) -> Self {
        Self { storage, ttl }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn stage(&self, order_id: &str, order: &NewOrder) -> Result<PendingOrder, StorageError> {
        self.stage_at(order_id, order, Utc::now())
    }

    pub fn stage_at(
        &self,
        order_id: &str,
        order: &NewOrder,
        now: DateTime<Utc>,
    ) -> Result<PendingOrder, StorageError> {
        let record = PendingOrder {
            order: order.clone(),
            staged_at: now,
        };
        let encoded = serde_json::to_string(&record).map_err(|source| StorageError::Corrupt {
            path: pending_order_key(order_id),
            source,
        })?;
        self.storage.set(&pending_order_key(order_id), &encoded)?;
        debug!(order_id = %order_id, "pending order staged");
        Ok(record)
    }

    pub fn load(&self, order_id: &str) -> Result<Option<PendingOrder>, StorageError> {
        self.load_at(order_id, Utc::now())
    }

    /// The staged record, unless it is missing, unreadable or expired at `now`
    pub fn load_at(
        &self,
        order_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<PendingOrder>, StorageError> {
        let key = pending_order_key(order_id);
        let Some(raw) = self.storage.get(&key)? else {
            return Ok(None);
        };
        match serde_json::from_str::<PendingOrder>(&raw) {
            Ok(record) if !self.is_expired(&record, now) => Ok(Some(record)),
            Ok(_) => {
                debug!(order_id = %order_id, "pending order expired");
                self.storage.remove(&key)?;
                Ok(None)
            }
            Err(e) => {
                warn!(order_id = %order_id, error = %e, "discarding unreadable pending order");
                self.storage.remove(&key)?;
                Ok(None)
            }
        }
    }

    pub fn remove(&self, order_id: &str) -> Result<(), StorageError> {
        self.storage.remove(&pending_order_key(order_id))
    }

    /// Drop every expired or unreadable record, returning how many went
    pub fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize, StorageError> {
        let mut purged = 0;
        for key in self.storage.keys()? {
            let Some(order_id) = key.strip_prefix(PENDING_ORDER_PREFIX) else {
                continue;
            };
            if self.storage.get(&key)?.is_some() && self.load_at(order_id, now)?.is_none() {
                purged += 1;
            }
        }
        Ok(purged)
    }

    fn is_expired(&self, record: &PendingOrder, now: DateTime<Utc>) -> bool {
        now - record.staged_at > self.ttl
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::storage::MemoryStorage;
    use crate::models::{OrderType, PaymentMethod, PaymentStatus};
    use crate::services::NewOrderItem;
    use rust_decimal::Decimal;

    fn order() -> NewOrder {
        NewOrder {
            items: vec![NewOrderItem {
                menu_item_id: "2".to_string(),
                name: "Chicken Momos".to_string(),
                quantity: 1,
                price: Decimal::from(250),
                size: None,
            }],
            total: Decimal::from(250),
            customer_name: Some("Asha".to_string()),
            customer_email: Some("asha@example.com".to_string()),
            customer_phone: Some("9876543210".to_string()),
            delivery_address: None,
            order_type: OrderType::Pickup,
            payment_method: PaymentMethod::Paytm,
            payment_status: PaymentStatus::Pending,
            transaction_id: None,
            paytm_transaction_id: None,
            paytm_order_id: None,
        }
    }

    fn store() -> (PendingOrderStore, Arc<MemoryStorage>) {
        let storage = Arc::new(MemoryStorage::new());
        (
            PendingOrderStore::new(storage.clone(), Duration::minutes(30)),
            storage,
        )
    }

    #[test]
    fn staged_record_is_keyed_by_order_id() {
        let (store, storage) = store();
        store.stage("ORDER_1", &order()).unwrap();
        assert!(storage.get("pendingOrder:ORDER_1").unwrap().is_some());
        assert_eq!(store.load("ORDER_1").unwrap().unwrap().order, order());
        assert!(store.load("ORDER_2").unwrap().is_none());
    }

    #[test]
    fn expired_record_is_absent_and_purged() {
        let (store, storage) = store();
        let staged = Utc::now() - Duration::minutes(31);
        store.stage_at("ORDER_1", &order(), staged).unwrap();

        assert!(store
            .load_at("ORDER_1", staged + Duration::minutes(30))
            .unwrap()
            .is_some());
        assert!(store.load("ORDER_1").unwrap().is_none());
        assert!(storage.get("pendingOrder:ORDER_1").unwrap().is_none());
    }

    #[test]
    fn purge_only_touches_stale_records() {
        let (store, storage) = store();
        let now = Utc::now();
        store.stage_at("OLD", &order(), now - Duration::hours(2)).unwrap();
        store.stage_at("NEW", &order(), now).unwrap();
        storage.set("pendingOrder:BROKEN", "{").unwrap();
        storage.set("cart", "[]").unwrap();

        assert_eq!(store.purge_expired(now).unwrap(), 2);
        let mut keys = storage.keys().unwrap();
        keys.sort();
        assert_eq!(keys, vec!["cart".to_string(), "pendingOrder:NEW".to_string()]);
    }
}
