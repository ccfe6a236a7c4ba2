use std::sync::Arc;

use tracing::{debug, error, warn};

use crate::error::StorageError;
use crate::models::order::Order;
use crate::observability::metrics::Metrics;
use crate::storage::KeyValueStore;

pub const LOCAL_ORDERS_KEY: &str = "local_orders";

/// Persists the locally created orders under a single fixed key.
///
/// Callers pass the already-filtered local subset; nothing here checks `is_local`.
#[derive(Clone)]
pub struct OrderStorage {
    backend: Arc<dyn KeyValueStore>,
    metrics: Metrics,
}

impl OrderStorage {
    pub fn new(backend: Arc<dyn KeyValueStore>, metrics: Metrics) -> Self {
        Self { backend, metrics }
    }

    /// Writes `orders`. Failures are logged and returned, never raised further.
    pub async fn save(&self, orders: &[Order]) -> Result<(), StorageError> {
        let result = match serde_json::to_string(orders) {
            Ok(encoded) => self.backend.set(LOCAL_ORDERS_KEY, encoded).await,
            Err(source) => Err(StorageError::Encode {
                key: LOCAL_ORDERS_KEY.to_string(),
                source,
            }),
        };

        match &result {
            Ok(()) => debug!(count = orders.len(), "local orders saved"),
            Err(err) => {
                self.metrics
                    .storage_failures_total
                    .with_label_values(&["save"])
                    .inc();
                error!(error = %err, count = orders.len(), "failed to save local orders");
            }
        }

        result
    }

    /// Reads the stored orders. An absent key is an empty list, not an error.
    pub async fn load(&self) -> Result<Vec<Order>, StorageError> {
        let Some(raw) = self.backend.get(LOCAL_ORDERS_KEY).await? else {
            return Ok(Vec::new());
        };

        serde_json::from_str(&raw).map_err(|source| StorageError::Corrupt {
            key: LOCAL_ORDERS_KEY.to_string(),
            source,
        })
    }

    /// Like [`OrderStorage::load`], but any failure yields an empty list.
    pub async fn load_or_default(&self) -> Vec<Order> {
        match self.load().await {
            Ok(orders) => orders,
            Err(err) => {
                self.metrics
                    .storage_failures_total
                    .with_label_values(&["load"])
                    .inc();
                warn!(error = %err, "no local orders recoverable; starting empty");
                Vec::new()
            }
        }
    }
}
