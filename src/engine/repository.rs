use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex as StdMutex, PoisonError};
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{watch, Mutex};
use tokio::time::sleep;
use tracing::{info, warn};

use crate::config::REFRESH_MIN_VISIBLE;
use crate::engine::connectivity::ConnectivityObserver;
use crate::engine::ids::LocalIdGenerator;
use crate::engine::merge::{local_subset, merge_orders};
use crate::engine::observers::{Observers, Subscription};
use crate::engine::remote::RemoteOrderSource;
use crate::models::order::{NewOrderRequest, Order};
use crate::models::snapshot::OrderSnapshot;
use crate::observability::metrics::Metrics;
use crate::storage::orders::OrderStorage;

/// Holds the published snapshot and fans each replacement out to observers.
struct Publisher {
    state: watch::Sender<Arc<OrderSnapshot>>,
    observers: Observers<Arc<OrderSnapshot>>,
    refreshes_in_flight: AtomicUsize,
    // Observers see publishes in the same order as the watch channel.
    publishing: StdMutex<()>,
    metrics: Metrics,
}

impl Publisher {
    fn publish<F>(&self, next: F) -> Arc<OrderSnapshot>
    where
        F: FnOnce(&OrderSnapshot) -> OrderSnapshot,
    {
        let _order = self
            .publishing
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let mut published = None;
        self.state.send_modify(|current| {
            let mut snapshot = next(current);
            snapshot.refreshing = self.refreshes_in_flight.load(Ordering::SeqCst) > 0;
            let snapshot = Arc::new(snapshot);
            published = Some(snapshot.clone());
            *current = snapshot;
        });
        let published = published.unwrap_or_else(|| self.state.borrow().clone());

        self.record(&published);
        self.observers.notify(&published);
        published
    }

    fn record(&self, snapshot: &OrderSnapshot) {
        let local = snapshot.pending_local_count();
        self.metrics
            .orders_published
            .with_label_values(&["local"])
            .set(local as i64);
        self.metrics
            .orders_published
            .with_label_values(&["remote"])
            .set((snapshot.orders.len() - local) as i64);
    }
}

/// Counts one refresh as in flight until finished or dropped.
struct RefreshInFlight {
    publisher: Arc<Publisher>,
    finished: bool,
}

impl RefreshInFlight {
    fn begin(publisher: &Arc<Publisher>) -> Self {
        publisher.refreshes_in_flight.fetch_add(1, Ordering::SeqCst);
        Self {
            publisher: publisher.clone(),
            finished: false,
        }
    }

    fn finish(mut self) -> Arc<OrderSnapshot> {
        self.finished = true;
        self.settle()
    }

    fn settle(&self) -> Arc<OrderSnapshot> {
        self.publisher
            .refreshes_in_flight
            .fetch_sub(1, Ordering::SeqCst);
        self.publisher.publish(|current| current.clone())
    }
}

impl Drop for RefreshInFlight {
    fn drop(&mut self) {
        if !self.finished {
            warn!("refresh abandoned before completing; clearing refreshing flag");
            self.settle();
        }
    }
}

/// In-memory source of truth for the order list of the running session.
pub struct OrderRepository {
    storage: OrderStorage,
    remote: Arc<dyn RemoteOrderSource>,
    ids: LocalIdGenerator,
    publisher: Arc<Publisher>,
    writes: Mutex<()>,
    refresh_min_visible: Duration,
    _connectivity: Subscription,
}

impl OrderRepository {
    pub fn new(
        storage: OrderStorage,
        remote: Arc<dyn RemoteOrderSource>,
        connectivity: &ConnectivityObserver,
        metrics: Metrics,
    ) -> Self {
        let initial = OrderSnapshot {
            is_offline: connectivity.is_offline(),
            ..OrderSnapshot::default()
        };
        let (state, _unused_rx) = watch::channel(Arc::new(initial));

        let publisher = Arc::new(Publisher {
            state,
            observers: Observers::new(),
            refreshes_in_flight: AtomicUsize::new(0),
            publishing: StdMutex::new(()),
            metrics,
        });

        let weak = Arc::downgrade(&publisher);
        let subscription = connectivity.subscribe(move |offline| {
            if let Some(publisher) = weak.upgrade() {
                let offline = *offline;
                publisher.publish(|current| OrderSnapshot {
                    is_offline: offline,
                    ..current.clone()
                });
            }
        });

        Self {
            storage,
            remote,
            ids: LocalIdGenerator::new(),
            publisher,
            writes: Mutex::new(()),
            refresh_min_visible: REFRESH_MIN_VISIBLE,
            _connectivity: subscription,
        }
    }

    pub fn with_refresh_min_visible(mut self, duration: Duration) -> Self {
        self.refresh_min_visible = duration;
        self
    }

    pub fn with_id_generator(mut self, ids: LocalIdGenerator) -> Self {
        self.ids = ids;
        self
    }

    /// Loads persisted local orders and publishes them merged with the remote set.
    /// Unreadable storage means starting with no local orders.
    pub async fn initialize(&self) -> Arc<OrderSnapshot> {
        let _guard = self.writes.lock().await;

        let mut local = self.storage.load_or_default().await;
        let stored = local.len();
        local.retain(|order| order.is_local && order.has_local_id());
        if local.len() != stored {
            warn!(
                dropped = stored - local.len(),
                "ignoring entries in local storage that are not locally created orders"
            );
        }

        let remote = self.remote.fetch();
        let snapshot = self.publisher.publish(|current| OrderSnapshot {
            orders: merge_orders(local, remote),
            ..current.clone()
        });

        info!(
            total = snapshot.orders.len(),
            local = snapshot.pending_local_count(),
            "order repository initialized"
        );
        snapshot
    }

    /// Records a new on-device request. The in-memory list is published before the
    /// local subset is written, and a failed write only costs durability.
    pub async fn add_request(&self, request: NewOrderRequest) -> Order {
        let _guard = self.writes.lock().await;

        let id = self.unused_local_id();
        let order = request.into_local_order(id, Utc::now());

        let snapshot = self.publisher.publish(|current| {
            let mut orders = Vec::with_capacity(current.orders.len() + 1);
            orders.push(order.clone());
            orders.extend(current.orders.iter().cloned());
            OrderSnapshot {
                orders: merge_orders(orders, Vec::new()),
                ..current.clone()
            }
        });
        self.publisher.metrics.requests_created_total.inc();
        info!(order_id = %order.id, offline = snapshot.is_offline, "delivery request created");

        // Failures are logged and counted by the storage layer.
        let _ = self.storage.save(&local_subset(&snapshot.orders)).await;

        order
    }

    /// Re-derives the list from the current local orders and a fresh remote read.
    /// `refreshing` stays raised for at least the configured visible duration, and is
    /// lowered again even if the caller stops awaiting midway.
    pub async fn refresh(&self) -> Arc<OrderSnapshot> {
        let in_flight = RefreshInFlight::begin(&self.publisher);
        self.publisher.metrics.refreshes_total.inc();

        let remote = self.remote.fetch();
        let refreshed = self.publisher.publish(|current| OrderSnapshot {
            orders: merge_orders(local_subset(&current.orders), remote),
            ..current.clone()
        });

        sleep(self.refresh_min_visible).await;

        info!(total = refreshed.orders.len(), "orders refreshed");
        in_flight.finish()
    }

    pub fn snapshot(&self) -> Arc<OrderSnapshot> {
        self.publisher.state.borrow().clone()
    }

    pub fn local_orders(&self) -> Vec<Order> {
        local_subset(&self.snapshot().orders)
    }

    /// Registers `callback` for every publish. Drop the returned handle to unsubscribe.
    /// Callbacks run inside the publish and must not trigger another one synchronously.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&Arc<OrderSnapshot>) + Send + Sync + 'static,
    {
        self.publisher.observers.subscribe(callback)
    }

    /// Stream-style access for consumers that prefer polling the latest value.
    pub fn watch(&self) -> watch::Receiver<Arc<OrderSnapshot>> {
        self.publisher.state.subscribe()
    }

    fn unused_local_id(&self) -> String {
        let snapshot = self.snapshot();
        let taken: HashSet<&str> = snapshot.orders.iter().map(|o| o.id.as_str()).collect();

        loop {
            let id = self.ids.next_id();
            if !taken.contains(id.as_str()) {
                return id;
            }
            warn!(order_id = %id, "local id already in use; drawing another");
        }
    }
}
