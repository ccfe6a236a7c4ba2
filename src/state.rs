use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::mpsc;

use crate::engine::connectivity::ConnectivityObserver;
use crate::engine::remote::RemoteOrderSource;
use crate::engine::repository::OrderRepository;
use crate::engine::tracking::TrackingSimulation;
use crate::models::connectivity::ConnectivityEvent;
use crate::observability::metrics::Metrics;
use crate::storage::orders::OrderStorage;
use crate::storage::KeyValueStore;

/// Everything the HTTP surface needs, wired once at startup.
pub struct AppState {
    pub repository: Arc<OrderRepository>,
    pub connectivity: Arc<ConnectivityObserver>,
    pub connectivity_tx: mpsc::Sender<ConnectivityEvent>,
    pub tracking: TrackingSimulation,
    pub metrics: Metrics,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(
        backend: Arc<dyn KeyValueStore>,
        remote: Arc<dyn RemoteOrderSource>,
        refresh_min_visible: Duration,
        connectivity_buffer_size: usize,
    ) -> (Self, mpsc::Receiver<ConnectivityEvent>) {
        let metrics = Metrics::new();
        let (connectivity_tx, connectivity_rx) = mpsc::channel(connectivity_buffer_size);

        let connectivity = Arc::new(ConnectivityObserver::new(metrics.clone()));
        let repository = OrderRepository::new(
            OrderStorage::new(backend, metrics.clone()),
            remote,
            &connectivity,
            metrics.clone(),
        )
        .with_refresh_min_visible(refresh_min_visible);

        (
            Self {
                repository: Arc::new(repository),
                connectivity,
                connectivity_tx,
                tracking: TrackingSimulation::default(),
                metrics,
                started_at: Instant::now(),
            },
            connectivity_rx,
        )
    }
}
