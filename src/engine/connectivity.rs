use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::engine::observers::{Observers, Subscription};
use crate::models::connectivity::ConnectivityEvent;
use crate::observability::metrics::Metrics;

/// Mirrors platform reachability as a single offline flag.
pub struct ConnectivityObserver {
    offline: AtomicBool,
    // Keeps the flag and the notification order in step across concurrent reports.
    transitions: Mutex<()>,
    observers: Observers<bool>,
    metrics: Metrics,
}

impl ConnectivityObserver {
    pub fn new(metrics: Metrics) -> Self {
        Self {
            offline: AtomicBool::new(false),
            transitions: Mutex::new(()),
            observers: Observers::new(),
            metrics,
        }
    }

    pub fn is_offline(&self) -> bool {
        self.offline.load(Ordering::SeqCst)
    }

    /// Applies one platform report and returns the resulting flag.
    /// Subscribers hear about transitions only.
    pub fn handle_event(&self, event: ConnectivityEvent) -> bool {
        let offline = event.is_offline();
        let _transition = self
            .transitions
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let previous = self.offline.swap(offline, Ordering::SeqCst);

        if previous != offline {
            self.metrics.offline.set(i64::from(offline));
            info!(
                offline,
                connected = event.is_connected,
                reachable = ?event.is_internet_reachable,
                "connectivity changed"
            );
            self.observers.notify(&offline);
        }

        offline
    }

    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&bool) + Send + Sync + 'static,
    {
        self.observers.subscribe(callback)
    }

    /// Consumes platform events until the sender side closes or the listener is shut down.
    pub fn listen(
        self: Arc<Self>,
        mut events: mpsc::Receiver<ConnectivityEvent>,
    ) -> ConnectivityListener {
        let handle = tokio::spawn(async move {
            info!("connectivity listener started");

            while let Some(event) = events.recv().await {
                self.handle_event(event);
            }

            warn!("connectivity listener stopped: event channel closed");
        });

        ConnectivityListener { handle }
    }
}

/// Handle to the background task fed by the platform signal.
pub struct ConnectivityListener {
    handle: JoinHandle<()>,
}

impl ConnectivityListener {
    pub async fn shutdown(self) {
        self.handle.abort();
        if let Err(err) = self.handle.await {
            if !err.is_cancelled() {
                warn!(error = %err, "connectivity listener ended abnormally");
            }
        }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}
