use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use dashmap::DashMap;

type Callback<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// Callback registry shared by the repository and the connectivity observer.
pub struct Observers<T> {
    next_id: AtomicU64,
    callbacks: Arc<DashMap<u64, Callback<T>>>,
}

impl<T: 'static> Observers<T> {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            callbacks: Arc::new(DashMap::new()),
        }
    }

    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.callbacks.insert(id, Arc::new(callback));

        let registry: Weak<DashMap<u64, Callback<T>>> = Arc::downgrade(&self.callbacks);
        Subscription {
            dispose: Some(Box::new(move || {
                if let Some(callbacks) = registry.upgrade() {
                    callbacks.remove(&id);
                }
            })),
        }
    }

    pub fn notify(&self, value: &T) {
        // Collect first so a callback may unsubscribe without deadlocking the map.
        let callbacks: Vec<Callback<T>> = self
            .callbacks
            .iter()
            .map(|entry| entry.value().clone())
            .collect();

        for callback in callbacks {
            callback(value);
        }
    }

    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }
}

impl<T: 'static> Default for Observers<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Disposer returned by `subscribe`. Dropping it unsubscribes.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    dispose: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    pub fn unsubscribe(mut self) {
        self.dispose_now();
    }

    fn dispose_now(&mut self) {
        if let Some(dispose) = self.dispose.take() {
            dispose();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.dispose_now();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.dispose.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::Observers;

    #[test]
    fn notifies_until_unsubscribed() {
        let observers = Observers::<u32>::new();
        let seen = Arc::new(AtomicUsize::new(0));

        let counter = seen.clone();
        let subscription = observers.subscribe(move |value| {
            counter.fetch_add(*value as usize, Ordering::SeqCst);
        });

        observers.notify(&2);
        subscription.unsubscribe();
        observers.notify(&5);

        assert_eq!(seen.load(Ordering::SeqCst), 2);
        assert!(observers.is_empty());
    }

    #[test]
    fn dropping_the_subscription_disposes_it() {
        let observers = Observers::<()>::new();
        {
            let _first = observers.subscribe(|_| {});
            let _second = observers.subscribe(|_| {});
            assert_eq!(observers.len(), 2);
        }
        assert_eq!(observers.len(), 0);
    }

    #[test]
    fn subscription_outliving_registry_is_harmless() {
        let observers = Observers::<()>::new();
        let subscription = observers.subscribe(|_| {});
        drop(observers);
        subscription.unsubscribe();
    }
}
