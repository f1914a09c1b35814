// ABOUTME: Ordered listener registry shared by the session store and the conversation slice.
// ABOUTME: Listeners are keyed by subscriber id and notified in registration order.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError, Weak};

/// Callback invoked with the new value on every change.
pub type Listener<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// Identifier handed out to each subscriber. Ids increase monotonically, so
/// iteration order over the registry is registration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ListenerId(u64);

struct Registry<T> {
    next_id: u64,
    entries: BTreeMap<ListenerId, Listener<T>>,
}

/// A set of listeners for values of type `T`.
pub struct Listeners<T> {
    registry: Mutex<Registry<T>>,
}

impl<T: 'static> Listeners<T> {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            registry: Mutex::new(Registry {
                next_id: 0,
                entries: BTreeMap::new(),
            }),
        })
    }

    /// Register a listener. The returned subscription removes it again.
    pub fn subscribe(self: &Arc<Self>, listener: Listener<T>) -> Subscription<T> {
        let mut registry = self.registry.lock().unwrap_or_else(PoisonError::into_inner);
        let id = ListenerId(registry.next_id);
        registry.next_id += 1;
        registry.entries.insert(id, listener);
        Subscription {
            id,
            registry: Arc::downgrade(self),
        }
    }

    /// Remove a listener. Returns false if it was already gone.
    pub fn remove(&self, id: ListenerId) -> bool {
        let mut registry = self.registry.lock().unwrap_or_else(PoisonError::into_inner);
        registry.entries.remove(&id).is_some()
    }

    /// Number of registered listeners.
    pub fn len(&self) -> usize {
        self.registry
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Invoke every listener with `value`, in registration order.
    ///
    /// The registry lock is released before any listener runs, so listeners
    /// may subscribe, unsubscribe, or trigger further notifications.
    pub fn notify(&self, value: &T) {
        let listeners: Vec<Listener<T>> = {
            let registry = self.registry.lock().unwrap_or_else(PoisonError::into_inner);
            registry.entries.values().cloned().collect()
        };
        for listener in listeners {
            listener(value);
        }
    }
}

/// Handle returned from [`Listeners::subscribe`].
///
/// Dropping the handle does not unsubscribe; call [`Subscription::unsubscribe`].
pub struct Subscription<T> {
    id: ListenerId,
    registry: Weak<Listeners<T>>,
}

impl<T: 'static> Subscription<T> {
    pub fn id(&self) -> ListenerId {
        self.id
    }

    /// Deregister the listener. Calling this more than once is a no-op.
    pub fn unsubscribe(&self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.remove(self.id);
        }
    }
}
