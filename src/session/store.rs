// ABOUTME: Session store: single source of truth for auth state across the client.
// ABOUTME: Stable snapshots, ordered synchronous notification, and one-time hydration from storage.

use std::sync::{Arc, Mutex, PoisonError};

use crate::observe::{Listeners, Subscription};
use crate::storage::{KeyValueStore, TOKEN_KEY, USER_KEY};

use super::types::{Session, User};

/// Handle returned by [`SessionStore::subscribe`].
pub type SessionSubscription = Subscription<Arc<Session>>;

struct StoreState {
    snapshot: Arc<Session>,
    hydrated: bool,
}

/// Process-wide authentication store.
///
/// Construct once with [`SessionStore::new`] and share the returned `Arc`
/// with every consumer. Each mutation replaces the snapshot wholesale; reads
/// between mutations return the same `Arc`, so `Arc::ptr_eq` is a valid
/// change check.
pub struct SessionStore {
    state: Mutex<StoreState>,
    listeners: Arc<Listeners<Arc<Session>>>,
    storage: Option<Arc<dyn KeyValueStore>>,
}

impl SessionStore {
    /// Create a store backed by durable storage. Hydration happens on the
    /// first subscription.
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Arc<Self> {
        Self::build(Some(storage))
    }

    /// Create a store with no durable storage. It never hydrates and stays
    /// loading until the first `set_auth` or `clear_auth`.
    pub fn without_storage() -> Arc<Self> {
        Self::build(None)
    }

    fn build(storage: Option<Arc<dyn KeyValueStore>>) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(StoreState {
                snapshot: Arc::new(Session::unloaded()),
                hydrated: false,
            }),
            listeners: Listeners::new(),
            storage,
        })
    }

    /// Register a listener invoked with the new snapshot on every change.
    ///
    /// The first subscription of the store's lifetime hydrates the state from
    /// storage; the resulting notification is delivered on a later scheduling
    /// turn, never from inside this call.
    pub fn subscribe<F>(self: &Arc<Self>, listener: F) -> SessionSubscription
    where
        F: Fn(&Arc<Session>) + Send + Sync + 'static,
    {
        let subscription = self.listeners.subscribe(Arc::new(listener));

        let hydrated_now = {
            let mut state = self.lock_state();
            match (&self.storage, state.hydrated) {
                (Some(storage), false) => {
                    state.hydrated = true;
                    state.snapshot = Arc::new(hydrate(storage.as_ref()));
                    true
                }
                _ => false,
            }
        };

        if hydrated_now {
            self.schedule_notify();
        }

        subscription
    }

    /// Current state. Stable between mutations.
    pub fn snapshot(&self) -> Arc<Session> {
        self.lock_state().snapshot.clone()
    }

    pub fn token(&self) -> Option<String> {
        self.snapshot().token.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.snapshot().is_authenticated()
    }

    /// Number of registered listeners.
    pub fn subscriber_count(&self) -> usize {
        self.listeners.len()
    }

    /// Store a freshly authenticated identity, persist it, and notify.
    pub fn set_auth(&self, user: User, token: impl Into<String>) {
        let token = token.into();
        if let Some(storage) = &self.storage {
            persist_auth(storage.as_ref(), &user, &token);
        }
        tracing::debug!(user_id = %user.id, "session authenticated");
        self.replace(Session::authenticated(user, token));
    }

    /// Forget the current identity, erase it from storage, and notify.
    pub fn clear_auth(&self) {
        if let Some(storage) = &self.storage {
            erase_auth(storage.as_ref());
        }
        tracing::debug!("session cleared");
        self.replace(Session::signed_out());
    }

    fn replace(&self, session: Session) {
        let snapshot = Arc::new(session);
        self.lock_state().snapshot = snapshot.clone();
        self.listeners.notify(&snapshot);
    }

    fn schedule_notify(self: &Arc<Self>) {
        let store = Arc::clone(self);
        let deliver = move || {
            let snapshot = store.snapshot();
            store.listeners.notify(&snapshot);
        };
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move { deliver() });
            }
            Err(_) => {
                std::thread::spawn(deliver);
            }
        }
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Restore the session from storage. Corrupted user records are erased.
fn hydrate(storage: &dyn KeyValueStore) -> Session {
    let token = read_key(storage, TOKEN_KEY);
    let user = read_key(storage, USER_KEY);

    let (Some(token), Some(user)) = (token, user) else {
        return Session::signed_out();
    };

    match serde_json::from_str::<User>(&user) {
        Ok(user) => {
            tracing::debug!(user_id = %user.id, "session hydrated from storage");
            Session::authenticated(user, token)
        }
        Err(e) => {
            tracing::debug!(error = %e, "stored user record is corrupted, clearing session");
            erase_auth(storage);
            Session::signed_out()
        }
    }
}

fn read_key(storage: &dyn KeyValueStore, key: &str) -> Option<String> {
    match storage.get(key) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(key, error = %e, "failed to read session storage");
            None
        }
    }
}

fn persist_auth(storage: &dyn KeyValueStore, user: &User, token: &str) {
    if let Err(e) = storage.set(TOKEN_KEY, token) {
        tracing::warn!(error = %e, "failed to persist session token");
    }
    match serde_json::to_string(user) {
        Ok(json) => {
            if let Err(e) = storage.set(USER_KEY, &json) {
                tracing::warn!(error = %e, "failed to persist session user");
            }
        }
        Err(e) => tracing::warn!(error = %e, "failed to serialize session user"),
    }
}

fn erase_auth(storage: &dyn KeyValueStore) {
    for key in [TOKEN_KEY, USER_KEY] {
        if let Err(e) = storage.remove(key) {
            tracing::warn!(key, error = %e, "failed to erase session storage");
        }
    }
}
