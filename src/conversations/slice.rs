// ABOUTME: Conversation slice: list/create/rename/delete over the conversation API.
// ABOUTME: Owns the active conversation id and notifies listeners when it changes.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::api::{
    ApiError, Conversation, ConversationApi, CreateConversationRequest, PaginationMeta,
    UpdateConversationRequest,
};
use crate::flight::InFlight;
use crate::observe::{Listeners, Subscription};

/// Handle returned by [`ConversationSlice::subscribe_selection`].
pub type SelectionSubscription = Subscription<Option<String>>;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversationState {
    /// Most recent first.
    pub conversations: Vec<Conversation>,
    pub pagination: Option<PaginationMeta>,
    pub active_id: Option<String>,
    /// True while any request is outstanding.
    pub is_loading: bool,
    /// Outstanding requests; overlapping operations each hold one.
    pub in_flight: usize,
    pub error: Option<String>,
}

impl ConversationState {
    /// The active conversation, if it is present in the loaded list.
    pub fn active_conversation(&self) -> Option<&Conversation> {
        let id = self.active_id.as_deref()?;
        self.conversations.iter().find(|c| c.id == id)
    }
}

pub struct ConversationSlice {
    api: Arc<dyn ConversationApi>,
    state: Mutex<ConversationState>,
    selection: Arc<Listeners<Option<String>>>,
}

impl ConversationSlice {
    pub fn new(api: Arc<dyn ConversationApi>) -> Self {
        Self {
            api,
            state: Mutex::new(ConversationState::default()),
            selection: Listeners::new(),
        }
    }

    pub fn snapshot(&self) -> ConversationState {
        self.lock_state().clone()
    }

    pub fn active_id(&self) -> Option<String> {
        self.lock_state().active_id.clone()
    }

    /// Register a listener for changes of the active conversation id.
    /// Listeners run synchronously, in registration order, only when the
    /// id actually changes.
    pub fn subscribe_selection<F>(&self, listener: F) -> SelectionSubscription
    where
        F: Fn(&Option<String>) + Send + Sync + 'static,
    {
        self.selection.subscribe(Arc::new(listener))
    }

    /// Replace the list with one page from the server.
    pub async fn fetch(&self, page: u32, limit: u32) {
        let _flight = self.begin();
        match self.api.list_conversations(page, limit).await {
            Ok(response) => {
                let mut state = self.lock_state();
                state.conversations = response.data;
                state.pagination = Some(response.meta);
            }
            Err(e) => self.record_error(&e),
        }
    }

    /// Create a conversation, put it at the head of the list and make it
    /// active.
    pub async fn create(&self, title: Option<String>) -> Option<Conversation> {
        let _flight = self.begin();
        let request = CreateConversationRequest { title };
        match self.api.create_conversation(&request).await {
            Ok(conversation) => {
                let changed = {
                    let mut state = self.lock_state();
                    state.conversations.insert(0, conversation.clone());
                    replace_active(&mut state, Some(conversation.id.clone()))
                };
                if changed {
                    self.selection.notify(&Some(conversation.id.clone()));
                }
                Some(conversation)
            }
            Err(e) => {
                self.record_error(&e);
                None
            }
        }
    }

    /// Rename a conversation in place. Selection is untouched.
    pub async fn rename(&self, id: &str, title: &str) -> Option<Conversation> {
        let _flight = self.begin();
        let request = UpdateConversationRequest {
            title: title.to_string(),
        };
        match self.api.rename_conversation(id, &request).await {
            Ok(updated) => {
                let mut state = self.lock_state();
                if let Some(entry) = state.conversations.iter_mut().find(|c| c.id == id) {
                    *entry = updated.clone();
                }
                Some(updated)
            }
            Err(e) => {
                self.record_error(&e);
                None
            }
        }
    }

    /// Delete a conversation. Deleting the active one clears the selection.
    /// On failure the list and selection are left as they were.
    pub async fn delete(&self, id: &str) -> bool {
        let _flight = self.begin();
        match self.api.delete_conversation(id).await {
            Ok(()) => {
                let changed = {
                    let mut state = self.lock_state();
                    state.conversations.retain(|c| c.id != id);
                    if state.active_id.as_deref() == Some(id) {
                        replace_active(&mut state, None)
                    } else {
                        false
                    }
                };
                if changed {
                    self.selection.notify(&None);
                }
                true
            }
            Err(e) => {
                self.record_error(&e);
                false
            }
        }
    }

    /// Make `id` the active conversation, or clear the selection with `None`.
    pub fn select(&self, id: Option<String>) {
        let changed = replace_active(&mut self.lock_state(), id.clone());
        if changed {
            tracing::debug!(conversation_id = ?id, "selection changed");
            self.selection.notify(&id);
        }
    }

    pub fn clear_error(&self) {
        self.lock_state().error = None;
    }

    fn begin(&self) -> InFlight<'_, ConversationState, impl FnMut(&mut ConversationState)> {
        InFlight::begin(
            &self.state,
            |s: &mut ConversationState| {
                s.in_flight += 1;
                s.is_loading = true;
                s.error = None;
            },
            |s: &mut ConversationState| {
                s.in_flight = s.in_flight.saturating_sub(1);
                s.is_loading = s.in_flight > 0;
            },
        )
    }

    fn record_error(&self, error: &ApiError) {
        tracing::debug!(error = %error, "conversation request failed");
        self.lock_state().error = Some(error.user_message());
    }

    fn lock_state(&self) -> MutexGuard<'_, ConversationState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Set the active id; returns whether it changed.
fn replace_active(state: &mut ConversationState, id: Option<String>) -> bool {
    if state.active_id == id {
        return false;
    }
    state.active_id = id;
    true
}
