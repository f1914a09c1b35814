// ABOUTME: Message slice: ordered messages for one conversation at a time.
// ABOUTME: Each retarget bumps a generation; results tagged with an older generation are dropped.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::api::{CreateMessageRequest, Message, MessageApi};
use crate::flight::InFlight;

/// Local validation error for blank input.
pub const EMPTY_MESSAGE: &str = "Message cannot be empty or whitespace only";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageState {
    /// Chronological, in the order the server returned them.
    pub messages: Vec<Message>,
    pub is_loading: bool,
    pub is_sending: bool,
    pub error: Option<String>,
    /// Conversation the current messages belong to.
    pub conversation_id: Option<String>,
    /// Bumped on every retarget or clear.
    pub generation: u64,
}

/// Whether `content` is worth sending.
pub fn validate_message(content: &str) -> bool {
    !content.trim().is_empty()
}

pub struct MessageSlice {
    api: Arc<dyn MessageApi>,
    state: Mutex<MessageState>,
}

impl MessageSlice {
    pub fn new(api: Arc<dyn MessageApi>) -> Self {
        Self {
            api,
            state: Mutex::new(MessageState::default()),
        }
    }

    pub fn snapshot(&self) -> MessageState {
        self.lock_state().clone()
    }

    /// Retarget the slice at `conversation_id`: drop the current messages
    /// immediately and return the generation the follow-up fetch must carry.
    pub fn begin(&self, conversation_id: &str) -> u64 {
        let mut state = self.lock_state();
        state.generation += 1;
        state.conversation_id = Some(conversation_id.to_string());
        state.messages.clear();
        state.error = None;
        state.is_loading = true;
        state.generation
    }

    /// Drop all messages and detach from any conversation.
    pub fn clear(&self) {
        let mut state = self.lock_state();
        state.generation += 1;
        state.conversation_id = None;
        state.messages.clear();
        state.error = None;
        state.is_loading = false;
    }

    /// Load the full message list. The result is applied only if no
    /// retarget or clear happened since `generation` was issued. Messages
    /// appended by sends that completed meanwhile are kept after the
    /// fetched ones.
    pub async fn fetch(&self, conversation_id: &str, generation: u64) {
        let _flight = InFlight::begin(
            &self.state,
            move |s: &mut MessageState| {
                if s.generation == generation {
                    s.is_loading = true;
                }
            },
            move |s: &mut MessageState| {
                if s.generation == generation {
                    s.is_loading = false;
                }
            },
        );

        let result = self.api.list_messages(conversation_id).await;

        let mut state = self.lock_state();
        if state.generation != generation {
            tracing::debug!(conversation_id, "discarding superseded message fetch");
            return;
        }
        match result {
            Ok(fetched) => {
                let sent = std::mem::take(&mut state.messages);
                state.messages = merge_thread(fetched, sent);
            }
            Err(e) => {
                tracing::debug!(conversation_id, error = %e, "message fetch failed");
                state.error = Some(e.user_message());
            }
        }
    }

    /// Send `content` and append the returned user message and reply.
    ///
    /// Blank content is rejected locally without a request. Returns the new
    /// messages on success.
    pub async fn send(&self, conversation_id: &str, content: &str) -> Option<Vec<Message>> {
        if !validate_message(content) {
            self.lock_state().error = Some(EMPTY_MESSAGE.to_string());
            return None;
        }

        let generation = self.lock_state().generation;
        let _flight = InFlight::begin(
            &self.state,
            |s: &mut MessageState| {
                s.is_sending = true;
                s.error = None;
            },
            |s: &mut MessageState| s.is_sending = false,
        );

        let request = CreateMessageRequest {
            content: content.trim().to_string(),
        };
        match self.api.send_message(conversation_id, &request).await {
            Ok(new_messages) => {
                let mut state = self.lock_state();
                if state.generation == generation {
                    state.messages.extend(new_messages.iter().cloned());
                } else {
                    tracing::debug!(conversation_id, "conversation changed while sending");
                }
                Some(new_messages)
            }
            Err(e) => {
                tracing::debug!(conversation_id, error = %e, "send failed");
                let mut state = self.lock_state();
                if state.generation == generation {
                    state.error = Some(e.user_message());
                }
                None
            }
        }
    }

    pub fn clear_error(&self) {
        self.lock_state().error = None;
    }

    fn lock_state(&self) -> MutexGuard<'_, MessageState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Server snapshot followed by local messages it does not contain yet.
fn merge_thread(mut fetched: Vec<Message>, local: Vec<Message>) -> Vec<Message> {
    for message in local {
        if !fetched.iter().any(|m| m.id == message.id) {
            fetched.push(message);
        }
    }
    fetched
}
