// ABOUTME: Chat coordinator: reacts to selection changes by clearing and refetching messages.
// ABOUTME: Exposes merged loading and error signals over the two feature slices.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::task::JoinHandle;

use crate::api::{Conversation, ConversationApi, Message, MessageApi, PaginationMeta};
use crate::conversations::{ConversationSlice, DEFAULT_PAGE_SIZE, SelectionSubscription};
use crate::messages::MessageSlice;

type PendingFetches = Arc<Mutex<Vec<JoinHandle<()>>>>;

/// Merged read model for the chat screen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatView {
    pub conversations: Vec<Conversation>,
    pub pagination: Option<PaginationMeta>,
    pub active_conversation: Option<Conversation>,
    pub active_conversation_id: Option<String>,
    pub messages: Vec<Message>,
    pub is_loading: bool,
    pub is_loading_conversations: bool,
    pub is_loading_messages: bool,
    pub is_sending: bool,
    /// The message error when present, otherwise the conversation error.
    pub error: Option<String>,
    pub conversations_error: Option<String>,
    pub messages_error: Option<String>,
}

/// Orchestrates the conversation slice and the message slice.
///
/// On construction the coordinator subscribes to selection changes: a new
/// active id clears the thread synchronously and spawns a fetch; a cleared
/// selection clears the thread. Fetches run on the ambient tokio runtime,
/// or on a private one when the selection changes outside any runtime.
/// [`ChatCoordinator::settle`] only waits for fetches on the ambient runtime.
pub struct ChatCoordinator {
    conversations: Arc<ConversationSlice>,
    messages: Arc<MessageSlice>,
    pending: PendingFetches,
    selection: SelectionSubscription,
    page_size: u32,
}

impl ChatCoordinator {
    pub fn new(conversations: Arc<ConversationSlice>, messages: Arc<MessageSlice>) -> Self {
        let pending: PendingFetches = Arc::new(Mutex::new(Vec::new()));
        let selection = {
            let messages = Arc::clone(&messages);
            let pending = Arc::clone(&pending);
            conversations.subscribe_selection(move |id: &Option<String>| {
                follow_selection(&messages, &pending, id.as_deref());
            })
        };
        Self {
            conversations,
            messages,
            pending,
            selection,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Build both slices over one API implementation.
    pub fn from_api<A>(api: Arc<A>) -> Self
    where
        A: ConversationApi + MessageApi + 'static,
    {
        let conversations = Arc::new(ConversationSlice::new(api.clone()));
        let messages = Arc::new(MessageSlice::new(api));
        Self::new(conversations, messages)
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Initial load of the first page of conversations.
    pub async fn load(&self) {
        self.fetch_conversations(0, self.page_size).await;
    }

    pub async fn fetch_conversations(&self, page: u32, limit: u32) {
        self.conversations.fetch(page, limit).await;
    }

    /// Create a conversation and make it active.
    pub async fn create_conversation(&self, title: Option<String>) -> Option<Conversation> {
        self.conversations.create(title).await
    }

    pub fn select_conversation(&self, id: &str) {
        self.conversations.select(Some(id.to_string()));
    }

    /// Leave the active conversation without deleting it.
    pub fn close_conversation(&self) {
        self.conversations.select(None);
    }

    pub async fn delete_conversation(&self, id: &str) -> bool {
        self.conversations.delete(id).await
    }

    pub async fn rename_conversation(&self, id: &str, title: &str) -> Option<Conversation> {
        self.conversations.rename(id, title).await
    }

    /// Send `content` to the active conversation. Does nothing when no
    /// conversation is active.
    pub async fn send_message(&self, content: &str) -> Option<Vec<Message>> {
        let id = self.conversations.active_id()?;
        self.messages.send(&id, content).await
    }

    pub fn clear_conversations_error(&self) {
        self.conversations.clear_error();
    }

    pub fn clear_messages_error(&self) {
        self.messages.clear_error();
    }

    pub fn clear_all_errors(&self) {
        self.clear_conversations_error();
        self.clear_messages_error();
    }

    /// Wait until every message fetch spawned so far, including ones
    /// spawned while waiting, has finished.
    pub async fn settle(&self) {
        loop {
            let handles = std::mem::take(&mut *lock_pending(&self.pending));
            if handles.is_empty() {
                break;
            }
            for result in futures::future::join_all(handles).await {
                if let Err(e) = result {
                    tracing::warn!(error = %e, "message fetch task failed");
                }
            }
        }
    }

    pub fn snapshot(&self) -> ChatView {
        let conversations = self.conversations.snapshot();
        let messages = self.messages.snapshot();
        ChatView {
            active_conversation: conversations.active_conversation().cloned(),
            active_conversation_id: conversations.active_id,
            pagination: conversations.pagination,
            conversations: conversations.conversations,
            messages: messages.messages,
            is_loading: conversations.is_loading || messages.is_loading,
            is_loading_conversations: conversations.is_loading,
            is_loading_messages: messages.is_loading,
            is_sending: messages.is_sending,
            error: messages.error.clone().or_else(|| conversations.error.clone()),
            conversations_error: conversations.error,
            messages_error: messages.error,
        }
    }
}

impl Drop for ChatCoordinator {
    fn drop(&mut self) {
        self.selection.unsubscribe();
    }
}

/// Keep the message slice on the newly selected conversation.
fn follow_selection(messages: &Arc<MessageSlice>, pending: &PendingFetches, id: Option<&str>) {
    let Some(id) = id else {
        messages.clear();
        return;
    };

    let generation = messages.begin(id);
    let slice = Arc::clone(messages);
    let conversation_id = id.to_string();
    let fetch = async move {
        slice.fetch(&conversation_id, generation).await;
    };

    match tokio::runtime::Handle::try_current() {
        Ok(runtime) => {
            let handle = runtime.spawn(fetch);
            let mut pending = lock_pending(pending);
            pending.retain(|h| !h.is_finished());
            pending.push(handle);
        }
        Err(_) => {
            // No ambient runtime: run the fetch on a private one.
            std::thread::spawn(move || {
                match tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                {
                    Ok(runtime) => runtime.block_on(fetch),
                    Err(e) => tracing::warn!(error = %e, "cannot start runtime for message fetch"),
                }
            });
        }
    }
}

fn lock_pending(pending: &PendingFetches) -> MutexGuard<'_, Vec<JoinHandle<()>>> {
    pending.lock().unwrap_or_else(PoisonError::into_inner)
}
