// ABOUTME: Shared fixtures for integration tests: an in-memory chat API with call
// ABOUTME: counters, injectable failures, and per-conversation gates for message fetches.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Semaphore;

use parley::api::{
    ApiError, Conversation, ConversationApi, CreateConversationRequest, CreateMessageRequest,
    Message, MessageApi, MessageRole, Page, PaginationMeta, UpdateConversationRequest,
};

pub fn conversation(id: &str, title: &str) -> Conversation {
    Conversation {
        id: id.to_string(),
        title: Some(title.to_string()),
        created_at: "2024-01-01T00:00:00Z".to_string(),
        updated_at: "2024-01-01T00:00:00Z".to_string(),
        message_count: 0,
    }
}

pub fn message(id: &str, role: MessageRole, content: &str) -> Message {
    Message {
        id: id.to_string(),
        content: content.to_string(),
        role,
        created_at: "2024-01-01T00:00:00Z".to_string(),
    }
}

/// In-memory stand-in for the REST API.
#[derive(Default)]
pub struct MockChatApi {
    conversations: Mutex<Vec<Conversation>>,
    threads: Mutex<HashMap<String, Vec<Message>>>,
    gates: Mutex<HashMap<String, Arc<Semaphore>>>,
    failing_threads: Mutex<HashSet<String>>,
    fail_list: AtomicBool,
    fail_delete: AtomicBool,
    next_id: AtomicUsize,
    pub list_calls: AtomicUsize,
    pub message_fetches: Mutex<Vec<String>>,
    pub send_calls: AtomicUsize,
    pub delete_calls: AtomicUsize,
}

impl MockChatApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Seed conversations, most recent first.
    pub fn with_conversations(conversations: Vec<Conversation>) -> Arc<Self> {
        let api = Self::default();
        *api.conversations.lock().unwrap() = conversations;
        Arc::new(api)
    }

    pub fn set_thread(&self, conversation_id: &str, messages: Vec<Message>) {
        self.threads
            .lock()
            .unwrap()
            .insert(conversation_id.to_string(), messages);
    }

    /// Hold message fetches for `conversation_id` until [`release`] is called.
    pub fn gate(&self, conversation_id: &str) {
        self.gates
            .lock()
            .unwrap()
            .insert(conversation_id.to_string(), Arc::new(Semaphore::new(0)));
    }

    pub fn release(&self, conversation_id: &str) {
        if let Some(gate) = self.gates.lock().unwrap().get(conversation_id) {
            gate.add_permits(1);
        }
    }

    pub fn fail_thread(&self, conversation_id: &str) {
        self.failing_threads
            .lock()
            .unwrap()
            .insert(conversation_id.to_string());
    }

    pub fn fail_list(&self, fail: bool) {
        self.fail_list.store(fail, Ordering::SeqCst);
    }

    pub fn fail_delete(&self, fail: bool) {
        self.fail_delete.store(fail, Ordering::SeqCst);
    }

    pub fn fetched(&self) -> Vec<String> {
        self.message_fetches.lock().unwrap().clone()
    }

    pub fn sends(&self) -> usize {
        self.send_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ConversationApi for MockChatApi {
    async fn list_conversations(
        &self,
        page: u32,
        limit: u32,
    ) -> Result<Page<Conversation>, ApiError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_list.load(Ordering::SeqCst) {
            return Err(ApiError::with_message(500, "Could not load conversations"));
        }
        let all = self.conversations.lock().unwrap().clone();
        let total = all.len() as u64;
        let data: Vec<Conversation> = all
            .into_iter()
            .skip((page * limit) as usize)
            .take(limit as usize)
            .collect();
        let total_pages = total.div_ceil(u64::from(limit.max(1))) as u32;
        Ok(Page {
            data,
            meta: PaginationMeta {
                total,
                page,
                limit,
                total_pages,
            },
        })
    }

    async fn create_conversation(
        &self,
        request: &CreateConversationRequest,
    ) -> Result<Conversation, ApiError> {
        let n = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let mut created = conversation(&format!("c{n}"), "");
        created.title = request.title.clone();
        self.conversations.lock().unwrap().insert(0, created.clone());
        Ok(created)
    }

    async fn rename_conversation(
        &self,
        id: &str,
        request: &UpdateConversationRequest,
    ) -> Result<Conversation, ApiError> {
        let mut conversations = self.conversations.lock().unwrap();
        match conversations.iter_mut().find(|c| c.id == id) {
            Some(c) => {
                c.title = Some(request.title.clone());
                Ok(c.clone())
            }
            None => Err(ApiError::with_message(404, "Conversation not found")),
        }
    }

    async fn delete_conversation(&self, id: &str) -> Result<(), ApiError> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(ApiError::with_message(500, "Delete failed"));
        }
        self.conversations.lock().unwrap().retain(|c| c.id != id);
        Ok(())
    }
}

#[async_trait]
impl MessageApi for MockChatApi {
    async fn list_messages(&self, conversation_id: &str) -> Result<Vec<Message>, ApiError> {
        self.message_fetches
            .lock()
            .unwrap()
            .push(conversation_id.to_string());

        // The server answers with the thread as it was when the request arrived.
        let snapshot = self
            .threads
            .lock()
            .unwrap()
            .get(conversation_id)
            .cloned()
            .unwrap_or_default();

        let gate = self.gates.lock().unwrap().get(conversation_id).cloned();
        if let Some(gate) = gate {
            let _permit = gate.acquire().await.unwrap();
        }

        if self.failing_threads.lock().unwrap().contains(conversation_id) {
            return Err(ApiError::with_message(404, "Conversation not found"));
        }
        Ok(snapshot)
    }

    async fn send_message(
        &self,
        conversation_id: &str,
        request: &CreateMessageRequest,
    ) -> Result<Vec<Message>, ApiError> {
        let n = self.send_calls.fetch_add(1, Ordering::SeqCst) + 1;
        let reply = vec![
            message(&format!("u{n}"), MessageRole::User, &request.content),
            message(
                &format!("a{n}"),
                MessageRole::Assistant,
                &format!("echo: {}", request.content),
            ),
        ];
        self.threads
            .lock()
            .unwrap()
            .entry(conversation_id.to_string())
            .or_default()
            .extend(reply.iter().cloned());
        Ok(reply)
    }
}

/// Poll `check` until it holds, failing the test after a second.
pub async fn eventually(mut check: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(1), async {
        while !check() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}
