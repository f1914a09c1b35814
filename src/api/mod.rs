// ABOUTME: REST collaborator: request/response types, error taxonomy, and the HTTP client.
// ABOUTME: Feature slices depend on the service traits, not on the concrete client.

pub mod client;
pub mod error;
pub mod types;

pub use client::ApiClient;
pub use error::{ApiError, ErrorBody, FieldError, UNEXPECTED_ERROR};
pub use types::*;

use async_trait::async_trait;

/// Authentication endpoints.
#[async_trait]
pub trait AuthApi: Send + Sync {
    async fn login(&self, request: &LoginRequest) -> Result<AuthResponse, ApiError>;
    async fn register(&self, request: &RegisterRequest) -> Result<AuthResponse, ApiError>;
    async fn logout(&self) -> Result<(), ApiError>;
}

/// Conversation CRUD endpoints.
#[async_trait]
pub trait ConversationApi: Send + Sync {
    async fn list_conversations(
        &self,
        page: u32,
        limit: u32,
    ) -> Result<Page<Conversation>, ApiError>;
    async fn create_conversation(
        &self,
        request: &CreateConversationRequest,
    ) -> Result<Conversation, ApiError>;
    async fn rename_conversation(
        &self,
        id: &str,
        request: &UpdateConversationRequest,
    ) -> Result<Conversation, ApiError>;
    async fn delete_conversation(&self, id: &str) -> Result<(), ApiError>;
}

/// Message endpoints of a single conversation.
#[async_trait]
pub trait MessageApi: Send + Sync {
    /// All messages of the conversation, oldest first.
    async fn list_messages(&self, conversation_id: &str) -> Result<Vec<Message>, ApiError>;

    /// Post a user message; returns the stored user message followed by the reply.
    async fn send_message(
        &self,
        conversation_id: &str,
        request: &CreateMessageRequest,
    ) -> Result<Vec<Message>, ApiError>;
}
