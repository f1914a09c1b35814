// ABOUTME: HTTP client for the chat REST API built on reqwest.
// ABOUTME: Injects the bearer token and invalidates the session on any 401 response.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;

use crate::navigation::{Navigator, Route};
use crate::session::SessionStore;

use super::error::{ApiError, ErrorBody};
use super::types::{
    AuthResponse, Conversation, CreateConversationRequest, CreateMessageRequest, LoginRequest,
    Message, Page, RegisterRequest, UpdateConversationRequest,
};
use super::{AuthApi, ConversationApi, MessageApi};

const AUTH_PATH: [&str; 2] = ["api", "auth"];
const CONVERSATIONS_PATH: [&str; 2] = ["api", "conversations"];

/// REST client shared by every feature slice.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    session: Arc<SessionStore>,
    navigator: Arc<dyn Navigator>,
}

impl ApiClient {
    pub fn new(
        base_url: impl Into<String>,
        timeout: Duration,
        session: Arc<SessionStore>,
        navigator: Arc<dyn Navigator>,
    ) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            session,
            navigator,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Base URL extended by `segments`, each percent-encoded as a single
    /// path segment.
    fn endpoint<'a>(
        &self,
        segments: impl IntoIterator<Item = &'a str>,
    ) -> Result<Url, ApiError> {
        let invalid = |reason: String| {
            ApiError::Transport(format!("invalid base URL {}: {reason}", self.base_url))
        };
        let mut url = Url::parse(&self.base_url).map_err(|e| invalid(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|()| invalid("cannot carry a path".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Send a request, attaching the bearer token when the session has one.
    async fn execute(&self, request: RequestBuilder) -> Result<Response, ApiError> {
        let request = match self.session.token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        };

        let response = request
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            let body = read_error_body(response).await;
            self.invalidate_session();
            return Err(ApiError::Unauthorized { body });
        }
        if !status.is_success() {
            let body = read_error_body(response).await;
            tracing::debug!(status = status.as_u16(), message = ?body.message, "request failed");
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    async fn fetch<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let response = self.execute(request).await?;
        response
            .json()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }

    fn invalidate_session(&self) {
        tracing::warn!("server rejected credentials, signing out");
        self.session.clear_auth();
        self.navigator.navigate(Route::Login);
    }
}

async fn read_error_body(response: Response) -> ErrorBody {
    response.json().await.unwrap_or_default()
}

#[async_trait]
impl AuthApi for ApiClient {
    async fn login(&self, request: &LoginRequest) -> Result<AuthResponse, ApiError> {
        let url = self.endpoint(AUTH_PATH.into_iter().chain(["login"]))?;
        self.fetch(self.http.post(url).json(request)).await
    }

    async fn register(&self, request: &RegisterRequest) -> Result<AuthResponse, ApiError> {
        let url = self.endpoint(AUTH_PATH.into_iter().chain(["register"]))?;
        self.fetch(self.http.post(url).json(request)).await
    }

    async fn logout(&self) -> Result<(), ApiError> {
        let url = self.endpoint(AUTH_PATH.into_iter().chain(["logout"]))?;
        self.execute(self.http.post(url)).await?;
        Ok(())
    }
}

#[async_trait]
impl ConversationApi for ApiClient {
    async fn list_conversations(
        &self,
        page: u32,
        limit: u32,
    ) -> Result<Page<Conversation>, ApiError> {
        let url = self.endpoint(CONVERSATIONS_PATH)?;
        self.fetch(self.http.get(url).query(&[("page", page), ("limit", limit)]))
            .await
    }

    async fn create_conversation(
        &self,
        request: &CreateConversationRequest,
    ) -> Result<Conversation, ApiError> {
        let url = self.endpoint(CONVERSATIONS_PATH)?;
        self.fetch(self.http.post(url).json(request)).await
    }

    async fn rename_conversation(
        &self,
        id: &str,
        request: &UpdateConversationRequest,
    ) -> Result<Conversation, ApiError> {
        let url = self.endpoint(CONVERSATIONS_PATH.into_iter().chain([id]))?;
        self.fetch(self.http.patch(url).json(request)).await
    }

    async fn delete_conversation(&self, id: &str) -> Result<(), ApiError> {
        let url = self.endpoint(CONVERSATIONS_PATH.into_iter().chain([id]))?;
        self.execute(self.http.delete(url)).await?;
        Ok(())
    }
}

#[async_trait]
impl MessageApi for ApiClient {
    async fn list_messages(&self, conversation_id: &str) -> Result<Vec<Message>, ApiError> {
        let url = self.endpoint(
            CONVERSATIONS_PATH
                .into_iter()
                .chain([conversation_id, "messages"]),
        )?;
        self.fetch(self.http.get(url)).await
    }

    async fn send_message(
        &self,
        conversation_id: &str,
        request: &CreateMessageRequest,
    ) -> Result<Vec<Message>, ApiError> {
        let url = self.endpoint(
            CONVERSATIONS_PATH
                .into_iter()
                .chain([conversation_id, "messages"]),
        )?;
        self.fetch(self.http.post(url).json(request)).await
    }
}
