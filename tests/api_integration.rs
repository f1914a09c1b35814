// ABOUTME: Integration tests for the HTTP client against a throwaway local server.
// ABOUTME: Checks bearer injection, JSON decoding, error bodies, and 401 session invalidation.

use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use parley::api::{ApiClient, ApiError, AuthApi, ConversationApi, LoginRequest, MessageApi};
use parley::navigation::{RecordingNavigator, Route};
use parley::session::{SessionStore, User};

/// Serve a single canned response and hand back the raw request text.
async fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = Vec::new();
        let mut buf = [0u8; 4096];
        loop {
            let n = socket.read(&mut buf).await.unwrap();
            if n == 0 {
                break;
            }
            request.extend_from_slice(&buf[..n]);
            if request_complete(&request) {
                break;
            }
        }
        let response = format!(
            "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
            body.len()
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.unwrap();
        String::from_utf8_lossy(&request).to_string()
    });

    (base_url, handle)
}

/// Headers received and, when a content-length is given, the whole body.
fn request_complete(raw: &[u8]) -> bool {
    let text = String::from_utf8_lossy(raw);
    let Some(header_end) = text.find("\r\n\r\n") else {
        return false;
    };
    let content_length = text[..header_end]
        .lines()
        .find_map(|line| {
            let (name, value) = line.split_once(':')?;
            name.eq_ignore_ascii_case("content-length")
                .then(|| value.trim().parse::<usize>().ok())
                .flatten()
        })
        .unwrap_or(0);
    raw.len() >= header_end + 4 + content_length
}

fn ada() -> User {
    User {
        id: "u1".to_string(),
        name: "Ada".to_string(),
        email: "ada@example.com".to_string(),
    }
}

fn client(base_url: &str, session: &Arc<SessionStore>, nav: &Arc<RecordingNavigator>) -> ApiClient {
    ApiClient::new(
        base_url,
        Duration::from_secs(5),
        Arc::clone(session),
        nav.clone(),
    )
    .unwrap()
}

#[tokio::test]
async fn bearer_token_is_attached_and_json_decoded() {
    let (base_url, server) = serve_once(
        "200 OK",
        r#"[{"id":"m1","content":"hi","role":"USER","createdAt":"2024-01-01T00:00:00Z"},
            {"id":"m2","content":"hello","role":"ASSISTANT","createdAt":"2024-01-01T00:00:01Z"}]"#,
    )
    .await;
    let session = SessionStore::without_storage();
    session.set_auth(ada(), "secret-token");
    let nav = Arc::new(RecordingNavigator::new());
    let api = client(&base_url, &session, &nav);

    let messages = api.list_messages("c1").await.unwrap();

    assert_eq!(messages.len(), 2);
    assert_eq!(messages[1].content, "hello");
    let request = server.await.unwrap();
    assert!(request.starts_with("GET /api/conversations/c1/messages "));
    assert!(
        request
            .to_ascii_lowercase()
            .contains("authorization: bearer secret-token"),
        "request was: {request}"
    );
}

#[tokio::test]
async fn no_token_means_no_authorization_header() {
    let (base_url, server) = serve_once(
        "200 OK",
        r#"{"user":{"id":"u1","name":"Ada","email":"ada@example.com"},"accessToken":"fresh"}"#,
    )
    .await;
    let session = SessionStore::without_storage();
    let nav = Arc::new(RecordingNavigator::new());
    let api = client(&base_url, &session, &nav);

    let response = api
        .login(&LoginRequest {
            email: "ada@example.com".to_string(),
            password: "pw".to_string(),
        })
        .await
        .unwrap();

    assert_eq!(response.access_token, "fresh");
    assert_eq!(response.user, ada());
    let request = server.await.unwrap();
    assert!(request.starts_with("POST /api/auth/login "));
    assert!(!request.to_ascii_lowercase().contains("authorization:"));
    assert!(request.contains(r#""email":"ada@example.com""#));
}

#[tokio::test]
async fn unauthorized_clears_session_and_redirects_to_login() {
    let (base_url, server) = serve_once("401 Unauthorized", r#"{"message":"Token expired"}"#).await;
    let session = SessionStore::without_storage();
    session.set_auth(ada(), "stale");
    let nav = Arc::new(RecordingNavigator::new());
    let api = client(&base_url, &session, &nav);

    let err = api.list_conversations(0, 20).await.unwrap_err();

    assert!(matches!(err, ApiError::Unauthorized { .. }), "got {err:?}");
    assert_eq!(err.user_message(), "Token expired");
    assert!(!session.is_authenticated());
    assert!(session.snapshot().token.is_none());
    assert_eq!(nav.routes(), vec![Route::Login]);
    server.await.unwrap();
}

#[tokio::test]
async fn error_status_carries_server_message_and_fields() {
    let (base_url, server) = serve_once(
        "400 Bad Request",
        r#"{"message":"Validation failed","errors":[{"field":"title","message":"Too long"}]}"#,
    )
    .await;
    let session = SessionStore::without_storage();
    session.set_auth(ada(), "tok");
    let nav = Arc::new(RecordingNavigator::new());
    let api = client(&base_url, &session, &nav);

    let err = api.delete_conversation("c1").await.unwrap_err();

    assert!(matches!(err, ApiError::Status { status: 400, .. }), "got {err:?}");
    assert_eq!(err.user_message(), "Validation failed");
    assert_eq!(err.field_errors().get("title").map(String::as_str), Some("Too long"));
    assert!(session.is_authenticated());
    assert!(nav.routes().is_empty());
    let request = server.await.unwrap();
    assert!(request.starts_with("DELETE /api/conversations/c1 "));
}

#[tokio::test]
async fn conversation_ids_cannot_change_the_route() {
    let (base_url, server) = serve_once("200 OK", "[]").await;
    let session = SessionStore::without_storage();
    session.set_auth(ada(), "tok");
    let nav = Arc::new(RecordingNavigator::new());
    let api = client(&base_url, &session, &nav);

    let messages = api.list_messages("../auth/logout?x=1").await.unwrap();

    assert!(messages.is_empty());
    let request = server.await.unwrap();
    assert!(
        request.starts_with("GET /api/conversations/..%2Fauth%2Flogout%3Fx=1/messages "),
        "request was: {request}"
    );
}
