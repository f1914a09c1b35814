// ABOUTME: Plain-text rendering of the chat view and session for the terminal.
// ABOUTME: Pure functions from state to strings so they can be tested directly.

use crate::api::{Message, MessageRole};
use crate::chat::ChatView;
use crate::session::Session;

/// One line describing who is signed in.
pub fn render_session(session: &Session) -> String {
    if session.is_loading {
        return "Checking session...".to_string();
    }
    match &session.user {
        Some(user) if session.is_authenticated() => {
            format!("Signed in as {} <{}>", user.name, user.email)
        }
        _ => "Not signed in".to_string(),
    }
}

/// Numbered conversation list, marking the active one.
pub fn render_conversations(view: &ChatView) -> String {
    if view.conversations.is_empty() {
        return "No conversations yet. Start one with /new".to_string();
    }

    let mut lines: Vec<String> = view
        .conversations
        .iter()
        .enumerate()
        .map(|(i, c)| {
            let marker = if view.active_conversation_id.as_deref() == Some(c.id.as_str()) {
                '*'
            } else {
                ' '
            };
            format!(
                "{marker} #{:<3} {} ({} messages) [{}]",
                i + 1,
                c.display_title(),
                c.message_count,
                c.id
            )
        })
        .collect();

    if let Some(meta) = view.pagination {
        if meta.total_pages > 1 {
            lines.push(format!(
                "  page {} of {} ({} total)",
                meta.page + 1,
                meta.total_pages,
                meta.total
            ));
        }
    }
    lines.join("\n")
}

pub fn render_message(message: &Message) -> String {
    let speaker = match message.role {
        MessageRole::User => "you",
        MessageRole::Assistant => "assistant",
    };
    format!("{speaker}> {}", message.content)
}

/// Header plus every message of the active conversation.
pub fn render_thread(view: &ChatView) -> String {
    let Some(id) = &view.active_conversation_id else {
        return "No conversation open. Use /open or /new".to_string();
    };
    let title = view
        .active_conversation
        .as_ref()
        .map(|c| c.display_title())
        .unwrap_or(id.as_str());

    let mut lines = vec![format!("== {title} ==")];
    if view.is_loading_messages {
        lines.push("(loading messages...)".to_string());
    } else if view.messages.is_empty() {
        lines.push("(no messages yet, say something)".to_string());
    }
    lines.extend(view.messages.iter().map(render_message));
    lines.join("\n")
}

/// Error banner, if the view carries an error.
pub fn render_error(view: &ChatView) -> Option<String> {
    view.error.as_ref().map(|e| format!("! {e}"))
}
