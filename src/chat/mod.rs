// ABOUTME: Chat module: composes the conversation and message slices into one view.
// ABOUTME: Keeps the message thread in step with the active conversation.

pub mod coordinator;

pub use coordinator::{ChatCoordinator, ChatView};
