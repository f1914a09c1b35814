// ABOUTME: Conversations feature: the sidebar list, pagination, and the active selection.
// ABOUTME: Publishes selection changes to subscribers such as the chat coordinator.

pub mod slice;

pub use slice::{ConversationSlice, ConversationState, SelectionSubscription};

/// Page size used when the caller does not ask for one.
pub const DEFAULT_PAGE_SIZE: u32 = 20;
