// ABOUTME: Messages feature: the thread of the active conversation.
// ABOUTME: Fetch, send, and clear with a generation guard against superseded results.

pub mod slice;

pub use slice::{EMPTY_MESSAGE, MessageSlice, MessageState, validate_message};
