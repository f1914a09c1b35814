// ABOUTME: Session module: the authenticated identity shared by every component.
// ABOUTME: Process-wide store with subscriber notification and lazy hydration from storage.

pub mod store;
pub mod types;

pub use store::{SessionStore, SessionSubscription};
pub use types::{Session, User};
