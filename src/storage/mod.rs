// ABOUTME: Durable client-side key-value storage used to persist the session.
// ABOUTME: A small string-keyed trait with file-backed and in-memory implementations.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

/// Storage key for the bearer token.
pub const TOKEN_KEY: &str = "accessToken";
/// Storage key for the JSON-serialized user record.
pub const USER_KEY: &str = "user";

/// String-keyed persistent storage, the equivalent of a browser's per-origin
/// local storage.
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`, if any.
    fn get(&self, key: &str) -> anyhow::Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> anyhow::Result<()>;

    /// Remove `key`. Removing an absent key is not an error.
    fn remove(&self, key: &str) -> anyhow::Result<()>;
}
