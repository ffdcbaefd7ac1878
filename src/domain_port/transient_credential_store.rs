use crate::application_port::SessionError;
use std::time::Duration;

/// Expiring, single-use key/value store backing OTP codes and email
/// verification tokens. Keys are namespaced by the caller.
#[async_trait::async_trait]
pub trait TransientCredentialStore: Send + Sync {
    /// Write an entry, overwriting any existing value for the key.
    async fn put(&self, key: &str, value: &str, ttl: Duration) -> Result<(), SessionError>;

    /// Non-destructive peek. Returns `None` for absent or expired entries.
    async fn get(&self, key: &str) -> Result<Option<String>, SessionError>;

    /// Atomically delete the entry and return true iff a live entry exists
    /// whose value equals `expected`. On false the entry (if any) is left
    /// untouched. Two concurrent calls with the correct value yield exactly
    /// one true.
    async fn consume(&self, key: &str, expected: &str) -> Result<bool, SessionError>;
}
