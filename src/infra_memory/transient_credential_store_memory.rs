use crate::application_port::SessionError;
use crate::domain_port::TransientCredentialStore;
use dashmap::DashMap;
use std::time::{Duration, Instant};

struct Entry {
    value: String,
    expires_at: Instant,
}

/// Expiry is lazy: dead entries are dropped when read, which is all the
/// session flows ever do with them.
#[derive(Default)]
pub struct MemoryCredentialStore {
    entries: DashMap<String, Entry>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl TransientCredentialStore for MemoryCredentialStore {
    async fn put(&self, key: &str, value: &str, ttl: Duration) -> Result<(), SessionError> {
        self.entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, SessionError> {
        let live = match self.entries.get(key) {
            Some(entry) if Instant::now() < entry.expires_at => Some(entry.value.clone()),
            Some(_) => None,
            None => return Ok(None),
        };
        if live.is_none() {
            self.entries
                .remove_if(key, |_, entry| Instant::now() >= entry.expires_at);
        }
        Ok(live)
    }

    async fn consume(&self, key: &str, expected: &str) -> Result<bool, SessionError> {
        // remove_if runs under the shard lock: check and delete are one step.
        let removed = self
            .entries
            .remove_if(key, |_, entry| {
                Instant::now() < entry.expires_at && entry.value == expected
            })
            .is_some();
        Ok(removed)
    }
}
