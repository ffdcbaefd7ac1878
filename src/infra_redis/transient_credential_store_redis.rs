use crate::application_port::SessionError;
use crate::domain_port::TransientCredentialStore;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Script};
use std::time::Duration;

const CONSUME_IF_MATCH: &str = include_str!("consume_if_match.lua");

/// TTL cache over Redis. Expiry is native (`SET ... EX`); the destructive
/// read runs server-side so check and delete cannot interleave.
pub struct RedisCredentialStore {
    conn: ConnectionManager,
    prefix: String,
}

impl RedisCredentialStore {
    pub fn new(conn: ConnectionManager, prefix: impl Into<String>) -> Self {
        RedisCredentialStore {
            conn,
            prefix: prefix.into(),
        }
    }

    fn key(&self, key: &str) -> String {
        format!("{}:{}", self.prefix, key)
    }
}

#[async_trait::async_trait]
impl TransientCredentialStore for RedisCredentialStore {
    async fn put(&self, key: &str, value: &str, ttl: Duration) -> Result<(), SessionError> {
        let key = self.key(key);
        let mut conn = self.conn.clone();
        let _: () = conn
            .set_ex(&key, value, ttl.as_secs().max(1))
            .await
            .map_err(|e| SessionError::Backend(e.to_string()))?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, SessionError> {
        let key = self.key(key);
        let mut conn = self.conn.clone();
        let value: Option<String> = conn
            .get(&key)
            .await
            .map_err(|e| SessionError::Backend(e.to_string()))?;
        Ok(value)
    }

    async fn consume(&self, key: &str, expected: &str) -> Result<bool, SessionError> {
        let key = self.key(key);
        let mut conn = self.conn.clone();
        let script = Script::new(CONSUME_IF_MATCH);
        let removed: i64 = script
            .key(&key)
            .arg(expected)
            .invoke_async(&mut conn)
            .await
            .map_err(|e| SessionError::Backend(e.to_string()))?;
        Ok(removed == 1)
    }
}
