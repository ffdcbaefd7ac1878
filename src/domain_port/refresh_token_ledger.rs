use crate::application_port::SessionError;
use crate::domain_model::SubjectId;
use chrono::{DateTime, Utc};

#[derive(Debug, Clone)]
pub struct RefreshTokenRecord {
    pub token: String,
    pub subject_id: SubjectId,
    pub expires_at: DateTime<Utc>,
    pub revoked: bool,
    pub created_at: DateTime<Utc>,
}

impl RefreshTokenRecord {
    pub fn is_usable(&self, now: DateTime<Utc>) -> bool {
        !self.revoked && now < self.expires_at
    }
}

/// Durable record of issued refresh tokens. The `revoked` flag is monotonic:
/// it only ever moves false -> true.
#[async_trait::async_trait]
pub trait RefreshTokenLedger: Send + Sync {
    /// Insert a new record. Fails with [`SessionError::DuplicateToken`] if
    /// the token string is already present.
    async fn store(&self, record: &RefreshTokenRecord) -> Result<(), SessionError>;

    async fn lookup(&self, token: &str) -> Result<Option<RefreshTokenRecord>, SessionError>;

    /// Compare-and-swap revocation. Returns true iff this call flipped the
    /// record from active to revoked; false if the record was already
    /// revoked or does not exist. Two concurrent callers see exactly one
    /// `true` between them.
    async fn revoke(&self, token: &str) -> Result<bool, SessionError>;

    /// Revoke every active record owned by the subject. Returns the number
    /// of records revoked.
    async fn revoke_all_for_subject(&self, subject_id: SubjectId) -> Result<u64, SessionError>;

    /// Remove a record entirely. Used when an expired token is presented for
    /// refresh; revocation is the normal end of life otherwise.
    async fn delete(&self, token: &str) -> Result<(), SessionError>;
}
