use crate::application_port::SessionError;
use crate::domain_model::SubjectId;

/// Identity as held by the external user store.
#[derive(Debug, Clone)]
pub struct Identity {
    pub id: SubjectId,
    pub email: String,
    pub role: String,
    pub phone_number: Option<String>,
    pub password_hash: String,
    pub phone_verified: bool,
    pub email_verified: bool,
}

/// External user store. Owned by another service; this crate only reads
/// identities and flips the two verification flags.
#[async_trait::async_trait]
pub trait IdentityStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<Identity>, SessionError>;

    async fn find_by_id(&self, id: SubjectId) -> Result<Option<Identity>, SessionError>;

    async fn mark_phone_verified(&self, id: SubjectId) -> Result<(), SessionError>;

    async fn mark_email_verified(&self, id: SubjectId) -> Result<(), SessionError>;
}
