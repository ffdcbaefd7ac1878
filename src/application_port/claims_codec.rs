use crate::application_port::SessionError;
use crate::domain_model::SubjectId;
use chrono::{DateTime, Utc};

/// Role claim carried by every refresh token. A refresh token presented to a
/// resource endpoint is rejected because this never matches a real role.
pub const REFRESH_ROLE: &str = "REFRESH";

/// The payload of a signed token. Exists only inside the token; never
/// persisted server-side.
#[derive(Debug, Clone, PartialEq)]
pub struct IdentityClaims {
    pub subject_id: SubjectId,
    pub email: String,
    pub role: String,
    pub app_name: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Signs and verifies time-bounded claim payloads. Pure transform apart from
/// reading the wall clock on decode.
pub trait ClaimsCodec: Send + Sync {
    fn encode(&self, claims: &IdentityClaims) -> Result<String, SessionError>;
    fn decode(&self, token: &str) -> Result<IdentityClaims, SessionError>;
}

#[async_trait::async_trait]
pub trait CredentialHasher: Send + Sync {
    async fn hash_password(&self, password: &str) -> Result<String, SessionError>;
    async fn verify_password(&self, password: &str, password_hash: &str)
    -> Result<bool, SessionError>;
}
