use crate::application_port::IdentityClaims;
use crate::domain_model::SubjectId;
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("token signature is invalid")]
    InvalidSignature,
    #[error("token is malformed")]
    Malformed,
    #[error("credential has expired")]
    Expired,
    #[error("refresh token has been revoked")]
    Revoked,
    #[error("refresh token not recognized")]
    TokenNotRecognized,
    #[error("refresh token already exists")]
    DuplicateToken,
    #[error("verification code does not match")]
    CredentialMismatch,
    #[error("subject not found")]
    SubjectNotFound,
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("backend unavailable: {0}")]
    Backend(String),
    #[error("dispatch failed: {0}")]
    Dispatch(String),
}

/// Access/refresh pair plus the identity it was minted for.
#[derive(Debug, Clone, Serialize)]
pub struct SessionTokens {
    pub subject_id: SubjectId,
    pub email: String,
    pub role: String,
    pub access_token: String,
    pub refresh_token: String,
    pub access_expires_at: DateTime<Utc>,
    pub refresh_expires_at: DateTime<Utc>,
}

/// The single entry point for credential and verification lifecycle flows.
/// Identity persistence, SMS and email transport are external collaborators
/// reached through the `domain_port` traits.
#[async_trait::async_trait]
pub trait SessionService: Send + Sync {
    /// Issue an access/refresh pair for an already-verified identity and
    /// record the refresh token in the ledger.
    async fn login(
        &self,
        subject_id: SubjectId,
        email: &str,
        role: &str,
    ) -> Result<SessionTokens, SessionError>;

    /// Resolve the identity by email, compare the password, then `login`.
    async fn authenticate(&self, email: &str, password: &str)
    -> Result<SessionTokens, SessionError>;

    /// Rotate: revoke the presented refresh token and issue a fresh pair.
    /// Exactly one of two concurrent calls with the same token succeeds.
    async fn refresh(&self, refresh_token: &str) -> Result<SessionTokens, SessionError>;

    /// Best-effort revocation of a single refresh token. Idempotent; unknown
    /// or already-revoked tokens are not an error.
    async fn logout(&self, refresh_token: &str) -> Result<(), SessionError>;

    /// Revoke every active refresh token owned by the subject. Returns the
    /// number of tokens revoked.
    async fn revoke_all(&self, subject_id: SubjectId) -> Result<u64, SessionError>;

    /// Decode and validate an access token. Refresh tokens are rejected.
    async fn verify_access(&self, access_token: &str) -> Result<IdentityClaims, SessionError>;

    async fn start_phone_verification(
        &self,
        subject_id: SubjectId,
        phone_number: &str,
    ) -> Result<(), SessionError>;

    async fn confirm_phone_otp(
        &self,
        subject_id: SubjectId,
        submitted_code: &str,
    ) -> Result<(), SessionError>;

    async fn start_email_verification(&self, email: &str) -> Result<(), SessionError>;

    /// Consume the email verification token and return the subject it
    /// belonged to.
    async fn confirm_email_token(&self, token: &str) -> Result<SubjectId, SessionError>;
}
