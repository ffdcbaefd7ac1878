use crate::application_impl::TokenConfig;
use crate::application_port::{ClaimsCodec, IdentityClaims, REFRESH_ROLE, SessionError};
use crate::domain_model::SubjectId;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Mints access and refresh tokens over a [`ClaimsCodec`]. Minting is
/// side-effect free; recording refresh tokens is the ledger's job.
pub struct TokenIssuer {
    codec: Arc<dyn ClaimsCodec>,
    cfg: TokenConfig,
}

impl TokenIssuer {
    pub fn new(codec: Arc<dyn ClaimsCodec>, cfg: TokenConfig) -> Self {
        TokenIssuer { codec, cfg }
    }

    pub fn issue_access_token(
        &self,
        subject_id: SubjectId,
        email: &str,
        role: &str,
    ) -> Result<IssuedToken, SessionError> {
        self.issue(subject_id, email, role, self.cfg.access_ttl)
    }

    /// The role claim is pinned to [`REFRESH_ROLE`] so a refresh token can
    /// never pass for an access token at a resource endpoint.
    pub fn issue_refresh_token(
        &self,
        subject_id: SubjectId,
        email: &str,
    ) -> Result<IssuedToken, SessionError> {
        self.issue(subject_id, email, REFRESH_ROLE, self.cfg.refresh_ttl)
    }

    fn issue(
        &self,
        subject_id: SubjectId,
        email: &str,
        role: &str,
        ttl: Duration,
    ) -> Result<IssuedToken, SessionError> {
        let issued_at = Utc::now();
        let expires_at = issued_at + ttl;

        let claims = IdentityClaims {
            subject_id,
            email: email.to_string(),
            role: role.to_string(),
            app_name: self.cfg.app_name.clone(),
            issued_at,
            expires_at,
        };

        let token = self.codec.encode(&claims)?;
        Ok(IssuedToken {
            token,
            issued_at,
            expires_at,
        })
    }
}
