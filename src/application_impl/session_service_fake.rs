use crate::application_port::{
    IdentityClaims, REFRESH_ROLE, SessionError, SessionService, SessionTokens,
};
use crate::domain_model::SubjectId;
use chrono::{Duration, Utc};

const ACCESS_PREFIX: &str = "fake-access-token:";
const REFRESH_PREFIX: &str = "fake-refresh-token:";

#[derive(Debug)]
pub struct FakeSessionService;

impl FakeSessionService {
    pub fn new() -> Self {
        Self
    }
}

impl Default for FakeSessionService {
    fn default() -> Self {
        Self::new()
    }
}

fn fake_tokens(subject_id: SubjectId, email: &str, role: &str) -> SessionTokens {
    let now = Utc::now();
    SessionTokens {
        subject_id,
        email: email.to_string(),
        role: role.to_string(),
        access_token: format!("{}{}:{}:{}", ACCESS_PREFIX, subject_id, role, email),
        refresh_token: format!("{}{}:{}:{}", REFRESH_PREFIX, subject_id, role, email),
        access_expires_at: now + Duration::hours(1),
        refresh_expires_at: now + Duration::days(7),
    }
}

fn parse_fake(token: &str, prefix: &str) -> Option<(SubjectId, String, String)> {
    let rest = token.strip_prefix(prefix)?;
    let mut parts = rest.splitn(3, ':');
    let subject_id = parts.next()?.parse().ok()?;
    let role = parts.next()?.to_string();
    let email = parts.next()?.to_string();
    Some((subject_id, role, email))
}

// Minimal fake implementation for basic use only: tokens are transparent
// strings and every verification attempt succeeds. Extend when a test needs
// configurable failures.
#[async_trait::async_trait]
impl SessionService for FakeSessionService {
    async fn login(
        &self,
        subject_id: SubjectId,
        email: &str,
        role: &str,
    ) -> Result<SessionTokens, SessionError> {
        Ok(fake_tokens(subject_id, email, role))
    }

    async fn authenticate(
        &self,
        email: &str,
        _password: &str,
    ) -> Result<SessionTokens, SessionError> {
        Ok(fake_tokens(SubjectId(1), email, "PASSENGER"))
    }

    async fn refresh(&self, refresh_token: &str) -> Result<SessionTokens, SessionError> {
        let (subject_id, role, email) =
            parse_fake(refresh_token, REFRESH_PREFIX).ok_or(SessionError::TokenNotRecognized)?;
        Ok(fake_tokens(subject_id, &email, &role))
    }

    async fn logout(&self, _refresh_token: &str) -> Result<(), SessionError> {
        Ok(())
    }

    async fn revoke_all(&self, _subject_id: SubjectId) -> Result<u64, SessionError> {
        Ok(0)
    }

    async fn verify_access(&self, access_token: &str) -> Result<IdentityClaims, SessionError> {
        let (subject_id, role, email) =
            parse_fake(access_token, ACCESS_PREFIX).ok_or(SessionError::TokenNotRecognized)?;
        if role == REFRESH_ROLE {
            return Err(SessionError::TokenNotRecognized);
        }
        let now = Utc::now();
        Ok(IdentityClaims {
            subject_id,
            email,
            role,
            app_name: "fake".to_string(),
            issued_at: now,
            expires_at: now + Duration::hours(1),
        })
    }

    async fn start_phone_verification(
        &self,
        _subject_id: SubjectId,
        _phone_number: &str,
    ) -> Result<(), SessionError> {
        Ok(())
    }

    async fn confirm_phone_otp(
        &self,
        _subject_id: SubjectId,
        _submitted_code: &str,
    ) -> Result<(), SessionError> {
        Ok(())
    }

    async fn start_email_verification(&self, _email: &str) -> Result<(), SessionError> {
        Ok(())
    }

    async fn confirm_email_token(&self, _token: &str) -> Result<SubjectId, SessionError> {
        Ok(SubjectId(1))
    }
}
