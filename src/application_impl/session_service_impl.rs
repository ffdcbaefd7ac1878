use crate::application_port::{
    ClaimsCodec, CredentialHasher, IdentityClaims, REFRESH_ROLE, SessionError, SessionService,
    SessionTokens,
};
use crate::domain_model::SubjectId;
use crate::domain_port::{
    EmailSender, IdentityStore, RefreshTokenLedger, RefreshTokenRecord, SmsSender,
    TransientCredentialStore,
};
use crate::application_impl::{TokenConfig, TokenIssuer};
use chrono::Utc;
use nanoid::nanoid;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

const OTP_KEY_PREFIX: &str = "OTP:";
const EMAIL_TOKEN_KEY_PREFIX: &str = "EMAIL_TOKEN:";

const OTP_FIRST_DIGIT: [char; 9] = ['1', '2', '3', '4', '5', '6', '7', '8', '9'];
const OTP_DIGITS: [char; 10] = ['0', '1', '2', '3', '4', '5', '6', '7', '8', '9'];

#[derive(Debug, Clone)]
pub struct VerificationConfig {
    pub otp_ttl: Duration,
    pub email_token_ttl: Duration,
    pub email_link_base: String,
}

impl Default for VerificationConfig {
    fn default() -> Self {
        VerificationConfig {
            otp_ttl: Duration::from_secs(5 * 60),
            email_token_ttl: Duration::from_secs(24 * 60 * 60),
            email_link_base: "http://localhost:8080/verify-email-confirm?token=".to_string(),
        }
    }
}

pub struct RealSessionService {
    identity_store: Arc<dyn IdentityStore>,
    credential_hasher: Arc<dyn CredentialHasher>,
    claims_codec: Arc<dyn ClaimsCodec>,
    issuer: TokenIssuer,
    ledger: Arc<dyn RefreshTokenLedger>,
    credentials: Arc<dyn TransientCredentialStore>,
    sms_sender: Arc<dyn SmsSender>,
    email_sender: Arc<dyn EmailSender>,
    verification: VerificationConfig,
}

impl RealSessionService {
    pub fn new(
        identity_store: Arc<dyn IdentityStore>,
        credential_hasher: Arc<dyn CredentialHasher>,
        claims_codec: Arc<dyn ClaimsCodec>,
        token_cfg: TokenConfig,
        ledger: Arc<dyn RefreshTokenLedger>,
        credentials: Arc<dyn TransientCredentialStore>,
        sms_sender: Arc<dyn SmsSender>,
        email_sender: Arc<dyn EmailSender>,
        verification: VerificationConfig,
    ) -> Self {
        let issuer = TokenIssuer::new(claims_codec.clone(), token_cfg);
        Self {
            identity_store,
            credential_hasher,
            claims_codec,
            issuer,
            ledger,
            credentials,
            sms_sender,
            email_sender,
            verification,
        }
    }

    fn otp_key(subject_id: SubjectId) -> String {
        format!("{}{}", OTP_KEY_PREFIX, subject_id)
    }

    fn email_token_key(token: &str) -> String {
        format!("{}{}", EMAIL_TOKEN_KEY_PREFIX, token)
    }

    /// Six decimal digits in 100000..=999999.
    fn generate_otp() -> String {
        let mut code = nanoid!(1, &OTP_FIRST_DIGIT);
        code.push_str(&nanoid!(5, &OTP_DIGITS));
        code
    }

    /// Mint a pair and record the refresh token. Shared by login,
    /// authenticate and the rotation winner in refresh.
    async fn issue_session(
        &self,
        subject_id: SubjectId,
        email: &str,
        role: &str,
    ) -> Result<SessionTokens, SessionError> {
        let access = self.issuer.issue_access_token(subject_id, email, role)?;
        let refresh = self.issuer.issue_refresh_token(subject_id, email)?;

        self.ledger
            .store(&RefreshTokenRecord {
                token: refresh.token.clone(),
                subject_id,
                expires_at: refresh.expires_at,
                revoked: false,
                created_at: refresh.issued_at,
            })
            .await?;

        Ok(SessionTokens {
            subject_id,
            email: email.to_string(),
            role: role.to_string(),
            access_token: access.token,
            refresh_token: refresh.token,
            access_expires_at: access.expires_at,
            refresh_expires_at: refresh.expires_at,
        })
    }
}

#[async_trait::async_trait]
impl SessionService for RealSessionService {
    async fn login(
        &self,
        subject_id: SubjectId,
        email: &str,
        role: &str,
    ) -> Result<SessionTokens, SessionError> {
        let tokens = self.issue_session(subject_id, email, role).await?;
        info!(subject = %subject_id, "session opened");
        Ok(tokens)
    }

    async fn authenticate(
        &self,
        email: &str,
        password: &str,
    ) -> Result<SessionTokens, SessionError> {
        // Absent identity and wrong password are indistinguishable on purpose.
        let identity = self
            .identity_store
            .find_by_email(email)
            .await?
            .ok_or(SessionError::InvalidCredentials)?;

        let ok = self
            .credential_hasher
            .verify_password(password, &identity.password_hash)
            .await?;
        if !ok {
            return Err(SessionError::InvalidCredentials);
        }

        self.login(identity.id, &identity.email, &identity.role)
            .await
    }

    async fn refresh(&self, refresh_token: &str) -> Result<SessionTokens, SessionError> {
        let record = self
            .ledger
            .lookup(refresh_token)
            .await?
            .ok_or(SessionError::TokenNotRecognized)?;

        let now = Utc::now();
        if !record.is_usable(now) {
            if now >= record.expires_at {
                self.ledger.delete(refresh_token).await?;
                return Err(SessionError::Expired);
            }
            // A revoked token coming back is a rotation replay: someone still
            // holds a credential that was already exchanged. Cut the whole
            // chain for this subject.
            let revoked = self.ledger.revoke_all_for_subject(record.subject_id).await?;
            warn!(
                subject = %record.subject_id,
                revoked,
                "revoked refresh token presented again; remaining sessions revoked"
            );
            return Err(SessionError::Revoked);
        }

        let identity = self
            .identity_store
            .find_by_id(record.subject_id)
            .await?
            .ok_or(SessionError::SubjectNotFound)?;

        // One winner: the conditional revoke decides between concurrent
        // refresh calls presenting the same token.
        if !self.ledger.revoke(refresh_token).await? {
            return Err(SessionError::Revoked);
        }

        self.issue_session(identity.id, &identity.email, &identity.role)
            .await
    }

    async fn logout(&self, refresh_token: &str) -> Result<(), SessionError> {
        // Best-effort: unknown or already-revoked tokens are fine.
        let _ = self.ledger.revoke(refresh_token).await?;
        Ok(())
    }

    async fn revoke_all(&self, subject_id: SubjectId) -> Result<u64, SessionError> {
        let revoked = self.ledger.revoke_all_for_subject(subject_id).await?;
        info!(subject = %subject_id, revoked, "all refresh tokens revoked");
        Ok(revoked)
    }

    async fn verify_access(&self, access_token: &str) -> Result<IdentityClaims, SessionError> {
        let claims = self.claims_codec.decode(access_token)?;
        if claims.role == REFRESH_ROLE {
            return Err(SessionError::TokenNotRecognized);
        }
        Ok(claims)
    }

    async fn start_phone_verification(
        &self,
        subject_id: SubjectId,
        phone_number: &str,
    ) -> Result<(), SessionError> {
        let otp = Self::generate_otp();
        self.credentials
            .put(&Self::otp_key(subject_id), &otp, self.verification.otp_ttl)
            .await?;

        // The OTP is durably stored at this point; a failed send is logged
        // and the verification stays open.
        if let Err(e) = self
            .sms_sender
            .send(phone_number, &format!("Your OTP is: {}", otp))
            .await
        {
            warn!(subject = %subject_id, error = %e, "OTP SMS dispatch failed");
        }
        Ok(())
    }

    async fn confirm_phone_otp(
        &self,
        subject_id: SubjectId,
        submitted_code: &str,
    ) -> Result<(), SessionError> {
        let key = Self::otp_key(subject_id);
        if self.credentials.consume(&key, submitted_code).await? {
            self.identity_store.mark_phone_verified(subject_id).await?;
            info!(subject = %subject_id, "phone verified");
            return Ok(());
        }

        // Label the failure for the caller; consumption already settled above.
        match self.credentials.get(&key).await? {
            Some(_) => Err(SessionError::CredentialMismatch),
            None => Err(SessionError::Expired),
        }
    }

    async fn start_email_verification(&self, email: &str) -> Result<(), SessionError> {
        let identity = self
            .identity_store
            .find_by_email(email)
            .await?
            .ok_or(SessionError::SubjectNotFound)?;

        let token = uuid::Uuid::new_v4().to_string();
        self.credentials
            .put(
                &Self::email_token_key(&token),
                &identity.id.to_string(),
                self.verification.email_token_ttl,
            )
            .await?;

        let link = format!("{}{}", self.verification.email_link_base, token);
        let body = format!("Click this link to verify your account: {}", link);
        if let Err(e) = self
            .email_sender
            .send(email, "Verify your email", &body)
            .await
        {
            warn!(subject = %identity.id, error = %e, "verification email dispatch failed");
        }
        Ok(())
    }

    async fn confirm_email_token(&self, token: &str) -> Result<SubjectId, SessionError> {
        let key = Self::email_token_key(token);

        // Peek first to learn the subject, then consume with that exact
        // value so a concurrent confirmation cannot double-succeed.
        let value = self
            .credentials
            .get(&key)
            .await?
            .ok_or(SessionError::Expired)?;
        let subject_id: SubjectId = value
            .parse()
            .map_err(|_| SessionError::Backend("malformed subject id in credential store".into()))?;

        if !self.credentials.consume(&key, &value).await? {
            return Err(SessionError::Expired);
        }

        self.identity_store.mark_email_verified(subject_id).await?;
        info!(subject = %subject_id, "email verified");
        Ok(subject_id)
    }
}
