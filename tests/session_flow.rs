//! End-to-end session lifecycle scenarios over the in-memory backend.

use pillion::application_impl::{
    Argon2CredentialHasher, JwtClaimsCodec, RealSessionService, TokenConfig, VerificationConfig,
};
use pillion::application_port::{
    ClaimsCodec, CredentialHasher, REFRESH_ROLE, SessionError, SessionService,
};
use pillion::domain_model::SubjectId;
use pillion::domain_port::{Identity, IdentityStore, SmsSender, TransientCredentialStore};
use pillion::infra_memory::{
    MemoryCredentialStore, MemoryEmailSender, MemoryIdentityStore, MemoryRefreshTokenLedger,
    MemorySmsSender,
};
use std::sync::Arc;
use std::time::Duration;

struct Harness {
    service: Arc<RealSessionService>,
    credentials: Arc<MemoryCredentialStore>,
    identities: Arc<MemoryIdentityStore>,
    sms: Arc<MemorySmsSender>,
    email: Arc<MemoryEmailSender>,
}

fn token_config() -> TokenConfig {
    TokenConfig {
        app_name: "pillion".to_string(),
        access_ttl: Duration::from_secs(3600),
        refresh_ttl: Duration::from_secs(7 * 24 * 3600),
        signing_key: b"integration-test-key".to_vec(),
    }
}

fn harness_with(token_cfg: TokenConfig, verification: VerificationConfig) -> Harness {
    let identities = Arc::new(MemoryIdentityStore::new());
    let credentials = Arc::new(MemoryCredentialStore::new());
    let ledger = Arc::new(MemoryRefreshTokenLedger::new());
    let sms = Arc::new(MemorySmsSender::new());
    let email = Arc::new(MemoryEmailSender::new());

    let codec: Arc<dyn ClaimsCodec> = Arc::new(JwtClaimsCodec::new(token_cfg.clone()));
    let service = Arc::new(RealSessionService::new(
        identities.clone(),
        Arc::new(Argon2CredentialHasher),
        codec,
        token_cfg,
        ledger.clone(),
        credentials.clone(),
        sms.clone(),
        email.clone(),
        verification,
    ));

    Harness {
        service,
        credentials,
        identities,
        sms,
        email,
    }
}

fn harness() -> Harness {
    harness_with(token_config(), VerificationConfig::default())
}

/// Placeholder hash for tests that never run the password comparison.
fn seed(harness: &Harness, id: i64, email: &str, role: &str) {
    harness.identities.upsert(Identity {
        id: SubjectId(id),
        email: email.to_string(),
        role: role.to_string(),
        phone_number: Some("+15551234567".to_string()),
        password_hash: "unused".to_string(),
        phone_verified: false,
        email_verified: false,
    });
}

fn last_otp(harness: &Harness) -> String {
    harness
        .sms
        .sent()
        .last()
        .and_then(|m| m.text.rsplit(' ').next().map(str::to_string))
        .expect("an OTP SMS was recorded")
}

#[tokio::test]
async fn login_then_refresh_rotates_the_chain() {
    let h = harness();
    seed(&h, 42, "a@b.com", "DRIVER");

    let tokens = h.service.login(SubjectId(42), "a@b.com", "DRIVER").await.unwrap();
    assert_eq!(tokens.subject_id, SubjectId(42));
    assert_eq!(tokens.role, "DRIVER");

    let rotated = h.service.refresh(&tokens.refresh_token).await.unwrap();
    assert_ne!(rotated.refresh_token, tokens.refresh_token);
    assert_eq!(rotated.subject_id, SubjectId(42));

    // The exchanged token is dead.
    assert!(matches!(
        h.service.refresh(&tokens.refresh_token).await,
        Err(SessionError::Revoked)
    ));
}

#[tokio::test]
async fn unknown_refresh_token_is_not_recognized() {
    let h = harness();
    assert!(matches!(
        h.service.refresh("never-issued").await,
        Err(SessionError::TokenNotRecognized)
    ));
}

#[tokio::test]
async fn concurrent_refresh_has_exactly_one_winner() {
    let h = harness();
    seed(&h, 42, "a@b.com", "DRIVER");
    let tokens = h.service.login(SubjectId(42), "a@b.com", "DRIVER").await.unwrap();

    let mut handles = Vec::new();
    for _ in 0..2 {
        let service = h.service.clone();
        let token = tokens.refresh_token.clone();
        handles.push(tokio::spawn(async move { service.refresh(&token).await }));
    }

    let mut ok = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => ok += 1,
            Err(SessionError::Revoked) | Err(SessionError::Expired) => {}
            Err(other) => panic!("unexpected refresh failure: {:?}", other),
        }
    }
    assert_eq!(ok, 1);
}

#[tokio::test]
async fn replaying_a_revoked_token_kills_the_whole_chain() {
    let h = harness();
    seed(&h, 42, "a@b.com", "DRIVER");

    let first = h.service.login(SubjectId(42), "a@b.com", "DRIVER").await.unwrap();
    let second = h.service.refresh(&first.refresh_token).await.unwrap();

    // Replay of the already-exchanged token: possible theft.
    assert!(matches!(
        h.service.refresh(&first.refresh_token).await,
        Err(SessionError::Revoked)
    ));

    // The defensive sweep also took out the live successor.
    assert!(matches!(
        h.service.refresh(&second.refresh_token).await,
        Err(SessionError::Revoked)
    ));
}

#[tokio::test]
async fn expired_refresh_token_fails_and_is_purged() {
    let mut cfg = token_config();
    cfg.refresh_ttl = Duration::from_secs(0);
    let h = harness_with(cfg, VerificationConfig::default());
    seed(&h, 42, "a@b.com", "DRIVER");

    let tokens = h.service.login(SubjectId(42), "a@b.com", "DRIVER").await.unwrap();

    assert!(matches!(
        h.service.refresh(&tokens.refresh_token).await,
        Err(SessionError::Expired)
    ));
    // The record was deleted, so a second attempt no longer recognizes it.
    assert!(matches!(
        h.service.refresh(&tokens.refresh_token).await,
        Err(SessionError::TokenNotRecognized)
    ));
}

#[tokio::test]
async fn logout_is_idempotent_and_best_effort() {
    let h = harness();
    seed(&h, 42, "a@b.com", "DRIVER");
    let tokens = h.service.login(SubjectId(42), "a@b.com", "DRIVER").await.unwrap();

    h.service.logout(&tokens.refresh_token).await.unwrap();
    h.service.logout(&tokens.refresh_token).await.unwrap();
    h.service.logout("never-issued").await.unwrap();

    assert!(matches!(
        h.service.refresh(&tokens.refresh_token).await,
        Err(SessionError::Revoked)
    ));
}

#[tokio::test]
async fn revoke_all_spares_other_subjects() {
    let h = harness();
    seed(&h, 42, "a@b.com", "DRIVER");
    seed(&h, 43, "c@d.com", "PASSENGER");

    let a = h.service.login(SubjectId(42), "a@b.com", "DRIVER").await.unwrap();
    let b = h.service.login(SubjectId(43), "c@d.com", "PASSENGER").await.unwrap();

    assert_eq!(h.service.revoke_all(SubjectId(42)).await.unwrap(), 1);

    assert!(matches!(
        h.service.refresh(&a.refresh_token).await,
        Err(SessionError::Revoked)
    ));
    assert!(h.service.refresh(&b.refresh_token).await.is_ok());
}

#[tokio::test]
async fn access_token_verifies_but_refresh_token_does_not() {
    let h = harness();
    seed(&h, 42, "a@b.com", "DRIVER");
    let tokens = h.service.login(SubjectId(42), "a@b.com", "DRIVER").await.unwrap();

    let claims = h.service.verify_access(&tokens.access_token).await.unwrap();
    assert_eq!(claims.subject_id, SubjectId(42));
    assert_eq!(claims.email, "a@b.com");
    assert_eq!(claims.role, "DRIVER");
    assert_ne!(claims.role, REFRESH_ROLE);

    assert!(matches!(
        h.service.verify_access(&tokens.refresh_token).await,
        Err(SessionError::TokenNotRecognized)
    ));
}

#[tokio::test]
async fn authenticate_checks_the_password() {
    let h = harness();
    let hash = Argon2CredentialHasher.hash_password("ride-safe").await.unwrap();
    h.identities.upsert(Identity {
        id: SubjectId(42),
        email: "a@b.com".to_string(),
        role: "DRIVER".to_string(),
        phone_number: None,
        password_hash: hash,
        phone_verified: false,
        email_verified: false,
    });

    let tokens = h.service.authenticate("a@b.com", "ride-safe").await.unwrap();
    assert_eq!(tokens.subject_id, SubjectId(42));

    assert!(matches!(
        h.service.authenticate("a@b.com", "wrong").await,
        Err(SessionError::InvalidCredentials)
    ));
    assert!(matches!(
        h.service.authenticate("nobody@b.com", "ride-safe").await,
        Err(SessionError::InvalidCredentials)
    ));
}

#[tokio::test]
async fn otp_flow_is_single_use() {
    let h = harness();
    seed(&h, 7, "p@q.com", "PASSENGER");

    h.service
        .start_phone_verification(SubjectId(7), "+15551234567")
        .await
        .unwrap();
    let otp = last_otp(&h);

    // Wrong code: rejected, entry intact.
    assert!(matches!(
        h.service.confirm_phone_otp(SubjectId(7), "000000").await,
        Err(SessionError::CredentialMismatch)
    ));
    assert!(h.credentials.get("OTP:7").await.unwrap().is_some());

    // Right code: consumed, flag flipped.
    h.service.confirm_phone_otp(SubjectId(7), &otp).await.unwrap();
    let identity = h.identities.find_by_id(SubjectId(7)).await.unwrap().unwrap();
    assert!(identity.phone_verified);

    // Replay of the correct code: the entry is gone.
    assert!(matches!(
        h.service.confirm_phone_otp(SubjectId(7), &otp).await,
        Err(SessionError::Expired)
    ));
}

#[tokio::test]
async fn concurrent_otp_confirmations_have_one_winner() {
    let h = harness();
    seed(&h, 7, "p@q.com", "PASSENGER");

    h.service
        .start_phone_verification(SubjectId(7), "+15551234567")
        .await
        .unwrap();
    let otp = last_otp(&h);

    let mut handles = Vec::new();
    for _ in 0..2 {
        let service = h.service.clone();
        let otp = otp.clone();
        handles.push(tokio::spawn(async move {
            service.confirm_phone_otp(SubjectId(7), &otp).await
        }));
    }

    let mut ok = 0;
    for handle in handles {
        if handle.await.unwrap().is_ok() {
            ok += 1;
        }
    }
    assert_eq!(ok, 1);
}

#[tokio::test]
async fn otp_expires_after_its_ttl() {
    let verification = VerificationConfig {
        otp_ttl: Duration::from_millis(50),
        ..VerificationConfig::default()
    };
    let h = harness_with(token_config(), verification);
    seed(&h, 7, "p@q.com", "PASSENGER");

    h.service
        .start_phone_verification(SubjectId(7), "+15551234567")
        .await
        .unwrap();
    let otp = last_otp(&h);

    tokio::time::sleep(Duration::from_millis(80)).await;

    assert!(matches!(
        h.service.confirm_phone_otp(SubjectId(7), &otp).await,
        Err(SessionError::Expired)
    ));
}

struct FailingSmsSender;

#[async_trait::async_trait]
impl SmsSender for FailingSmsSender {
    async fn send(&self, _phone_number: &str, _text: &str) -> Result<(), SessionError> {
        Err(SessionError::Dispatch("gateway down".to_string()))
    }
}

#[tokio::test]
async fn otp_survives_a_failed_sms_dispatch() {
    let identities = Arc::new(MemoryIdentityStore::new());
    let credentials = Arc::new(MemoryCredentialStore::new());
    let cfg = token_config();
    let codec: Arc<dyn ClaimsCodec> = Arc::new(JwtClaimsCodec::new(cfg.clone()));
    let service = RealSessionService::new(
        identities.clone(),
        Arc::new(Argon2CredentialHasher),
        codec,
        cfg,
        Arc::new(MemoryRefreshTokenLedger::new()),
        credentials.clone(),
        Arc::new(FailingSmsSender),
        Arc::new(MemoryEmailSender::new()),
        VerificationConfig::default(),
    );
    identities.upsert(Identity {
        id: SubjectId(7),
        email: "p@q.com".to_string(),
        role: "PASSENGER".to_string(),
        phone_number: Some("+15551234567".to_string()),
        password_hash: "unused".to_string(),
        phone_verified: false,
        email_verified: false,
    });

    // Dispatch fails but the operation succeeds and the code stays live.
    service
        .start_phone_verification(SubjectId(7), "+15551234567")
        .await
        .unwrap();

    let otp = credentials.get("OTP:7").await.unwrap().expect("OTP stored");
    service.confirm_phone_otp(SubjectId(7), &otp).await.unwrap();
}

#[tokio::test]
async fn email_verification_round_trip() {
    let h = harness();
    seed(&h, 9, "x@y.com", "PASSENGER");

    h.service.start_email_verification("x@y.com").await.unwrap();

    let mail = h.email.sent();
    let sent = mail.last().expect("verification email was recorded");
    assert_eq!(sent.to_address, "x@y.com");
    let token = sent
        .body
        .split_once("token=")
        .map(|(_, t)| t.to_string())
        .expect("body carries the verification link");

    // The token maps to the subject that asked for verification.
    assert_eq!(
        h.credentials
            .get(&format!("EMAIL_TOKEN:{}", token))
            .await
            .unwrap()
            .as_deref(),
        Some("9")
    );

    let subject = h.service.confirm_email_token(&token).await.unwrap();
    assert_eq!(subject, SubjectId(9));
    let identity = h.identities.find_by_id(SubjectId(9)).await.unwrap().unwrap();
    assert!(identity.email_verified);

    // Single use.
    assert!(matches!(
        h.service.confirm_email_token(&token).await,
        Err(SessionError::Expired)
    ));
}

#[tokio::test]
async fn email_verification_requires_a_known_subject() {
    let h = harness();
    assert!(matches!(
        h.service.start_email_verification("nobody@y.com").await,
        Err(SessionError::SubjectNotFound)
    ));
}
