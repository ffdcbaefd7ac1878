//! Walks the full credential lifecycle against the in-memory backend:
//! authenticate, verify, rotate, logout, then both verification flows.
//!
//! ```text
//! cargo run --bin session_demo -- --settings=settings/dev.toml
//! ```

use pillion::application_impl::Argon2CredentialHasher;
use pillion::application_port::{CredentialHasher, SessionError, SessionService};
use pillion::domain_model::SubjectId;
use pillion::domain_port::{Identity, IdentityStore};
use pillion::infra_memory::{MemoryEmailSender, MemoryIdentityStore, MemorySmsSender};
use pillion::logger::*;
use pillion::runtime::{Externals, Runtime};
use pillion::settings::*;
use std::sync::Arc;

const EMAIL: &str = "demo.driver@example.com";
const PASSWORD: &str = "ride-safe";
const PHONE: &str = "+15551234567";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let logger = Logger::bootstrap();
    let project_settings = parse_settings(cli.settings.as_deref())?;
    logger.apply_filter(&project_settings.log.filter)?;

    // region seed external collaborators

    let hasher = Argon2CredentialHasher;
    let identity_store = Arc::new(MemoryIdentityStore::new());
    identity_store.upsert(Identity {
        id: SubjectId(42),
        email: EMAIL.to_string(),
        role: "DRIVER".to_string(),
        phone_number: Some(PHONE.to_string()),
        password_hash: hasher.hash_password(PASSWORD).await?,
        phone_verified: false,
        email_verified: false,
    });

    let sms_sender = Arc::new(MemorySmsSender::new());
    let email_sender = Arc::new(MemoryEmailSender::new());

    let runtime = Runtime::try_new(
        &project_settings,
        Externals {
            identity_store: identity_store.clone(),
            sms_sender: sms_sender.clone(),
            email_sender: email_sender.clone(),
        },
    )
    .await?;
    let sessions = runtime.session_service.clone();

    // endregion

    // region token lifecycle

    let tokens = sessions.authenticate(EMAIL, PASSWORD).await?;
    println!("{}", serde_json::to_string_pretty(&tokens)?);

    let claims = sessions.verify_access(&tokens.access_token).await?;
    info!(?claims, "access token verified");

    let rotated = sessions.refresh(&tokens.refresh_token).await?;
    info!(new_refresh_expiry = %rotated.refresh_expires_at, "refresh token rotated");

    match sessions.refresh(&tokens.refresh_token).await {
        Err(SessionError::Revoked) => info!("old refresh token correctly rejected"),
        other => warn!(?other, "unexpected outcome for replayed refresh token"),
    }

    sessions.logout(&rotated.refresh_token).await?;
    info!("logged out");

    // endregion

    // region phone + email verification

    sessions.start_phone_verification(SubjectId(42), PHONE).await?;
    let sms = sms_sender.sent();
    let otp = sms
        .last()
        .and_then(|m| m.text.rsplit(' ').next().map(str::to_string))
        .expect("OTP SMS was recorded");
    sessions.confirm_phone_otp(SubjectId(42), &otp).await?;
    info!("phone verified");

    sessions.start_email_verification(EMAIL).await?;
    let mail = email_sender.sent();
    let token = mail
        .last()
        .and_then(|m| m.body.split_once("token=").map(|(_, t)| t.to_string()))
        .expect("verification email was recorded");
    let subject = sessions.confirm_email_token(&token).await?;
    info!(%subject, "email verified");

    let verified = identity_store.find_by_id(SubjectId(42)).await?.unwrap();
    println!(
        "phone_verified={} email_verified={}",
        verified.phone_verified, verified.email_verified
    );

    // endregion

    runtime.shutdown().await;

    Ok(())
}
