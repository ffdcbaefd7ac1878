use crate::application_impl::{
    Argon2CredentialHasher, FakeSessionService, JwtClaimsCodec, RealSessionService, TokenConfig,
    VerificationConfig,
};
use crate::application_port::{ClaimsCodec, CredentialHasher, SessionService};
use crate::domain_port::{
    EmailSender, IdentityStore, RefreshTokenLedger, SmsSender, TransientCredentialStore,
};
use crate::infra_memory::{MemoryCredentialStore, MemoryRefreshTokenLedger};
use crate::infra_mysql::MySqlRefreshTokenLedger;
use crate::infra_redis::RedisCredentialStore;
use crate::logger::info;
use crate::settings::Settings;
use sqlx::{MySql, Pool};
use std::sync::Arc;
use std::time::Duration;

/// Collaborators owned by other services, injected by the embedding
/// application: identity persistence and outbound transports.
pub struct Externals {
    pub identity_store: Arc<dyn IdentityStore>,
    pub sms_sender: Arc<dyn SmsSender>,
    pub email_sender: Arc<dyn EmailSender>,
}

/// Composition root. Builds the session service object graph from settings;
/// the backend string selects where the ledger and the credential cache live.
pub struct Runtime {
    pub session_service: Arc<dyn SessionService>,
    pool: Option<Pool<MySql>>,
}

impl Runtime {
    pub async fn try_new(settings: &Settings, externals: Externals) -> anyhow::Result<Self> {
        let token_cfg = TokenConfig {
            app_name: settings.auth.app_name.clone(),
            access_ttl: Duration::from_secs(settings.auth.access_ttl_secs),
            refresh_ttl: Duration::from_secs(settings.auth.refresh_ttl_secs),
            signing_key: settings.auth.signing_key.clone().into_bytes(),
        };
        let verification = VerificationConfig {
            otp_ttl: Duration::from_secs(settings.verification.otp_ttl_secs),
            email_token_ttl: Duration::from_secs(settings.verification.email_token_ttl_secs),
            email_link_base: settings.verification.email_link_base.clone(),
        };

        let claims_codec: Arc<dyn ClaimsCodec> = Arc::new(JwtClaimsCodec::new(token_cfg.clone()));
        let credential_hasher: Arc<dyn CredentialHasher> = Arc::new(Argon2CredentialHasher);

        let (session_service, pool): (Arc<dyn SessionService>, Option<Pool<MySql>>) =
            match settings.session.backend.as_str() {
                "fake" => (Arc::new(FakeSessionService::new()), None),
                "memory" => {
                    let ledger: Arc<dyn RefreshTokenLedger> =
                        Arc::new(MemoryRefreshTokenLedger::new());
                    let credentials: Arc<dyn TransientCredentialStore> =
                        Arc::new(MemoryCredentialStore::new());
                    let service = RealSessionService::new(
                        externals.identity_store,
                        credential_hasher,
                        claims_codec,
                        token_cfg,
                        ledger,
                        credentials,
                        externals.sms_sender,
                        externals.email_sender,
                        verification,
                    );
                    (Arc::new(service), None)
                }
                "real" => {
                    let redis_client = redis::Client::open(settings.redis.dsn.as_str())?;
                    let redis_manager = redis_client.get_connection_manager().await?;
                    let credentials: Arc<dyn TransientCredentialStore> =
                        Arc::new(RedisCredentialStore::new(
                            redis_manager,
                            settings.redis.key_prefix.clone(),
                        ));

                    let pool = Pool::<MySql>::connect(&settings.mysql.dsn).await?;
                    let ledger: Arc<dyn RefreshTokenLedger> =
                        Arc::new(MySqlRefreshTokenLedger::new(pool.clone()));

                    let service = RealSessionService::new(
                        externals.identity_store,
                        credential_hasher,
                        claims_codec,
                        token_cfg,
                        ledger,
                        credentials,
                        externals.sms_sender,
                        externals.email_sender,
                        verification,
                    );
                    (Arc::new(service), Some(pool))
                }
                other => return Err(anyhow::anyhow!("unknown session backend: {}", other)),
            };

        info!("session service ready");

        Ok(Self {
            session_service,
            pool,
        })
    }

    pub async fn shutdown(&self) {
        if let Some(pool) = &self.pool {
            pool.close().await;
        }
        info!("session service shut down");
    }
}
