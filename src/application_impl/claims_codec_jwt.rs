use crate::application_port::{ClaimsCodec, IdentityClaims, SessionError};
use crate::domain_model::SubjectId;
use chrono::DateTime;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Token configuration, built once at startup and handed to the codec and
/// the issuer. The signing key is process-wide and never rotated at runtime.
#[derive(Debug, Clone)]
pub struct TokenConfig {
    pub app_name: String,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
    pub signing_key: Vec<u8>,
}

#[derive(Debug, Serialize, Deserialize)]
struct JwtClaims {
    sub: String, // subject email
    #[serde(rename = "userId")]
    user_id: i64,
    role: String,
    #[serde(rename = "appName")]
    app_name: String,
    iat: i64,
    exp: i64,
}

pub struct JwtClaimsCodec {
    cfg: TokenConfig,
}

impl JwtClaimsCodec {
    pub fn new(cfg: TokenConfig) -> Self {
        JwtClaimsCodec { cfg }
    }
}

impl ClaimsCodec for JwtClaimsCodec {
    fn encode(&self, claims: &IdentityClaims) -> Result<String, SessionError> {
        let wire = JwtClaims {
            sub: claims.email.clone(),
            user_id: claims.subject_id.0,
            role: claims.role.clone(),
            app_name: claims.app_name.clone(),
            iat: claims.issued_at.timestamp(),
            exp: claims.expires_at.timestamp(),
        };

        encode(
            &Header::new(Algorithm::HS256),
            &wire,
            &EncodingKey::from_secret(&self.cfg.signing_key),
        )
        .map_err(|e| SessionError::Backend(e.to_string()))
    }

    fn decode(&self, token: &str) -> Result<IdentityClaims, SessionError> {
        let mut validation = Validation::new(Algorithm::HS256);
        // No leeway: a token is dead the moment its expiry passes.
        validation.leeway = 0;

        let data = decode::<JwtClaims>(
            token,
            &DecodingKey::from_secret(&self.cfg.signing_key),
            &validation,
        )
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => SessionError::Expired,
            ErrorKind::InvalidSignature => SessionError::InvalidSignature,
            _ => SessionError::Malformed,
        })?;

        let wire = data.claims;
        let issued_at = DateTime::from_timestamp(wire.iat, 0).ok_or(SessionError::Malformed)?;
        let expires_at = DateTime::from_timestamp(wire.exp, 0).ok_or(SessionError::Malformed)?;

        Ok(IdentityClaims {
            subject_id: SubjectId(wire.user_id),
            email: wire.sub,
            role: wire.role,
            app_name: wire.app_name,
            issued_at,
            expires_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn test_config() -> TokenConfig {
        TokenConfig {
            app_name: "pillion".to_string(),
            access_ttl: Duration::from_secs(3600),
            refresh_ttl: Duration::from_secs(7 * 24 * 3600),
            signing_key: b"test-signing-key".to_vec(),
        }
    }

    fn claims_with_ttl(ttl_secs: i64) -> IdentityClaims {
        let now = Utc::now();
        IdentityClaims {
            subject_id: SubjectId(42),
            email: "a@b.com".to_string(),
            role: "DRIVER".to_string(),
            app_name: "pillion".to_string(),
            issued_at: now,
            expires_at: now + chrono::Duration::seconds(ttl_secs),
        }
    }

    #[test]
    fn round_trip_preserves_claims() {
        let codec = JwtClaimsCodec::new(test_config());
        let claims = claims_with_ttl(3600);

        let token = codec.encode(&claims).unwrap();
        let decoded = codec.decode(&token).unwrap();

        assert_eq!(decoded.subject_id, SubjectId(42));
        assert_eq!(decoded.email, "a@b.com");
        assert_eq!(decoded.role, "DRIVER");
        assert_eq!(decoded.app_name, "pillion");
        assert_eq!(
            decoded.expires_at.timestamp() - decoded.issued_at.timestamp(),
            3600
        );
    }

    #[test]
    fn decode_after_expiry_fails_expired() {
        let codec = JwtClaimsCodec::new(test_config());
        let claims = claims_with_ttl(-5);

        let token = codec.encode(&claims).unwrap();
        assert!(matches!(codec.decode(&token), Err(SessionError::Expired)));
    }

    #[test]
    fn decode_with_wrong_key_fails_invalid_signature() {
        let codec = JwtClaimsCodec::new(test_config());
        let token = codec.encode(&claims_with_ttl(3600)).unwrap();

        let mut other = test_config();
        other.signing_key = b"some-other-key".to_vec();
        let other_codec = JwtClaimsCodec::new(other);

        assert!(matches!(
            other_codec.decode(&token),
            Err(SessionError::InvalidSignature)
        ));
    }

    #[test]
    fn decode_garbage_fails_malformed() {
        let codec = JwtClaimsCodec::new(test_config());
        assert!(matches!(
            codec.decode("not-a-token"),
            Err(SessionError::Malformed)
        ));
    }
}
