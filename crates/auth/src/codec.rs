//! HS256 bearer token codec.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};

use usergate_core::UserId;

use crate::claims::{TokenClaims, TokenError, validate_claims};
use crate::context::UserIdentity;

/// Verifies a raw bearer token and yields the identity it carries.
///
/// The request gate only depends on this trait, so tests and alternative
/// signers can stand in for the HS256 codec.
pub trait TokenValidator: Send + Sync {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<UserIdentity, TokenError>;
}

/// Issuance policy for the codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenPolicy {
    /// Lifetime of issued tokens.
    pub ttl: Duration,

    /// The single privileged identity.
    pub admin_id: UserId,

    /// Issue admin tokens without `exp`. Weaker: such a token is valid until
    /// the signing secret changes.
    pub long_lived_admin_tokens: bool,
}

/// Signs and parses tokens with a symmetric HMAC-SHA256 key.
pub struct Hs256TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    policy: TokenPolicy,
}

impl Hs256TokenCodec {
    pub fn new(secret: impl AsRef<[u8]>, policy: TokenPolicy) -> Self {
        let secret = secret.as_ref();

        // Expiry is checked against the caller's clock in `validate_claims`,
        // and `exp` is optional for long-lived admin tokens.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.leeway = 0;
        validation.set_required_spec_claims::<&str>(&[]);

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            policy,
        }
    }

    pub fn policy(&self) -> &TokenPolicy {
        &self.policy
    }

    /// Issue a token for `id`, valid from `now`.
    pub fn issue(&self, id: UserId, now: DateTime<Utc>) -> Result<String, TokenError> {
        let expires_at = if id == self.policy.admin_id && self.policy.long_lived_admin_tokens {
            None
        } else {
            Some(now + self.policy.ttl)
        };
        self.sign(&TokenClaims::new(id, now, expires_at))
    }

    /// Sign arbitrary claims. `issue` is the normal entry point.
    pub fn sign(&self, claims: &TokenClaims) -> Result<String, TokenError> {
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(|e| TokenError::Encoding(e.to_string()))
    }

    /// Decode, verify the signature, then check the time window.
    pub fn parse(&self, token: &str, now: DateTime<Utc>) -> Result<UserIdentity, TokenError> {
        let data = jsonwebtoken::decode::<TokenClaims>(token, &self.decoding, &self.validation)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature => TokenError::BadSignature,
                other => TokenError::Malformed(format!("{other:?}")),
            })?;

        let claims = data.claims;
        let id = UserId::new(claims.id).map_err(|e| TokenError::Malformed(e.to_string()))?;
        validate_claims(&claims, now)?;

        Ok(UserIdentity::new(id))
    }
}

impl TokenValidator for Hs256TokenCodec {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<UserIdentity, TokenError> {
        self.parse(token, now)
    }
}
