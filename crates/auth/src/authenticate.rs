//! Bearer header authentication.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;

use usergate_core::UserId;

use crate::claims::TokenError;
use crate::codec::TokenValidator;
use crate::context::RequestContext;

const BEARER_PREFIX: &str = "Bearer ";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("authorization header missing")]
    MissingToken,

    #[error("authorization header is not a bearer credential")]
    MalformedHeader,

    #[error("invalid token: {0}")]
    InvalidToken(#[source] TokenError),

    /// The token verified but its subject no longer exists.
    #[error("token subject no longer exists")]
    UnknownIdentity,
}

/// Turns an `Authorization` header value into a [`RequestContext`].
///
/// Pure: no IO, no store lookups. Liveness of the identity is the caller's
/// concern.
#[derive(Clone)]
pub struct Authenticator {
    validator: Arc<dyn TokenValidator>,
    admin_id: UserId,
}

impl Authenticator {
    pub fn new(validator: Arc<dyn TokenValidator>, admin_id: UserId) -> Self {
        Self {
            validator,
            admin_id,
        }
    }

    pub fn authenticate(
        &self,
        header: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<RequestContext, AuthError> {
        let header = match header {
            Some(h) if !h.is_empty() => h,
            _ => return Err(AuthError::MissingToken),
        };

        let token = header
            .strip_prefix(BEARER_PREFIX)
            .ok_or(AuthError::MalformedHeader)?;

        let identity = self
            .validator
            .validate(token, now)
            .map_err(AuthError::InvalidToken)?;

        Ok(RequestContext::derive(identity, self.admin_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{Hs256TokenCodec, TokenPolicy};
    use chrono::Duration;

    fn id(raw: u64) -> UserId {
        UserId::new(raw).unwrap()
    }

    fn setup() -> (Arc<Hs256TokenCodec>, Authenticator) {
        let codec = Arc::new(Hs256TokenCodec::new(
            "test-secret",
            TokenPolicy {
                ttl: Duration::minutes(20),
                admin_id: id(1),
                long_lived_admin_tokens: false,
            },
        ));
        let auth = Authenticator::new(codec.clone(), id(1));
        (codec, auth)
    }

    #[test]
    fn missing_or_empty_header() {
        let (_, auth) = setup();
        let now = Utc::now();
        assert_eq!(auth.authenticate(None, now), Err(AuthError::MissingToken));
        assert_eq!(auth.authenticate(Some(""), now), Err(AuthError::MissingToken));
    }

    #[test]
    fn wrong_scheme_is_malformed_header() {
        let (_, auth) = setup();
        let now = Utc::now();
        for header in ["Token abc", "bearer abc", "Bearer", "Bearerabc"] {
            assert_eq!(
                auth.authenticate(Some(header), now),
                Err(AuthError::MalformedHeader),
                "{header:?}"
            );
        }
    }

    #[test]
    fn codec_failures_surface_as_invalid_token() {
        let (codec, auth) = setup();
        let now = Utc::now();

        let err = auth.authenticate(Some("Bearer garbage"), now).unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken(TokenError::Malformed(_))));

        let token = codec.issue(id(9), now).unwrap();
        let later = now + Duration::hours(1);
        assert_eq!(
            auth.authenticate(Some(&format!("Bearer {token}")), later),
            Err(AuthError::InvalidToken(TokenError::Expired))
        );
    }

    #[test]
    fn valid_token_yields_context_and_admin_flag() {
        let (codec, auth) = setup();
        let now = Utc::now();

        let user = codec.issue(id(42), now).unwrap();
        let ctx = auth.authenticate(Some(&format!("Bearer {user}")), now).unwrap();
        assert_eq!(ctx.user_id(), id(42));
        assert!(!ctx.is_admin());

        let admin = codec.issue(id(1), now).unwrap();
        let ctx = auth.authenticate(Some(&format!("Bearer {admin}")), now).unwrap();
        assert_eq!(ctx.user_id(), id(1));
        assert!(ctx.is_admin());
    }

    #[test]
    fn admin_id_is_configurable() {
        let (codec, _) = setup();
        let auth = Authenticator::new(codec.clone(), id(42));
        let now = Utc::now();
        let token = codec.issue(id(42), now).unwrap();
        let ctx = auth.authenticate(Some(&format!("Bearer {token}")), now).unwrap();
        assert!(ctx.is_admin());
    }
}
