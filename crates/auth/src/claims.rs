use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use usergate_core::UserId;

/// Claims carried by a bearer token.
///
/// Wire shape: `{"Id": <u64>, "iat"?: <secs>, "exp"?: <secs>}`. A token without
/// `exp` never expires; only the admin identity is ever issued one, and only
/// when configured to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject identifier.
    #[serde(rename = "Id")]
    pub id: u64,

    /// Issued-at, unix seconds. Informational; tokens from older issuers omit it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,

    /// Expiration, unix seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
}

impl TokenClaims {
    pub fn new(id: UserId, issued_at: DateTime<Utc>, expires_at: Option<DateTime<Utc>>) -> Self {
        Self {
            id: id.get(),
            iat: Some(issued_at.timestamp()),
            exp: expires_at.map(|t| t.timestamp()),
        }
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.exp.and_then(|secs| Utc.timestamp_opt(secs, 0).single())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("malformed token: {0}")]
    Malformed(String),

    #[error("token signature does not verify")]
    BadSignature,

    #[error("token has expired")]
    Expired,

    #[error("failed to sign token: {0}")]
    Encoding(String),
}

/// Check the time window of already-verified claims.
///
/// A token is expired from the second named by `exp` onwards.
pub fn validate_claims(claims: &TokenClaims, now: DateTime<Utc>) -> Result<(), TokenError> {
    match claims.exp {
        Some(exp) if now.timestamp() >= exp => Err(TokenError::Expired),
        _ => Ok(()),
    }
}
