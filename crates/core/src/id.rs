//! Strongly-typed identifiers used across the workspace.

use core::num::NonZeroU64;
use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Identifier of a user account.
///
/// Ids are assigned by the user store. They are never zero and never exceed
/// [`UserId::MAX`], so they fit a signed 64-bit column.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub struct UserId(NonZeroU64);

impl UserId {
    pub const MAX: u64 = i64::MAX as u64;

    /// Wrap a raw id, rejecting zero and values above [`UserId::MAX`].
    pub fn new(raw: u64) -> Result<Self, DomainError> {
        if raw > Self::MAX {
            return Err(DomainError::invalid_id(format!(
                "UserId: must be at most {}",
                Self::MAX
            )));
        }
        NonZeroU64::new(raw)
            .map(Self)
            .ok_or_else(|| DomainError::invalid_id("UserId: must be non-zero"))
    }

    /// The first id a store assigns.
    pub const FIRST: Self = Self(NonZeroU64::MIN);

    pub fn get(&self) -> u64 {
        self.0.get()
    }
}

impl core::fmt::Display for UserId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl TryFrom<u64> for UserId {
    type Error = DomainError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<UserId> for u64 {
    fn from(value: UserId) -> Self {
        value.get()
    }
}

impl FromStr for UserId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s
            .parse::<u64>()
            .map_err(|e| DomainError::invalid_id(format!("UserId: {e}")))?;
        Self::new(raw)
    }
}
