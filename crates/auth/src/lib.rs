//! `usergate-auth` — token authentication and self/admin authorization.
//!
//! This crate is intentionally decoupled from HTTP and storage.

pub mod authenticate;
pub mod authorize;
pub mod claims;
pub mod codec;
pub mod context;
pub mod password;

pub use authenticate::{AuthError, Authenticator};
pub use authorize::{
    AccessKind, AuthzError, ExplicitTargetPolicy, ResolvedTarget, TargetRoute,
    authorize_self_or_admin, require_admin,
};
pub use claims::{TokenClaims, TokenError, validate_claims};
pub use codec::{Hs256TokenCodec, TokenPolicy, TokenValidator};
pub use context::{RequestContext, UserIdentity};
pub use password::{Argon2Hasher, CredentialHasher, PasswordError};
