//! `usergate-core` — shared domain primitives (no infrastructure concerns).

pub mod error;
pub mod id;
pub mod user;

pub use error::{DomainError, DomainResult};
pub use id::UserId;
pub use user::{EMAIL_MAX_LEN, NewUser, USERNAME_MAX_LEN, UserPatch, UserRecord, UserView};
