//! User store abstraction (the persistence collaborator of the auth core).
//!
//! The auth core never calls this; handlers do, with the target id the
//! authorization policy resolved.

pub mod in_memory;
pub mod postgres;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use usergate_core::{NewUser, UserId, UserPatch, UserRecord};

pub use in_memory::InMemoryUserStore;
pub use postgres::PostgresUserStore;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A unique column (username, email) already holds the value.
    #[error("conflict: {0}")]
    Conflict(String),

    #[error("storage backend error: {0}")]
    Backend(String),
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: UserId) -> Result<Option<UserRecord>, StoreError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, StoreError>;

    async fn insert(&self, user: NewUser) -> Result<UserId, StoreError>;

    /// Apply `patch` and return the updated row, or `None` if `id` is absent.
    async fn update(&self, id: UserId, patch: UserPatch) -> Result<Option<UserRecord>, StoreError>;

    /// Returns whether a row was removed.
    async fn delete(&self, id: UserId) -> Result<bool, StoreError>;

    /// All users ordered by id.
    async fn list(&self) -> Result<Vec<UserRecord>, StoreError>;
}

#[async_trait]
impl<S> UserStore for Arc<S>
where
    S: UserStore + ?Sized,
{
    async fn find_by_id(&self, id: UserId) -> Result<Option<UserRecord>, StoreError> {
        (**self).find_by_id(id).await
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, StoreError> {
        (**self).find_by_username(username).await
    }

    async fn insert(&self, user: NewUser) -> Result<UserId, StoreError> {
        (**self).insert(user).await
    }

    async fn update(&self, id: UserId, patch: UserPatch) -> Result<Option<UserRecord>, StoreError> {
        (**self).update(id, patch).await
    }

    async fn delete(&self, id: UserId) -> Result<bool, StoreError> {
        (**self).delete(id).await
    }

    async fn list(&self) -> Result<Vec<UserRecord>, StoreError> {
        (**self).list().await
    }
}
