//! Startup seeding of the admin account.

use anyhow::Context;

use usergate_auth::CredentialHasher;
use usergate_core::{NewUser, UserId};

use crate::user_store::UserStore;

/// Create the admin account if no user named `username` exists yet.
///
/// Privilege is tied to an id, not a name, so a mismatch between the seeded
/// row's id and `admin_id` is logged loudly.
pub async fn ensure_admin_user(
    store: &dyn UserStore,
    hasher: &dyn CredentialHasher,
    username: &str,
    password: &str,
    admin_id: UserId,
) -> anyhow::Result<UserId> {
    let id = match store.find_by_username(username).await? {
        Some(existing) => existing.id,
        None => {
            let hash = hasher.hash(password).context("hashing admin password")?;
            let new = NewUser::new(username, "", hash)?;
            let id = store.insert(new).await.context("creating admin user")?;
            tracing::info!(user_id = %id, username, "admin user created");
            id
        }
    };

    if id != admin_id {
        tracing::warn!(
            user_id = %id,
            admin_id = %admin_id,
            username,
            "bootstrap admin account does not hold the configured admin id; it has no privileges"
        );
    }

    Ok(id)
}
