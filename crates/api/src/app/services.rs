//! Shared handler dependencies, built once at startup.

use std::sync::Arc;

use chrono::Utc;

use usergate_auth::{
    Argon2Hasher, CredentialHasher, ExplicitTargetPolicy, Hs256TokenCodec, PasswordError,
    TokenError,
};
use usergate_core::UserId;
use usergate_infra::{AuthConfig, UserStore};

const DUMMY_PASSWORD: &str = "usergate-no-such-user";

pub struct AppServices {
    pub store: Arc<dyn UserStore>,
    pub hasher: Arc<dyn CredentialHasher>,
    pub tokens: Arc<Hs256TokenCodec>,
    pub target_policy: ExplicitTargetPolicy,
    /// Verified against when the login username does not exist, so both
    /// failure paths pay for one Argon2 verification.
    dummy_hash: String,
}

impl AppServices {
    pub fn new(store: Arc<dyn UserStore>, auth: &AuthConfig) -> Self {
        let hasher = Argon2Hasher;
        let dummy_hash = hasher.hash(DUMMY_PASSWORD).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "could not prepare dummy password hash");
            String::new()
        });

        Self {
            store,
            hasher: Arc::new(hasher),
            tokens: Arc::new(Hs256TokenCodec::new(&auth.jwt_secret, auth.token_policy())),
            target_policy: auth.explicit_target_policy,
            dummy_hash,
        }
    }

    pub fn issue_token(&self, id: UserId) -> Result<String, TokenError> {
        self.tokens.issue(id, Utc::now())
    }

    /// Argon2 is CPU-bound, so it runs on the blocking pool.
    pub async fn hash_password(&self, password: String) -> Result<String, PasswordError> {
        let hasher = self.hasher.clone();
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| PasswordError::Hash(e.to_string()))?
    }

    pub async fn verify_password(&self, hash: String, password: String) -> bool {
        let hasher = self.hasher.clone();
        tokio::task::spawn_blocking(move || hasher.verify(&hash, &password))
            .await
            .unwrap_or(false)
    }

    /// Burn one verification for a username that does not exist. Always false.
    pub async fn verify_unknown_user(&self, password: String) -> bool {
        let _ = self.verify_password(self.dummy_hash.clone(), password).await;
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use usergate_infra::InMemoryUserStore;

    fn services() -> AppServices {
        AppServices::new(
            Arc::new(InMemoryUserStore::new()),
            &AuthConfig::with_secret("test-secret"),
        )
    }

    #[test]
    fn dummy_hash_is_a_real_argon2_hash() {
        let services = services();
        assert!(services.dummy_hash.starts_with("$argon2"));
        assert!(services.hasher.verify(&services.dummy_hash, DUMMY_PASSWORD));
    }

    #[tokio::test]
    async fn unknown_user_never_verifies() {
        let services = services();
        assert!(!services.verify_unknown_user(DUMMY_PASSWORD.to_string()).await);
        assert!(!services.verify_unknown_user("anything".to_string()).await);
    }
}
