//! Configuration loading and representation.
//!
//! Everything comes from environment variables; missing values fall back to
//! development defaults, malformed values are startup errors.

use std::net::SocketAddr;

use anyhow::{Context, bail};
use chrono::Duration;

use usergate_auth::{ExplicitTargetPolicy, TokenPolicy};
use usergate_core::UserId;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_JWT_SECRET: &str = "dev-secret";
const DEFAULT_ADMIN_ID: u64 = 1;
const DEFAULT_TOKEN_TTL_SECS: i64 = 20 * 60;
const DEFAULT_CORS_ORIGINS: &str = "http://localhost:5173,http://localhost:5174";
const DEFAULT_ADMIN_USERNAME: &str = "admin";
const DEFAULT_ADMIN_PASSWORD: &str = "admin123";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub auth: AuthConfig,
    /// CORS allowed origins (exact match).
    pub cors_allowed_origins: Vec<String>,
    /// Postgres connection string; `None` selects the in-memory store.
    pub database_url: Option<String>,
    pub admin_username: String,
    pub admin_password: String,
}

#[derive(Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub admin_id: UserId,
    pub token_ttl: Duration,
    pub long_lived_admin_tokens: bool,
    pub explicit_target_policy: ExplicitTargetPolicy,
    /// Reject tokens whose subject was deleted after issuance.
    pub verify_identity_exists: bool,
}

// Keep the secret out of logs.
impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"<redacted>")
            .field("admin_id", &self.admin_id)
            .field("token_ttl", &self.token_ttl)
            .field("long_lived_admin_tokens", &self.long_lived_admin_tokens)
            .field("explicit_target_policy", &self.explicit_target_policy)
            .field("verify_identity_exists", &self.verify_identity_exists)
            .finish()
    }
}

impl AuthConfig {
    pub fn token_policy(&self) -> TokenPolicy {
        TokenPolicy {
            ttl: self.token_ttl,
            admin_id: self.admin_id,
            long_lived_admin_tokens: self.long_lived_admin_tokens,
        }
    }

    /// Development defaults with the given secret.
    pub fn with_secret(jwt_secret: impl Into<String>) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
            admin_id: UserId::FIRST,
            token_ttl: Duration::seconds(DEFAULT_TOKEN_TTL_SECS),
            long_lived_admin_tokens: false,
            explicit_target_policy: ExplicitTargetPolicy::AdminOnly,
            verify_identity_exists: true,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (tests pass a map).
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let bind_addr = get("BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse::<SocketAddr>()
            .context("BIND_ADDR must be a socket address")?;

        let jwt_secret = get("JWT_SECRET").unwrap_or_else(|| {
            tracing::warn!("JWT_SECRET not set; using insecure dev default");
            DEFAULT_JWT_SECRET.to_string()
        });

        let admin_raw = match get("ADMIN_USER_ID") {
            Some(v) => v.parse::<u64>().context("ADMIN_USER_ID must be an integer")?,
            None => DEFAULT_ADMIN_ID,
        };
        let admin_id = UserId::new(admin_raw).context("ADMIN_USER_ID")?;

        let ttl_secs = match get("TOKEN_TTL_SECS") {
            Some(v) => v.parse::<i64>().context("TOKEN_TTL_SECS must be an integer")?,
            None => DEFAULT_TOKEN_TTL_SECS,
        };
        if ttl_secs <= 0 {
            bail!("TOKEN_TTL_SECS must be positive, got {ttl_secs}");
        }

        let long_lived_admin_tokens = parse_bool(get("LONG_LIVED_ADMIN_TOKENS"), false)
            .context("LONG_LIVED_ADMIN_TOKENS")?;
        if long_lived_admin_tokens {
            tracing::warn!("admin tokens are issued without expiry");
        }

        let explicit_target_policy = match get("EXPLICIT_TARGET_POLICY") {
            Some(v) => v
                .parse::<ExplicitTargetPolicy>()
                .map_err(anyhow::Error::msg)
                .context("EXPLICIT_TARGET_POLICY")?,
            None => ExplicitTargetPolicy::default(),
        };

        let verify_identity_exists = parse_bool(get("VERIFY_IDENTITY_EXISTS"), true)
            .context("VERIFY_IDENTITY_EXISTS")?;

        let cors_allowed_origins = get("CORS_ALLOWED_ORIGINS")
            .unwrap_or_else(|| DEFAULT_CORS_ORIGINS.to_string())
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();

        let admin_username =
            get("ADMIN_USERNAME").unwrap_or_else(|| DEFAULT_ADMIN_USERNAME.to_string());
        let admin_password = get("ADMIN_PASSWORD").unwrap_or_else(|| {
            tracing::warn!("ADMIN_PASSWORD not set; using insecure dev default");
            DEFAULT_ADMIN_PASSWORD.to_string()
        });

        Ok(Self {
            bind_addr,
            auth: AuthConfig {
                jwt_secret,
                admin_id,
                token_ttl: Duration::seconds(ttl_secs),
                long_lived_admin_tokens,
                explicit_target_policy,
                verify_identity_exists,
            },
            cors_allowed_origins,
            database_url: get("DATABASE_URL"),
            admin_username,
            admin_password,
        })
    }
}

fn parse_bool(raw: Option<String>, default: bool) -> anyhow::Result<bool> {
    match raw.as_deref().map(|s| s.trim().to_ascii_lowercase()) {
        None => Ok(default),
        Some(v) => match v.as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            other => bail!("expected a boolean, got '{other}'"),
        },
    }
}
