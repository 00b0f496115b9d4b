//! Infrastructure layer: user storage, configuration, startup seeding.

pub mod bootstrap;
pub mod config;
pub mod user_store;

pub use bootstrap::ensure_admin_user;
pub use config::{AppConfig, AuthConfig};
pub use user_store::{InMemoryUserStore, PostgresUserStore, StoreError, UserStore};
