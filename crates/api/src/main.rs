use std::sync::Arc;

use anyhow::Context;

use usergate_auth::Argon2Hasher;
use usergate_infra::{
    AppConfig, InMemoryUserStore, PostgresUserStore, UserStore, ensure_admin_user,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    usergate_observability::init();

    let config = AppConfig::from_env()?;
    tracing::info!(?config.auth, origins = ?config.cors_allowed_origins, "configuration loaded");

    let store: Arc<dyn UserStore> = match &config.database_url {
        Some(url) => Arc::new(
            PostgresUserStore::connect(url)
                .await
                .context("connecting to DATABASE_URL")?,
        ),
        None => {
            tracing::warn!("DATABASE_URL not set; users are kept in memory");
            Arc::new(InMemoryUserStore::new())
        }
    };

    ensure_admin_user(
        store.as_ref(),
        &Argon2Hasher,
        &config.admin_username,
        &config.admin_password,
        config.auth.admin_id,
    )
    .await?;

    let app = usergate_api::app::build_app(&config, store);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
