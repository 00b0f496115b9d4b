//! Postgres-backed user store.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | StoreError |
//! |------------|----------------------|------------|
//! | Database (unique violation) | `23505` | `Conflict` |
//! | anything else | any | `Backend` |

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::instrument;

use usergate_core::{NewUser, UserId, UserPatch, UserRecord};

use super::{StoreError, UserStore};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id BIGSERIAL PRIMARY KEY,
    username VARCHAR(50) NOT NULL UNIQUE,
    email VARCHAR(100) NOT NULL DEFAULT '',
    password_hash TEXT NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
)
"#;

// The bootstrap admin has no email, so only non-empty emails are unique.
const EMAIL_INDEX: &str = r#"
CREATE UNIQUE INDEX IF NOT EXISTS users_email_key ON users (email) WHERE email <> ''
"#;

const COLUMNS: &str = "id, username, email, password_hash, created_at";

/// Postgres-backed user store.
///
/// Uses the SQLx connection pool, which is `Send + Sync`; no extra locking.
#[derive(Debug, Clone)]
pub struct PostgresUserStore {
    pool: Arc<PgPool>,
}

impl PostgresUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Connect and make sure the `users` table exists.
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPool::connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        let store = Self::new(pool);
        store.ensure_schema().await?;
        Ok(store)
    }

    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        for statement in [SCHEMA, EMAIL_INDEX] {
            sqlx::query(statement)
                .execute(&*self.pool)
                .await
                .map_err(|e| map_sqlx_error("ensure_schema", e))?;
        }
        Ok(())
    }
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            match db_err.code().as_deref() {
                Some("23505") => StoreError::Conflict(msg),
                _ => StoreError::Backend(msg),
            }
        }
        other => StoreError::Backend(format!("{operation}: {other}")),
    }
}

fn row_to_record(row: &PgRow) -> Result<UserRecord, StoreError> {
    let decode = |e: sqlx::Error| map_sqlx_error("decode_user", e);

    let raw_id: i64 = row.try_get("id").map_err(decode)?;
    let id = u64::try_from(raw_id)
        .map_err(|e| StoreError::Backend(format!("negative user id {raw_id}: {e}")))
        .and_then(|raw| UserId::new(raw).map_err(|e| StoreError::Backend(e.to_string())))?;

    let created_at: DateTime<Utc> = row.try_get("created_at").map_err(decode)?;

    Ok(UserRecord {
        id,
        username: row.try_get("username").map_err(decode)?,
        email: row.try_get("email").map_err(decode)?,
        password_hash: row.try_get("password_hash").map_err(decode)?,
        created_at,
    })
}

fn db_id(id: UserId) -> Result<i64, StoreError> {
    i64::try_from(id.get()).map_err(|e| StoreError::Backend(format!("user id {id} out of range: {e}")))
}

#[async_trait]
impl UserStore for PostgresUserStore {
    #[instrument(skip(self))]
    async fn find_by_id(&self, id: UserId) -> Result<Option<UserRecord>, StoreError> {
        let row = sqlx::query(&format!("SELECT {COLUMNS} FROM users WHERE id = $1"))
            .bind(db_id(id)?)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_by_id", e))?;
        row.as_ref().map(row_to_record).transpose()
    }

    #[instrument(skip(self))]
    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, StoreError> {
        let row = sqlx::query(&format!("SELECT {COLUMNS} FROM users WHERE username = $1"))
            .bind(username)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_by_username", e))?;
        row.as_ref().map(row_to_record).transpose()
    }

    #[instrument(skip(self, user), fields(username = %user.username))]
    async fn insert(&self, user: NewUser) -> Result<UserId, StoreError> {
        let row = sqlx::query(
            "INSERT INTO users (username, email, password_hash) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_user", e))?;

        let raw: i64 = row
            .try_get("id")
            .map_err(|e| map_sqlx_error("insert_user", e))?;
        u64::try_from(raw)
            .ok()
            .and_then(|raw| UserId::new(raw).ok())
            .ok_or_else(|| StoreError::Backend(format!("database returned invalid id {raw}")))
    }

    #[instrument(skip(self, patch))]
    async fn update(&self, id: UserId, patch: UserPatch) -> Result<Option<UserRecord>, StoreError> {
        // COALESCE keeps columns whose patch field is NULL.
        let row = sqlx::query(&format!(
            r#"
            UPDATE users SET
                username = COALESCE($2, username),
                email = COALESCE($3, email),
                password_hash = COALESCE($4, password_hash)
            WHERE id = $1
            RETURNING {COLUMNS}
            "#
        ))
        .bind(db_id(id)?)
        .bind(patch.username)
        .bind(patch.email)
        .bind(patch.password_hash)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_user", e))?;
        row.as_ref().map(row_to_record).transpose()
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: UserId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(db_id(id)?)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_user", e))?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self))]
    async fn list(&self) -> Result<Vec<UserRecord>, StoreError> {
        let rows = sqlx::query(&format!("SELECT {COLUMNS} FROM users ORDER BY id"))
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_users", e))?;
        rows.iter().map(row_to_record).collect()
    }
}
