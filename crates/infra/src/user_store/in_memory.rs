use std::collections::BTreeMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;

use usergate_core::{NewUser, UserId, UserPatch, UserRecord};

use super::{StoreError, UserStore};

/// In-memory user store for tests/dev.
///
/// Ids are assigned sequentially from 1 and never reused, like a SERIAL column.
#[derive(Debug)]
pub struct InMemoryUserStore {
    inner: RwLock<Inner>,
}

#[derive(Debug)]
struct Inner {
    rows: BTreeMap<UserId, UserRecord>,
    next_id: u64,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner {
                rows: BTreeMap::new(),
                next_id: 1,
            }),
        }
    }
}

impl Default for InMemoryUserStore {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned() -> StoreError {
    StoreError::Backend("user store lock poisoned".to_string())
}

/// Reject `username`/`email` values already held by a row other than `except`.
fn check_unique(
    rows: &BTreeMap<UserId, UserRecord>,
    username: Option<&str>,
    email: Option<&str>,
    except: Option<UserId>,
) -> Result<(), StoreError> {
    for row in rows.values().filter(|r| Some(r.id) != except) {
        if username.is_some_and(|u| u == row.username) {
            return Err(StoreError::Conflict(format!(
                "username '{}' is taken",
                row.username
            )));
        }
        // Empty emails (the bootstrap admin) are not unique-checked.
        if email.is_some_and(|e| !e.is_empty() && e == row.email) {
            return Err(StoreError::Conflict(format!("email '{}' is taken", row.email)));
        }
    }
    Ok(())
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_id(&self, id: UserId) -> Result<Option<UserRecord>, StoreError> {
        let inner = self.inner.read().map_err(|_| poisoned())?;
        Ok(inner.rows.get(&id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, StoreError> {
        let inner = self.inner.read().map_err(|_| poisoned())?;
        Ok(inner.rows.values().find(|r| r.username == username).cloned())
    }

    async fn insert(&self, user: NewUser) -> Result<UserId, StoreError> {
        let mut inner = self.inner.write().map_err(|_| poisoned())?;
        check_unique(&inner.rows, Some(&user.username), Some(&user.email), None)?;

        let id = UserId::new(inner.next_id).map_err(|e| StoreError::Backend(e.to_string()))?;
        inner.next_id += 1;
        inner.rows.insert(
            id,
            UserRecord {
                id,
                username: user.username,
                email: user.email,
                password_hash: user.password_hash,
                created_at: Utc::now(),
            },
        );
        Ok(id)
    }

    async fn update(&self, id: UserId, patch: UserPatch) -> Result<Option<UserRecord>, StoreError> {
        let mut inner = self.inner.write().map_err(|_| poisoned())?;
        if !inner.rows.contains_key(&id) {
            return Ok(None);
        }
        check_unique(
            &inner.rows,
            patch.username.as_deref(),
            patch.email.as_deref(),
            Some(id),
        )?;

        let Some(row) = inner.rows.get_mut(&id) else {
            return Ok(None);
        };
        patch.apply_to(row);
        Ok(Some(row.clone()))
    }

    async fn delete(&self, id: UserId) -> Result<bool, StoreError> {
        let mut inner = self.inner.write().map_err(|_| poisoned())?;
        Ok(inner.rows.remove(&id).is_some())
    }

    async fn list(&self) -> Result<Vec<UserRecord>, StoreError> {
        let inner = self.inner.read().map_err(|_| poisoned())?;
        Ok(inner.rows.values().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(name: &str) -> NewUser {
        NewUser::new(name, format!("{name}@example.com"), "$argon2id$stub").unwrap()
    }

    #[tokio::test]
    async fn ids_are_sequential_from_one() {
        let store = InMemoryUserStore::new();
        assert_eq!(store.insert(new_user("admin")).await.unwrap().get(), 1);
        assert_eq!(store.insert(new_user("ana")).await.unwrap().get(), 2);
    }

    #[tokio::test]
    async fn ids_are_not_reused_after_delete() {
        let store = InMemoryUserStore::new();
        let first = store.insert(new_user("a")).await.unwrap();
        assert!(store.delete(first).await.unwrap());
        let second = store.insert(new_user("b")).await.unwrap();
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn lookups_by_id_and_username() {
        let store = InMemoryUserStore::new();
        let id = store.insert(new_user("ana")).await.unwrap();

        let by_id = store.find_by_id(id).await.unwrap().unwrap();
        assert_eq!(by_id.username, "ana");

        let by_name = store.find_by_username("ana").await.unwrap().unwrap();
        assert_eq!(by_name.id, id);

        assert!(store.find_by_username("bob").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_username_or_email_conflicts() {
        let store = InMemoryUserStore::new();
        store.insert(new_user("ana")).await.unwrap();

        let err = store.insert(new_user("ana")).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));

        let same_email = NewUser::new("other", "ana@example.com", "h").unwrap();
        let err = store.insert(same_email).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn update_is_partial_and_checks_uniqueness() {
        let store = InMemoryUserStore::new();
        let ana = store.insert(new_user("ana")).await.unwrap();
        store.insert(new_user("bob")).await.unwrap();

        let updated = store
            .update(
                ana,
                UserPatch {
                    email: Some("ana@new.example".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.username, "ana");
        assert_eq!(updated.email, "ana@new.example");

        let err = store
            .update(
                ana,
                UserPatch {
                    username: Some("bob".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));

        // Renaming to your own current name is not a conflict.
        let same = store
            .update(
                ana,
                UserPatch {
                    username: Some("ana".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(same.is_some());
    }

    #[tokio::test]
    async fn update_and_delete_of_missing_rows() {
        let store = InMemoryUserStore::new();
        let ghost = UserId::new(99).unwrap();
        assert!(store.update(ghost, UserPatch::default()).await.unwrap().is_none());
        assert!(!store.delete(ghost).await.unwrap());
    }

    #[tokio::test]
    async fn list_is_ordered_by_id() {
        let store = InMemoryUserStore::new();
        for name in ["c", "a", "b"] {
            store.insert(new_user(name)).await.unwrap();
        }
        let names: Vec<_> = store
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.username)
            .collect();
        assert_eq!(names, vec!["c", "a", "b"]);
    }
}
