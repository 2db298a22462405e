use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::users::{
    repo::{RepoError, RepoResult, UserRepository},
    repo_types::{NewUser, User, UserChanges, UserCredentials},
};

/// In-process user store with the same contract as the Postgres one.
/// Rows are kept in insertion order.
#[derive(Default)]
pub struct MemoryUserRepository {
    rows: RwLock<Vec<UserCredentials>>,
}

impl MemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn find_by_email(&self, email: &str) -> RepoResult<Option<UserCredentials>> {
        let rows = self.rows.read().await;
        Ok(rows.iter().find(|r| r.user.email == email).cloned())
    }

    async fn insert(&self, new: NewUser) -> RepoResult<User> {
        let mut rows = self.rows.write().await;
        if rows.iter().any(|r| r.user.email == new.email) {
            return Err(RepoError::DuplicateEmail);
        }
        let now = OffsetDateTime::now_utc();
        let user = User {
            id: Uuid::new_v4(),
            name: new.name,
            email: new.email,
            role: new.role,
            created_at: now,
            updated_at: now,
        };
        rows.push(UserCredentials {
            user: user.clone(),
            password_hash: new.password_hash,
        });
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> RepoResult<User> {
        let rows = self.rows.read().await;
        rows.iter()
            .find(|r| r.user.id == id)
            .map(|r| r.user.clone())
            .ok_or(RepoError::NotFound)
    }

    async fn find_all(&self) -> RepoResult<Vec<User>> {
        let rows = self.rows.read().await;
        Ok(rows.iter().map(|r| r.user.clone()).collect())
    }

    async fn update(&self, id: Uuid, changes: UserChanges) -> RepoResult<User> {
        let mut rows = self.rows.write().await;
        if let Some(email) = &changes.email {
            if rows.iter().any(|r| r.user.id != id && &r.user.email == email) {
                return Err(RepoError::DuplicateEmail);
            }
        }
        let row = rows
            .iter_mut()
            .find(|r| r.user.id == id)
            .ok_or(RepoError::NotFound)?;
        if let Some(name) = changes.name {
            row.user.name = name;
        }
        if let Some(email) = changes.email {
            row.user.email = email;
        }
        if let Some(role) = changes.role {
            row.user.role = role;
        }
        row.user.updated_at = OffsetDateTime::now_utc();
        Ok(row.user.clone())
    }

    async fn remove(&self, id: Uuid) -> RepoResult<User> {
        let mut rows = self.rows.write().await;
        let idx = rows
            .iter()
            .position(|r| r.user.id == id)
            .ok_or(RepoError::NotFound)?;
        Ok(rows.remove(idx).user)
    }
}
