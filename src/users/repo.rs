use async_trait::async_trait;
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use crate::users::repo_types::{NewUser, User, UserChanges, UserCredentials};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("user already exists")]
    DuplicateEmail,
    #[error("user not found")]
    NotFound,
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

pub type RepoResult<T> = Result<T, RepoError>;

/// Persistence of user rows. Email uniqueness is enforced by the store.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_email(&self, email: &str) -> RepoResult<Option<UserCredentials>>;
    async fn insert(&self, user: NewUser) -> RepoResult<User>;
    async fn find_by_id(&self, id: Uuid) -> RepoResult<User>;
    /// All users in insertion order.
    async fn find_all(&self) -> RepoResult<Vec<User>>;
    async fn update(&self, id: Uuid, changes: UserChanges) -> RepoResult<User>;
    /// Deletes the row and returns its last projection.
    async fn remove(&self, id: Uuid) -> RepoResult<User>;
}

const USER_COLUMNS: &str = "id, name, email, role, created_at, updated_at";

fn map_write_error(e: sqlx::Error) -> RepoError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => RepoError::DuplicateEmail,
        _ => RepoError::Database(e),
    }
}

#[derive(Clone)]
pub struct PgUserRepository {
    db: PgPool,
}

impl PgUserRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_email(&self, email: &str) -> RepoResult<Option<UserCredentials>> {
        let row = sqlx::query_as::<_, UserCredentials>(&format!(
            "SELECT {USER_COLUMNS}, password_hash FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }

    async fn insert(&self, user: NewUser) -> RepoResult<User> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (name, email, password_hash, role)
            VALUES ($1, $2, $3, $4)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role)
        .fetch_one(&self.db)
        .await
        .map_err(map_write_error)
    }

    async fn find_by_id(&self, id: Uuid) -> RepoResult<User> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.db)
            .await?
            .ok_or(RepoError::NotFound)
    }

    async fn find_all(&self) -> RepoResult<Vec<User>> {
        let rows = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at ASC, id ASC"
        ))
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn update(&self, id: Uuid, changes: UserChanges) -> RepoResult<User> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
               SET name = COALESCE($2, name),
                   email = COALESCE($3, email),
                   role = COALESCE($4, role),
                   updated_at = now()
             WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(changes.name)
        .bind(changes.email)
        .bind(changes.role)
        .fetch_optional(&self.db)
        .await
        .map_err(map_write_error)?
        .ok_or(RepoError::NotFound)
    }

    async fn remove(&self, id: Uuid) -> RepoResult<User> {
        sqlx::query_as::<_, User>(&format!(
            "DELETE FROM users WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or(RepoError::NotFound)
    }
}
