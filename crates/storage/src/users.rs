//! User account store

use chrono::Utc;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use cityflow_types::User;

use crate::{StorageError, StorageResult};

/// A stored account together with its credential hash.
///
/// The hash stays inside the API process; only [`User`] is serialized.
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub user: User,
    pub password_hash: String,
}

/// Store for the `users` table.
#[derive(Clone)]
pub struct UserStore {
    pool: PgPool,
}

impl UserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create an account; a duplicate email surfaces as
    /// [`StorageError::DuplicateEmail`].
    pub async fn create(&self, email: &str, password_hash: &str) -> StorageResult<User> {
        let user = User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            role: User::DEFAULT_ROLE.to_string(),
            created_at: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO users (id, email, password_hash, role, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(password_hash)
        .bind(&user.role)
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(StorageError::from_user_insert)?;

        Ok(user)
    }

    /// Look up an account by email.
    pub async fn by_email(&self, email: &str) -> StorageResult<Option<UserRecord>> {
        let row = sqlx::query(
            "SELECT id, email, password_hash, role, created_at FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| {
            Ok(UserRecord {
                user: User {
                    id: row.try_get("id")?,
                    email: row.try_get("email")?,
                    role: row.try_get("role")?,
                    created_at: row.try_get("created_at")?,
                },
                password_hash: row.try_get("password_hash")?,
            })
        })
        .transpose()
    }
}
