//! User repository.

use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::aggregates::{Registration, User, UserProfile};
use crate::{Result, ShopError};

/// Repository for user database operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Creates a user and their profile together.
    ///
    /// # Errors
    ///
    /// Returns `Conflict` if the username or email is already taken.
    pub async fn register(&self, username: &str, email: &str, phone_number: &str) -> Result<Registration> {
        let mut tx = self.pool.begin().await?;
        let user = sqlx::query_as::<_, User>("INSERT INTO users (id, username, email) VALUES ($1, $2, $3) RETURNING *")
            .bind(Uuid::now_v7())
            .bind(username)
            .bind(email.to_lowercase())
            .fetch_one(&mut *tx)
            .await?;
        let profile = sqlx::query_as::<_, UserProfile>(
            "INSERT INTO user_profiles (user_id, phone_number) VALUES ($1, $2) RETURNING *",
        )
        .bind(user.id)
        .bind(phone_number)
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;
        tracing::info!(user_id = %user.id, username = %user.username, "user registered");
        Ok(Registration { user, profile })
    }

    pub async fn get(&self, id: Uuid) -> Result<User> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool)
            .await?
            .ok_or_else(|| ShopError::not_found(format!("user {id}")))
    }

    pub async fn profile(&self, user_id: Uuid) -> Result<Registration> {
        let user = self.get(user_id).await?;
        let profile = sqlx::query_as::<_, UserProfile>("SELECT * FROM user_profiles WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(self.pool)
            .await?
            .ok_or_else(|| ShopError::not_found(format!("profile for user {user_id}")))?;
        Ok(Registration { user, profile })
    }

    pub async fn update_profile(&self, user_id: Uuid, phone_number: &str) -> Result<Registration> {
        let user = self.get(user_id).await?;
        let profile = sqlx::query_as::<_, UserProfile>(
            "UPDATE user_profiles SET phone_number = $2, updated_at = NOW() WHERE user_id = $1 RETURNING *",
        )
        .bind(user_id)
        .bind(phone_number)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| ShopError::not_found(format!("profile for user {user_id}")))?;
        Ok(Registration { user, profile })
    }
}
