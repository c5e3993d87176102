use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{NewUser, UserRecord},
};

/// Account storage
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait UserStore: Send + Sync {
    /// Inserts the user unless the username or email is taken.
    /// Returns `false` when nothing was inserted.
    async fn create_user(&self, user: &NewUser) -> AppResult<bool>;

    /// Looks a user up by email or username
    async fn find_by_login(&self, login: &str) -> AppResult<Option<UserRecord>>;

    async fn find_by_id(&self, user_id: Uuid) -> AppResult<Option<UserRecord>>;

    async fn find_by_email(&self, email: &str) -> AppResult<Option<UserRecord>>;

    async fn update_password(&self, user_id: Uuid, password_hash: &str) -> AppResult<()>;

    async fn set_reset_code(&self, email: &str, code: &str) -> AppResult<()>;

    /// Replaces the password and clears the reset code, but only where both the
    /// email and the code match. Returns whether a row changed.
    async fn reset_password(&self, email: &str, code: &str, password_hash: &str)
        -> AppResult<bool>;
}

const USER_COLUMNS: &str =
    "user_id, username, email, dob, password, image_url, reset_code, created_on";

/// Postgres-backed account storage
#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl UserStore for PgUserStore {
    async fn create_user(&self, user: &NewUser) -> AppResult<bool> {
        // Both unique constraints are covered by the untargeted ON CONFLICT
        let result = sqlx::query(
            r#"
            INSERT INTO users (user_id, username, email, dob, password, image_url, reset_code, created_on)
            SELECT $1, $2, $3, $4, $5, $6, NULL, $7
            WHERE NOT EXISTS (
                SELECT 1 FROM users WHERE username = $2 OR email = $3
            )
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(user.user_id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(user.dob)
        .bind(&user.password_hash)
        .bind(&user.image_url)
        .bind(user.created_on)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn find_by_login(&self, login: &str) -> AppResult<Option<UserRecord>> {
        let user = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {} FROM users WHERE email = $1 OR username = $1 LIMIT 1",
            USER_COLUMNS
        ))
        .bind(login)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_by_id(&self, user_id: Uuid) -> AppResult<Option<UserRecord>> {
        let user = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {} FROM users WHERE user_id = $1",
            USER_COLUMNS
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<UserRecord>> {
        let user = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {} FROM users WHERE email = $1",
            USER_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn update_password(&self, user_id: Uuid, password_hash: &str) -> AppResult<()> {
        sqlx::query("UPDATE users SET password = $1 WHERE user_id = $2")
            .bind(password_hash)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn set_reset_code(&self, email: &str, code: &str) -> AppResult<()> {
        sqlx::query("UPDATE users SET reset_code = $1 WHERE email = $2")
            .bind(code)
            .bind(email)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn reset_password(
        &self,
        email: &str,
        code: &str,
        password_hash: &str,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE users SET reset_code = NULL, password = $1
            WHERE reset_code = $2 AND email = $3
            "#,
        )
        .bind(password_hash)
        .bind(code)
        .bind(email)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
