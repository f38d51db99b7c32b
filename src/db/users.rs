use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::User;

impl super::Database {
    /// Create a new user with an already hashed password
    pub async fn create_user(&self, email: &str, username: &str, password_hash: &str) -> Result<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, email, username, password, created_at)
            VALUES ($1, $2, $3, $4, NOW())
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(email)
        .bind(username)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e {
                if db_err.constraint() == Some("users_username_key") {
                    return AppError::Conflict("Name already taken".to_string());
                }
                if db_err.constraint() == Some("users_email_key") {
                    return AppError::Conflict("Email already taken".to_string());
                }
            }
            AppError::Database(e)
        })?;

        Ok(user)
    }

    /// Look a user up by username or email. Emails are stored lowercased and
    /// match case-insensitively; usernames match exactly.
    pub async fn find_user_by_login(&self, username_or_email: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE username = $1 OR email = lower($1)",
        )
        .bind(username_or_email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Whether a username or email is already registered
    pub async fn name_or_email_exists(&self, value: &str) -> Result<bool> {
        let (exists,): (bool,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM users WHERE username = $1 OR email = $1)",
        )
        .bind(value)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }
}
