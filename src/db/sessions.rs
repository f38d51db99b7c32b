use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::Result;
use crate::models::Session;

impl super::Database {
    /// Start a session, replacing every earlier session of the user
    pub async fn create_session(
        &self,
        user_id: Uuid,
        username: &str,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<Session> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM sessions WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        let session = sqlx::query_as::<_, Session>(
            r#"
            INSERT INTO sessions (user_id, username, token_hash, expires_at)
            VALUES ($1, $2, $3, $4)
            RETURNING user_id, username, expires_at
            "#,
        )
        .bind(user_id)
        .bind(username)
        .bind(token_hash)
        .bind(expires_at)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(session)
    }

    /// Session for a token hash, if it exists and has not expired
    pub async fn validate_session(&self, token_hash: &str) -> Result<Option<Session>> {
        let session = sqlx::query_as::<_, Session>(
            r#"
            SELECT user_id, username, expires_at
            FROM sessions
            WHERE token_hash = $1 AND expires_at > NOW()
            "#,
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await?;

        Ok(session)
    }

    /// End the session identified by a token hash
    pub async fn delete_session(&self, token_hash: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM sessions WHERE token_hash = $1")
            .bind(token_hash)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete every expired session
    pub async fn remove_expired_sessions(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at < NOW()")
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
