use sqlx::PgExecutor;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::{Reaction, ReactionCounts};

impl super::Database {
    /// Like/dislike tally of a post
    pub async fn count_reactions(&self, post_id: i64) -> Result<ReactionCounts> {
        let rows: Vec<(String, i64)> = sqlx::query_as(
            r#"
            SELECT reaction_type, COUNT(*) AS count
            FROM post_reactions
            WHERE post_id = $1
            GROUP BY reaction_type
            "#,
        )
        .bind(post_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(ReactionCounts::from_rows(rows))
    }

    /// Every opinion held by a user
    pub async fn get_user_reactions(&self, user_id: Uuid) -> Result<Vec<(i64, Reaction)>> {
        let rows: Vec<(i64, String)> = sqlx::query_as(
            "SELECT post_id, reaction_type FROM post_reactions WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|(post_id, kind)| {
                Reaction::parse(&kind)
                    .map(|r| (post_id, r))
                    .ok_or_else(|| AppError::Storage(format!("unknown reaction type '{}'", kind)))
            })
            .collect()
    }

    /// Toggle a user's opinion on a post.
    /// Toggles for the same (user, post) pair are serialized by a transaction-scoped
    /// advisory lock taken before the held opinion is read, so two identical requests
    /// never both decide to insert.
    pub async fn apply_reaction(
        &self,
        user_id: Uuid,
        post_id: i64,
        reaction: Reaction,
    ) -> Result<Option<Reaction>> {
        let mut tx = self.pool.begin().await?;

        let post: Option<(i64,)> = sqlx::query_as("SELECT id FROM posts WHERE id = $1")
            .bind(post_id)
            .fetch_optional(&mut *tx)
            .await?;
        if post.is_none() {
            return Err(AppError::NotFound("Post not found".to_string()));
        }

        // Released on commit or rollback
        sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1::text || '/' || $2::text, 0))")
            .bind(user_id)
            .bind(post_id)
            .execute(&mut *tx)
            .await?;

        let held: Option<(String,)> = sqlx::query_as(
            r#"
            SELECT reaction_type FROM post_reactions
            WHERE user_id = $1 AND post_id = $2
            FOR UPDATE
            "#,
        )
        .bind(user_id)
        .bind(post_id)
        .fetch_optional(&mut *tx)
        .await?;

        let current = held.and_then(|(kind,)| Reaction::parse(&kind));
        let next = Reaction::toggle(current, reaction);

        match next {
            None => {
                delete_reaction(&mut *tx, user_id, post_id, reaction).await?;
            }
            Some(opinion) => {
                upsert_reaction(&mut *tx, user_id, post_id, opinion).await?;
            }
        }

        tx.commit().await?;

        Ok(next)
    }
}

/// Remove exactly this opinion; returns whether a row was deleted
pub async fn delete_reaction<'e, E: PgExecutor<'e>>(
    executor: E,
    user_id: Uuid,
    post_id: i64,
    reaction: Reaction,
) -> Result<bool> {
    let result = sqlx::query(
        "DELETE FROM post_reactions WHERE user_id = $1 AND post_id = $2 AND reaction_type = $3",
    )
    .bind(user_id)
    .bind(post_id)
    .bind(reaction.as_str())
    .execute(executor)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Insert an opinion, overwriting any other opinion on the same post
pub async fn upsert_reaction<'e, E: PgExecutor<'e>>(
    executor: E,
    user_id: Uuid,
    post_id: i64,
    reaction: Reaction,
) -> Result<bool> {
    let result = sqlx::query(
        r#"
        INSERT INTO post_reactions (user_id, post_id, reaction_type, created_at)
        VALUES ($1, $2, $3, NOW())
        ON CONFLICT (user_id, post_id)
        DO UPDATE SET reaction_type = EXCLUDED.reaction_type, created_at = NOW()
        "#,
    )
    .bind(user_id)
    .bind(post_id)
    .bind(reaction.as_str())
    .execute(executor)
    .await?;

    Ok(result.rows_affected() > 0)
}
