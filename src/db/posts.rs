use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::{Post, PostRow, Reaction};
use crate::store::MatchMode;
use crate::threads::search::category_search_query;

impl super::Database {
    /// Create a new thread and link its categories.
    /// Post, category upserts and links are written in one transaction.
    pub async fn create_thread(
        &self,
        author_id: Uuid,
        author: &str,
        title: &str,
        content: &str,
        categories: &[String],
    ) -> Result<Post> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, PostRow>(
            r#"
            INSERT INTO posts (author, author_id, title, content, created_at)
            VALUES ($1, $2, $3, $4, NOW())
            RETURNING *
            "#,
        )
        .bind(author)
        .bind(author_id)
        .bind(title)
        .bind(content)
        .fetch_one(&mut *tx)
        .await?;

        // A thread is its own base
        let row = sqlx::query_as::<_, PostRow>(
            "UPDATE posts SET base_id = id WHERE id = $1 RETURNING *",
        )
        .bind(row.id)
        .fetch_one(&mut *tx)
        .await?;

        for name in categories {
            // Upsert holds a row lock on the category until commit
            let (category_id,): (i64,) = sqlx::query_as(
                r#"
                INSERT INTO categories (name) VALUES ($1)
                ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
                RETURNING id
                "#,
            )
            .bind(name)
            .fetch_one(&mut *tx)
            .await?;

            sqlx::query(
                r#"
                INSERT INTO posts_categories (post_id, category_id)
                VALUES ($1, $2)
                ON CONFLICT DO NOTHING
                "#,
            )
            .bind(row.id)
            .bind(category_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(row.into())
    }

    /// Reply to any post. The base id is taken from the parent, never from the client.
    pub async fn create_reply(
        &self,
        author_id: Uuid,
        author: &str,
        parent_id: i64,
        content: &str,
    ) -> Result<Post> {
        let mut tx = self.pool.begin().await?;

        let parent = sqlx::query_as::<_, PostRow>("SELECT * FROM posts WHERE id = $1 FOR SHARE")
            .bind(parent_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;

        let row = sqlx::query_as::<_, PostRow>(
            r#"
            INSERT INTO posts (base_id, parent_id, author, author_id, title, content, created_at)
            VALUES ($1, $2, $3, $4, '', $5, NOW())
            RETURNING *
            "#,
        )
        .bind(parent.base_id)
        .bind(parent.id)
        .bind(author)
        .bind(author_id)
        .bind(content)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(row.into())
    }

    /// Get a post by id, if it exists
    pub async fn find_post(&self, id: i64) -> Result<Option<Post>> {
        let row = sqlx::query_as::<_, PostRow>("SELECT * FROM posts WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Post::from))
    }

    /// Direct replies of a post in creation order
    pub async fn get_replies(&self, parent_id: i64) -> Result<Vec<Post>> {
        let rows = sqlx::query_as::<_, PostRow>(
            "SELECT * FROM posts WHERE parent_id = $1 ORDER BY created_at ASC, id ASC",
        )
        .bind(parent_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    /// All threads in creation order
    pub async fn get_threads(&self) -> Result<Vec<Post>> {
        let rows = sqlx::query_as::<_, PostRow>(
            "SELECT * FROM posts WHERE title <> '' ORDER BY id ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    /// Threads started by a user
    pub async fn get_threads_by_author(&self, author_id: Uuid) -> Result<Vec<Post>> {
        let rows = sqlx::query_as::<_, PostRow>(
            "SELECT * FROM posts WHERE title <> '' AND author_id = $1 ORDER BY id ASC",
        )
        .bind(author_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    /// Threads a user has liked or disliked. Replies are not included.
    pub async fn get_threads_reacted_by(&self, user_id: Uuid, reaction: Reaction) -> Result<Vec<Post>> {
        let rows = sqlx::query_as::<_, PostRow>(
            r#"
            SELECT p.*
            FROM posts p
            JOIN post_reactions pr ON pr.post_id = p.id
            WHERE p.title <> ''
              AND pr.user_id = $1
              AND pr.reaction_type = $2
            ORDER BY p.id ASC
            "#,
        )
        .bind(user_id)
        .bind(reaction.as_str())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    /// Threads matching a category search; terms are bound, never interpolated
    pub async fn search_threads_by_category(&self, terms: &[String], mode: MatchMode) -> Result<Vec<Post>> {
        if terms.is_empty() {
            return Ok(Vec::new());
        }

        let mut query = category_search_query(terms, mode);
        let rows = query
            .build_query_as::<PostRow>()
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }
}
