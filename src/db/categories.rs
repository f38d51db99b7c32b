use crate::error::Result;
use crate::models::CategoryUsage;

impl super::Database {
    /// Category names attached to a post
    pub async fn get_post_categories(&self, post_id: i64) -> Result<Vec<String>> {
        let rows: Vec<(String,)> = sqlx::query_as(
            r#"
            SELECT c.name
            FROM categories c
            JOIN posts_categories pc ON pc.category_id = c.id
            WHERE pc.post_id = $1
            ORDER BY c.name ASC
            "#,
        )
        .bind(post_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|(name,)| name).collect())
    }

    /// Categories in use, most used first
    pub async fn get_popular_categories(&self) -> Result<Vec<CategoryUsage>> {
        let rows = sqlx::query_as::<_, CategoryUsage>(
            r#"
            SELECT c.name, COUNT(pc.post_id) AS post_count
            FROM categories c
            JOIN posts_categories pc ON pc.category_id = c.id
            GROUP BY c.id, c.name
            ORDER BY post_count DESC, c.name ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Delete categories no post refers to
    pub async fn remove_unused_categories(&self) -> Result<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM categories c
            WHERE NOT EXISTS (
                SELECT 1 FROM posts_categories pc WHERE pc.category_id = c.id
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
