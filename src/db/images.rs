use uuid::Uuid;

use crate::error::Result;
use crate::files::StoredImage;
use crate::models::Image;

impl super::Database {
    /// Record an uploaded image against its post
    pub async fn insert_image(&self, post_id: i64, user_id: Uuid, image: &StoredImage) -> Result<Image> {
        let row = sqlx::query_as::<_, Image>(
            r#"
            INSERT INTO images (id, post_id, user_id, original_name, file_size, created_at)
            VALUES ($1, $2, $3, $4, $5, NOW())
            RETURNING *
            "#,
        )
        .bind(&image.file_name)
        .bind(post_id)
        .bind(user_id)
        .bind(&image.original_name)
        .bind(image.file_size)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    /// Images attached to a post, oldest first
    pub async fn get_post_images(&self, post_id: i64) -> Result<Vec<Image>> {
        let rows = sqlx::query_as::<_, Image>(
            "SELECT * FROM images WHERE post_id = $1 ORDER BY created_at ASC",
        )
        .bind(post_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
