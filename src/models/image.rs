use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// An image attached to a post
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Image {
    /// Stored file name, including extension
    pub id: String,
    pub post_id: Option<i64>,
    pub user_id: Option<Uuid>,
    pub original_name: String,
    pub file_size: i64,
    pub created_at: DateTime<Utc>,
}

impl Image {
    /// Public URL the file is served under
    pub fn url(&self) -> String {
        image_url(&self.id)
    }
}

pub fn image_url(id: &str) -> String {
    format!("/images/{}", id)
}
