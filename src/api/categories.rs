use axum::{extract::State, Json};

use crate::{error::Result, models::CategoryUsage, AppState};

/// Categories in use, most popular first
pub async fn list_categories(State(state): State<AppState>) -> Result<Json<Vec<CategoryUsage>>> {
    let categories = state.db.get_popular_categories().await?;
    Ok(Json(categories))
}
