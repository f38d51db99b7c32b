use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use crate::{
    auth::{AuthenticatedUser, Viewer},
    config::ForumConfig,
    error::{AppError, Result},
    files::{delete_image, discard_images, store_image, validate_image},
    models::{
        normalize_terms, CreateReplyRequest, CreateThreadRequest, Post, ThreadListPage, ThreadPage,
    },
    store::{ForumStore, MatchMode},
    threads::{apply_viewer_overlay, build_from_root, list_and_rank_threads, Selection, ThreadFilter},
    AppState,
};

/// Number of categories highlighted on the thread list
const TOP_CATEGORIES: usize = 10;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    /// Restrict to the viewer's own, liked or disliked threads
    pub filter: Option<Selection>,
    /// Free-text category search
    pub search: Option<String>,
    #[serde(default)]
    pub mode: MatchMode,
}

/// List threads, most recently active first
pub async fn list_threads(
    State(state): State<AppState>,
    viewer: Viewer,
    Query(query): Query<ListQuery>,
) -> Result<Json<ThreadListPage>> {
    let filter = ThreadFilter::resolve(query.filter, query.search.as_deref(), query.mode, viewer.user_id());
    let threads = list_and_rank_threads(&state.db, &filter, viewer.user_id()).await?;

    let categories: Vec<String> = state
        .db
        .get_popular_categories()
        .await?
        .into_iter()
        .map(|c| c.name)
        .collect();
    let top_categories = categories.iter().take(TOP_CATEGORIES).cloned().collect();

    Ok(Json(ThreadListPage {
        threads,
        categories,
        top_categories,
    }))
}

/// A thread with every reply, marked for the viewer
pub async fn get_thread(
    State(state): State<AppState>,
    viewer: Viewer,
    Path(id): Path<i64>,
) -> Result<Json<ThreadPage>> {
    let root = state
        .db
        .get_post(id)
        .await?
        .filter(Post::is_thread)
        .ok_or_else(|| AppError::NotFound("Thread not found".to_string()))?;

    let tree = build_from_root(&state.db, root).await?;
    let thread = apply_viewer_overlay(&state.db, tree, viewer.user_id()).await?;

    let images = state
        .db
        .get_post_images(id)
        .await?
        .iter()
        .map(|image| image.url())
        .collect();

    Ok(Json(ThreadPage {
        thread,
        images,
        can_reply: viewer.is_logged_in(),
    }))
}

/// Start a new thread
///
/// Accepts multipart/form-data with fields:
/// - title: Thread title (required)
/// - content: Post body (required)
/// - categories: Space or punctuation separated categories (required)
/// - images: Image files (optional, repeatable)
pub async fn create_thread(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<Post>)> {
    let mut title: Option<String> = None;
    let mut content: Option<String> = None;
    let mut categories: Option<String> = None;
    let mut files: Vec<(Vec<u8>, String)> = Vec::new();

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        AppError::BadRequest(format!("Failed to read multipart field: {}", e))
    })? {
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            "images" => {
                let filename = field.file_name().unwrap_or("image").to_string();
                let data = field.bytes().await.map_err(|e| {
                    AppError::BadRequest(format!("Failed to read file: {}", e))
                })?;
                if !data.is_empty() {
                    files.push((data.to_vec(), filename));
                }
            }
            "title" | "content" | "categories" => {
                let text = field.text().await.map_err(|e| {
                    AppError::BadRequest(format!("Failed to read {}: {}", name, e))
                })?;
                match name.as_str() {
                    "title" => title = Some(text),
                    "content" => content = Some(text),
                    _ => categories = Some(text),
                }
            }
            _ => {} // Ignore unknown fields
        }
    }

    let req = CreateThreadRequest {
        title: title.unwrap_or_default(),
        content: content.unwrap_or_default(),
        categories: categories.unwrap_or_default(),
    };
    let (title, content, categories) = validate_thread(&req, &state.config.forum)?;

    // Reject bad images before anything is written
    let mut checked = Vec::with_capacity(files.len());
    for (data, filename) in &files {
        let format = validate_image(data, &state.upload_config)
            .await
            .map_err(|e| AppError::BadRequest(format!("{}: {}", filename, e)))?;
        checked.push((data, format, filename));
    }

    let image_dir = &state.upload_config.image_dir;
    let mut stored = Vec::with_capacity(checked.len());
    for (data, format, filename) in checked {
        match store_image(data, format, filename, &state.upload_config).await {
            Ok(image) => stored.push(image),
            Err(e) => {
                discard_images(image_dir, &stored).await;
                return Err(e.into());
            }
        }
    }

    let post = match state
        .db
        .create_thread(user.user_id, &user.username, title, content, &categories)
        .await
    {
        Ok(post) => post,
        Err(e) => {
            discard_images(image_dir, &stored).await;
            return Err(e);
        }
    };

    // The thread is committed; a lost image is logged, not fatal
    for image in &stored {
        if let Err(e) = state.db.insert_image(post.id, user.user_id, image).await {
            tracing::warn!("Dropping image {} of thread {}: {}", image.file_name, post.id, e);
            if let Err(e) = delete_image(image_dir, &image.file_name).await {
                tracing::warn!("Failed to remove image {}: {}", image.file_name, e);
            }
        }
    }

    tracing::info!(
        "{} started thread {} with {} categories and {} images",
        user.username,
        post.id,
        categories.len(),
        stored.len()
    );

    Ok((StatusCode::CREATED, Json(post)))
}

/// Reply to a thread or to another reply
pub async fn create_reply(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(req): Json<CreateReplyRequest>,
) -> Result<(StatusCode, Json<Post>)> {
    let content = validate_content(&req.content, &state.config.forum)?;

    let post = state
        .db
        .create_reply(user.user_id, &user.username, req.parent_id, content)
        .await?;

    Ok((StatusCode::CREATED, Json(post)))
}

/// Trimmed title and content plus normalized categories
fn validate_thread<'a>(
    req: &'a CreateThreadRequest,
    limits: &ForumConfig,
) -> Result<(&'a str, &'a str, Vec<String>)> {
    let title = req.title.trim();
    if title.is_empty() {
        return Err(AppError::BadRequest("Title is required".to_string()));
    }
    if title.chars().count() > limits.max_title_len {
        return Err(AppError::BadRequest(format!(
            "Title too long (max {} characters)",
            limits.max_title_len
        )));
    }

    let content = validate_content(&req.content, limits)?;

    if req.categories.chars().count() > limits.max_categories_len {
        return Err(AppError::BadRequest(format!(
            "Categories too long (max {} characters)",
            limits.max_categories_len
        )));
    }
    let categories = normalize_terms(&req.categories);
    if categories.is_empty() {
        return Err(AppError::BadRequest("At least one category is required".to_string()));
    }

    Ok((title, content, categories))
}

fn validate_content<'a>(content: &'a str, limits: &ForumConfig) -> Result<&'a str> {
    let content = content.trim();
    if content.is_empty() {
        return Err(AppError::BadRequest("Content is required".to_string()));
    }
    if content.chars().count() > limits.max_content_len {
        return Err(AppError::BadRequest(format!(
            "Content too long (max {} characters)",
            limits.max_content_len
        )));
    }
    Ok(content)
}
