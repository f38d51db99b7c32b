use axum::{
    extract::{Path, State},
    Json,
};

use crate::{
    auth::AuthenticatedUser,
    error::{AppError, Result},
    models::{Reaction, ReactionResponse},
    store::ForumStore,
    threads::tally,
    AppState,
};

/// Toggle a like on a post
pub async fn like(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(post_id): Path<i64>,
) -> Result<Json<ReactionResponse>> {
    react(&state, &user, post_id, Reaction::Like).await
}

/// Toggle a dislike on a post
pub async fn dislike(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(post_id): Path<i64>,
) -> Result<Json<ReactionResponse>> {
    react(&state, &user, post_id, Reaction::Dislike).await
}

async fn react(
    state: &AppState,
    user: &AuthenticatedUser,
    post_id: i64,
    requested: Reaction,
) -> Result<Json<ReactionResponse>> {
    let reaction = state.db.toggle_reaction(user.user_id, post_id, requested).await?;

    let post = state
        .db
        .get_post(post_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;

    tracing::debug!(
        "{} set {:?} on post {} (requested {})",
        user.username,
        reaction,
        post_id,
        requested.as_str()
    );

    Ok(Json(ReactionResponse {
        post_id,
        base_id: post.base_id,
        reaction,
        counts: tally(&state.db, post_id).await,
    }))
}
