mod categories;
mod reactions;
mod threads;
mod users;

use axum::{routing::{get, post}, Router};

use crate::AppState;

/// Build the API router
pub fn router() -> Router<AppState> {
    Router::new()
        // Accounts and sessions
        .route("/users/register", post(users::register))
        .route("/users/login", post(users::login))
        .route("/users/logout", post(users::logout))
        .route("/users/me", get(users::me))
        // Threads and replies
        .route("/threads", get(threads::list_threads))
        .route("/threads", post(threads::create_thread))
        .route("/threads/{id}", get(threads::get_thread))
        .route("/replies", post(threads::create_reply))
        // Reactions
        .route("/posts/{id}/like", post(reactions::like))
        .route("/posts/{id}/dislike", post(reactions::dislike))
        // Categories
        .route("/categories", get(categories::list_categories))
}
