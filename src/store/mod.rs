//! Persistence contract consumed by the thread engine.
//!
//! The engine only ever talks to storage through [`ForumStore`], so it can
//! run against PostgreSQL in production and an in-memory store in tests.

#[cfg(test)]
pub(crate) mod memory;

use async_trait::async_trait;
use uuid::Uuid;

use crate::db::Database;
use crate::error::Result;
use crate::models::{Post, Reaction, ReactionCounts};

/// How a category search combines its terms
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    /// Post carries at least one of the categories
    Any,
    /// Post carries every one of the categories
    #[default]
    All,
}

#[async_trait]
pub trait ForumStore: Send + Sync {
    /// Load a single post by id
    async fn get_post(&self, id: i64) -> Result<Option<Post>>;

    /// Posts whose parent is `parent_id`, oldest first
    async fn get_direct_replies(&self, parent_id: i64) -> Result<Vec<Post>>;

    /// Category names attached to a post
    async fn get_categories_for_post(&self, post_id: i64) -> Result<Vec<String>>;

    /// Like/dislike tally of a post
    async fn get_reaction_counts(&self, post_id: i64) -> Result<ReactionCounts>;

    /// Every `(post_id, opinion)` held by a viewer
    async fn get_reactions_for_viewer(&self, viewer: Uuid) -> Result<Vec<(i64, Reaction)>>;

    /// All threads, oldest first
    async fn list_threads(&self) -> Result<Vec<Post>>;

    /// Threads started by `author_id`, oldest first
    async fn threads_by_author(&self, author_id: Uuid) -> Result<Vec<Post>>;

    /// Threads the user holds `reaction` on, oldest first
    async fn threads_reacted_by(&self, user_id: Uuid, reaction: Reaction) -> Result<Vec<Post>>;

    /// Threads matching normalized category `terms` under `mode`
    async fn search_posts_by_category(&self, terms: &[String], mode: MatchMode) -> Result<Vec<Post>>;

    /// Apply a like/dislike toggle atomically, returning the resulting opinion
    async fn toggle_reaction(
        &self,
        user_id: Uuid,
        post_id: i64,
        reaction: Reaction,
    ) -> Result<Option<Reaction>>;
}

#[async_trait]
impl ForumStore for Database {
    async fn get_post(&self, id: i64) -> Result<Option<Post>> {
        self.find_post(id).await
    }

    async fn get_direct_replies(&self, parent_id: i64) -> Result<Vec<Post>> {
        self.get_replies(parent_id).await
    }

    async fn get_categories_for_post(&self, post_id: i64) -> Result<Vec<String>> {
        self.get_post_categories(post_id).await
    }

    async fn get_reaction_counts(&self, post_id: i64) -> Result<ReactionCounts> {
        self.count_reactions(post_id).await
    }

    async fn get_reactions_for_viewer(&self, viewer: Uuid) -> Result<Vec<(i64, Reaction)>> {
        self.get_user_reactions(viewer).await
    }

    async fn list_threads(&self) -> Result<Vec<Post>> {
        self.get_threads().await
    }

    async fn threads_by_author(&self, author_id: Uuid) -> Result<Vec<Post>> {
        self.get_threads_by_author(author_id).await
    }

    async fn threads_reacted_by(&self, user_id: Uuid, reaction: Reaction) -> Result<Vec<Post>> {
        self.get_threads_reacted_by(user_id, reaction).await
    }

    async fn search_posts_by_category(&self, terms: &[String], mode: MatchMode) -> Result<Vec<Post>> {
        self.search_threads_by_category(terms, mode).await
    }

    async fn toggle_reaction(
        &self,
        user_id: Uuid,
        post_id: i64,
        reaction: Reaction,
    ) -> Result<Option<Reaction>> {
        self.apply_reaction(user_id, post_id, reaction).await
    }
}
