//! In-memory [`ForumStore`] used by the engine tests.

use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::{Post, Reaction, ReactionCounts};

use super::{ForumStore, MatchMode};

#[derive(Default)]
struct Inner {
    posts: Vec<Post>,
    categories: Vec<(i64, String)>,
    reactions: Vec<(Uuid, i64, Reaction)>,
    broken_replies: HashSet<i64>,
    broken_tallies: bool,
    broken_viewer_reactions: bool,
}

#[derive(Default)]
pub(crate) struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_thread(&self, title: &str, created_at: &str, categories: &[&str]) -> i64 {
        self.add_thread_by(None, title, created_at, categories)
    }

    pub fn add_thread_by(
        &self,
        author_id: Option<Uuid>,
        title: &str,
        created_at: &str,
        categories: &[&str],
    ) -> i64 {
        let mut inner = self.inner.lock().unwrap();
        let id = inner.posts.len() as i64 + 1;
        inner.posts.push(Post {
            id,
            base_id: id,
            parent_id: 0,
            author: "author".to_string(),
            author_id,
            title: title.to_string(),
            content: format!("content of {}", title),
            created_at: created_at.to_string(),
        });
        for name in categories {
            inner.categories.push((id, name.to_string()));
        }
        id
    }

    /// Reply below `parent`, inheriting its thread
    pub fn add_reply(&self, parent: i64, created_at: &str) -> i64 {
        let mut inner = self.inner.lock().unwrap();
        let base_id = inner
            .posts
            .iter()
            .find(|p| p.id == parent)
            .map(|p| p.base_id)
            .expect("reply parent exists");
        let id = inner.posts.len() as i64 + 1;
        inner.posts.push(Post {
            id,
            base_id,
            parent_id: parent,
            author: "replier".to_string(),
            author_id: None,
            title: String::new(),
            content: format!("reply {}", id),
            created_at: created_at.to_string(),
        });
        id
    }

    /// Set `user`'s opinion on `post`, replacing any previous one
    pub fn react(&self, user: Uuid, post: i64, reaction: Reaction) {
        let mut inner = self.inner.lock().unwrap();
        inner.reactions.retain(|(u, p, _)| !(*u == user && *p == post));
        inner.reactions.push((user, post, reaction));
    }

    /// Point `id` at a new parent without touching its base
    pub fn reparent(&self, id: i64, parent: i64) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(post) = inner.posts.iter_mut().find(|p| p.id == id) {
            post.parent_id = parent;
        }
    }

    pub fn fail_tallies(&self) {
        self.inner.lock().unwrap().broken_tallies = true;
    }

    pub fn fail_replies_of(&self, parent: i64) {
        self.inner.lock().unwrap().broken_replies.insert(parent);
    }

    pub fn fail_viewer_reactions(&self) {
        self.inner.lock().unwrap().broken_viewer_reactions = true;
    }

    /// Stored reaction rows for one (user, post) pair
    pub fn opinions_of(&self, user: Uuid, post: i64) -> usize {
        self.inner
            .lock()
            .unwrap()
            .reactions
            .iter()
            .filter(|(u, p, _)| *u == user && *p == post)
            .count()
    }
}

impl Inner {
    fn threads(&self) -> impl Iterator<Item = &Post> {
        self.posts.iter().filter(|p| p.is_thread())
    }

    fn categories_of(&self, post_id: i64) -> Vec<String> {
        let mut names: Vec<String> = self
            .categories
            .iter()
            .filter(|(id, _)| *id == post_id)
            .map(|(_, name)| name.clone())
            .collect();
        names.sort();
        names
    }

    fn opinion(&self, user: Uuid, post: i64) -> Option<Reaction> {
        self.reactions
            .iter()
            .find(|(u, p, _)| *u == user && *p == post)
            .map(|(_, _, r)| *r)
    }
}

#[async_trait]
impl ForumStore for MemoryStore {
    async fn get_post(&self, id: i64) -> Result<Option<Post>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.posts.iter().find(|p| p.id == id).cloned())
    }

    async fn get_direct_replies(&self, parent_id: i64) -> Result<Vec<Post>> {
        let inner = self.inner.lock().unwrap();
        if inner.broken_replies.contains(&parent_id) {
            return Err(AppError::Storage(format!("replies of {} unavailable", parent_id)));
        }
        let mut replies: Vec<Post> = inner
            .posts
            .iter()
            .filter(|p| p.parent_id == parent_id && !p.is_thread())
            .cloned()
            .collect();
        replies.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(replies)
    }

    async fn get_categories_for_post(&self, post_id: i64) -> Result<Vec<String>> {
        Ok(self.inner.lock().unwrap().categories_of(post_id))
    }

    async fn get_reaction_counts(&self, post_id: i64) -> Result<ReactionCounts> {
        let inner = self.inner.lock().unwrap();
        if inner.broken_tallies {
            return Err(AppError::Storage("reaction counts unavailable".to_string()));
        }
        let mut counts = ReactionCounts::default();
        for (_, _, reaction) in inner.reactions.iter().filter(|(_, p, _)| *p == post_id) {
            match reaction {
                Reaction::Like => counts.likes += 1,
                Reaction::Dislike => counts.dislikes += 1,
            }
        }
        Ok(counts)
    }

    async fn get_reactions_for_viewer(&self, viewer: Uuid) -> Result<Vec<(i64, Reaction)>> {
        let inner = self.inner.lock().unwrap();
        if inner.broken_viewer_reactions {
            return Err(AppError::Storage("viewer reactions unavailable".to_string()));
        }
        Ok(inner
            .reactions
            .iter()
            .filter(|(u, _, _)| *u == viewer)
            .map(|(_, p, r)| (*p, *r))
            .collect())
    }

    async fn list_threads(&self) -> Result<Vec<Post>> {
        Ok(self.inner.lock().unwrap().threads().cloned().collect())
    }

    async fn threads_by_author(&self, author_id: Uuid) -> Result<Vec<Post>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .threads()
            .filter(|p| p.author_id == Some(author_id))
            .cloned()
            .collect())
    }

    async fn threads_reacted_by(&self, user_id: Uuid, reaction: Reaction) -> Result<Vec<Post>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .threads()
            .filter(|p| inner.opinion(user_id, p.id) == Some(reaction))
            .cloned()
            .collect())
    }

    async fn search_posts_by_category(&self, terms: &[String], mode: MatchMode) -> Result<Vec<Post>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .threads()
            .filter(|p| {
                let names = inner.categories_of(p.id);
                match mode {
                    MatchMode::Any => terms.iter().any(|t| names.contains(t)),
                    MatchMode::All => terms.iter().all(|t| names.contains(t)),
                }
            })
            .cloned()
            .collect())
    }

    async fn toggle_reaction(
        &self,
        user_id: Uuid,
        post_id: i64,
        reaction: Reaction,
    ) -> Result<Option<Reaction>> {
        let mut inner = self.inner.lock().unwrap();
        if !inner.posts.iter().any(|p| p.id == post_id) {
            return Err(AppError::NotFound("Post not found".to_string()));
        }

        let next = Reaction::toggle(inner.opinion(user_id, post_id), reaction);
        inner.reactions.retain(|(u, p, _)| !(*u == user_id && *p == post_id));
        if let Some(kept) = next {
            inner.reactions.push((user_id, post_id, kept));
        }
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};

    #[tokio::test]
    async fn test_toggle_on_missing_post_fails() {
        let store = MemoryStore::new();
        let result = store.toggle_reaction(Uuid::new_v4(), 7, Reaction::Like).await;
        assert!(matches!(assert_err!(result), AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_replies_skip_threads_and_sort_by_time() {
        let store = MemoryStore::new();
        let thread = store.add_thread("t", "2024-01-01T00:00:00Z", &[]);
        let late = store.add_reply(thread, "2024-01-01T00:00:09Z");
        let early = store.add_reply(thread, "2024-01-01T00:00:01Z");

        let replies = assert_ok!(store.get_direct_replies(thread).await);
        let ids: Vec<i64> = replies.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![early, late]);
    }
}
