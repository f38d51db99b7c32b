//! The thread list: choose threads, build their trees, rank, mark for the viewer.

use serde::Deserialize;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{Post, PostNode, Reaction};
use crate::store::{ForumStore, MatchMode};

use super::overlay::ViewerReactions;
use super::rank::rank;
use super::search::{build_search_filter, SearchFilter};
use super::tree::build_from_root;

/// Viewer-scoped selections of the thread list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Selection {
    Created,
    Liked,
    Disliked,
}

/// Which threads to list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThreadFilter {
    All,
    CreatedBy(Uuid),
    ReactedBy(Uuid, Reaction),
    Search(SearchFilter),
}

impl ThreadFilter {
    /// Resolve request parameters into a filter.
    ///
    /// A non-blank search wins over a selection. Selections need a viewer
    /// and fall back to every thread without one.
    pub fn resolve(
        selection: Option<Selection>,
        search: Option<&str>,
        mode: MatchMode,
        viewer: Option<Uuid>,
    ) -> Self {
        if let Some(raw) = search.filter(|s| !s.trim().is_empty()) {
            return ThreadFilter::Search(build_search_filter(raw, mode));
        }

        match (selection, viewer) {
            (Some(Selection::Created), Some(user)) => ThreadFilter::CreatedBy(user),
            (Some(Selection::Liked), Some(user)) => ThreadFilter::ReactedBy(user, Reaction::Like),
            (Some(Selection::Disliked), Some(user)) => ThreadFilter::ReactedBy(user, Reaction::Dislike),
            _ => ThreadFilter::All,
        }
    }
}

/// Load the threads a filter selects, without trees
pub async fn select_threads<S: ForumStore + ?Sized>(store: &S, filter: &ThreadFilter) -> Result<Vec<Post>> {
    match filter {
        ThreadFilter::All | ThreadFilter::Search(SearchFilter::NoOp) => store.list_threads().await,
        ThreadFilter::CreatedBy(user) => store.threads_by_author(*user).await,
        ThreadFilter::ReactedBy(user, reaction) => store.threads_reacted_by(*user, *reaction).await,
        ThreadFilter::Search(SearchFilter::Categories { terms, mode }) => {
            store.search_posts_by_category(terms, *mode).await
        }
    }
}

/// Fully annotated threads for a filter, most recently active first
pub async fn list_and_rank_threads<S: ForumStore + ?Sized>(
    store: &S,
    filter: &ThreadFilter,
    viewer: Option<Uuid>,
) -> Result<Vec<PostNode>> {
    let roots = select_threads(store, filter).await?;

    let mut threads = Vec::with_capacity(roots.len());
    for root in roots {
        threads.push(build_from_root(store, root).await?);
    }

    let mut threads = rank(threads)?;

    let reactions = ViewerReactions::load(store, viewer).await?;
    for thread in &mut threads {
        reactions.apply(thread);
    }

    Ok(threads)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::store::memory::MemoryStore;
    use crate::threads::rank::activity_timestamp;
    use crate::threads::time::parse_timestamp;

    fn ids(threads: &[PostNode]) -> Vec<i64> {
        threads.iter().map(|t| t.post.id).collect()
    }

    async fn search(store: &MemoryStore, query: &str, mode: MatchMode) -> Vec<i64> {
        let filter = ThreadFilter::resolve(None, Some(query), mode, None);
        ids(&list_and_rank_threads(store, &filter, None).await.unwrap())
    }

    #[test]
    fn test_resolve_prefers_search() {
        let viewer = Uuid::new_v4();
        let filter = ThreadFilter::resolve(Some(Selection::Liked), Some("rust"), MatchMode::Any, Some(viewer));
        assert_eq!(
            filter,
            ThreadFilter::Search(SearchFilter::Categories {
                terms: vec!["rust".to_string()],
                mode: MatchMode::Any
            })
        );
    }

    #[test]
    fn test_resolve_selection_needs_viewer() {
        let viewer = Uuid::new_v4();
        assert_eq!(
            ThreadFilter::resolve(Some(Selection::Disliked), None, MatchMode::All, Some(viewer)),
            ThreadFilter::ReactedBy(viewer, Reaction::Dislike)
        );
        assert_eq!(
            ThreadFilter::resolve(Some(Selection::Created), Some("  "), MatchMode::All, Some(viewer)),
            ThreadFilter::CreatedBy(viewer)
        );
        assert_eq!(
            ThreadFilter::resolve(Some(Selection::Created), None, MatchMode::All, None),
            ThreadFilter::All
        );
    }

    #[tokio::test]
    async fn test_end_to_end_thread_with_nested_replies() {
        let store = MemoryStore::new();
        let thread = store.add_thread("Scenario", "2024-01-01T00:00:00Z", &["demo"]);
        store.add_reply(thread, "2024-01-01T00:00:01Z");
        let r2 = store.add_reply(thread, "2024-01-01T00:00:02Z");
        store.add_reply(r2, "2024-01-01T00:00:03Z");

        let threads = list_and_rank_threads(&store, &ThreadFilter::All, None).await.unwrap();

        assert_eq!(threads.len(), 1);
        assert_eq!(threads[0].reply_count, 2);
        assert_eq!(threads[0].total_replies, 3);
        assert_eq!(
            activity_timestamp(&threads[0]).unwrap(),
            parse_timestamp("2024-01-01T00:00:03Z").unwrap()
        );
    }

    #[tokio::test]
    async fn test_threads_ranked_by_latest_reply() {
        let store = MemoryStore::new();
        let old = store.add_thread("Old but busy", "2024-01-01T00:00:00Z", &[]);
        let new = store.add_thread("New and quiet", "2024-01-02T00:00:00Z", &[]);
        let quiet = store.add_thread("Old and quiet", "2023-12-01T00:00:00Z", &[]);
        let reply = store.add_reply(old, "2024-01-01T01:00:00Z");
        store.add_reply(reply, "2024-01-03T00:00:00Z");

        let threads = list_and_rank_threads(&store, &ThreadFilter::All, None).await.unwrap();
        assert_eq!(ids(&threads), vec![old, new, quiet]);
    }

    #[tokio::test]
    async fn test_category_search_any_and_all() {
        let store = MemoryStore::new();
        let abc = store.add_thread("abc", "2024-01-01T00:00:00Z", &["a", "b", "c"]);
        let a = store.add_thread("a", "2024-01-01T00:00:00Z", &["a"]);
        let c = store.add_thread("c", "2024-01-01T00:00:00Z", &["c"]);

        assert_eq!(search(&store, "a b", MatchMode::Any).await, vec![abc, a]);
        assert_eq!(search(&store, "a b", MatchMode::All).await, vec![abc]);
        assert_eq!(search(&store, "A, a, B", MatchMode::All).await, vec![abc]);
        assert_eq!(search(&store, "c", MatchMode::All).await, vec![abc, c]);
        assert!(search(&store, "zzz", MatchMode::Any).await.is_empty());
    }

    #[tokio::test]
    async fn test_empty_search_falls_back_to_all_threads() {
        let store = MemoryStore::new();
        let t1 = store.add_thread("one", "2024-01-01T00:00:00Z", &["a"]);
        let t2 = store.add_thread("two", "2024-01-01T00:00:00Z", &["b"]);

        assert_eq!(search(&store, "?!", MatchMode::All).await, vec![t1, t2]);
    }

    #[tokio::test]
    async fn test_created_and_reacted_selections() {
        let store = MemoryStore::new();
        let me = Uuid::new_v4();
        let mine = store.add_thread_by(Some(me), "mine", "2024-01-01T00:00:00Z", &[]);
        let theirs = store.add_thread("theirs", "2024-01-02T00:00:00Z", &[]);
        let reply = store.add_reply(theirs, "2024-01-02T01:00:00Z");
        store.react(me, theirs, Reaction::Like);
        store.react(me, reply, Reaction::Dislike);

        let created = ThreadFilter::resolve(Some(Selection::Created), None, MatchMode::All, Some(me));
        let liked = ThreadFilter::resolve(Some(Selection::Liked), None, MatchMode::All, Some(me));
        let disliked = ThreadFilter::resolve(Some(Selection::Disliked), None, MatchMode::All, Some(me));

        assert_eq!(ids(&list_and_rank_threads(&store, &created, Some(me)).await.unwrap()), vec![mine]);
        let liked_threads = list_and_rank_threads(&store, &liked, Some(me)).await.unwrap();
        assert_eq!(ids(&liked_threads), vec![theirs]);
        assert!(liked_threads[0].liked_now);
        assert!(liked_threads[0].replies[0].disliked_now);
        // Only thread-level reactions select threads
        assert!(list_and_rank_threads(&store, &disliked, Some(me)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_any_failing_tree_fails_the_list() {
        let store = MemoryStore::new();
        store.add_thread("fine", "2024-01-01T00:00:00Z", &[]);
        let broken = store.add_thread("broken", "2024-01-01T00:00:00Z", &[]);
        store.fail_replies_of(broken);

        let result = list_and_rank_threads(&store, &ThreadFilter::All, None).await;
        assert!(matches!(result, Err(AppError::Storage(_))));
    }

    #[tokio::test]
    async fn test_toggle_keeps_one_opinion_per_viewer() {
        let store = MemoryStore::new();
        let viewer = Uuid::new_v4();
        let thread = store.add_thread("votes", "2024-01-01T00:00:00Z", &[]);
        store.react(Uuid::new_v4(), thread, Reaction::Like);

        let counts = |threads: Vec<PostNode>| (threads[0].likes, threads[0].dislikes);
        let list = || list_and_rank_threads(&store, &ThreadFilter::All, Some(viewer));

        assert_eq!(store.toggle_reaction(viewer, thread, Reaction::Dislike).await.unwrap(), Some(Reaction::Dislike));
        assert_eq!(counts(list().await.unwrap()), (1, 1));

        // Dislike -> like converts the opinion
        assert_eq!(store.toggle_reaction(viewer, thread, Reaction::Like).await.unwrap(), Some(Reaction::Like));
        assert_eq!(counts(list().await.unwrap()), (2, 0));
        assert_eq!(store.opinions_of(viewer, thread), 1);

        // Liking again removes the like
        assert_eq!(store.toggle_reaction(viewer, thread, Reaction::Like).await.unwrap(), None);
        assert_eq!(counts(list().await.unwrap()), (1, 0));
        assert_eq!(store.opinions_of(viewer, thread), 0);
    }
}
