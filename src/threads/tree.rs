//! Reconstruction of a reply tree from the flat posts table.
//!
//! Posts are loaded breadth first with an explicit queue, then assembled
//! leaves first, so neither step recurses on the native stack. Every post
//! is checked for revisits (a `parent_id` cycle) and for belonging to the
//! same thread as the root; either violation aborts the whole build.

use std::collections::{HashMap, HashSet};

use crate::error::{AppError, Result};
use crate::models::{Post, PostNode};
use crate::store::ForumStore;

use super::tally::tally;
use super::time::normalize;

/// Replies nested deeper than this below the root are rejected.
/// Keeps dropping and serializing the finished tree within stack limits.
pub const MAX_REPLY_DEPTH: usize = 500;

/// Build the annotated tree rooted at `thread_id`
pub async fn build_tree<S: ForumStore + ?Sized>(store: &S, thread_id: i64) -> Result<PostNode> {
    let root = store
        .get_post(thread_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Thread not found".to_string()))?;

    build_from_root(store, root).await
}

/// Build the annotated tree below an already loaded root post
pub async fn build_from_root<S: ForumStore + ?Sized>(store: &S, root: Post) -> Result<PostNode> {
    let root_id = root.id;
    let thread_base = root.base_id;
    let categories = dedup(store.get_categories_for_post(root_id).await?);

    // `loaded` ends up in breadth-first order: every parent before its children
    let mut visited: HashSet<i64> = HashSet::from([root_id]);
    let mut depth: HashMap<i64, usize> = HashMap::from([(root_id, 0)]);
    let mut children: HashMap<i64, Vec<i64>> = HashMap::new();
    let mut loaded: Vec<Post> = vec![root];
    let mut cursor = 0;

    while cursor < loaded.len() {
        let parent_id = loaded[cursor].id;
        let child_depth = depth.get(&parent_id).copied().unwrap_or(0) + 1;
        cursor += 1;

        for reply in store.get_direct_replies(parent_id).await? {
            if !visited.insert(reply.id) {
                return Err(AppError::Storage(format!(
                    "post {} reached twice while building thread {}",
                    reply.id, root_id
                )));
            }
            if reply.base_id != thread_base {
                return Err(AppError::Storage(format!(
                    "reply {} has base {} but belongs to thread {}",
                    reply.id, reply.base_id, thread_base
                )));
            }
            if child_depth > MAX_REPLY_DEPTH {
                return Err(AppError::Storage(format!(
                    "thread {} nests replies deeper than {}",
                    root_id, MAX_REPLY_DEPTH
                )));
            }

            depth.insert(reply.id, child_depth);
            children.entry(parent_id).or_default().push(reply.id);
            loaded.push(reply);
        }
    }

    // Walking backwards guarantees children are built before their parent
    let mut built: HashMap<i64, PostNode> = HashMap::with_capacity(loaded.len());
    for post in loaded.into_iter().rev() {
        let child_ids = children.remove(&post.id).unwrap_or_default();
        let mut replies = Vec::with_capacity(child_ids.len());
        for id in child_ids {
            let node = built
                .remove(&id)
                .ok_or_else(|| AppError::Storage(format!("reply {} missing from thread {}", id, root_id)))?;
            replies.push(node);
        }

        let node = annotate(store, post, replies).await?;
        built.insert(node.post.id, node);
    }

    let mut tree = built
        .remove(&root_id)
        .ok_or_else(|| AppError::Storage(format!("thread {} lost its root", root_id)))?;
    tree.categories = categories;
    Ok(tree)
}

/// Attach display time and tallies to a post
async fn annotate<S: ForumStore + ?Sized>(
    store: &S,
    post: Post,
    replies: Vec<PostNode>,
) -> Result<PostNode> {
    let shown = normalize(&post.created_at)?;
    let counts = tally(store, post.id).await;
    let total_replies = replies.iter().map(|r| r.total_replies + 1).sum();

    Ok(PostNode {
        created_day: shown.day,
        created_time: shown.time,
        likes: counts.likes,
        dislikes: counts.dislikes,
        reply_count: replies.len(),
        total_replies,
        categories: Vec::new(),
        replies,
        liked_now: false,
        disliked_now: false,
        post,
    })
}

fn dedup(names: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    names.into_iter().filter(|n| seen.insert(n.clone())).collect()
}
