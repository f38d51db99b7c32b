//! Ordering of threads by their most recent activity.

use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::models::PostNode;

use super::time::parse_timestamp;

/// Newest creation time anywhere in the tree, the root included
pub fn activity_timestamp(thread: &PostNode) -> Result<DateTime<Utc>> {
    let mut newest = parse_timestamp(&thread.post.created_at)?;
    let mut stack: Vec<&PostNode> = thread.replies.iter().collect();

    while let Some(node) = stack.pop() {
        let created = parse_timestamp(&node.post.created_at)?;
        if created > newest {
            newest = created;
        }
        stack.extend(node.replies.iter());
    }

    Ok(newest)
}

/// Sort threads by activity, newest first.
/// Threads with equal activity keep their input order; any unreadable
/// timestamp fails the whole ranking.
pub fn rank(threads: Vec<PostNode>) -> Result<Vec<PostNode>> {
    let mut keyed = threads
        .into_iter()
        .map(|thread| Ok((activity_timestamp(&thread)?, thread)))
        .collect::<Result<Vec<_>>>()?;

    // `sort_by` is stable
    keyed.sort_by(|a, b| b.0.cmp(&a.0));

    Ok(keyed.into_iter().map(|(_, thread)| thread).collect())
}
