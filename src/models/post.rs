use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A post row as stored - threads and replies share the table
#[derive(Debug, Clone, FromRow)]
pub struct PostRow {
    pub id: i64,
    pub base_id: i64,
    pub parent_id: Option<i64>,
    pub author: String,
    pub author_id: Option<Uuid>,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// A thread or a reply
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    /// Id of the owning thread (own id for threads)
    pub base_id: i64,
    /// Immediate parent post, 0 for threads
    pub parent_id: i64,
    /// Display name at creation time
    pub author: String,
    /// Owning user, None once the account is removed
    pub author_id: Option<Uuid>,
    /// Empty for replies
    pub title: String,
    pub content: String,
    /// Creation instant in RFC3339 wire form (`YYYY-MM-DDTHH:MM:SS[.ffffff]Z`)
    pub created_at: String,
}

impl From<PostRow> for Post {
    fn from(row: PostRow) -> Self {
        Post {
            id: row.id,
            base_id: row.base_id,
            parent_id: row.parent_id.unwrap_or(0),
            author: row.author,
            author_id: row.author_id,
            title: row.title,
            content: row.content,
            created_at: row.created_at.to_rfc3339_opts(SecondsFormat::AutoSi, true),
        }
    }
}

impl Post {
    /// Threads are exactly the posts with a title
    pub fn is_thread(&self) -> bool {
        !self.title.is_empty()
    }
}

/// Request to create a new thread
#[derive(Debug, Deserialize)]
pub struct CreateThreadRequest {
    pub title: String,
    pub content: String,
    /// Raw, space or punctuation separated category list
    pub categories: String,
}

/// Request to reply to any post
#[derive(Debug, Deserialize)]
pub struct CreateReplyRequest {
    pub parent_id: i64,
    pub content: String,
}

/// Date and time of a post in the forum's display timezone
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayTime {
    /// `D.M.YYYY`
    pub day: String,
    /// `HH:MM`
    pub time: String,
}

/// A post annotated for presentation, with its replies materialized
#[derive(Debug, Clone, Serialize)]
pub struct PostNode {
    #[serde(flatten)]
    pub post: Post,
    pub created_day: String,
    pub created_time: String,
    pub likes: i64,
    pub dislikes: i64,
    /// Number of direct replies
    pub reply_count: usize,
    /// Number of replies anywhere below this post
    pub total_replies: usize,
    /// Category names, only carried by threads
    pub categories: Vec<String>,
    pub replies: Vec<PostNode>,
    /// Whether the requesting viewer likes this post
    pub liked_now: bool,
    /// Whether the requesting viewer dislikes this post
    pub disliked_now: bool,
}

impl PostNode {
    /// Visit every node of the tree, root first
    pub fn walk(&self) -> Vec<&PostNode> {
        let mut out = Vec::new();
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(node.replies.iter().rev());
        }
        out
    }
}

/// Response for a single thread page
#[derive(Debug, Serialize)]
pub struct ThreadPage {
    pub thread: PostNode,
    pub images: Vec<String>,
    pub can_reply: bool,
}

/// Response for the thread listing
#[derive(Debug, Serialize)]
pub struct ThreadListPage {
    pub threads: Vec<PostNode>,
    pub categories: Vec<String>,
    pub top_categories: Vec<String>,
}
