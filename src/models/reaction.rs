use serde::{Deserialize, Serialize};

/// A viewer's opinion on a post; at most one per (user, post)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Reaction {
    Like,
    Dislike,
}

impl Reaction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Reaction::Like => "like",
            Reaction::Dislike => "dislike",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "like" => Some(Reaction::Like),
            "dislike" => Some(Reaction::Dislike),
            _ => None,
        }
    }

    /// Opinion held after `requested` is submitted on top of `current`.
    /// Repeating the same opinion removes it, the opposite one replaces it.
    pub fn toggle(current: Option<Reaction>, requested: Reaction) -> Option<Reaction> {
        match current {
            Some(held) if held == requested => None,
            _ => Some(requested),
        }
    }
}

/// Like/dislike tally of one post
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReactionCounts {
    pub likes: i64,
    pub dislikes: i64,
}

impl ReactionCounts {
    /// Build from `(reaction_type, count)` rows; unknown types are ignored
    pub fn from_rows<I>(rows: I) -> Self
    where
        I: IntoIterator<Item = (String, i64)>,
    {
        let mut counts = ReactionCounts::default();
        for (kind, count) in rows {
            match Reaction::parse(&kind) {
                Some(Reaction::Like) => counts.likes = count,
                Some(Reaction::Dislike) => counts.dislikes = count,
                None => {}
            }
        }
        counts
    }
}

/// Result of a like/dislike request
#[derive(Debug, Serialize)]
pub struct ReactionResponse {
    pub post_id: i64,
    pub base_id: i64,
    /// The viewer's opinion after the toggle
    pub reaction: Option<Reaction>,
    #[serde(flatten)]
    pub counts: ReactionCounts,
}
