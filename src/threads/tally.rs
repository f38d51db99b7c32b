//! Like/dislike tallies. Tallies are cosmetic, so failures never abort a page.

use tracing::warn;

use crate::models::ReactionCounts;
use crate::store::ForumStore;

/// Like and dislike counts for a post; `(0, 0)` with a warning if the store fails
pub async fn tally<S: ForumStore + ?Sized>(store: &S, post_id: i64) -> ReactionCounts {
    match store.get_reaction_counts(post_id).await {
        Ok(counts) => counts,
        Err(e) => {
            warn!("Fetching reactions for post {} failed: {}", post_id, e);
            ReactionCounts::default()
        }
    }
}
