//! Per-viewer like/dislike markers on an annotated tree.

use std::collections::HashMap;

use uuid::Uuid;

use crate::error::Result;
use crate::models::{PostNode, Reaction};
use crate::store::ForumStore;

/// The opinions one viewer holds, keyed by post id
#[derive(Debug, Default)]
pub struct ViewerReactions {
    by_post: HashMap<i64, Reaction>,
}

impl ViewerReactions {
    /// Load a viewer's opinions in a single query. No viewer means no opinions.
    pub async fn load<S: ForumStore + ?Sized>(store: &S, viewer: Option<Uuid>) -> Result<Self> {
        let Some(viewer) = viewer else {
            return Ok(Self::default());
        };

        let by_post = store.get_reactions_for_viewer(viewer).await?.into_iter().collect();
        Ok(Self { by_post })
    }

    pub fn get(&self, post_id: i64) -> Option<Reaction> {
        self.by_post.get(&post_id).copied()
    }

    /// Mark every node of the tree
    pub fn apply(&self, tree: &mut PostNode) {
        let mut stack: Vec<&mut PostNode> = vec![tree];
        while let Some(node) = stack.pop() {
            let opinion = self.get(node.post.id);
            node.liked_now = opinion == Some(Reaction::Like);
            node.disliked_now = opinion == Some(Reaction::Dislike);
            stack.extend(node.replies.iter_mut());
        }
    }
}

/// Return `tree` with `liked_now`/`disliked_now` set for `viewer`
pub async fn apply_viewer_overlay<S: ForumStore + ?Sized>(
    store: &S,
    mut tree: PostNode,
    viewer: Option<Uuid>,
) -> Result<PostNode> {
    let reactions = ViewerReactions::load(store, viewer).await?;
    reactions.apply(&mut tree);
    Ok(tree)
}
