//! Read-side forum engine: reply trees, display times, tallies, ranking,
//! category search and viewer markers.

pub mod listing;
pub mod overlay;
pub mod rank;
pub mod search;
pub mod tally;
pub mod time;
pub mod tree;

pub use listing::{list_and_rank_threads, select_threads, Selection, ThreadFilter};
pub use overlay::{apply_viewer_overlay, ViewerReactions};
pub use rank::{activity_timestamp, rank};
pub use search::{build_search_filter, category_search_query, SearchFilter};
pub use tally::tally;
pub use time::{normalize, parse_timestamp, DISPLAY_TZ};
pub use tree::{build_from_root, build_tree, MAX_REPLY_DEPTH};
