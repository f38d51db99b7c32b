//! Background maintenance tasks
//!
//! Handles:
//! - Expired session deletion
//! - Removal of categories no thread uses any more

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::interval;
use tracing::{info, warn};

use crate::config::Config;
use crate::db::Database;

/// Start both sweeps; each runs immediately and then on its own interval
pub fn start_cleanup_tasks(db: Database, config: Arc<Config>) {
    spawn_sweep(
        "expired sessions",
        Duration::from_secs(config.cleanup.session_interval_secs),
        db.clone(),
        |db| async move { db.remove_expired_sessions().await },
    );
    spawn_sweep(
        "unused categories",
        Duration::from_secs(config.cleanup.category_interval_secs),
        db,
        |db| async move { db.remove_unused_categories().await },
    );
}

fn spawn_sweep<F, Fut>(what: &'static str, every: Duration, db: Database, sweep: F)
where
    F: Fn(Database) -> Fut + Send + 'static,
    Fut: Future<Output = crate::error::Result<u64>> + Send,
{
    tokio::spawn(async move {
        // The first tick completes immediately
        let mut ticker = interval(every);

        loop {
            ticker.tick().await;

            match sweep(db.clone()).await {
                Ok(count) if count > 0 => info!("Removed {} {}", count, what),
                Ok(_) => {}
                Err(e) => warn!("Failed to remove {}: {}", what, e),
            }
        }
    });
}

/// Run both sweeps once (for admin use).
/// Both sweeps are attempted; the first failure is returned after logging.
pub async fn trigger_cleanup(db: &Database) -> anyhow::Result<CleanupReport> {
    let expired_sessions = db.remove_expired_sessions().await;
    if let Err(e) = &expired_sessions {
        warn!("Failed to remove expired sessions: {}", e);
    }
    let unused_categories = db.remove_unused_categories().await;
    if let Err(e) = &unused_categories {
        warn!("Failed to remove unused categories: {}", e);
    }

    Ok(CleanupReport {
        expired_sessions_deleted: expired_sessions?,
        unused_categories_deleted: unused_categories?,
    })
}

#[derive(Debug, serde::Serialize)]
pub struct CleanupReport {
    pub expired_sessions_deleted: u64,
    pub unused_categories_deleted: u64,
}
