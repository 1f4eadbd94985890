use std::time::Duration;

use super::{FaqStore, FileStamp};

/// Reload the store once if its file changed since `last_seen`.
///
/// Returns `true` when a new book was swapped in. `last_seen` only advances
/// on a successful reload so a broken file is retried on the next poll.
pub fn reload_if_modified(store: &FaqStore, last_seen: &mut Option<FileStamp>) -> bool {
    let Some(stamp) = store.stamp() else {
        return false;
    };
    if *last_seen == Some(stamp) {
        return false;
    }

    match store.reload() {
        Ok(rows) => {
            tracing::info!(
                name: "faq.reloaded",
                path = %store.path().display(),
                rows,
                "FAQ table reloaded"
            );
            *last_seen = Some(stamp);
            true
        }
        Err(e) => {
            tracing::error!(
                name: "faq.reload_failed",
                path = %store.path().display(),
                error = %e,
                "FAQ reload failed, keeping previous table"
            );
            false
        }
    }
}

/// Poll the FAQ file forever, reloading when its modification time or size changes.
pub async fn watch(store: FaqStore, every: Duration) {
    tracing::info!(
        path = %store.path().display(),
        interval_secs = every.as_secs(),
        "Starting FAQ watcher"
    );
    let mut last_seen = store.stamp();
    let mut interval = tokio::time::interval(every);
    // The first tick completes immediately and the file was just loaded.
    interval.tick().await;

    loop {
        interval.tick().await;
        reload_if_modified(&store, &mut last_seen);
    }
}
