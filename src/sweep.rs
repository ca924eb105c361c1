//! Scheduled eviction of expired cache entries.
//!
//! Reads already drop stale entries lazily; the sweep only bounds memory held by
//! keys nobody asks for again.

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio_cron_scheduler::{Job, JobScheduler};

use crate::npm::ResponseStore;

/// Removes every expired entry and reports how many went.
pub fn sweep_once(cache: &ResponseStore) -> usize {
    let purged = cache.purge_expired();
    let stats = cache.stats();
    if purged > 0 {
        tracing::info!(
            purged,
            remaining = stats.total_entries,
            fresh = stats.fresh_entries,
            ttl_secs = stats.ttl_secs,
            "Swept expired cache entries"
        );
    } else {
        tracing::debug!(entries = stats.total_entries, "No expired cache entries to sweep");
    }
    purged
}

/// Starts a scheduler running [`sweep_once`] on `schedule` (six-field cron).
///
/// The caller owns the returned scheduler and should shut it down on exit.
pub async fn start_cache_sweeper(
    cache: Arc<ResponseStore>,
    schedule: &str,
) -> Result<JobScheduler> {
    let sched = JobScheduler::new()
        .await
        .context("creating cache sweep scheduler")?;

    let job = Job::new_async(schedule, move |_uuid, _l| {
        let cache = cache.clone();
        Box::pin(async move {
            sweep_once(&cache);
        })
    })
    .with_context(|| format!("invalid sweep schedule {schedule:?}"))?;

    sched
        .add(job)
        .await
        .context("adding sweep job to scheduler")?;
    sched
        .start()
        .await
        .context("starting cache sweep scheduler")?;

    tracing::info!(schedule = %schedule, "Cache sweep scheduler started");
    Ok(sched)
}
