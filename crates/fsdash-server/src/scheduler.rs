//! Background job scheduler.
//!
//! When `FSDASH_BACKGROUND_REFRESH` is on, an hourly job invalidates the
//! record cache and re-warms both kinds so the first request after the top
//! of the hour does not pay for the upstream round trip.

use std::sync::Arc;

use fsdash_feed::{RecordCache, RecordSource};
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

/// Top of every hour (sec min hour day month weekday).
const HOURLY_REFRESH_SCHEDULE: &str = "0 0 * * * *";

/// Builds and starts the background job scheduler with the hourly refresh job.
///
/// Returns the running [`JobScheduler`] handle, which must be kept alive for
/// the lifetime of the process. Dropping it shuts down all scheduled jobs.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the scheduler cannot be initialised, the
/// job cannot be registered, or the scheduler cannot be started.
pub async fn build_scheduler<S>(
    cache: Arc<RecordCache<S>>,
) -> Result<JobScheduler, JobSchedulerError>
where
    S: RecordSource + 'static,
{
    let scheduler = JobScheduler::new().await?;
    scheduler.add(refresh_job(cache)?).await?;
    scheduler.start().await?;
    tracing::info!(schedule = HOURLY_REFRESH_SCHEDULE, "background refresh enabled");
    Ok(scheduler)
}

fn refresh_job<S>(cache: Arc<RecordCache<S>>) -> Result<Job, JobSchedulerError>
where
    S: RecordSource + 'static,
{
    Job::new_async(HOURLY_REFRESH_SCHEDULE, move |_uuid, _lock| {
        let cache = Arc::clone(&cache);
        Box::pin(async move {
            tracing::info!("scheduler: refreshing record cache");
            cache.refresh_all().await;
        })
    })
}
