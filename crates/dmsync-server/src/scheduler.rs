//! Background job scheduler.
//!
//! Runs the bulk sync on `DMSYNC_SYNC_SCHEDULE` when one is configured.

use std::sync::Arc;

use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

use dmsync_engine::BulkSync;

/// Builds and starts the scheduler, or returns `None` when no schedule is
/// configured.
///
/// The returned handle must be kept alive for the lifetime of the process;
/// dropping it shuts down all jobs.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the scheduler cannot be initialised, the
/// cron expression is rejected, or the scheduler fails to start.
pub async fn build_scheduler(
    schedule: Option<&str>,
    job: Arc<BulkSync>,
) -> Result<Option<JobScheduler>, JobSchedulerError> {
    let Some(schedule) = schedule else {
        tracing::info!("DMSYNC_SYNC_SCHEDULE not set; scheduled bulk sync disabled");
        return Ok(None);
    };

    let scheduler = JobScheduler::new().await?;
    register_bulk_sync_job(&scheduler, schedule, job).await?;
    scheduler.start().await?;
    tracing::info!(schedule, "scheduled bulk sync enabled");
    Ok(Some(scheduler))
}

async fn register_bulk_sync_job(
    scheduler: &JobScheduler,
    schedule: &str,
    sync: Arc<BulkSync>,
) -> Result<(), JobSchedulerError> {
    let job = Job::new_async(schedule, move |_uuid, _lock| {
        let sync = Arc::clone(&sync);

        Box::pin(async move {
            tracing::info!("scheduler: starting bulk sync");
            match sync.run(false).await {
                Ok(report) => tracing::info!(%report, "scheduler: bulk sync finished"),
                Err(e) => tracing::error!(
                    kind = e.kind(),
                    error = %e,
                    "scheduler: bulk sync aborted"
                ),
            }
        })
    })?;

    scheduler.add(job).await?;
    Ok(())
}
