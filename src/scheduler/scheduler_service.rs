use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info, warn};
use utoipa::ToSchema;

use crate::dispatch::{DispatchService, JobSummary};
use crate::error::{EngineError, EngineResult};

/// Outcome of one job within a run. Failures are carried as text; they have
/// already been logged.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct JobReport {
    pub job: String,
    pub succeeded: bool,
    pub summary: Option<JobSummary>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub jobs: Vec<JobReport>,
}

impl RunReport {
    pub fn job(&self, name: &str) -> Option<&JobReport> {
        self.jobs.iter().find(|j| j.job == name)
    }

    pub fn failed_jobs(&self) -> usize {
        self.jobs.iter().filter(|j| !j.succeeded).count()
    }
}

pub const MAINTENANCE_JOB: &str = "maintenance_reminders";
pub const LICENSE_JOB: &str = "license_expiry";
pub const INCIDENT_JOB: &str = "incident_alerts";
pub const CLEANUP_JOB: &str = "expired_cleanup";

/// Idle/Running gate around the per-tick jobs. A trigger that arrives while
/// a run is in flight is dropped, not queued.
pub struct ReminderScheduler {
    dispatch: Arc<DispatchService>,
    running: Arc<AtomicBool>,
}

/// Owned by the spawned run, so the gate only reopens once every job has
/// settled, even if the caller stopped waiting.
struct RunningGuard(Arc<AtomicBool>);

impl Drop for RunningGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl ReminderScheduler {
    pub fn new(dispatch: Arc<DispatchService>) -> Self {
        Self {
            dispatch,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Runs every job for the current UTC day. Returns `None` when a run is
    /// already in progress.
    pub async fn run_scheduled_notifications(&self) -> Option<RunReport> {
        let now = Utc::now();
        self.trigger(now.date_naive(), now).await
    }

    pub async fn trigger(&self, today: NaiveDate, now: DateTime<Utc>) -> Option<RunReport> {
        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            warn!("Notification run already in progress, ignoring trigger");
            return None;
        }
        let guard = RunningGuard(self.running.clone());
        let dispatch = self.dispatch.clone();

        let run = tokio::spawn(async move {
            let _guard = guard;
            run_all_jobs(dispatch, today, now).await
        });

        match run.await {
            Ok(report) => Some(report),
            Err(e) => {
                error!("Notification run aborted: {}", e);
                None
            }
        }
    }
}

async fn run_all_jobs(dispatch: Arc<DispatchService>, today: NaiveDate, now: DateTime<Utc>) -> RunReport {
    info!(%today, "Starting scheduled notification run");
    let started_at = Utc::now();

    let maintenance = {
        let dispatch = dispatch.clone();
        settle(MAINTENANCE_JOB, async move { dispatch.run_maintenance_reminders(today).await })
    };
    let license = {
        let dispatch = dispatch.clone();
        settle(LICENSE_JOB, async move { dispatch.run_license_reminders(today).await })
    };
    let incidents = {
        let dispatch = dispatch.clone();
        settle(INCIDENT_JOB, async move { dispatch.run_incident_alerts(today).await })
    };
    let cleanup = settle(CLEANUP_JOB, async move { dispatch.cleanup_expired(now).await });

    let (maintenance, license, incidents, cleanup) =
        tokio::join!(maintenance, license, incidents, cleanup);

    let report = RunReport {
        started_at,
        finished_at: Utc::now(),
        jobs: vec![maintenance, license, incidents, cleanup],
    };
    info!(failed = report.failed_jobs(), "Scheduled notification run finished");
    report
}

/// Runs a job on its own task so an error or panic stays inside its report.
async fn settle<F>(name: &'static str, job: F) -> JobReport
where
    F: Future<Output = EngineResult<JobSummary>> + Send + 'static,
{
    let outcome = match tokio::spawn(job).await {
        Ok(result) => result,
        Err(join_error) => Err(EngineError::Aborted(join_error.to_string())),
    };

    match outcome {
        Ok(summary) => JobReport {
            job: name.to_string(),
            succeeded: true,
            summary: Some(summary),
            error: None,
        },
        Err(e) => {
            error!(job = name, "Notification job failed: {}", e);
            JobReport {
                job: name.to_string(),
                succeeded: false,
                summary: None,
                error: Some(e.to_string()),
            }
        }
    }
}

pub async fn start_notification_scheduler(
    scheduler: Arc<ReminderScheduler>,
    cron: &str,
) -> anyhow::Result<JobScheduler> {
    let jobs = JobScheduler::new().await?;

    let job = Job::new_async(cron, move |_uuid, _l| {
        let scheduler = scheduler.clone();

        Box::pin(async move {
            scheduler.run_scheduled_notifications().await;
        })
    })?;

    jobs.add(job).await?;
    jobs.start().await?;

    info!(cron, "Notification scheduler started");
    Ok(jobs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::DispatchOptions;
    use crate::email::spawn_delivery_worker;
    use crate::notification::notification_models::NotificationCategory;
    use crate::reminder::reminder_models::{DRIVER_ENTITY, MAINTENANCE_TASK_ENTITY};
    use crate::testing::{
        candidate, recipient, FakeRecipients, FakeScanner, FakeSettings, InMemoryNotifications,
        RecordingEmailSender,
    };
    use chrono::Duration;
    use uuid::Uuid;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    fn scheduler(scanner: FakeScanner, store: Arc<InMemoryNotifications>) -> ReminderScheduler {
        let recipients = FakeRecipients::with(
            NotificationCategory::MaintenanceReminder,
            vec![recipient("a@example.com"), recipient("b@example.com")],
        )
        .and(NotificationCategory::LicenseExpiry, vec![recipient("c@example.com")]);
        let (queue, _worker) =
            spawn_delivery_worker(Arc::new(RecordingEmailSender::default()), store.clone(), 16);
        let dispatch = DispatchService::new(
            Arc::new(scanner),
            Arc::new(recipients),
            store,
            Arc::new(FakeSettings::default()),
            queue,
            DispatchOptions {
                app_base_url: "https://fleet.example.com".to_string(),
                retention_days: 30,
            },
        );
        ReminderScheduler::new(Arc::new(dispatch))
    }

    #[tokio::test]
    async fn test_run_reports_every_job() {
        let store = Arc::new(InMemoryNotifications::default());
        let now = Utc::now();
        store.seed(Uuid::new_v4(), Some(now - Duration::days(1)));
        let scanner = FakeScanner {
            maintenance: vec![candidate(MAINTENANCE_TASK_ENTITY, "Oil change", 7, today())],
            license: vec![candidate(DRIVER_ENTITY, "Jon Doe", 60, today())],
            ..FakeScanner::default()
        };
        let scheduler = scheduler(scanner, store.clone());

        let report = scheduler.trigger(today(), now).await.unwrap();
        assert_eq!(report.jobs.len(), 4);
        assert_eq!(report.failed_jobs(), 0);
        assert_eq!(
            report.job(MAINTENANCE_JOB).unwrap().summary.as_ref().unwrap().notifications_created,
            2
        );
        assert_eq!(
            report.job(LICENSE_JOB).unwrap().summary.as_ref().unwrap().notifications_created,
            1
        );
        assert_eq!(
            report.job(CLEANUP_JOB).unwrap().summary.as_ref().unwrap().notifications_deleted,
            1
        );
        assert_eq!(store.all().len(), 3);
        assert!(!scheduler.is_running());
    }

    #[tokio::test]
    async fn test_failed_job_does_not_cancel_others() {
        let store = Arc::new(InMemoryNotifications::default());
        let scanner = FakeScanner {
            maintenance: vec![candidate(MAINTENANCE_TASK_ENTITY, "Oil change", 15, today())],
            license: vec![candidate(DRIVER_ENTITY, "Jon Doe", 30, today())],
            fail_license: true,
            panic_incidents: true,
            ..FakeScanner::default()
        };
        let scheduler = scheduler(scanner, store.clone());

        let report = scheduler.trigger(today(), Utc::now()).await.unwrap();
        assert_eq!(report.failed_jobs(), 2);
        assert!(!report.job(LICENSE_JOB).unwrap().succeeded);
        let incident = report.job(INCIDENT_JOB).unwrap();
        assert!(!incident.succeeded);
        assert!(incident.error.as_ref().unwrap().starts_with("job aborted"));
        assert!(report.job(MAINTENANCE_JOB).unwrap().succeeded);
        assert!(report.job(CLEANUP_JOB).unwrap().succeeded);

        let rows = store.all();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|n| n.category == "maintenance_reminder"));
        assert!(!scheduler.is_running());
    }

    #[tokio::test]
    async fn test_trigger_while_running_is_ignored() {
        let store = Arc::new(InMemoryNotifications::default());
        let scanner = FakeScanner {
            maintenance: vec![candidate(MAINTENANCE_TASK_ENTITY, "Oil change", 7, today())],
            ..FakeScanner::default()
        };
        let scheduler = scheduler(scanner, store.clone());

        scheduler.running.store(true, Ordering::Release);
        assert!(scheduler.trigger(today(), Utc::now()).await.is_none());
        assert!(store.all().is_empty());

        scheduler.running.store(false, Ordering::Release);
        assert!(scheduler.trigger(today(), Utc::now()).await.is_some());
        assert_eq!(store.all().len(), 2);
    }

    #[tokio::test]
    async fn test_cancelled_caller_keeps_gate_closed_until_jobs_finish() {
        let store = Arc::new(InMemoryNotifications::default());
        let scanner = FakeScanner {
            maintenance: vec![candidate(MAINTENANCE_TASK_ENTITY, "Oil change", 7, today())],
            scan_delay: Some(std::time::Duration::from_millis(300)),
            ..FakeScanner::default()
        };
        let scheduler = Arc::new(scheduler(scanner, store.clone()));

        let caller = {
            let scheduler = scheduler.clone();
            tokio::spawn(async move { scheduler.trigger(today(), Utc::now()).await })
        };
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        caller.abort();
        assert!(caller.await.unwrap_err().is_cancelled());

        assert!(scheduler.is_running());
        assert!(scheduler.trigger(today(), Utc::now()).await.is_none());

        for _ in 0..100 {
            if !scheduler.is_running() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        }
        assert!(!scheduler.is_running());
        assert_eq!(store.all().len(), 2);
    }
}
