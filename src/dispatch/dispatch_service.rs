use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};
use utoipa::ToSchema;

use crate::email::{EmailJob, EmailQueue, NotificationEmail};
use crate::error::EngineResult;
use crate::notification::notification_models::{
    NewNotification, NotificationCategory, NotificationPriority, RelatedEntity,
};
use crate::notification::notification_repository::NotificationWriter;
use crate::reminder::{CandidateRecord, CandidateScanner, LICENSE_WINDOW_DAYS, MAINTENANCE_WINDOW_DAYS};
use crate::settings::ThresholdSettings;
use crate::user::{Recipient, RecipientResolver};

/// Counters for one job of one scheduler run.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct JobSummary {
    pub candidates_scanned: usize,
    pub candidates_matched: usize,
    pub recipients: usize,
    pub notifications_created: usize,
    pub write_failures: usize,
    pub emails_queued: usize,
    pub notifications_deleted: u64,
}

#[derive(Debug, Clone)]
pub struct DispatchOptions {
    /// Prefix for deep links in emails, e.g. `https://fleet.example.com`.
    pub app_base_url: String,
    /// Lifetime of a created notification before cleanup may delete it.
    pub retention_days: i64,
}

/// Scans, matches, fans out and persists reminders for each category, then
/// hands emails to the delivery worker.
pub struct DispatchService {
    scanner: Arc<dyn CandidateScanner>,
    recipients: Arc<dyn RecipientResolver>,
    writer: Arc<dyn NotificationWriter>,
    settings: Arc<dyn ThresholdSettings>,
    emails: EmailQueue,
    options: DispatchOptions,
}

impl DispatchService {
    pub fn new(
        scanner: Arc<dyn CandidateScanner>,
        recipients: Arc<dyn RecipientResolver>,
        writer: Arc<dyn NotificationWriter>,
        settings: Arc<dyn ThresholdSettings>,
        emails: EmailQueue,
        options: DispatchOptions,
    ) -> Self {
        Self {
            scanner,
            recipients,
            writer,
            settings,
            emails,
            options,
        }
    }

    pub async fn run_maintenance_reminders(&self, today: NaiveDate) -> EngineResult<JobSummary> {
        let category = NotificationCategory::MaintenanceReminder;
        let thresholds = self.settings.reminder_thresholds(category).await?;
        if thresholds.is_empty() {
            debug!(%category, "No thresholds configured, job disabled");
            return Ok(JobSummary::default());
        }

        let candidates = self
            .scanner
            .scan_maintenance_candidates(today, MAINTENANCE_WINDOW_DAYS)
            .await?;
        let scanned = candidates.len();
        let matched: Vec<CandidateRecord> = candidates
            .into_iter()
            .filter(|c| thresholds.should_remind(c.days_remaining))
            .collect();

        self.dispatch(category, scanned, matched).await
    }

    pub async fn run_license_reminders(&self, today: NaiveDate) -> EngineResult<JobSummary> {
        let category = NotificationCategory::LicenseExpiry;
        let thresholds = self.settings.reminder_thresholds(category).await?;
        if thresholds.is_empty() {
            debug!(%category, "No thresholds configured, job disabled");
            return Ok(JobSummary::default());
        }

        let candidates = self
            .scanner
            .scan_license_candidates(today, LICENSE_WINDOW_DAYS)
            .await?;
        let scanned = candidates.len();
        let matched: Vec<CandidateRecord> = candidates
            .into_iter()
            .filter(|c| thresholds.should_remind(c.days_remaining))
            .collect();

        self.dispatch(category, scanned, matched).await
    }

    /// Alerts on high/critical incidents reported yesterday, so each incident
    /// is picked up by exactly one daily run.
    pub async fn run_incident_alerts(&self, today: NaiveDate) -> EngineResult<JobSummary> {
        let category = NotificationCategory::IncidentAlert;
        let reported_on = today - Duration::days(1);

        let candidates = self.scanner.scan_incident_candidates(today, reported_on).await?;
        let scanned = candidates.len();

        self.dispatch(category, scanned, candidates).await
    }

    pub async fn cleanup_expired(&self, now: DateTime<Utc>) -> EngineResult<JobSummary> {
        let deleted = self.writer.delete_expired(now).await?;
        info!(deleted, "Expired notifications removed");

        Ok(JobSummary {
            notifications_deleted: deleted,
            ..JobSummary::default()
        })
    }

    async fn dispatch(
        &self,
        category: NotificationCategory,
        scanned: usize,
        matched: Vec<CandidateRecord>,
    ) -> EngineResult<JobSummary> {
        let mut summary = JobSummary {
            candidates_scanned: scanned,
            candidates_matched: matched.len(),
            ..JobSummary::default()
        };

        if matched.is_empty() {
            info!(%category, scanned, "No candidates due for notification");
            return Ok(summary);
        }

        let recipients = self.recipients.resolve_recipients(category).await?;
        summary.recipients = recipients.len();
        if recipients.is_empty() {
            info!(%category, matched = summary.candidates_matched, "No opted-in recipients");
            return Ok(summary);
        }

        let expires_at = Utc::now() + Duration::days(self.options.retention_days);

        for candidate in &matched {
            let content = compose(category, candidate);
            for recipient in &recipients {
                let new = NewNotification {
                    recipient_id: recipient.id,
                    category,
                    title: content.title.clone(),
                    message: content.message.clone(),
                    priority: content.priority,
                    related_entity: Some(RelatedEntity {
                        entity_type: candidate.entity_type,
                        id: candidate.entity_id,
                    }),
                    expires_at: Some(expires_at),
                };

                let notification = match self.writer.write(&new).await {
                    Ok(notification) => notification,
                    Err(e) => {
                        summary.write_failures += 1;
                        warn!(
                            %category,
                            recipient_id = %recipient.id,
                            entity_id = %candidate.entity_id,
                            "Failed to write notification: {}",
                            e
                        );
                        continue;
                    }
                };
                summary.notifications_created += 1;

                if recipient.email_notifications {
                    let job = EmailJob {
                        notification_id: notification.id,
                        email: self.email_for(recipient, category, candidate, &content),
                    };
                    if self.emails.enqueue(job) {
                        summary.emails_queued += 1;
                    }
                }
            }
        }

        info!(
            %category,
            matched = summary.candidates_matched,
            created = summary.notifications_created,
            failures = summary.write_failures,
            "Notification job finished"
        );
        Ok(summary)
    }

    fn email_for(
        &self,
        recipient: &Recipient,
        category: NotificationCategory,
        candidate: &CandidateRecord,
        content: &Content,
    ) -> NotificationEmail {
        NotificationEmail {
            to: recipient.email.clone(),
            name: recipient.name.clone(),
            category,
            title: content.title.clone(),
            message: content.message.clone(),
            action_url: Some(action_url(&self.options.app_base_url, candidate)),
            language: recipient.language.clone(),
        }
    }
}

struct Content {
    title: String,
    message: String,
    priority: NotificationPriority,
}

fn compose(category: NotificationCategory, candidate: &CandidateRecord) -> Content {
    let days = candidate.days_remaining;
    let date = candidate.due_date.format("%Y-%m-%d");

    match category {
        NotificationCategory::LicenseExpiry => Content {
            title: match days {
                0 => "Driver license expires today".to_string(),
                1 => "Driver license expires tomorrow".to_string(),
                d => format!("Driver license expires in {} days", d),
            },
            message: format!(
                "License {} of driver {} expires on {}.",
                candidate.reference.as_deref().unwrap_or("-"),
                candidate.label,
                date
            ),
            priority: NotificationPriority::for_license(days),
        },
        NotificationCategory::IncidentAlert => {
            let severity = candidate.severity.unwrap_or(NotificationPriority::Medium);
            let vehicle = candidate
                .reference
                .as_deref()
                .map(|plate| format!(" involving vehicle {}", plate))
                .unwrap_or_default();
            Content {
                title: format!("New {} incident reported", severity),
                message: format!("Incident \"{}\"{} was reported on {}.", candidate.label, vehicle, date),
                priority: severity,
            }
        }
        _ => {
            let vehicle = candidate
                .reference
                .as_deref()
                .map(|plate| format!(" for vehicle {}", plate))
                .unwrap_or_default();
            Content {
                title: match days {
                    0 => "Maintenance due today".to_string(),
                    1 => "Maintenance due tomorrow".to_string(),
                    d => format!("Maintenance due in {} days", d),
                },
                message: format!(
                    "Maintenance task \"{}\"{} is scheduled on {}.",
                    candidate.label, vehicle, date
                ),
                priority: NotificationPriority::for_maintenance(days),
            }
        }
    }
}

fn action_url(base_url: &str, candidate: &CandidateRecord) -> String {
    let section = match candidate.entity_type {
        crate::reminder::reminder_models::DRIVER_ENTITY => "drivers",
        crate::reminder::reminder_models::INCIDENT_ENTITY => "incidents",
        _ => "maintenance",
    };
    format!("{}/{}/{}", base_url.trim_end_matches('/'), section, candidate.entity_id)
}
