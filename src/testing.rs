//! In-memory collaborators for engine tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use uuid::Uuid;

use crate::email::email_sender::DeliveryError;
use crate::email::{EmailSender, NotificationEmail};
use crate::error::{EngineError, EngineResult};
use crate::notification::notification_models::{NewNotification, Notification, NotificationCategory};
use crate::notification::notification_repository::NotificationWriter;
use crate::reminder::{CandidateRecord, CandidateScanner, ThresholdSet};
use crate::settings::settings_repository::default_thresholds;
use crate::settings::ThresholdSettings;
use crate::user::{Recipient, RecipientResolver};

pub fn candidate(entity_type: &'static str, label: &str, days: i64, today: NaiveDate) -> CandidateRecord {
    CandidateRecord {
        entity_type,
        entity_id: Uuid::new_v4(),
        label: label.to_string(),
        reference: Some("AB-123-CD".to_string()),
        due_date: today + Duration::days(days),
        days_remaining: days,
        severity: None,
    }
}

pub fn recipient(email: &str) -> Recipient {
    Recipient {
        id: Uuid::new_v4(),
        name: email.split('@').next().unwrap_or(email).to_string(),
        email: email.to_string(),
        language: "en".to_string(),
        email_notifications: true,
    }
}

#[derive(Default)]
pub struct FakeScanner {
    pub maintenance: Vec<CandidateRecord>,
    pub license: Vec<CandidateRecord>,
    pub incidents: Vec<CandidateRecord>,
    pub fail: bool,
    pub fail_license: bool,
    pub panic_incidents: bool,
    pub scan_delay: Option<std::time::Duration>,
}

fn unreachable_store() -> EngineError {
    EngineError::DataAccess(sqlx::Error::PoolTimedOut)
}

#[async_trait]
impl CandidateScanner for FakeScanner {
    async fn scan_maintenance_candidates(
        &self,
        _today: NaiveDate,
        _window_days: i64,
    ) -> EngineResult<Vec<CandidateRecord>> {
        if let Some(delay) = self.scan_delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail {
            return Err(unreachable_store());
        }
        Ok(self.maintenance.clone())
    }

    async fn scan_license_candidates(
        &self,
        _today: NaiveDate,
        _window_days: i64,
    ) -> EngineResult<Vec<CandidateRecord>> {
        if self.fail || self.fail_license {
            return Err(unreachable_store());
        }
        Ok(self.license.clone())
    }

    async fn scan_incident_candidates(
        &self,
        _today: NaiveDate,
        _reported_on: NaiveDate,
    ) -> EngineResult<Vec<CandidateRecord>> {
        if self.panic_incidents {
            panic!("incident scan exploded");
        }
        if self.fail {
            return Err(unreachable_store());
        }
        Ok(self.incidents.clone())
    }
}

#[derive(Default)]
pub struct FakeRecipients {
    by_category: HashMap<NotificationCategory, Vec<Recipient>>,
}

impl FakeRecipients {
    pub fn with(category: NotificationCategory, recipients: Vec<Recipient>) -> Self {
        let mut by_category = HashMap::new();
        by_category.insert(category, recipients);
        Self { by_category }
    }

    pub fn and(mut self, category: NotificationCategory, recipients: Vec<Recipient>) -> Self {
        self.by_category.insert(category, recipients);
        self
    }
}

#[async_trait]
impl RecipientResolver for FakeRecipients {
    async fn resolve_recipients(&self, category: NotificationCategory) -> EngineResult<Vec<Recipient>> {
        Ok(self.by_category.get(&category).cloned().unwrap_or_default())
    }
}

#[derive(Default)]
pub struct FakeSettings {
    overrides: HashMap<NotificationCategory, ThresholdSet>,
}

impl FakeSettings {
    pub fn with(category: NotificationCategory, thresholds: ThresholdSet) -> Self {
        let mut overrides = HashMap::new();
        overrides.insert(category, thresholds);
        Self { overrides }
    }
}

#[async_trait]
impl ThresholdSettings for FakeSettings {
    async fn reminder_thresholds(&self, category: NotificationCategory) -> EngineResult<ThresholdSet> {
        Ok(self
            .overrides
            .get(&category)
            .cloned()
            .unwrap_or_else(|| default_thresholds(category)))
    }
}

/// Mirrors the SQL predicates of the Postgres writer.
#[derive(Default)]
pub struct InMemoryNotifications {
    rows: Mutex<Vec<Notification>>,
    fail_for: HashSet<Uuid>,
}

impl InMemoryNotifications {
    pub fn failing_for(recipients: impl IntoIterator<Item = Uuid>) -> Self {
        Self {
            rows: Mutex::new(Vec::new()),
            fail_for: recipients.into_iter().collect(),
        }
    }

    pub fn seed(&self, recipient_id: Uuid, expires_at: Option<DateTime<Utc>>) -> Notification {
        let row = Notification {
            id: Uuid::new_v4(),
            recipient_id,
            category: NotificationCategory::System.as_str().to_string(),
            title: "Seeded".to_string(),
            message: "Seeded notification".to_string(),
            priority: "low".to_string(),
            is_read: false,
            email_sent: false,
            email_sent_at: None,
            related_entity_type: None,
            related_entity_id: None,
            expires_at,
            created_at: Utc::now(),
        };
        self.rows.lock().unwrap().push(row.clone());
        row
    }

    pub fn get(&self, id: Uuid) -> Option<Notification> {
        self.rows.lock().unwrap().iter().find(|n| n.id == id).cloned()
    }

    pub fn all(&self) -> Vec<Notification> {
        self.rows.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationWriter for InMemoryNotifications {
    async fn write(&self, notification: &NewNotification) -> EngineResult<Notification> {
        if self.fail_for.contains(&notification.recipient_id) {
            return Err(EngineError::Persistence(sqlx::Error::RowNotFound));
        }
        let row = Notification {
            id: Uuid::new_v4(),
            recipient_id: notification.recipient_id,
            category: notification.category.as_str().to_string(),
            title: notification.title.clone(),
            message: notification.message.clone(),
            priority: notification.priority.as_str().to_string(),
            is_read: false,
            email_sent: false,
            email_sent_at: None,
            related_entity_type: notification
                .related_entity
                .as_ref()
                .map(|e| e.entity_type.to_string()),
            related_entity_id: notification.related_entity.as_ref().map(|e| e.id),
            expires_at: notification.expires_at,
            created_at: Utc::now(),
        };
        self.rows.lock().unwrap().push(row.clone());
        Ok(row)
    }

    async fn mark_read(&self, id: Uuid, owner_id: Uuid) -> EngineResult<()> {
        let mut rows = self.rows.lock().unwrap();
        if let Some(row) = rows.iter_mut().find(|n| n.id == id && n.recipient_id == owner_id) {
            row.is_read = true;
        }
        Ok(())
    }

    async fn mark_all_read(&self, owner_id: Uuid) -> EngineResult<u64> {
        let mut rows = self.rows.lock().unwrap();
        let mut updated = 0;
        for row in rows.iter_mut().filter(|n| n.recipient_id == owner_id && !n.is_read) {
            row.is_read = true;
            updated += 1;
        }
        Ok(updated)
    }

    async fn mark_email_sent(&self, id: Uuid, sent_at: DateTime<Utc>) -> EngineResult<()> {
        let mut rows = self.rows.lock().unwrap();
        if let Some(row) = rows.iter_mut().find(|n| n.id == id && !n.email_sent) {
            row.email_sent = true;
            row.email_sent_at = Some(sent_at);
        }
        Ok(())
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> EngineResult<u64> {
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|n| !matches!(n.expires_at, Some(at) if at < now));
        Ok((before - rows.len()) as u64)
    }
}

#[derive(Default)]
pub struct RecordingEmailSender {
    fail_for: HashSet<String>,
    attempts: Mutex<Vec<NotificationEmail>>,
    sent: Mutex<Vec<NotificationEmail>>,
}

impl RecordingEmailSender {
    pub fn failing_for<'a>(addresses: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            fail_for: addresses.into_iter().map(str::to_string).collect(),
            ..Self::default()
        }
    }

    pub fn attempts(&self) -> usize {
        self.attempts.lock().unwrap().len()
    }

    pub fn sent(&self) -> Vec<NotificationEmail> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl EmailSender for RecordingEmailSender {
    async fn send_notification_email(&self, email: &NotificationEmail) -> Result<(), DeliveryError> {
        self.attempts.lock().unwrap().push(email.clone());
        if self.fail_for.contains(&email.to) {
            return Err(DeliveryError::Build("mailbox unavailable".to_string()));
        }
        self.sent.lock().unwrap().push(email.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mark_read_is_idempotent_and_owner_scoped() {
        let store = InMemoryNotifications::default();
        let owner = Uuid::new_v4();
        let id = store.seed(owner, None).id;

        store.mark_read(id, Uuid::new_v4()).await.unwrap();
        assert!(!store.get(id).unwrap().is_read);

        store.mark_read(id, owner).await.unwrap();
        store.mark_read(id, owner).await.unwrap();
        assert!(store.get(id).unwrap().is_read);
    }

    #[tokio::test]
    async fn test_mark_all_read_counts_only_unread() {
        let store = InMemoryNotifications::default();
        let owner = Uuid::new_v4();
        store.seed(owner, None);
        store.seed(owner, None);
        store.seed(Uuid::new_v4(), None);

        assert_eq!(store.mark_all_read(owner).await.unwrap(), 2);
        assert_eq!(store.mark_all_read(owner).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_email_flag_is_set_once() {
        let store = InMemoryNotifications::default();
        let id = store.seed(Uuid::new_v4(), None).id;
        let first = Utc::now();

        store.mark_email_sent(id, first).await.unwrap();
        store.mark_email_sent(id, first + Duration::minutes(5)).await.unwrap();
        assert_eq!(store.get(id).unwrap().email_sent_at, Some(first));
    }
}
