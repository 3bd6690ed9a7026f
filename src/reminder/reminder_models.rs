use chrono::NaiveDate;
use sqlx::FromRow;
use uuid::Uuid;

use super::threshold::days_remaining;
use crate::notification::notification_models::NotificationPriority;

pub const MAINTENANCE_TASK_ENTITY: &str = "maintenance_task";
pub const DRIVER_ENTITY: &str = "driver";
pub const INCIDENT_ENTITY: &str = "incident";

/// Source record plus its remaining day count, computed during a scan and
/// dropped when the run ends.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateRecord {
    pub entity_type: &'static str,
    pub entity_id: Uuid,
    /// Task title, driver name or incident title.
    pub label: String,
    /// Vehicle plate or license number, when known.
    pub reference: Option<String>,
    pub due_date: NaiveDate,
    pub days_remaining: i64,
    pub severity: Option<NotificationPriority>,
}

#[derive(Debug, Clone, FromRow)]
pub struct MaintenanceRow {
    pub id: Uuid,
    pub title: String,
    pub scheduled_date: NaiveDate,
    pub plate_number: Option<String>,
}

impl MaintenanceRow {
    pub fn into_candidate(self, today: NaiveDate) -> CandidateRecord {
        CandidateRecord {
            entity_type: MAINTENANCE_TASK_ENTITY,
            entity_id: self.id,
            label: self.title,
            reference: self.plate_number,
            due_date: self.scheduled_date,
            days_remaining: days_remaining(self.scheduled_date, today),
            severity: None,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct DriverLicenseRow {
    pub id: Uuid,
    pub full_name: String,
    pub license_number: String,
    pub license_expiry: NaiveDate,
}

impl DriverLicenseRow {
    pub fn into_candidate(self, today: NaiveDate) -> CandidateRecord {
        CandidateRecord {
            entity_type: DRIVER_ENTITY,
            entity_id: self.id,
            label: self.full_name,
            reference: Some(self.license_number),
            due_date: self.license_expiry,
            days_remaining: days_remaining(self.license_expiry, today),
            severity: None,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct IncidentRow {
    pub id: Uuid,
    pub title: String,
    pub severity: String,
    pub reported_on: NaiveDate,
    pub plate_number: Option<String>,
}

impl IncidentRow {
    pub fn into_candidate(self, today: NaiveDate) -> CandidateRecord {
        CandidateRecord {
            entity_type: INCIDENT_ENTITY,
            entity_id: self.id,
            label: self.title,
            reference: self.plate_number,
            due_date: self.reported_on,
            days_remaining: days_remaining(self.reported_on, today),
            severity: Some(NotificationPriority::from_label(&self.severity)),
        }
    }
}
