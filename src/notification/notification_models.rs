use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum NotificationCategory {
    MaintenanceReminder,
    LicenseExpiry,
    IncidentAlert,
    DocumentExpiry,
    System,
}

impl NotificationCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationCategory::MaintenanceReminder => "maintenance_reminder",
            NotificationCategory::LicenseExpiry => "license_expiry",
            NotificationCategory::IncidentAlert => "incident_alert",
            NotificationCategory::DocumentExpiry => "document_expiry",
            NotificationCategory::System => "system",
        }
    }

    /// Per-user opt-in column gating this category. `None` means every
    /// active user is eligible.
    pub fn opt_in_column(&self) -> Option<&'static str> {
        match self {
            NotificationCategory::MaintenanceReminder => Some("maintenance_alerts"),
            NotificationCategory::LicenseExpiry => Some("license_alerts"),
            NotificationCategory::IncidentAlert => Some("incident_alerts"),
            NotificationCategory::DocumentExpiry | NotificationCategory::System => None,
        }
    }
}

impl std::fmt::Display for NotificationCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum NotificationPriority {
    Low,
    Medium,
    High,
    Critical,
}

impl NotificationPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationPriority::Low => "low",
            NotificationPriority::Medium => "medium",
            NotificationPriority::High => "high",
            NotificationPriority::Critical => "critical",
        }
    }

    /// Parse a stored severity/priority label. Unknown labels fall back to medium.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "low" => NotificationPriority::Low,
            "high" => NotificationPriority::High,
            "critical" => NotificationPriority::Critical,
            _ => NotificationPriority::Medium,
        }
    }

    pub fn for_maintenance(days_remaining: i64) -> Self {
        match days_remaining {
            d if d <= 0 => NotificationPriority::Critical,
            d if d <= 3 => NotificationPriority::High,
            _ => NotificationPriority::Medium,
        }
    }

    pub fn for_license(days_remaining: i64) -> Self {
        match days_remaining {
            d if d <= 7 => NotificationPriority::Critical,
            d if d <= 30 => NotificationPriority::High,
            _ => NotificationPriority::Medium,
        }
    }
}

impl std::fmt::Display for NotificationPriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Notification {
    pub id: Uuid,
    pub recipient_id: Uuid,
    pub category: String,
    pub title: String,
    pub message: String,
    pub priority: String,
    pub is_read: bool,
    pub email_sent: bool,
    pub email_sent_at: Option<DateTime<Utc>>,
    pub related_entity_type: Option<String>,
    pub related_entity_id: Option<Uuid>,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Weak reference from a notification back to the record that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelatedEntity {
    pub entity_type: &'static str,
    pub id: Uuid,
}

#[derive(Debug, Clone)]
pub struct NewNotification {
    pub recipient_id: Uuid,
    pub category: NotificationCategory,
    pub title: String,
    pub message: String,
    pub priority: NotificationPriority,
    pub related_entity: Option<RelatedEntity>,
    pub expires_at: Option<DateTime<Utc>>,
}
