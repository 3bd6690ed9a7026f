use async_trait::async_trait;
use sqlx::PgPool;

use crate::error::{EngineError, EngineResult};
use crate::notification::notification_models::NotificationCategory;
use crate::reminder::ThresholdSet;

pub const MAINTENANCE_THRESHOLDS_KEY: &str = "maintenance_reminder_days";
pub const LICENSE_THRESHOLDS_KEY: &str = "license_reminder_days";

/// Source of the per-category reminder day offsets.
#[async_trait]
pub trait ThresholdSettings: Send + Sync {
    async fn reminder_thresholds(&self, category: NotificationCategory) -> EngineResult<ThresholdSet>;
}

pub fn settings_key(category: NotificationCategory) -> Option<&'static str> {
    match category {
        NotificationCategory::MaintenanceReminder => Some(MAINTENANCE_THRESHOLDS_KEY),
        NotificationCategory::LicenseExpiry => Some(LICENSE_THRESHOLDS_KEY),
        _ => None,
    }
}

pub fn default_thresholds(category: NotificationCategory) -> ThresholdSet {
    match category {
        NotificationCategory::MaintenanceReminder => ThresholdSet::new([30, 15, 7, 3]),
        NotificationCategory::LicenseExpiry => ThresholdSet::new([90, 60, 30, 15, 7]),
        _ => ThresholdSet::default(),
    }
}

#[derive(Clone)]
pub struct SettingsRepository {
    pool: PgPool,
}

impl SettingsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ThresholdSettings for SettingsRepository {
    async fn reminder_thresholds(&self, category: NotificationCategory) -> EngineResult<ThresholdSet> {
        let Some(key) = settings_key(category) else {
            return Ok(ThresholdSet::default());
        };

        let value: Option<String> =
            sqlx::query_scalar("SELECT value FROM app_settings WHERE key = $1")
                .bind(key)
                .fetch_optional(&self.pool)
                .await
                .map_err(EngineError::DataAccess)?;

        match value {
            Some(raw) => Ok(ThresholdSet::parse(&raw)),
            None => {
                tracing::debug!(key, "No threshold setting stored, using defaults");
                Ok(default_thresholds(category))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_thresholds() {
        assert_eq!(
            default_thresholds(NotificationCategory::MaintenanceReminder).as_slice(),
            &[30, 15, 7, 3]
        );
        assert_eq!(
            default_thresholds(NotificationCategory::LicenseExpiry).as_slice(),
            &[90, 60, 30, 15, 7]
        );
        assert!(default_thresholds(NotificationCategory::IncidentAlert).is_empty());
    }

    #[test]
    fn test_settings_keys() {
        assert_eq!(
            settings_key(NotificationCategory::MaintenanceReminder),
            Some("maintenance_reminder_days")
        );
        assert_eq!(settings_key(NotificationCategory::System), None);
    }
}
