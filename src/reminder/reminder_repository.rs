use async_trait::async_trait;
use chrono::{Duration, NaiveDate};
use sqlx::PgPool;

use super::reminder_models::{CandidateRecord, DriverLicenseRow, IncidentRow, MaintenanceRow};
use crate::error::{EngineError, EngineResult};

/// Read-only access to the records reminders are derived from.
#[async_trait]
pub trait CandidateScanner: Send + Sync {
    /// Active, non-completed maintenance due between `today` and
    /// `today + window_days` inclusive.
    async fn scan_maintenance_candidates(
        &self,
        today: NaiveDate,
        window_days: i64,
    ) -> EngineResult<Vec<CandidateRecord>>;

    /// Active drivers whose license expires between `today` and
    /// `today + window_days` inclusive.
    async fn scan_license_candidates(
        &self,
        today: NaiveDate,
        window_days: i64,
    ) -> EngineResult<Vec<CandidateRecord>>;

    /// Open high/critical incidents reported on `reported_on`.
    async fn scan_incident_candidates(
        &self,
        today: NaiveDate,
        reported_on: NaiveDate,
    ) -> EngineResult<Vec<CandidateRecord>>;
}

#[derive(Clone)]
pub struct ReminderRepository {
    pool: PgPool,
}

impl ReminderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CandidateScanner for ReminderRepository {
    async fn scan_maintenance_candidates(
        &self,
        today: NaiveDate,
        window_days: i64,
    ) -> EngineResult<Vec<CandidateRecord>> {
        let horizon = today + Duration::days(window_days);

        let rows = sqlx::query_as::<_, MaintenanceRow>(
            "SELECT m.id, m.title, m.scheduled_date, v.plate_number
             FROM maintenance_tasks m
             LEFT JOIN vehicles v ON v.id = m.vehicle_id
             WHERE m.is_active = true
             AND m.status NOT IN ('completed', 'cancelled')
             AND m.scheduled_date BETWEEN $1 AND $2
             ORDER BY m.scheduled_date, m.id",
        )
        .bind(today)
        .bind(horizon)
        .fetch_all(&self.pool)
        .await
        .map_err(EngineError::DataAccess)?;

        Ok(rows.into_iter().map(|row| row.into_candidate(today)).collect())
    }

    async fn scan_license_candidates(
        &self,
        today: NaiveDate,
        window_days: i64,
    ) -> EngineResult<Vec<CandidateRecord>> {
        let horizon = today + Duration::days(window_days);

        let rows = sqlx::query_as::<_, DriverLicenseRow>(
            "SELECT id, full_name, license_number, license_expiry
             FROM drivers
             WHERE is_active = true
             AND license_expiry IS NOT NULL
             AND license_expiry BETWEEN $1 AND $2
             ORDER BY license_expiry, id",
        )
        .bind(today)
        .bind(horizon)
        .fetch_all(&self.pool)
        .await
        .map_err(EngineError::DataAccess)?;

        Ok(rows.into_iter().map(|row| row.into_candidate(today)).collect())
    }

    async fn scan_incident_candidates(
        &self,
        today: NaiveDate,
        reported_on: NaiveDate,
    ) -> EngineResult<Vec<CandidateRecord>> {
        let rows = sqlx::query_as::<_, IncidentRow>(
            "SELECT i.id, i.title, i.severity, i.reported_on, v.plate_number
             FROM incidents i
             LEFT JOIN vehicles v ON v.id = i.vehicle_id
             WHERE i.status = 'open'
             AND i.severity IN ('high', 'critical')
             AND i.reported_on = $1
             ORDER BY i.id",
        )
        .bind(reported_on)
        .fetch_all(&self.pool)
        .await
        .map_err(EngineError::DataAccess)?;

        Ok(rows.into_iter().map(|row| row.into_candidate(today)).collect())
    }
}
