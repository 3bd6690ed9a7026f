use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: String,
    pub language: String,
    pub is_active: bool,
    pub maintenance_alerts: bool,
    pub license_alerts: bool,
    pub incident_alerts: bool,
    pub email_notifications: bool,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == "admin"
    }
}

/// The slice of a user the dispatch pipeline needs for fan-out and email.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Recipient {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub language: String,
    pub email_notifications: bool,
}
