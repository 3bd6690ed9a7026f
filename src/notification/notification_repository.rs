use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::notification_models::{NewNotification, Notification};
use crate::error::{EngineError, EngineResult, Result};

/// Sole writer of notification state.
#[async_trait]
pub trait NotificationWriter: Send + Sync {
    /// Always inserts a new row; equivalent notifications are not looked up first.
    async fn write(&self, notification: &NewNotification) -> EngineResult<Notification>;

    /// No-op unless `owner_id` is the recipient. Idempotent.
    async fn mark_read(&self, id: Uuid, owner_id: Uuid) -> EngineResult<()>;

    async fn mark_all_read(&self, owner_id: Uuid) -> EngineResult<u64>;

    /// Sets the email flag once; later calls leave the first timestamp.
    async fn mark_email_sent(&self, id: Uuid, sent_at: DateTime<Utc>) -> EngineResult<()>;

    /// Deletes rows whose non-null `expires_at` is before `now`.
    async fn delete_expired(&self, now: DateTime<Utc>) -> EngineResult<u64>;
}

#[derive(Clone)]
pub struct NotificationRepository {
    pool: PgPool,
}

impl NotificationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_recipient(
        &self,
        recipient_id: Uuid,
        unread_only: bool,
        limit: i64,
    ) -> Result<Vec<Notification>> {
        let notifications = sqlx::query_as::<_, Notification>(
            "SELECT * FROM notifications
             WHERE recipient_id = $1
             AND ($2 = false OR is_read = false)
             ORDER BY created_at DESC
             LIMIT $3",
        )
        .bind(recipient_id)
        .bind(unread_only)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(notifications)
    }

    pub async fn count_unread(&self, recipient_id: Uuid) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM notifications WHERE recipient_id = $1 AND is_read = false",
        )
        .bind(recipient_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }
}

#[async_trait]
impl NotificationWriter for NotificationRepository {
    async fn write(&self, notification: &NewNotification) -> EngineResult<Notification> {
        let (entity_type, entity_id) = match &notification.related_entity {
            Some(entity) => (Some(entity.entity_type), Some(entity.id)),
            None => (None, None),
        };

        let row = sqlx::query_as::<_, Notification>(
            "INSERT INTO notifications
                (id, recipient_id, category, title, message, priority,
                 related_entity_type, related_entity_id, expires_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(notification.recipient_id)
        .bind(notification.category.as_str())
        .bind(&notification.title)
        .bind(&notification.message)
        .bind(notification.priority.as_str())
        .bind(entity_type)
        .bind(entity_id)
        .bind(notification.expires_at)
        .fetch_one(&self.pool)
        .await
        .map_err(EngineError::Persistence)?;

        Ok(row)
    }

    async fn mark_read(&self, id: Uuid, owner_id: Uuid) -> EngineResult<()> {
        sqlx::query("UPDATE notifications SET is_read = true WHERE id = $1 AND recipient_id = $2")
            .bind(id)
            .bind(owner_id)
            .execute(&self.pool)
            .await
            .map_err(EngineError::Persistence)?;

        Ok(())
    }

    async fn mark_all_read(&self, owner_id: Uuid) -> EngineResult<u64> {
        let result = sqlx::query(
            "UPDATE notifications SET is_read = true WHERE recipient_id = $1 AND is_read = false",
        )
        .bind(owner_id)
        .execute(&self.pool)
        .await
        .map_err(EngineError::Persistence)?;

        Ok(result.rows_affected())
    }

    async fn mark_email_sent(&self, id: Uuid, sent_at: DateTime<Utc>) -> EngineResult<()> {
        sqlx::query(
            "UPDATE notifications SET email_sent = true, email_sent_at = $2
             WHERE id = $1 AND email_sent = false",
        )
        .bind(id)
        .bind(sent_at)
        .execute(&self.pool)
        .await
        .map_err(EngineError::Persistence)?;

        Ok(())
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> EngineResult<u64> {
        let result = sqlx::query(
            "DELETE FROM notifications WHERE expires_at IS NOT NULL AND expires_at < $1",
        )
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(EngineError::Persistence)?;

        Ok(result.rows_affected())
    }
}
