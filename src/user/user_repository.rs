use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::user_models::{Recipient, User};
use crate::error::{EngineError, EngineResult, Result};
use crate::notification::notification_models::NotificationCategory;

/// Resolves which users receive notifications of a category.
#[async_trait]
pub trait RecipientResolver: Send + Sync {
    /// Active users opted in to `category`, ordered by id. Empty when no one
    /// is opted in.
    async fn resolve_recipients(&self, category: NotificationCategory) -> EngineResult<Vec<Recipient>>;
}

#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, user_id: Uuid) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }
}

fn recipients_query(category: NotificationCategory) -> String {
    let mut query = String::from(
        "SELECT id, name, email, language, email_notifications FROM users WHERE is_active = true",
    );
    if let Some(column) = category.opt_in_column() {
        query.push_str(&format!(" AND {} = true", column));
    }
    query.push_str(" ORDER BY id");
    query
}

#[async_trait]
impl RecipientResolver for UserRepository {
    async fn resolve_recipients(&self, category: NotificationCategory) -> EngineResult<Vec<Recipient>> {
        let query = recipients_query(category);
        let recipients = sqlx::query_as::<_, Recipient>(&query)
            .fetch_all(&self.pool)
            .await
            .map_err(EngineError::DataAccess)?;

        Ok(recipients)
    }
}
