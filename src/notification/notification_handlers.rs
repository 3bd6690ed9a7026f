use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use super::notification_dto::{
    ListNotificationsQuery, MarkAllReadResponse, UnreadCountResponse, DEFAULT_LIST_LIMIT,
};
use super::notification_models::Notification;
use super::notification_repository::NotificationWriter;
use crate::{error::Result, middleware::AuthUser, state::AppState};

/// List notifications for the authenticated user, newest first
#[utoipa::path(
    get,
    path = "/api/notifications",
    params(ListNotificationsQuery),
    responses(
        (status = 200, description = "List of notifications", body = Vec<Notification>),
        (status = 400, description = "Invalid query"),
        (status = 401, description = "Unauthorized")
    ),
    tag = "notifications",
    security(("bearer_auth" = []))
)]
pub async fn get_notifications(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(query): Query<ListNotificationsQuery>,
) -> Result<Json<Vec<Notification>>> {
    query.validate()?;

    let notifications = state
        .notification_repository
        .find_by_recipient(
            user_id,
            query.unread_only.unwrap_or(false),
            query.limit.unwrap_or(DEFAULT_LIST_LIMIT),
        )
        .await?;

    Ok(Json(notifications))
}

/// Count unread notifications for the authenticated user
#[utoipa::path(
    get,
    path = "/api/notifications/unread-count",
    responses(
        (status = 200, description = "Unread notification count", body = UnreadCountResponse),
        (status = 401, description = "Unauthorized")
    ),
    tag = "notifications",
    security(("bearer_auth" = []))
)]
pub async fn get_unread_count(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<UnreadCountResponse>> {
    let unread = state.notification_repository.count_unread(user_id).await?;

    Ok(Json(UnreadCountResponse { unread }))
}

/// Mark notification as read
///
/// Succeeds without effect when the notification belongs to someone else.
#[utoipa::path(
    patch,
    path = "/api/notifications/{id}/read",
    params(
        ("id" = Uuid, Path, description = "Notification ID")
    ),
    responses(
        (status = 204, description = "Notification marked as read"),
        (status = 401, description = "Unauthorized")
    ),
    tag = "notifications",
    security(("bearer_auth" = []))
)]
pub async fn mark_notification_read(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(notification_id): Path<Uuid>,
) -> Result<StatusCode> {
    state
        .notification_repository
        .mark_read(notification_id, user_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Mark every unread notification of the authenticated user as read
#[utoipa::path(
    patch,
    path = "/api/notifications/read-all",
    responses(
        (status = 200, description = "Notifications marked as read", body = MarkAllReadResponse),
        (status = 401, description = "Unauthorized")
    ),
    tag = "notifications",
    security(("bearer_auth" = []))
)]
pub async fn mark_all_notifications_read(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<MarkAllReadResponse>> {
    let updated = state.notification_repository.mark_all_read(user_id).await?;

    Ok(Json(MarkAllReadResponse { updated }))
}
