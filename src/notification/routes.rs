use axum::{
    routing::{get, patch},
    Router,
};

use super::notification_handlers::{
    get_notifications, get_unread_count, mark_all_notifications_read, mark_notification_read,
};
use crate::state::AppState;

pub fn notification_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(get_notifications))
        .route("/unread-count", get(get_unread_count))
        .route("/read-all", patch(mark_all_notifications_read))
        .route("/:id/read", patch(mark_notification_read))
}
