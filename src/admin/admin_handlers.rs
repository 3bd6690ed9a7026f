use axum::{extract::State, Json};

use crate::{
    error::{AppError, Result},
    scheduler::RunReport,
    state::AppState,
};

/// Trigger a notification run immediately
#[utoipa::path(
    post,
    path = "/api/admin/notifications/run",
    responses(
        (status = 200, description = "Run finished; per-job outcome included", body = RunReport),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin access required"),
        (status = 409, description = "A run is already in progress")
    ),
    tag = "admin",
    security(("bearer_auth" = []))
)]
pub async fn run_notifications(State(state): State<AppState>) -> Result<Json<RunReport>> {
    tracing::info!("Manual notification run requested");

    let report = state
        .scheduler
        .run_scheduled_notifications()
        .await
        .ok_or_else(|| AppError::Conflict("A notification run is already in progress".to_string()))?;

    Ok(Json(report))
}
