use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use crate::{
    error::{AppError, Result},
    middleware::AuthUser,
    state::AppState,
};

/// Admin role is checked against the database, not the token claims, so a
/// revoked role takes effect immediately.
pub async fn admin_authorization(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    request: Request,
    next: Next,
) -> Result<Response> {
    let user = state
        .user_repository
        .find_by_id(user_id)
        .await?
        .ok_or(AppError::Unauthorized("Unknown user".to_string()))?;

    if !user.is_active || !user.is_admin() {
        return Err(AppError::Forbidden("Admin access required".to_string()));
    }

    Ok(next.run(request).await)
}
