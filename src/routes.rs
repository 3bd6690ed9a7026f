use crate::{
    admin::{self, admin_authorization},
    error::Result,
    middleware::auth_middleware,
    notification::{
        notification_dto::{MarkAllReadResponse, UnreadCountResponse},
        notification_handlers, routes::notification_routes, Notification,
    },
    dispatch::JobSummary,
    scheduler::{scheduler_service::JobReport, RunReport},
    state::AppState,
};
use axum::{
    extract::State,
    middleware,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        notification_handlers::get_notifications,
        notification_handlers::get_unread_count,
        notification_handlers::mark_notification_read,
        notification_handlers::mark_all_notifications_read,
        admin::admin_handlers::run_notifications,
    ),
    components(
        schemas(
            Notification,
            UnreadCountResponse,
            MarkAllReadResponse,
            RunReport,
            JobReport,
            JobSummary,
        )
    ),
    tags(
        (name = "notifications", description = "Notification inbox endpoints"),
        (name = "admin", description = "Operational endpoints")
    ),
    modifiers(&SecurityAddon)
)]
struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                utoipa::openapi::security::SecurityScheme::Http(
                    utoipa::openapi::security::Http::new(
                        utoipa::openapi::security::HttpAuthScheme::Bearer,
                    ),
                ),
            )
        }
    }
}

async fn health_check(State(state): State<AppState>) -> Result<Json<Value>> {
    sqlx::query("SELECT 1").execute(&state.db).await?;

    Ok(Json(json!({
        "status": "ok",
        "scheduler_running": state.scheduler.is_running(),
    })))
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Protected routes (auth required)
    let notification_routes = notification_routes().route_layer(
        middleware::from_fn_with_state(state.clone(), auth_middleware),
    );

    // Admin routes (auth + admin role)
    let admin_routes = Router::new()
        .route("/notifications/run", post(admin::run_notifications))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            admin_authorization,
        ))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    // Combine all routes
    let api_routes = Router::new()
        .nest("/notifications", notification_routes)
        .nest("/admin", admin_routes);

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/health", get(health_check))
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
