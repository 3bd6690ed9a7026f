mod admin;
mod auth;
mod db;
mod dispatch;
mod email;
mod error;
mod middleware;
mod notification;
mod reminder;
mod routes;
mod scheduler;
mod settings;
mod state;
mod user;

#[cfg(test)]
mod testing;

use db::{create_pool, run_migrations, DbPool};
use dispatch::{DispatchOptions, DispatchService};
use email::{
    delivery_worker::DeliveryStats, spawn_delivery_worker, EmailConfig, EmailSender,
    NoopEmailSender, SmtpEmailSender,
};
use notification::NotificationRepository;
use reminder::ReminderRepository;
use routes::create_router;
use scheduler::{start_notification_scheduler, ReminderScheduler};
use settings::SettingsRepository;
use state::{AppState, Config};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use user::UserRepository;

/// Wires repositories, the email worker, the dispatch pipeline and the
/// scheduler into one application state.
pub fn build_state(
    db: DbPool,
    config: Config,
    email_sender: Arc<dyn EmailSender>,
) -> (AppState, JoinHandle<DeliveryStats>) {
    let config = Arc::new(config);

    // Create repositories
    let user_repository = UserRepository::new(db.clone());
    let notification_repository = NotificationRepository::new(db.clone());
    let reminder_repository = ReminderRepository::new(db.clone());
    let settings_repository = SettingsRepository::new(db.clone());

    // Email delivery runs detached from the dispatch pipeline
    let (email_queue, email_worker) = spawn_delivery_worker(
        email_sender,
        Arc::new(notification_repository.clone()),
        config.email_queue_capacity,
    );

    let dispatch = DispatchService::new(
        Arc::new(reminder_repository),
        Arc::new(user_repository.clone()),
        Arc::new(notification_repository.clone()),
        Arc::new(settings_repository),
        email_queue,
        DispatchOptions {
            app_base_url: config.app_base_url.clone(),
            retention_days: config.notification_retention_days,
        },
    );
    let scheduler = Arc::new(ReminderScheduler::new(Arc::new(dispatch)));

    let state = AppState {
        db,
        config,
        user_repository,
        notification_repository,
        scheduler,
    };

    (state, email_worker)
}

fn email_sender_from_env() -> Arc<dyn EmailSender> {
    match EmailConfig::from_env() {
        Some(email_config) => match SmtpEmailSender::new(email_config) {
            Ok(sender) => {
                tracing::info!("SMTP email delivery enabled");
                Arc::new(sender)
            }
            Err(e) => {
                tracing::warn!("Failed to configure SMTP transport, emails disabled: {}", e);
                Arc::new(NoopEmailSender)
            }
        },
        None => {
            tracing::warn!("SMTP_HOST not set, notification emails disabled");
            Arc::new(NoopEmailSender)
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,fleet_reminders=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;

    tracing::info!("Connecting to database...");
    let db = create_pool(&config.database_url, config.database_max_connections).await?;

    tracing::info!("Running migrations...");
    run_migrations(&db).await?;

    let addr = format!("{}:{}", config.host, config.port);
    let cron = config.reminder_cron.clone();

    let (state, _email_worker) = build_state(db, config, email_sender_from_env());

    // Start the reminder scheduler
    let _jobs = start_notification_scheduler(state.scheduler.clone(), &cron).await?;

    // Create router
    let app = create_router(state);

    tracing::info!("Server starting on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
