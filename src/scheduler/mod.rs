pub mod scheduler_service;

pub use scheduler_service::{start_notification_scheduler, ReminderScheduler, RunReport};
