pub mod reminder_models;
pub mod reminder_repository;
pub mod threshold;

pub use reminder_models::CandidateRecord;
pub use reminder_repository::{CandidateScanner, ReminderRepository};
pub use threshold::{ThresholdSet, LICENSE_WINDOW_DAYS, MAINTENANCE_WINDOW_DAYS};
