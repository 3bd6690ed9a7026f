pub mod delivery_worker;
pub mod email_sender;
pub mod templates;

pub use delivery_worker::{spawn_delivery_worker, EmailJob, EmailQueue};
pub use email_sender::{EmailConfig, EmailSender, NoopEmailSender, NotificationEmail, SmtpEmailSender};
