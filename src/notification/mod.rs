// Declare submodules
pub mod notification_dto;
pub mod notification_handlers;
pub mod notification_models;
pub mod notification_repository;
pub mod routes;

// Re-export public items
pub use notification_models::Notification;
pub use notification_repository::NotificationRepository;
