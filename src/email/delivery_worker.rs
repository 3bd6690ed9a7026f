use std::sync::Arc;

use chrono::Utc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use uuid::Uuid;

use super::email_sender::{EmailSender, NotificationEmail};
use crate::notification::notification_repository::NotificationWriter;

/// An email owed for a notification that is already committed.
#[derive(Debug, Clone)]
pub struct EmailJob {
    pub notification_id: Uuid,
    pub email: NotificationEmail,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryStats {
    pub sent: u64,
    pub failed: u64,
}

/// Handle used by the dispatch pipeline to hand off emails without waiting
/// for them.
#[derive(Clone)]
pub struct EmailQueue {
    tx: mpsc::Sender<EmailJob>,
}

impl EmailQueue {
    /// Returns false when the job was dropped because the queue is full or
    /// the worker is gone; the notification keeps `email_sent = false`.
    pub fn enqueue(&self, job: EmailJob) -> bool {
        let notification_id = job.notification_id;
        match self.tx.try_send(job) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!(%notification_id, "Email queue full, dropping email");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::warn!(%notification_id, "Email worker stopped, dropping email");
                false
            }
        }
    }
}

/// Starts the delivery worker. It runs until every [`EmailQueue`] clone is
/// dropped and the backlog is drained, then yields its counters.
pub fn spawn_delivery_worker(
    sender: Arc<dyn EmailSender>,
    writer: Arc<dyn NotificationWriter>,
    capacity: usize,
) -> (EmailQueue, JoinHandle<DeliveryStats>) {
    let (tx, mut rx) = mpsc::channel::<EmailJob>(capacity.max(1));

    let handle = tokio::spawn(async move {
        let mut stats = DeliveryStats::default();

        while let Some(job) = rx.recv().await {
            match sender.send_notification_email(&job.email).await {
                Ok(()) => {
                    stats.sent += 1;
                    if let Err(e) = writer.mark_email_sent(job.notification_id, Utc::now()).await {
                        tracing::error!(
                            notification_id = %job.notification_id,
                            "Email sent but flag update failed: {}",
                            e
                        );
                    }
                }
                Err(e) => {
                    stats.failed += 1;
                    tracing::warn!(
                        notification_id = %job.notification_id,
                        to = %job.email.to,
                        "Email delivery failed: {}",
                        e
                    );
                }
            }
        }

        tracing::info!(sent = stats.sent, failed = stats.failed, "Email delivery worker stopped");
        stats
    });

    (EmailQueue { tx }, handle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::notification_models::NotificationCategory;
    use crate::testing::{InMemoryNotifications, RecordingEmailSender};

    fn job(notification_id: Uuid, to: &str) -> EmailJob {
        EmailJob {
            notification_id,
            email: NotificationEmail {
                to: to.to_string(),
                name: "Test".to_string(),
                category: NotificationCategory::MaintenanceReminder,
                title: "Maintenance due in 3 days".to_string(),
                message: "Tyre rotation".to_string(),
                action_url: None,
                language: "en".to_string(),
            },
        }
    }

    #[tokio::test]
    async fn test_successful_send_sets_flag() {
        let store = Arc::new(InMemoryNotifications::default());
        let id = store.seed(Uuid::new_v4(), None).id;
        let sender = Arc::new(RecordingEmailSender::default());

        let (queue, handle) = spawn_delivery_worker(sender.clone(), store.clone(), 8);
        assert!(queue.enqueue(job(id, "a@example.com")));
        drop(queue);

        let stats = handle.await.unwrap();
        assert_eq!(stats, DeliveryStats { sent: 1, failed: 0 });
        let row = store.get(id).unwrap();
        assert!(row.email_sent);
        assert!(row.email_sent_at.is_some());
    }

    #[tokio::test]
    async fn test_failed_send_leaves_flag_unset() {
        let store = Arc::new(InMemoryNotifications::default());
        let ok_id = store.seed(Uuid::new_v4(), None).id;
        let bad_id = store.seed(Uuid::new_v4(), None).id;
        let sender = Arc::new(RecordingEmailSender::failing_for(["bad@example.com"]));

        let (queue, handle) = spawn_delivery_worker(sender.clone(), store.clone(), 8);
        queue.enqueue(job(bad_id, "bad@example.com"));
        queue.enqueue(job(ok_id, "ok@example.com"));
        drop(queue);

        let stats = handle.await.unwrap();
        assert_eq!(stats, DeliveryStats { sent: 1, failed: 1 });
        assert!(!store.get(bad_id).unwrap().email_sent);
        assert!(store.get(ok_id).unwrap().email_sent);
        assert_eq!(sender.attempts(), 2);
    }
}
