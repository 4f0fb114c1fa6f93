use idv_core::contract::Notification;
use tracing::{info, warn};

pub trait Notifier {
    fn publish(&self, topic: &str, message: &str, subject: &str) -> Result<(), String>;
}

/// Publishes `notification` if a topic is configured. Failures are logged and
/// never change the outcome of the calling stage.
pub fn notify_best_effort(
    notifier: &dyn Notifier,
    topic: Option<&str>,
    app_uuid: &str,
    notification: &Notification,
) -> bool {
    let Some(topic) = topic.filter(|topic| !topic.trim().is_empty()) else {
        warn!(
            app_uuid,
            subject = notification.subject,
            "notification_skipped: TOPIC must be configured"
        );
        return false;
    };

    match notifier.publish(topic, notification.message, notification.subject) {
        Ok(()) => {
            info!(
                app_uuid,
                topic,
                subject = notification.subject,
                "notification_sent"
            );
            true
        }
        Err(error) => {
            warn!(app_uuid, topic, error = %error, "notification_failed");
            false
        }
    }
}
