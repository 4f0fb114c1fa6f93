use idv_core::contract::LicenseSubmissionMessage;
use idv_core::error::{Result, VerificationError};
use tracing::info;

pub trait MessageQueue {
    fn send_message(&self, queue_url: &str, body: &str) -> std::result::Result<(), String>;
}

/// Hands the license number to the submitter through the queue.
pub fn enqueue_submission(
    queue: &dyn MessageQueue,
    queue_url: Option<&str>,
    message: &LicenseSubmissionMessage,
) -> Result<()> {
    let queue_url = queue_url
        .filter(|url| !url.trim().is_empty())
        .ok_or_else(|| VerificationError::Config("QUEUE_URL must be configured".to_string()))?;
    let body = serde_json::to_string(message).map_err(|error| {
        VerificationError::Parse(format!("could not encode submission message: {error}"))
    })?;

    queue.send_message(queue_url, &body).map_err(|error| {
        VerificationError::ExternalService(format!("could not enqueue submission: {error}"))
    })?;
    info!(app_uuid = %message.uuid, queue_url, "license_submission_enqueued");
    Ok(())
}
