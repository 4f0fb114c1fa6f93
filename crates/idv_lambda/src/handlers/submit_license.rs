use idv_core::contract::{
    LicenseSubmissionMessage, StageResponse, LICENSE_VALIDATION_ATTRIBUTE,
    LICENSE_VALIDATION_NOTIFICATION,
};
use idv_core::error::{Result, VerificationError};
use idv_core::events::decode_queue_message;
use idv_core::validation::parse_validation_body;
use idv_core::workflow::Stage;
use serde_json::Value;
use tracing::info;

use crate::adapters::notifier::notify_best_effort;
use crate::adapters::record_store::{resolve_table, write_outcome};
use crate::config::PipelineConfig;
use crate::handlers::stages::{run_stage, stage_failure, verdict_response};
use crate::handlers::Collaborators;

/// Asks the validation endpoint about the license and records
/// `LICENSE_VALIDATION`. Called once per message; retries are left to the
/// queue.
pub fn submit_license(
    message: &LicenseSubmissionMessage,
    config: &PipelineConfig,
    deps: Collaborators<'_>,
) -> Result<()> {
    let invoke_url = config
        .invoke_url
        .as_deref()
        .ok_or_else(|| VerificationError::Config("INVOKE_URL must be configured".to_string()))?;
    let body = serde_json::to_value(message).map_err(|error| {
        VerificationError::Parse(format!("could not encode validation request: {error}"))
    })?;

    let reply = deps.validator.post_json(invoke_url, &body).map_err(|error| {
        VerificationError::ExternalService(format!("validation request failed: {error}"))
    })?;
    if !reply.is_success() {
        return Err(VerificationError::ExternalService(format!(
            "validation endpoint answered {}: {}",
            reply.status, reply.body
        )));
    }
    let valid = parse_validation_body(&reply.body)?;
    info!(app_uuid = %message.uuid, valid, "license_checked");

    let table = resolve_table(config.table.as_deref(), deps.records)?;
    write_outcome(
        deps.records,
        &table,
        &message.uuid,
        LICENSE_VALIDATION_ATTRIBUTE,
        valid,
    )?;

    if !valid {
        notify_best_effort(
            deps.notifier,
            config.topic.as_deref(),
            &message.uuid,
            &LICENSE_VALIDATION_NOTIFICATION,
        );
        return Err(VerificationError::Mismatch(
            "License was rejected by the validation service".to_string(),
        ));
    }
    Ok(())
}

/// Queue-triggered submitter function. Only the first record is handled.
///
/// Returns `Err` for faults the queue should redeliver the message for;
/// rejections and undecodable messages are answered with a response.
pub fn process_submission_event(
    event: &Value,
    config: &PipelineConfig,
    deps: Collaborators<'_>,
) -> Result<StageResponse> {
    let message = match decode_queue_message(event) {
        Ok(message) => message,
        Err(error) => return Ok(stage_failure(Stage::SubmitLicense, &error)),
    };

    let result = run_stage(Stage::SubmitLicense, Some(message.uuid.as_str()), || {
        submit_license(&message, config, deps)
    });
    match result {
        Err(error) if is_redeliverable(&error) => Err(error),
        result => Ok(verdict_response(
            Stage::SubmitLicense,
            result,
            "License validation successful",
            "License validation failed",
        )),
    }
}

/// Like [`process_submission_event`], with redeliverable faults folded into
/// the failure response.
pub fn handle_submission_event(
    event: &Value,
    config: &PipelineConfig,
    deps: Collaborators<'_>,
) -> StageResponse {
    process_submission_event(event, config, deps)
        .unwrap_or_else(|error| stage_failure(Stage::SubmitLicense, &error))
}

fn is_redeliverable(error: &VerificationError) -> bool {
    !matches!(
        error,
        VerificationError::Mismatch(_) | VerificationError::Parse(_)
    )
}
