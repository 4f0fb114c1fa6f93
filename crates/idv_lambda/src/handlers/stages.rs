//! Plumbing shared by the per-stage handlers of both topologies.

use std::path::{Path, PathBuf};

use idv_core::contract::StageResponse;
use idv_core::error::{Result, VerificationError};
use idv_core::storage_keys::{artifact_object_key, local_artifact_path, ApplicationArtifact};
use idv_core::workflow::Stage;
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::adapters::object_store::ObjectStore;
use crate::adapters::record_store::TableHandle;

/// Application a verifier writes its outcome for.
#[derive(Debug, Clone, Copy)]
pub struct VerificationTarget<'a> {
    pub bucket: &'a str,
    pub app_uuid: &'a str,
    pub table: &'a TableHandle,
}

/// Runs one stage body between `stage_started` and `stage_completed` /
/// `stage_failed` events.
pub fn run_stage<T>(
    stage: Stage,
    app_uuid: Option<&str>,
    body: impl FnOnce() -> Result<T>,
) -> Result<T> {
    info!(stage = stage.as_str(), app_uuid, "stage_started");
    let result = body();
    match &result {
        Ok(_) => info!(stage = stage.as_str(), app_uuid, "stage_completed"),
        Err(error) if error.is_mismatch() => {
            info!(stage = stage.as_str(), app_uuid, error = %error, "stage_failed")
        }
        Err(error) => warn!(
            stage = stage.as_str(),
            app_uuid,
            code = error.code(),
            error = %error,
            "stage_failed"
        ),
    }
    result
}

pub fn stage_failure(stage: Stage, error: &VerificationError) -> StageResponse {
    StageResponse::failure(format!("Error in {stage}: {error}"))
}

/// Output event of a stage that hands a payload to the next one, or a
/// failure response when it could not.
pub fn stage_output<T: Serialize>(stage: Stage, result: Result<T>) -> Value {
    let response = match result {
        Ok(payload) => match serde_json::to_value(payload) {
            Ok(value) => return value,
            Err(error) => stage_failure(
                stage,
                &VerificationError::Parse(format!("could not encode stage output: {error}")),
            ),
        },
        Err(error) => stage_failure(stage, &error),
    };
    serde_json::to_value(response).unwrap_or(Value::Null)
}

/// `{status, message}` of a verifier stage. Mismatches get the fixed
/// `failure_message`, other errors name the stage.
pub fn verdict_response(
    stage: Stage,
    result: Result<()>,
    success_message: &str,
    failure_message: &str,
) -> StageResponse {
    match result {
        Ok(()) => StageResponse::success(success_message),
        Err(error) if error.is_mismatch() => StageResponse::failure(failure_message),
        Err(error) => stage_failure(stage, &error),
    }
}

/// Fetches the re-uploaded `<uuid>_details.csv` into the scratch folder.
pub fn download_details(
    objects: &dyn ObjectStore,
    bucket: &str,
    app_uuid: &str,
    scratch_dir: &Path,
) -> Result<PathBuf> {
    let key = artifact_object_key(app_uuid, ApplicationArtifact::Details);
    let destination = local_artifact_path(scratch_dir, app_uuid, ApplicationArtifact::Details);
    objects
        .download(bucket, &key, &destination)
        .map_err(|error| {
            VerificationError::ExternalService(format!("could not download {key}: {error}"))
        })?;
    Ok(destination)
}
