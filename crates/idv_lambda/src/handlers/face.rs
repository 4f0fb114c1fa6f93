use idv_core::contract::{
    StageResponse, FACE_MATCH_NOTIFICATION, LICENSE_SELFIE_MATCH_ATTRIBUTE, SIMILARITY_THRESHOLD,
};
use idv_core::error::{Result, VerificationError};
use idv_core::events::decode_stage_trigger;
use idv_core::matching::is_face_match;
use idv_core::storage_keys::{artifact_object_key, ApplicationArtifact};
use idv_core::workflow::Stage;
use serde_json::Value;
use tracing::info;

use crate::adapters::notifier::notify_best_effort;
use crate::adapters::record_store::{resolve_table, write_outcome};
use crate::config::PipelineConfig;
use crate::handlers::stages::{run_stage, stage_failure, verdict_response, VerificationTarget};
use crate::handlers::Collaborators;

/// Compares the selfie with the license photo and records
/// `LICENSE_SELFIE_MATCH`. A negative result is written, notified and
/// returned as `Mismatch`.
pub fn verify_face(
    deps: Collaborators<'_>,
    topic: Option<&str>,
    target: VerificationTarget<'_>,
    selfie_key: &str,
    license_key: &str,
) -> Result<()> {
    let comparison = deps
        .faces
        .compare_faces(target.bucket, selfie_key, license_key, SIMILARITY_THRESHOLD)
        .map_err(|error| {
            VerificationError::ExternalService(format!("face comparison failed: {error}"))
        })?;

    let matched = is_face_match(&comparison);
    info!(
        app_uuid = target.app_uuid,
        matched,
        candidates = comparison.matches.len(),
        "face_compared"
    );
    write_outcome(
        deps.records,
        target.table,
        target.app_uuid,
        LICENSE_SELFIE_MATCH_ATTRIBUTE,
        matched,
    )?;

    if !matched {
        notify_best_effort(
            deps.notifier,
            topic,
            target.app_uuid,
            &FACE_MATCH_NOTIFICATION,
        );
        return Err(VerificationError::Mismatch("Could not match selfie with license".to_string()));
    }
    Ok(())
}

/// Asynchronous-topology compare-faces function.
pub fn handle_compare_faces_event(
    event: &Value,
    config: &PipelineConfig,
    deps: Collaborators<'_>,
) -> StageResponse {
    let trigger = match decode_stage_trigger(event) {
        Ok(trigger) => trigger,
        Err(error) => return stage_failure(Stage::VerifyFace, &error),
    };

    let result = run_stage(Stage::VerifyFace, Some(trigger.app_uuid.as_str()), || {
        let table = resolve_table(config.table.as_deref(), deps.records)?;
        let target = VerificationTarget {
            bucket: &trigger.bucket,
            app_uuid: &trigger.app_uuid,
            table: &table,
        };
        verify_face(
            deps,
            config.topic.as_deref(),
            target,
            &artifact_object_key(&trigger.app_uuid, ApplicationArtifact::Selfie),
            &artifact_object_key(&trigger.app_uuid, ApplicationArtifact::License),
        )
    });

    verdict_response(
        Stage::VerifyFace,
        result,
        "Selfie Comparison successful",
        "Selfie Comparison failed",
    )
}
