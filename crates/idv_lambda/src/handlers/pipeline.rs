//! Synchronous topology: one invocation drives an application through every
//! stage, handing the license number to the submitter queue at the end.

use idv_core::contract::{ObjectLocation, StageResponse};
use idv_core::details::submission_message;
use idv_core::error::Result;
use idv_core::events::decode_ingest_trigger;
use idv_core::workflow::{Stage, WorkflowRun, WorkflowState};
use serde_json::Value;
use tracing::info;

use crate::adapters::queue::enqueue_submission;
use crate::config::PipelineConfig;
use crate::handlers::details::update_record_with_details;
use crate::handlers::document::verify_document;
use crate::handlers::face::verify_face;
use crate::handlers::ingest::prepare_customer_info;
use crate::handlers::stages::{run_stage, stage_failure, VerificationTarget};
use crate::handlers::Collaborators;

pub fn handle_pipeline_event(
    event: &Value,
    config: &PipelineConfig,
    deps: Collaborators<'_>,
) -> StageResponse {
    match decode_ingest_trigger(event) {
        Ok(location) => run_pipeline(&location, config, deps).response(),
        Err(error) => stage_failure(Stage::Ingest, &error),
    }
}

/// Runs every stage in order and returns the finished run. The first failure
/// or mismatch aborts; outcomes written before it stay in the table.
pub fn run_pipeline(
    location: &ObjectLocation,
    config: &PipelineConfig,
    deps: Collaborators<'_>,
) -> WorkflowRun {
    let mut run = WorkflowRun::new();
    drive(&mut run, location, config, deps);
    if let WorkflowState::Completed = run.state() {
        info!(key = %location.key, "pipeline_completed");
    }
    run
}

fn drive(
    run: &mut WorkflowRun,
    location: &ObjectLocation,
    config: &PipelineConfig,
    deps: Collaborators<'_>,
) -> Option<()> {
    let bundle = step(run, None, || {
        prepare_customer_info(location, &config.scratch_dir, deps.objects)
    })?;
    let app_uuid = bundle.app_uuid.as_str();

    let (table, details) = step(run, Some(app_uuid), || {
        update_record_with_details(
            &bundle.details_file,
            app_uuid,
            config.table.as_deref(),
            deps.records,
        )
    })?;
    let target = VerificationTarget {
        bucket: &location.bucket,
        app_uuid,
        table: &table,
    };

    step(run, Some(app_uuid), || {
        verify_face(
            deps,
            config.topic.as_deref(),
            target,
            &bundle.selfie_key,
            &bundle.license_key,
        )
    })?;
    step(run, Some(app_uuid), || {
        verify_document(
            deps,
            config.topic.as_deref(),
            target,
            &bundle.license_key,
            &details,
        )
    })?;
    step(run, Some(app_uuid), || {
        enqueue_submission(
            deps.queue,
            config.queue_url.as_deref(),
            &submission_message(app_uuid, &details),
        )
    })
}

/// Runs the run's current stage and records its outcome. `None` once the run
/// can go no further.
fn step<T>(
    run: &mut WorkflowRun,
    app_uuid: Option<&str>,
    body: impl FnOnce() -> Result<T>,
) -> Option<T> {
    let stage = run.current_stage()?;
    match run_stage(stage, app_uuid, body) {
        Ok(value) => {
            run.finish_stage(Ok(()));
            Some(value)
        }
        Err(error) => {
            run.finish_stage(Err(error));
            None
        }
    }
}
