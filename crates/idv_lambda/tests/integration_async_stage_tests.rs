mod support;

use idv_core::contract::{
    ApplicationDetailsOutput, IngestOutput, LicenseSubmissionMessage, StageResponse,
    LICENSE_DETAILS_MATCH_ATTRIBUTE, LICENSE_SELFIE_MATCH_ATTRIBUTE, LICENSE_VALIDATION_ATTRIBUTE,
};
use idv_lambda::adapters::queue::enqueue_submission;
use idv_lambda::handlers::details::handle_write_details_event;
use idv_lambda::handlers::document::handle_compare_details_event;
use idv_lambda::handlers::face::handle_compare_faces_event;
use idv_lambda::handlers::ingest::handle_unzip_event;
use idv_lambda::handlers::submit_license::handle_submission_event;
use idv_lambda::handlers::Collaborators;
use idv_lambda::test_helpers::{StaticValidationClient, TEST_BUCKET};
use serde_json::json;
use support::scenario::{queue_event, stage_event, storage_event, Scenario};

#[test]
fn stages_chain_from_upload_to_validation() {
    let scenario = Scenario::new();
    let key = scenario.upload_application("8d247914");
    let deps = scenario.services.collaborators();

    let unzipped = handle_unzip_event(&storage_event(&key), &scenario.config, deps);
    let ingest: IngestOutput = serde_json::from_value(unzipped).expect("ingest output");
    assert_eq!(ingest.app_uuid, "8d247914");

    let trigger = stage_event(&ingest.app_uuid);
    let written = handle_write_details_event(&trigger, &scenario.config, deps);
    let details: ApplicationDetailsOutput =
        serde_json::from_value(written).expect("write details output");
    assert_eq!(details.driver_license_id, "X123");
    assert!(details.validation_override);

    assert_eq!(
        handle_compare_faces_event(&trigger, &scenario.config, deps),
        StageResponse::success("Selfie Comparison successful")
    );
    assert_eq!(
        handle_compare_details_event(&trigger, &scenario.config, deps),
        StageResponse::success("ID Information Comparison successful")
    );

    let message = LicenseSubmissionMessage::from(details);
    enqueue_submission(deps.queue, scenario.config.queue_url.as_deref(), &message)
        .expect("enqueue");
    let event = scenario
        .services
        .queue
        .first_as_event()
        .expect("message queued");
    assert!(handle_submission_event(&event, &scenario.config, deps).is_success());

    for attribute in [
        LICENSE_SELFIE_MATCH_ATTRIBUTE,
        LICENSE_DETAILS_MATCH_ATTRIBUTE,
        LICENSE_VALIDATION_ATTRIBUTE,
    ] {
        assert_eq!(
            scenario.flag("8d247914", attribute),
            Some(true),
            "{attribute}"
        );
    }
}

#[test]
fn unzip_of_corrupt_archive_reports_failure() {
    let scenario = Scenario::new();
    let objects = &scenario.services.objects;
    objects.seed_object(TEST_BUCKET, "zipped/8d247914.zip", b"PK-but-not-really");

    let output = handle_unzip_event(
        &storage_event("zipped/8d247914.zip"),
        &scenario.config,
        scenario.services.collaborators(),
    );

    assert_eq!(output["status"], "failure");
    let message = output["message"].as_str().expect("message");
    assert!(message.starts_with("Error in ingest: unzip error"));
}

#[test]
fn rejected_license_is_recorded_and_notified() {
    let scenario = Scenario::new();
    let validator = StaticValidationClient::replying(200, "false");
    let deps = Collaborators {
        validator: &validator,
        ..scenario.services.collaborators()
    };
    let body = json!({
        "driver_license_id": "X123",
        "validation_override": false,
        "uuid": "8d247914"
    })
    .to_string();

    let response = handle_submission_event(&queue_event(&body), &scenario.config, deps);

    assert_eq!(
        response,
        StageResponse::failure("License validation failed")
    );
    assert_eq!(
        scenario.flag("8d247914", LICENSE_VALIDATION_ATTRIBUTE),
        Some(false)
    );
    assert_eq!(
        scenario.services.notifier.published()[0].subject,
        "Customer's License Validation Fails"
    );
}

#[test]
fn only_the_first_queue_record_is_processed() {
    let scenario = Scenario::new();
    let first = json!({"driver_license_id": "X1", "validation_override": true, "uuid": "first"});
    let second = json!({"driver_license_id": "X2", "validation_override": true, "uuid": "second"});
    let event = json!({
        "Records": [
            {"eventSource": "aws:sqs", "body": first.to_string()},
            {"eventSource": "aws:sqs", "body": second.to_string()}
        ]
    });

    let deps = scenario.services.collaborators();

    let response = handle_submission_event(&event, &scenario.config, deps);

    assert!(response.is_success());
    assert_eq!(
        scenario.flag("first", LICENSE_VALIDATION_ATTRIBUTE),
        Some(true)
    );
    assert_eq!(scenario.flag("second", LICENSE_VALIDATION_ATTRIBUTE), None);
    assert_eq!(scenario.services.validator.requests().len(), 1);
}

#[test]
fn missing_queue_url_blocks_submission() {
    let scenario = Scenario::new().with_config(|config| config.queue_url = None);
    let message = LicenseSubmissionMessage {
        driver_license_id: "X123".to_string(),
        validation_override: true,
        uuid: "8d247914".to_string(),
    };

    let error = enqueue_submission(
        scenario.services.collaborators().queue,
        scenario.config.queue_url.as_deref(),
        &message,
    )
    .expect_err("no queue configured");

    assert_eq!(error.code(), "config_error");
    assert!(scenario.services.queue.bodies().is_empty());
}
