use idv_core::contract::{
    StageResponse, DETAILS_MATCH_NOTIFICATION, LICENSE_DETAILS_MATCH_ATTRIBUTE,
};
use idv_core::details::{parse_details_file, SubmittedDetails};
use idv_core::error::{Result, VerificationError};
use idv_core::events::decode_stage_trigger;
use idv_core::matching::{details_match, extract_identity_fields};
use idv_core::storage_keys::{artifact_object_key, ApplicationArtifact};
use idv_core::workflow::Stage;
use serde_json::Value;
use tracing::info;

use crate::adapters::notifier::notify_best_effort;
use crate::adapters::record_store::{resolve_table, write_outcome};
use crate::config::PipelineConfig;
use crate::handlers::stages::{
    download_details, run_stage, stage_failure, verdict_response, VerificationTarget,
};
use crate::handlers::Collaborators;

/// Reads the license and checks the recognized fields against what the
/// customer submitted, recording `LICENSE_DETAILS_MATCH`.
pub fn verify_document(
    deps: Collaborators<'_>,
    topic: Option<&str>,
    target: VerificationTarget<'_>,
    license_key: &str,
    submitted: &SubmittedDetails,
) -> Result<()> {
    let analysis = deps
        .documents
        .analyze_id(target.bucket, license_key)
        .map_err(|error| {
            VerificationError::ExternalService(format!("document analysis failed: {error}"))
        })?;
    let extracted = extract_identity_fields(&analysis)?;

    let matched = details_match(&extracted, submitted);
    info!(
        app_uuid = target.app_uuid,
        matched,
        fields = extracted.len(),
        "document_compared"
    );
    write_outcome(
        deps.records,
        target.table,
        target.app_uuid,
        LICENSE_DETAILS_MATCH_ATTRIBUTE,
        matched,
    )?;

    if !matched {
        notify_best_effort(
            deps.notifier,
            topic,
            target.app_uuid,
            &DETAILS_MATCH_NOTIFICATION,
        );
        return Err(VerificationError::Mismatch(
            "License details do not match submitted details".to_string(),
        ));
    }
    Ok(())
}

/// Asynchronous-topology compare-details function. Re-reads the submitted
/// details from the re-uploaded CSV.
pub fn handle_compare_details_event(
    event: &Value,
    config: &PipelineConfig,
    deps: Collaborators<'_>,
) -> StageResponse {
    let trigger = match decode_stage_trigger(event) {
        Ok(trigger) => trigger,
        Err(error) => return stage_failure(Stage::VerifyDocument, &error),
    };

    let result = run_stage(Stage::VerifyDocument, Some(trigger.app_uuid.as_str()), || {
        let details_file = download_details(
            deps.objects,
            &trigger.bucket,
            &trigger.app_uuid,
            &config.scratch_dir,
        )?;
        let submitted = parse_details_file(&details_file)?;
        let table = resolve_table(config.table.as_deref(), deps.records)?;
        verify_document(
            deps,
            config.topic.as_deref(),
            VerificationTarget {
                bucket: &trigger.bucket,
                app_uuid: &trigger.app_uuid,
                table: &table,
            },
            &artifact_object_key(&trigger.app_uuid, ApplicationArtifact::License),
            &submitted,
        )
    });

    verdict_response(
        Stage::VerifyDocument,
        result,
        "ID Information Comparison successful",
        "ID Information Comparison failed",
    )
}

#[cfg(test)]
mod tests {
    use idv_core::details::parse_details;
    use idv_core::matching::DocumentAnalysis;
    use serde_json::json;

    use super::*;
    use crate::adapters::record_store::TableHandle;
    use crate::test_helpers::{
        sample_identity_fields, InMemoryRecordStore, StaticDocumentAnalyzer, TestServices,
        SAMPLE_DETAILS_CSV, TEST_APP_UUID, TEST_BUCKET, TEST_TABLE, TEST_TOPIC,
    };

    fn services_with(documents: StaticDocumentAnalyzer) -> TestServices {
        TestServices {
            documents,
            ..TestServices::default()
        }
    }

    fn run(services: &TestServices, submitted: &SubmittedDetails) -> Result<()> {
        let table: TableHandle =
            resolve_table(Some(TEST_TABLE), &services.records).expect("table exists");
        verify_document(
            services.collaborators(),
            Some(TEST_TOPIC),
            VerificationTarget {
                bucket: TEST_BUCKET,
                app_uuid: TEST_APP_UUID,
                table: &table,
            },
            "unzipped/8d247914_license.png",
            submitted,
        )
    }

    fn details_flag(services: &TestServices) -> Option<bool> {
        services
            .records
            .item(TEST_TABLE, TEST_APP_UUID)
            .and_then(|item| item.flag(LICENSE_DETAILS_MATCH_ATTRIBUTE))
    }

    fn trigger_event() -> Value {
        json!({
            "detail": {"bucket": {"name": TEST_BUCKET}},
            "application": {"app_uuid": TEST_APP_UUID}
        })
    }

    fn seed_details(services: &TestServices) {
        services.objects.seed_object(
            TEST_BUCKET,
            "unzipped/8d247914_details.csv",
            SAMPLE_DETAILS_CSV.as_bytes(),
        );
    }

    fn submitted() -> SubmittedDetails {
        parse_details(SAMPLE_DETAILS_CSV).expect("sample details")
    }

    #[test]
    fn equal_fields_write_true_without_notifying() {
        let services = TestServices::default();

        run(&services, &submitted()).expect("fields match");

        assert_eq!(details_flag(&services), Some(true));
        assert!(services.notifier.published().is_empty());
        let calls = services.documents.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, TEST_BUCKET);
        assert_eq!(calls[0].1, "unzipped/8d247914_license.png");
    }

    #[test]
    fn one_differing_value_writes_false_and_notifies() {
        let mut fields = sample_identity_fields();
        fields[2] = ("LAST_NAME", "Roe");
        let services = services_with(StaticDocumentAnalyzer::with_fields(&fields));

        let error = run(&services, &submitted()).expect_err("last name differs");

        assert!(error.is_mismatch());
        assert_eq!(details_flag(&services), Some(false));
        let published = services.notifier.published();
        assert_eq!(published.len(), 1);
        assert_eq!(
            published[0].message,
            "No matches between Customer ID and Submitted Customer Info"
        );
        assert_eq!(published[0].subject, "Customer ID Info Match Fails");
    }

    #[test]
    fn unrecognized_fields_are_ignored() {
        let mut fields = sample_identity_fields();
        fields.push(("EXPIRATION_DATE", "01/01/2030"));
        let services = services_with(StaticDocumentAnalyzer::with_fields(&fields));

        run(&services, &submitted()).expect("extra analyzer field is filtered");
        assert_eq!(details_flag(&services), Some(true));
    }

    #[test]
    fn extra_submitted_column_is_a_mismatch() {
        let services = TestServices::default();
        let mut submitted = submitted();
        submitted.insert("MIDDLE_NAME".to_string(), "Q".to_string());

        let error = run(&services, &submitted).expect_err("strict equality");

        assert!(error.is_mismatch());
        assert_eq!(details_flag(&services), Some(false));
    }

    #[test]
    fn no_documents_is_external_and_writes_nothing() {
        let analyzer = StaticDocumentAnalyzer::with_analysis(DocumentAnalysis::default());
        let services = services_with(analyzer);

        let error = run(&services, &submitted()).expect_err("no documents");

        assert!(matches!(error, VerificationError::ExternalService(_)));
        assert_eq!(services.records.write_count(), 0);
    }

    #[test]
    fn analyzer_failure_is_external() {
        let services = services_with(StaticDocumentAnalyzer::failing("UnsupportedDocument"));

        let error = run(&services, &submitted()).expect_err("analyzer down");

        assert!(matches!(error, VerificationError::ExternalService(_)));
        assert!(services.notifier.published().is_empty());
    }

    #[test]
    fn compare_details_event_reads_uploaded_csv() {
        let scratch = tempfile::tempdir().expect("tempdir");
        let services = TestServices::default();
        seed_details(&services);
        let config = PipelineConfig {
            table: Some(TEST_TABLE.to_string()),
            topic: Some(TEST_TOPIC.to_string()),
            scratch_dir: scratch.path().to_path_buf(),
            ..PipelineConfig::default()
        };
        let event = trigger_event();

        let response = handle_compare_details_event(&event, &config, services.collaborators());

        assert_eq!(
            response,
            StageResponse::success("ID Information Comparison successful")
        );
        assert_eq!(details_flag(&services), Some(true));
    }

    #[test]
    fn compare_details_event_without_table_writes_nothing() {
        let scratch = tempfile::tempdir().expect("tempdir");
        let services = TestServices::default();
        seed_details(&services);
        let config = PipelineConfig {
            scratch_dir: scratch.path().to_path_buf(),
            ..PipelineConfig::default()
        };
        let event = trigger_event();

        let response = handle_compare_details_event(&event, &config, services.collaborators());

        let message = response.message;
        assert!(message.starts_with("Error in verify_document: configuration error"));
        assert!(services.documents.calls().is_empty());
        assert_eq!(services.records.write_count(), 0);
    }

    #[test]
    fn compare_details_event_with_missing_table_writes_nothing() {
        let scratch = tempfile::tempdir().expect("tempdir");
        let services = TestServices {
            records: InMemoryRecordStore::without_tables(),
            ..TestServices::default()
        };
        seed_details(&services);
        let config = PipelineConfig {
            table: Some(TEST_TABLE.to_string()),
            topic: Some(TEST_TOPIC.to_string()),
            scratch_dir: scratch.path().to_path_buf(),
            ..PipelineConfig::default()
        };
        let event = trigger_event();

        let response = handle_compare_details_event(&event, &config, services.collaborators());

        let message = response.message;
        assert!(message.starts_with("Error in verify_document: not found"));
        assert!(services.documents.calls().is_empty());
        assert_eq!(services.records.write_count(), 0);
        assert!(services.notifier.published().is_empty());
    }
}
