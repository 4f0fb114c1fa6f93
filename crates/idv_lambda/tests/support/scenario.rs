#![allow(dead_code)]

use idv_lambda::config::PipelineConfig;
use idv_lambda::test_helpers::{
    sample_archive_bytes, TestServices, SAMPLE_DETAILS_CSV, TEST_BUCKET, TEST_INVOKE_URL,
    TEST_QUEUE_URL, TEST_TABLE, TEST_TOPIC,
};
use serde_json::{json, Value};
use tempfile::TempDir;

/// One uploaded application plus the doubles and config the stages run with.
pub struct Scenario {
    pub services: TestServices,
    pub config: PipelineConfig,
    scratch: TempDir,
}

impl Scenario {
    pub fn new() -> Self {
        Self::with_services(TestServices::default())
    }

    pub fn with_services(services: TestServices) -> Self {
        let scratch = tempfile::tempdir().expect("scratch dir");
        let config = PipelineConfig {
            table: Some(TEST_TABLE.to_string()),
            topic: Some(TEST_TOPIC.to_string()),
            queue_url: Some(TEST_QUEUE_URL.to_string()),
            invoke_url: Some(TEST_INVOKE_URL.to_string()),
            scratch_dir: scratch.path().to_path_buf(),
        };
        Self {
            services,
            config,
            scratch,
        }
    }

    pub fn with_config(mut self, edit: impl FnOnce(&mut PipelineConfig)) -> Self {
        edit(&mut self.config);
        self
    }

    /// Puts `zipped/<uuid>.zip` in the bucket and returns its key.
    pub fn upload_application(&self, app_uuid: &str) -> String {
        self.upload_application_with_details(app_uuid, SAMPLE_DETAILS_CSV)
    }

    pub fn upload_application_with_details(&self, app_uuid: &str, details_csv: &str) -> String {
        let key = format!("zipped/{app_uuid}.zip");
        self.services.objects.seed_object(
            TEST_BUCKET,
            &key,
            &sample_archive_bytes(app_uuid, details_csv),
        );
        key
    }

    pub fn flag(&self, app_uuid: &str, attribute: &str) -> Option<bool> {
        self.services
            .records
            .item(TEST_TABLE, app_uuid)
            .and_then(|item| item.flag(attribute))
    }
}

/// Storage notification as delivered by an S3 trigger.
pub fn storage_event(key: &str) -> Value {
    json!({
        "Records": [{
            "eventSource": "aws:s3",
            "s3": {
                "bucket": {"name": TEST_BUCKET},
                "object": {"key": key}
            }
        }]
    })
}

/// Event received by every asynchronous stage after unzip.
pub fn stage_event(app_uuid: &str) -> Value {
    json!({
        "detail": {"bucket": {"name": TEST_BUCKET}},
        "application": {"app_uuid": app_uuid}
    })
}

pub fn queue_event(body: &str) -> Value {
    json!({"Records": [{"eventSource": "aws:sqs", "body": body}]})
}
