//! Decoding of the trigger payloads each function receives.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::contract::{LicenseSubmissionMessage, ObjectLocation};
use crate::error::{Result, VerificationError};

/// Trigger of every stage downstream of ingest in the asynchronous topology:
/// `{"detail": {"bucket": {"name"}}, "application": {"app_uuid"}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageTrigger {
    pub bucket: String,
    pub app_uuid: String,
}

/// Location of the uploaded archive.
///
/// Accepts both a direct storage notification (`Records[0].s3`) and an
/// EventBridge object-created event (`detail`).
pub fn decode_ingest_trigger(event: &Value) -> Result<ObjectLocation> {
    let source = match event.get("Records") {
        Some(records) => records
            .as_array()
            .and_then(|records| records.first())
            .and_then(|record| record.get("s3"))
            .ok_or_else(|| parse_error("storage event must include Records[0].s3"))?,
        None => event
            .get("detail")
            .ok_or_else(|| parse_error("ingest event must include detail or Records"))?,
    };

    Ok(ObjectLocation {
        bucket: string_at(source, &["bucket", "name"])?,
        key: string_at(source, &["object", "key"])?,
    })
}

pub fn decode_stage_trigger(event: &Value) -> Result<StageTrigger> {
    let detail = event
        .get("detail")
        .ok_or_else(|| parse_error("stage event must include detail"))?;
    let application = event
        .get("application")
        .ok_or_else(|| parse_error("stage event must include application"))?;

    Ok(StageTrigger {
        bucket: string_at(detail, &["bucket", "name"])?,
        app_uuid: string_at(application, &["app_uuid"])?,
    })
}

/// First queue record's body, JSON-decoded. Only one message is handled per
/// invocation.
pub fn decode_queue_message(event: &Value) -> Result<LicenseSubmissionMessage> {
    let record = event
        .get("Records")
        .and_then(Value::as_array)
        .and_then(|records| records.first())
        .ok_or_else(|| parse_error("queue event must include a Records entry"))?;
    let body = record
        .get("body")
        .and_then(Value::as_str)
        .ok_or_else(|| parse_error("queue record body must be a string"))?;

    serde_json::from_str(body)
        .map_err(|error| parse_error(&format!("invalid license submission message: {error}")))
}

fn string_at(value: &Value, path: &[&str]) -> Result<String> {
    let mut cursor = value;
    for segment in path {
        cursor = cursor
            .get(segment)
            .ok_or_else(|| parse_error(&format!("missing field '{}'", path.join("."))))?;
    }
    cursor
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| parse_error(&format!("field '{}' must be a string", path.join("."))))
}

fn parse_error(message: &str) -> VerificationError {
    VerificationError::Parse(message.to_string())
}
