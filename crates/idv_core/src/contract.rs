use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Minimum similarity (inclusive) for a selfie/license face match.
pub const SIMILARITY_THRESHOLD: f32 = 80.0;

/// Partition key attribute of the application table.
pub const APP_UUID_ATTRIBUTE: &str = "APP_UUID";
pub const LICENSE_SELFIE_MATCH_ATTRIBUTE: &str = "LICENSE_SELFIE_MATCH";
pub const LICENSE_DETAILS_MATCH_ATTRIBUTE: &str = "LICENSE_DETAILS_MATCH";
pub const LICENSE_VALIDATION_ATTRIBUTE: &str = "LICENSE_VALIDATION";

/// Submitted-details column holding the driver license number.
pub const DOCUMENT_NUMBER_FIELD: &str = "DOCUMENT_NUMBER";
/// License id queued when the submitted details carry no document number.
pub const MISSING_LICENSE_ID: &str = "0";

/// Identity fields recognized on an analyzed license. Anything else the
/// analyzer reports is dropped.
pub const CUSTOMER_INFORMATION: [&str; 8] = [
    "DOCUMENT_NUMBER",
    "FIRST_NAME",
    "LAST_NAME",
    "DATE_OF_BIRTH",
    "ADDRESS",
    "STATE_IN_ADDRESS",
    "CITY_IN_ADDRESS",
    "ZIP_CODE_IN_ADDRESS",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Notification {
    pub message: &'static str,
    pub subject: &'static str,
}

pub const FACE_MATCH_NOTIFICATION: Notification = Notification {
    message: "No matches between selfie and license",
    subject: "Face Match Fails",
};

pub const DETAILS_MATCH_NOTIFICATION: Notification = Notification {
    message: "No matches between Customer ID and Submitted Customer Info",
    subject: "Customer ID Info Match Fails",
};

pub const LICENSE_VALIDATION_NOTIFICATION: Notification = Notification {
    message: "Invalid Customer's license",
    subject: "Customer's License Validation Fails",
};

/// Bucket + key of a stored object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectLocation {
    pub bucket: String,
    pub key: String,
}

/// Everything later stages need to know about an ingested archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerInfoBundle {
    pub selfie_key: String,
    pub license_key: String,
    pub details_file: PathBuf,
    pub app_uuid: String,
}

/// Queue payload consumed by the license submitter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicenseSubmissionMessage {
    pub driver_license_id: String,
    pub validation_override: bool,
    pub uuid: String,
}

/// Output of the asynchronous unzip stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestOutput {
    pub app_uuid: String,
}

/// Output of the asynchronous write-details stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationDetailsOutput {
    pub driver_license_id: String,
    pub validation_override: bool,
    pub app_uuid: String,
}

impl From<ApplicationDetailsOutput> for LicenseSubmissionMessage {
    fn from(output: ApplicationDetailsOutput) -> Self {
        Self {
            driver_license_id: output.driver_license_id,
            validation_override: output.validation_override,
            uuid: output.app_uuid,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    Success,
    Failure,
}

/// Structured `{status, message}` reported by a pipeline or stage invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageResponse {
    pub status: ResponseStatus,
    pub message: String,
}

impl StageResponse {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            status: ResponseStatus::Success,
            message: message.into(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            status: ResponseStatus::Failure,
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ResponseStatus::Success
    }
}
