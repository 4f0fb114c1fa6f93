//! Error taxonomy shared by every verification stage.

use thiserror::Error;

/// Failure of a single verification stage.
///
/// `Mismatch` is a business outcome rather than a technical fault: the stage
/// finished its work (including the record write) but the comparison was
/// negative.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VerificationError {
    /// A required environment/config value is missing.
    #[error("configuration error: {0}")]
    Config(String),

    /// A referenced table or resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Malformed CSV, JSON or event payload.
    #[error("parse error: {0}")]
    Parse(String),

    #[error("unzip error: {0}")]
    Unzip(String),

    #[error("list error: {0}")]
    List(String),

    #[error("upload error: {0}")]
    Upload(String),

    /// The record store rejected a put/update.
    #[error("write error: {0}")]
    Write(String),

    /// A comparator, analyzer, queue, object store or HTTP call failed.
    #[error("external service error: {0}")]
    ExternalService(String),

    #[error("mismatch: {0}")]
    Mismatch(String),
}

impl VerificationError {
    /// Stable snake-case code used in logs and structured responses.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Config(_) => "config_error",
            Self::NotFound(_) => "not_found_error",
            Self::Parse(_) => "parse_error",
            Self::Unzip(_) => "unzip_error",
            Self::List(_) => "list_error",
            Self::Upload(_) => "upload_error",
            Self::Write(_) => "write_error",
            Self::ExternalService(_) => "external_service_error",
            Self::Mismatch(_) => "mismatch_error",
        }
    }

    pub fn is_mismatch(&self) -> bool {
        matches!(self, Self::Mismatch(_))
    }
}

pub type Result<T> = std::result::Result<T, VerificationError>;
