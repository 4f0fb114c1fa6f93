use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Result, VerificationError};

/// Request accepted by the license validation endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationRequest {
    pub driver_license_id: String,
    pub validation_override: bool,
}

/// Stand-in registry decision: echoes the override flag.
pub fn stub_decision(request: &ValidationRequest) -> bool {
    request.validation_override
}

/// Reads the boolean verdict out of a validation response body.
///
/// A bare JSON boolean is expected; a proxy-shaped `{"body": <bool>}` is
/// accepted as well.
pub fn parse_validation_body(body: &str) -> Result<bool> {
    let value: Value = serde_json::from_str(body).map_err(|error| {
        VerificationError::Parse(format!("validation response is not JSON: {error}"))
    })?;

    match value {
        Value::Bool(verdict) => Ok(verdict),
        Value::Object(ref object) => match object.get("body") {
            Some(Value::Bool(verdict)) => Ok(*verdict),
            _ => Err(VerificationError::Parse(
                "validation response body must be a boolean".to_string(),
            )),
        },
        _ => Err(VerificationError::Parse("validation response must be a boolean".to_string())),
    }
}
