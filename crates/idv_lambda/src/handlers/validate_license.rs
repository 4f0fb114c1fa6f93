//! Stand-in for the external license registry, exposed behind API Gateway.

use idv_core::validation::{stub_decision, ValidationRequest};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiGatewayResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub headers: Value,
    pub body: String,
}

/// Answers `{driver_license_id, validation_override}` with the override flag
/// as a JSON boolean body.
pub fn handle_validation_event(event: Value) -> ApiGatewayResponse {
    let payload = match normalize_apigw_event(event) {
        Ok(value) => value,
        Err(message) => return validation_error_response(&message),
    };

    let request = match serde_json::from_value::<ValidationRequest>(payload) {
        Ok(value) => value,
        Err(error) => return validation_error_response(&format!("Malformed request: {error}")),
    };

    let verdict = stub_decision(&request);
    info!(
        driver_license_id = %request.driver_license_id,
        verdict, "license_validated"
    );
    json_response(200, Value::Bool(verdict))
}

fn normalize_apigw_event(event: Value) -> Result<Value, String> {
    let Some(object) = event.as_object() else {
        return Err("Request payload must be a JSON object".to_string());
    };

    let Some(body) = object.get("body") else {
        return Ok(event);
    };

    match body {
        Value::Object(_) => Ok(body.clone()),
        Value::String(text) => {
            serde_json::from_str(text).map_err(|error| format!("Malformed JSON body: {error}"))
        }
        _ => Err("Request body must be a JSON object".to_string()),
    }
}

fn validation_error_response(message: &str) -> ApiGatewayResponse {
    json_response(
        400,
        json!({
            "error": "validation_error",
            "message": message,
        }),
    )
}

fn json_response(status_code: u16, body: Value) -> ApiGatewayResponse {
    ApiGatewayResponse {
        status_code,
        headers: json!({ "content-type": "application/json" }),
        body: body.to_string(),
    }
}
