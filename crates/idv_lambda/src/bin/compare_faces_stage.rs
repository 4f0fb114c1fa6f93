use idv_lambda::adapters::aws::AwsCollaborators;
use idv_lambda::config::PipelineConfig;
use idv_lambda::handlers::face::handle_compare_faces_event;
use idv_lambda::telemetry::init_tracing;
use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::Value;

async fn handle_request(
    event: LambdaEvent<Value>,
    config: &PipelineConfig,
    services: &AwsCollaborators,
) -> Result<Value, Error> {
    let response = handle_compare_faces_event(&event.payload, config, services.collaborators());
    Ok(serde_json::to_value(response)?)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_tracing();
    let config = PipelineConfig::from_env();
    let services = AwsCollaborators::load().await;
    lambda_runtime::run(service_fn(|event| handle_request(event, &config, &services))).await
}
