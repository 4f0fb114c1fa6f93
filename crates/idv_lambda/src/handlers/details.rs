use std::path::Path;

use idv_core::details::{details_output, parse_details_file, SubmittedDetails};
use idv_core::error::Result;
use idv_core::events::decode_stage_trigger;
use idv_core::workflow::Stage;
use serde_json::Value;

use crate::adapters::record_store::{put_details, resolve_table, RecordStore, TableHandle};
use crate::config::PipelineConfig;
use crate::handlers::stages::{download_details, run_stage, stage_output};
use crate::handlers::Collaborators;

/// Stores the submitted details as the application's item.
///
/// The file is parsed before the table is touched, so a bad file never
/// reaches the record store.
pub fn update_record_with_details(
    details_file: &Path,
    app_uuid: &str,
    table: Option<&str>,
    records: &dyn RecordStore,
) -> Result<(TableHandle, SubmittedDetails)> {
    let details = parse_details_file(details_file)?;
    let table = resolve_table(table, records)?;
    put_details(records, &table, app_uuid, &details)?;
    Ok((table, details))
}

/// Asynchronous-topology write function: emits
/// `{driver_license_id, validation_override, app_uuid}`.
pub fn handle_write_details_event(
    event: &Value,
    config: &PipelineConfig,
    deps: Collaborators<'_>,
) -> Value {
    let result = decode_stage_trigger(event).and_then(|trigger| {
        run_stage(Stage::WriteDetails, Some(trigger.app_uuid.as_str()), || {
            let details_file = download_details(
                deps.objects,
                &trigger.bucket,
                &trigger.app_uuid,
                &config.scratch_dir,
            )?;
            let (_, details) = update_record_with_details(
                &details_file,
                &trigger.app_uuid,
                config.table.as_deref(),
                deps.records,
            )?;
            Ok(details_output(&trigger.app_uuid, &details))
        })
    });
    stage_output(Stage::WriteDetails, result)
}
