//! Archive ingest: download the uploaded zip, extract it into scratch space
//! and re-upload every member under `unzipped/`.

use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

use idv_core::contract::{CustomerInfoBundle, IngestOutput, ObjectLocation};
use idv_core::error::{Result, VerificationError};
use idv_core::events::decode_ingest_trigger;
use idv_core::storage_keys::{
    archive_file_name, customer_info_bundle, derive_app_uuid, scratch_archive_path,
    unzipped_folder, unzipped_object_key,
};
use idv_core::workflow::Stage;
use serde_json::Value;
use tracing::{debug, info, warn};
use zip::ZipArchive;

use crate::adapters::object_store::ObjectStore;
use crate::config::PipelineConfig;
use crate::handlers::stages::{run_stage, stage_output};
use crate::handlers::Collaborators;

/// Downloads the archive at `location`, extracts it into `scratch_dir` and
/// re-uploads every member. The downloaded zip is removed once extraction
/// has run, whatever its outcome.
pub fn prepare_customer_info(
    location: &ObjectLocation,
    scratch_dir: &Path,
    objects: &dyn ObjectStore,
) -> Result<CustomerInfoBundle> {
    let key = &location.key;
    let archive_path = scratch_archive_path(scratch_dir, key);
    objects
        .download(&location.bucket, key, &archive_path)
        .map_err(|error| {
            VerificationError::ExternalService(format!("could not download {key}: {error}"))
        })?;

    let folder = unzipped_folder(scratch_dir);
    let extracted = unzip_archive(&archive_path, &folder);
    remove_archive(&archive_path);
    extracted?;

    let files = list_extracted_files(&folder)?;
    let uploaded = upload_extracted_files(objects, &location.bucket, &files)?;
    info!(
        bucket = %location.bucket,
        key = %key,
        uploaded = uploaded.len(),
        "archive_ingested"
    );

    let file_name = archive_file_name(key);
    let app_uuid = derive_app_uuid(file_name).ok_or_else(|| {
        VerificationError::Parse(format!("could not derive application id from {file_name}"))
    })?;
    Ok(customer_info_bundle(scratch_dir, &app_uuid))
}

fn remove_archive(archive: &Path) {
    if let Err(error) = fs::remove_file(archive) {
        warn!(archive = %archive.display(), error = %error, "archive_cleanup_failed");
    }
}

/// Extracts every member of `archive` into `destination`. Leftovers of a
/// previous invocation in the same container are removed first.
pub fn unzip_archive(archive: &Path, destination: &Path) -> Result<()> {
    if destination.exists() {
        fs::remove_dir_all(destination).map_err(|error| unzip_error(archive, error))?;
    }
    fs::create_dir_all(destination).map_err(|error| unzip_error(archive, error))?;

    let file = fs::File::open(archive).map_err(|error| unzip_error(archive, error))?;
    let mut zip = ZipArchive::new(file).map_err(|error| unzip_error(archive, error))?;
    zip.extract(destination)
        .map_err(|error| unzip_error(archive, error))?;
    debug!(archive = %archive.display(), members = zip.len(), "archive_extracted");
    Ok(())
}

fn unzip_error(archive: &Path, error: impl std::fmt::Display) -> VerificationError {
    VerificationError::Unzip(format!("{}: {error}", archive.display()))
}

/// Regular files directly inside `folder`, sorted by name.
pub fn list_extracted_files(folder: &Path) -> Result<Vec<PathBuf>> {
    let list_error =
        |error: std::io::Error| VerificationError::List(format!("{}: {error}", folder.display()));

    let mut files = Vec::new();
    for entry in fs::read_dir(folder).map_err(list_error)? {
        let entry = entry.map_err(list_error)?;
        if entry.file_type().map_err(list_error)?.is_file() {
            files.push(entry.path());
        }
    }
    files.sort();
    Ok(files)
}

/// Uploads each file to `unzipped/<name>`. Stops at the first failure; files
/// already uploaded stay in the bucket.
pub fn upload_extracted_files(
    objects: &dyn ObjectStore,
    bucket: &str,
    files: &[PathBuf],
) -> Result<Vec<String>> {
    let mut keys = Vec::with_capacity(files.len());
    for path in files {
        let name = path.file_name().and_then(OsStr::to_str).ok_or_else(|| {
            VerificationError::List(format!("unsupported file name: {}", path.display()))
        })?;
        let key = unzipped_object_key(name);
        objects
            .upload(path, bucket, &key)
            .map_err(|error| VerificationError::Upload(format!("{key}: {error}")))?;
        keys.push(key);
    }
    Ok(keys)
}

/// Asynchronous-topology unzip function: emits `{app_uuid}` for the next stage.
pub fn handle_unzip_event(
    event: &Value,
    config: &PipelineConfig,
    deps: Collaborators<'_>,
) -> Value {
    let result = run_stage(Stage::Ingest, None, || {
        let location = decode_ingest_trigger(event)?;
        let bundle = prepare_customer_info(&location, &config.scratch_dir, deps.objects)?;
        Ok(IngestOutput {
            app_uuid: bundle.app_uuid,
        })
    });
    stage_output(Stage::Ingest, result)
}
