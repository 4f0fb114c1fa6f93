use std::path::{Path, PathBuf};

use crate::contract::CustomerInfoBundle;

/// Bucket prefix the ingestor re-uploads archive members under.
pub const UNZIPPED_PREFIX: &str = "unzipped/";
/// Scratch subfolder archives are extracted into.
pub const UNZIPPED_FOLDER: &str = "unzipped";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplicationArtifact {
    Selfie,
    License,
    Details,
}

impl ApplicationArtifact {
    fn suffix(self) -> &'static str {
        match self {
            Self::Selfie => "_selfie.png",
            Self::License => "_license.png",
            Self::Details => "_details.csv",
        }
    }

    pub fn file_name(self, app_uuid: &str) -> String {
        format!("{app_uuid}{}", self.suffix())
    }
}

pub fn unzipped_object_key(file_name: &str) -> String {
    format!("{UNZIPPED_PREFIX}{file_name}")
}

pub fn artifact_object_key(app_uuid: &str, artifact: ApplicationArtifact) -> String {
    unzipped_object_key(&artifact.file_name(app_uuid))
}

/// Last path segment of an object key (`zipped/8d247914.zip` -> `8d247914.zip`).
pub fn archive_file_name(key: &str) -> &str {
    key.rsplit('/').next().unwrap_or(key)
}

/// Application identifier of an archive: its base name up to the first `.`.
///
/// Returns `None` when the name has no extension separator or the stem is
/// empty; callers must treat that as fatal.
pub fn derive_app_uuid(file_name: &str) -> Option<String> {
    let (stem, _) = file_name.split_once('.')?;
    if stem.is_empty() {
        return None;
    }
    Some(stem.to_string())
}

pub fn scratch_archive_path(scratch_dir: &Path, key: &str) -> PathBuf {
    scratch_dir.join(archive_file_name(key))
}

pub fn unzipped_folder(scratch_dir: &Path) -> PathBuf {
    scratch_dir.join(UNZIPPED_FOLDER)
}

pub fn local_artifact_path(
    scratch_dir: &Path,
    app_uuid: &str,
    artifact: ApplicationArtifact,
) -> PathBuf {
    unzipped_folder(scratch_dir).join(artifact.file_name(app_uuid))
}

pub fn customer_info_bundle(scratch_dir: &Path, app_uuid: &str) -> CustomerInfoBundle {
    CustomerInfoBundle {
        selfie_key: artifact_object_key(app_uuid, ApplicationArtifact::Selfie),
        license_key: artifact_object_key(app_uuid, ApplicationArtifact::License),
        details_file: local_artifact_path(scratch_dir, app_uuid, ApplicationArtifact::Details),
        app_uuid: app_uuid.to_string(),
    }
}
