use std::path::Path;

pub trait ObjectStore {
    /// Copies `bucket/key` to `destination` on the local filesystem.
    fn download(&self, bucket: &str, key: &str, destination: &Path) -> Result<(), String>;

    fn upload(&self, source: &Path, bucket: &str, key: &str) -> Result<(), String>;
}
