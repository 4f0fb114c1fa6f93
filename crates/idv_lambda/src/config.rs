use std::path::PathBuf;

pub const TABLE_ENV: &str = "TABLE";
pub const TOPIC_ENV: &str = "TOPIC";
pub const QUEUE_URL_ENV: &str = "QUEUE_URL";
pub const INVOKE_URL_ENV: &str = "INVOKE_URL";
pub const SCRATCH_DIR_ENV: &str = "SCRATCH_DIR";
pub const DEFAULT_SCRATCH_DIR: &str = "/tmp/";

/// Function configuration, read from the environment once per cold start.
///
/// Values are optional here; each stage checks for what it needs so a missing
/// value surfaces as a configuration error of that stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    pub table: Option<String>,
    pub topic: Option<String>,
    pub queue_url: Option<String>,
    pub invoke_url: Option<String>,
    pub scratch_dir: PathBuf,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            table: None,
            topic: None,
            queue_url: None,
            invoke_url: None,
            scratch_dir: PathBuf::from(DEFAULT_SCRATCH_DIR),
        }
    }
}

impl PipelineConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        Self {
            table: read(TABLE_ENV),
            topic: read(TOPIC_ENV),
            queue_url: read(QUEUE_URL_ENV),
            invoke_url: read(INVOKE_URL_ENV),
            scratch_dir: read(SCRATCH_DIR_ENV)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_SCRATCH_DIR)),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn reads_values_and_defaults_scratch_dir() {
        let env = HashMap::from([
            ("TABLE", "applications"),
            ("TOPIC", "arn:aws:sns:us-east-1:123:notifications"),
        ]);
        let config = PipelineConfig::from_lookup(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.table.as_deref(), Some("applications"));
        assert!(config.queue_url.is_none());
        assert_eq!(config.scratch_dir, PathBuf::from("/tmp/"));
    }

    #[test]
    fn blank_values_count_as_unset() {
        let config = PipelineConfig::from_lookup(|key| match key {
            "TABLE" => Some("   ".to_string()),
            "SCRATCH_DIR" => Some("/var/scratch".to_string()),
            _ => None,
        });

        assert!(config.table.is_none());
        assert_eq!(config.scratch_dir, PathBuf::from("/var/scratch"));
    }
}
