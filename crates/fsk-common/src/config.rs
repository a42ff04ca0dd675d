use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{FskError, Result};

/// Session-wide write settings resolved before planning.
///
/// Raw setting values are kept as the session delivered them; typed parsing
/// happens in the capability gate and the job configurator so both report the
/// offending value verbatim.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WriteSessionConfig {
    /// Resolved compression codec name.
    pub compression_codec: String,
    /// Legacy file-format compatibility switch.
    pub legacy_format: bool,
    /// Output timestamp precision identifier.
    pub timestamp_precision: String,
    /// Commit-summary verbosity setting.
    pub summary_level: String,
    /// Output committer name; empty selects the format's standard committer.
    pub committer: String,
    /// Local directory for staged batch files.
    pub staging_dir: PathBuf,
}

impl Default for WriteSessionConfig {
    fn default() -> Self {
        Self {
            compression_codec: "snappy".to_string(),
            legacy_format: false,
            timestamp_precision: "micros".to_string(),
            summary_level: "none".to_string(),
            committer: String::new(),
            staging_dir: PathBuf::from(".fsk_staging"),
        }
    }
}

impl WriteSessionConfig {
    /// Returns a copy with format-specific write options applied on top of
    /// the session settings.
    ///
    /// Unknown keys are ignored (they belong to other layers of the write
    /// path); malformed values for known keys are configuration errors.
    ///
    /// Recognized keys:
    /// - `write.compression_codec`
    /// - `write.legacy_format`
    /// - `write.timestamp_precision`
    /// - `write.summary_level`
    /// - `write.committer`
    /// - `write.staging_dir`
    ///
    /// The `FSK_STAGING_DIR` environment variable overrides the staging
    /// directory last.
    pub fn with_options(&self, options: &HashMap<String, String>) -> Result<Self> {
        let mut out = self.clone();
        if let Some(v) = options.get("write.compression_codec") {
            out.compression_codec = v.clone();
        }
        if let Some(v) = options.get("write.legacy_format") {
            out.legacy_format = v.parse::<bool>().map_err(|_| {
                FskError::InvalidConfig(format!(
                    "write.legacy_format must be true or false, got '{v}'"
                ))
            })?;
        }
        if let Some(v) = options.get("write.timestamp_precision") {
            out.timestamp_precision = v.clone();
        }
        if let Some(v) = options.get("write.summary_level") {
            out.summary_level = v.clone();
        }
        if let Some(v) = options.get("write.committer") {
            out.committer = v.clone();
        }
        if let Some(v) = options.get("write.staging_dir") {
            out.staging_dir = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("FSK_STAGING_DIR") {
            if !v.is_empty() {
                out.staging_dir = PathBuf::from(v);
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_override_session_settings() {
        let session = WriteSessionConfig::default();
        let mut options = HashMap::new();
        options.insert("write.compression_codec".to_string(), "none".to_string());
        options.insert("write.summary_level".to_string(), "job".to_string());
        options.insert("other.key".to_string(), "ignored".to_string());

        let resolved = session.with_options(&options).expect("resolve");
        assert_eq!(resolved.compression_codec, "none");
        assert_eq!(resolved.summary_level, "job");
        assert_eq!(resolved.timestamp_precision, "micros");
    }

    #[test]
    fn malformed_legacy_flag_is_a_config_error() {
        let session = WriteSessionConfig::default();
        let mut options = HashMap::new();
        options.insert("write.legacy_format".to_string(), "yes".to_string());

        let err = session
            .with_options(&options)
            .expect_err("malformed bool must fail");
        assert!(err.to_string().contains("write.legacy_format"), "got: {err}");
    }
}
