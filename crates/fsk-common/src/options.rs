//! Typed write-option values shared by the capability gate and the job
//! configurator.
//!
//! Both components parse the same raw settings; keeping the parsers here means
//! a rejection reason and the matching configuration error always name the
//! offending value the same way.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{FskError, Result};

/// Compression codecs the accelerated encoder produces.
///
/// `none` and `uncompressed` are accepted spellings of the same codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompressionCodec {
    /// No compression; files carry the bare format extension.
    Uncompressed,
    /// Snappy block compression.
    Snappy,
}

impl CompressionCodec {
    /// Parses a resolved codec name, rejecting anything outside the
    /// accelerated set with the offending name in the error.
    pub fn parse(name: &str) -> Result<Self> {
        match name.to_ascii_lowercase().as_str() {
            "none" | "uncompressed" => Ok(Self::Uncompressed),
            "snappy" => Ok(Self::Snappy),
            other => Err(FskError::InvalidConfig(format!(
                "unsupported compression codec for accelerated write: '{other}' \
                 (supported: none, uncompressed, snappy)"
            ))),
        }
    }

    /// Codec portion of the output file extension, including the leading dot
    /// when non-empty (`snappy` -> ".snappy", uncompressed -> "").
    #[must_use]
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Uncompressed => "",
            Self::Snappy => ".snappy",
        }
    }
}

impl fmt::Display for CompressionCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uncompressed => write!(f, "uncompressed"),
            Self::Snappy => write!(f, "snappy"),
        }
    }
}

/// Output timestamp precision requested by the session.
///
/// The accelerator produces exactly one precision; the others are rejected
/// explicitly rather than silently converted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimestampPrecision {
    Millis,
    Micros,
    Nanos,
}

impl TimestampPrecision {
    /// Parses a precision identifier.
    pub fn parse(name: &str) -> Result<Self> {
        match name.to_ascii_lowercase().as_str() {
            "millis" | "milliseconds" => Ok(Self::Millis),
            "micros" | "microseconds" => Ok(Self::Micros),
            "nanos" | "nanoseconds" => Ok(Self::Nanos),
            other => Err(FskError::InvalidConfig(format!(
                "unknown timestamp precision: '{other}' (expected millis, micros, or nanos)"
            ))),
        }
    }
}

impl fmt::Display for TimestampPrecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Millis => write!(f, "millis"),
            Self::Micros => write!(f, "micros"),
            Self::Nanos => write!(f, "nanos"),
        }
    }
}

/// Commit-summary verbosity requested for the job.
///
/// Summary generation is costly and rarely consumed, so the default is
/// [`SummaryLevel::None`]; jobs opt in explicitly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SummaryLevel {
    /// No per-job summary metadata.
    #[default]
    None,
    /// One summary per job, emitted by the committer when supported.
    Job,
}

impl SummaryLevel {
    /// Parses a summary-level setting.
    pub fn parse(name: &str) -> Result<Self> {
        match name.to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "job" => Ok(Self::Job),
            other => Err(FskError::InvalidConfig(format!(
                "unknown commit summary level: '{other}' (expected none or job)"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codec_parse_accepts_aliases_and_is_case_insensitive() {
        assert_eq!(
            CompressionCodec::parse("NONE").expect("none"),
            CompressionCodec::Uncompressed
        );
        assert_eq!(
            CompressionCodec::parse("uncompressed").expect("uncompressed"),
            CompressionCodec::Uncompressed
        );
        assert_eq!(
            CompressionCodec::parse("Snappy").expect("snappy"),
            CompressionCodec::Snappy
        );
    }

    #[test]
    fn codec_parse_rejects_with_offending_name() {
        let err = CompressionCodec::parse("gzip").expect_err("gzip must be rejected");
        assert!(err.to_string().contains("'gzip'"), "got: {err}");
    }

    #[test]
    fn codec_extension_is_empty_for_uncompressed() {
        assert_eq!(CompressionCodec::Uncompressed.extension(), "");
        assert_eq!(CompressionCodec::Snappy.extension(), ".snappy");
    }

    #[test]
    fn precision_parse_round_trips_all_variants() {
        for (name, expected) in [
            ("millis", TimestampPrecision::Millis),
            ("micros", TimestampPrecision::Micros),
            ("nanos", TimestampPrecision::Nanos),
        ] {
            assert_eq!(TimestampPrecision::parse(name).expect(name), expected);
        }
        assert!(TimestampPrecision::parse("seconds").is_err());
    }

    #[test]
    fn summary_level_defaults_to_none() {
        assert_eq!(SummaryLevel::default(), SummaryLevel::None);
        assert_eq!(SummaryLevel::parse("job").expect("job"), SummaryLevel::Job);
    }
}
