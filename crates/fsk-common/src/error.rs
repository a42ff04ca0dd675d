use thiserror::Error;

/// Canonical FlashSink error taxonomy used across crates.
///
/// Classification guidance:
/// - [`FskError::InvalidConfig`]: write-job configuration contract violations
///   discovered before any task runs
/// - [`FskError::Encode`]: accelerator-side batch encode failures
/// - [`FskError::Transfer`]: staged-file to destination copy failures
/// - [`FskError::Canceled`]: task cancellation observed while waiting on the
///   shared accelerator
/// - [`FskError::Io`]: raw filesystem IO failures from std APIs
#[derive(Debug, Error)]
pub enum FskError {
    /// Invalid or inconsistent write-job configuration.
    ///
    /// Examples:
    /// - compression codec outside the accelerated set
    /// - legacy file format requested
    /// - timestamp precision the accelerator does not produce
    /// - unknown output committer
    ///
    /// Raised at configuration time, never per batch.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Accelerator encode failure for one batch.
    ///
    /// Examples:
    /// - device out-of-memory during column compaction
    /// - malformed column data rejected by the encoder
    ///
    /// The batch buffers and the accelerator lease are always released before
    /// this error reaches the caller.
    #[error("accelerated encode failed: {0}")]
    Encode(String),

    /// Destination copy failure for one staged file.
    ///
    /// The message names the destination path. The staging file is always
    /// deleted before this error reaches the caller.
    #[error("transfer to destination failed: {0}")]
    Transfer(String),

    /// Task canceled while blocked on accelerator acquisition.
    #[error("canceled: {0}")]
    Canceled(String),

    /// Transparent std IO failures.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Standard FlashSink result alias.
pub type Result<T> = std::result::Result<T, FskError>;
