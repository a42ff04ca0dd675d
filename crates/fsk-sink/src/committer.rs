use std::sync::Arc;

use fsk_common::{FskError, Result};

/// Output-committer contract consumed by the host engine.
///
/// The commit protocol itself (atomic visibility of completed files) is owned
/// by the host; this layer only needs to know which committer runs the job
/// and whether it can produce per-job summary metadata.
pub trait OutputCommitter: Send + Sync + std::fmt::Debug {
    fn name(&self) -> &'static str;

    /// Whether this committer can emit per-job summary metadata.
    fn supports_summaries(&self) -> bool;
}

/// The format's standard committer; emits summaries when asked.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardCommitter;

impl OutputCommitter for StandardCommitter {
    fn name(&self) -> &'static str {
        "standard"
    }

    fn supports_summaries(&self) -> bool {
        true
    }
}

/// Direct-to-destination committer used against object stores where a rename
/// pass is wasted work; has no summary phase.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectCommitter;

impl OutputCommitter for DirectCommitter {
    fn name(&self) -> &'static str {
        "direct"
    }

    fn supports_summaries(&self) -> bool {
        false
    }
}

/// Resolves a committer by name; empty selects the format's standard one.
pub fn resolve_committer(name: &str) -> Result<Arc<dyn OutputCommitter>> {
    match name.to_ascii_lowercase().as_str() {
        "" | "standard" => Ok(Arc::new(StandardCommitter)),
        "direct" => Ok(Arc::new(DirectCommitter)),
        other => Err(FskError::InvalidConfig(format!(
            "unknown output committer: '{other}' (expected standard or direct)"
        ))),
    }
}
