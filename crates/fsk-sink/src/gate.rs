//! Planning-time feasibility gate for the accelerated write path.
//!
//! The gate examines resolved session configuration once per job and decides
//! whether the accelerated writer may legally replace the engine's default
//! one. The decision is a sum type so callers cannot proceed on a rejection
//! by accident; rejection reasons are also logged for plan diagnostics.

use tracing::debug;

use fsk_common::{CompressionCodec, TimestampPrecision, WriteSessionConfig};

/// Outcome of the capability check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    /// The accelerated writer may replace the default writer for this job.
    Accepted,
    /// The accelerated writer must not be used; `reason` names the offending
    /// setting.
    Rejected { reason: String },
}

impl GateDecision {
    fn rejected(reason: impl Into<String>) -> Self {
        let reason = reason.into();
        debug!(%reason, "accelerated write rejected");
        Self::Rejected { reason }
    }

    #[must_use]
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted)
    }

    /// Rejection reason, if any.
    #[must_use]
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Accepted => None,
            Self::Rejected { reason } => Some(reason),
        }
    }
}

/// Host planner's say on whether the surrounding plan node can be replaced.
///
/// The gate forwards a veto reason unchanged, so the host's wording reaches
/// plan diagnostics verbatim.
pub trait PlanReplacementPolicy: Send + Sync {
    /// Returns the host's reason against replacement, or `None` to allow it.
    fn replacement_veto(&self) -> Option<String>;
}

/// Policy used when the host imposes no constraint of its own.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoVeto;

impl PlanReplacementPolicy for NoVeto {
    fn replacement_veto(&self) -> Option<String> {
        None
    }
}

/// Decides whether this job's write may run on the accelerator.
///
/// All of the following must hold for [`GateDecision::Accepted`]:
/// - compression codec within the accelerated set
/// - legacy file format not requested
/// - output timestamp precision exactly microseconds
/// - no veto from the host planner
#[must_use]
pub fn can_accelerate(
    config: &WriteSessionConfig,
    host: &dyn PlanReplacementPolicy,
) -> GateDecision {
    if let Err(e) = CompressionCodec::parse(&config.compression_codec) {
        return GateDecision::rejected(e.to_string());
    }
    if config.legacy_format {
        return GateDecision::rejected(
            "legacy file format is not supported by the accelerated writer",
        );
    }
    match TimestampPrecision::parse(&config.timestamp_precision) {
        Err(e) => return GateDecision::rejected(e.to_string()),
        Ok(TimestampPrecision::Micros) => {}
        Ok(other) => {
            return GateDecision::rejected(format!(
                "unsupported timestamp precision: '{other}' (accelerated writes produce micros only)"
            ));
        }
    }
    if let Some(reason) = host.replacement_veto() {
        return GateDecision::rejected(reason);
    }
    GateDecision::Accepted
}

#[cfg(test)]
mod tests {
    use fsk_common::WriteSessionConfig;

    use super::{can_accelerate, GateDecision, NoVeto, PlanReplacementPolicy};

    struct Veto(&'static str);

    impl PlanReplacementPolicy for Veto {
        fn replacement_veto(&self) -> Option<String> {
            Some(self.0.to_string())
        }
    }

    #[test]
    fn default_session_is_accepted() {
        let decision = can_accelerate(&WriteSessionConfig::default(), &NoVeto);
        assert!(decision.is_accepted());
        assert!(decision.reason().is_none());
    }

    #[test]
    fn unsupported_codec_is_rejected_with_the_codec_name() {
        let mut config = WriteSessionConfig::default();
        config.compression_codec = "gzip".to_string();
        let decision = can_accelerate(&config, &NoVeto);
        let reason = decision.reason().expect("rejected");
        assert!(reason.contains("'gzip'"), "got: {reason}");
    }

    #[test]
    fn legacy_format_is_rejected() {
        let mut config = WriteSessionConfig::default();
        config.legacy_format = true;
        let decision = can_accelerate(&config, &NoVeto);
        let reason = decision.reason().expect("rejected");
        assert!(reason.contains("legacy"), "got: {reason}");
    }

    #[test]
    fn millisecond_precision_is_rejected_not_downgraded() {
        let mut config = WriteSessionConfig::default();
        config.timestamp_precision = "millis".to_string();
        let decision = can_accelerate(&config, &NoVeto);
        let reason = decision.reason().expect("rejected");
        assert!(reason.contains("'millis'"), "got: {reason}");
    }

    #[test]
    fn host_veto_reason_is_forwarded_unchanged() {
        let decision = can_accelerate(
            &WriteSessionConfig::default(),
            &Veto("sort order must be preserved by the default writer"),
        );
        assert_eq!(
            decision,
            GateDecision::Rejected {
                reason: "sort order must be preserved by the default writer".to_string()
            }
        );
    }
}
