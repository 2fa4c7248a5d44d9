#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/hobart/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod normalizer;
pub mod overrides;
pub mod registry;
pub mod statement;

pub use error::{NormalizeError, Result};
pub use normalizer::{
    FilingFact, MetricConfidence, MetricRecord, NormalizationContext, NormalizationResult,
    StatementNormalizer, PAYLOAD_VERSION,
};
pub use overrides::{
    MappingOverrideRule, MatchFailure, OverrideDecision, OverrideEngine, OverrideQuery,
    OverrideScope, OverrideTrace, RuleTraceEntry,
};
pub use statement::{
    AccountingStandard, CanonicalMetric, CanonicalStatementPayload, FiscalPeriod,
    StatementIdentity, StatementType,
};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
