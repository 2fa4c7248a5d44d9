#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/hobart/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod pipeline;

// Re-export the engine crates under stable module names
pub use hobart_derive as derive;
pub use hobart_normalize as normalize;
pub use hobart_reconcile as reconcile;
pub use hobart_xbrl as xbrl;

// Re-export the types most callers touch
pub use pipeline::{filing_facts, normalize_filing, NormalizedFiling, PipelineError, StatementMeta};

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
