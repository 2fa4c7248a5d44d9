#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/hobart/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod calendar;
pub mod engine;
pub mod fact;
pub mod rules;

pub use engine::{ReconcilerConfig, ReconciliationEngine};
pub use fact::NormalizedFact;
pub use rules::{
    CalendarRule, FxRule, IdentityRule, ReconciliationResult, ReconciliationRule,
    ReconciliationStatus, RollforwardRule, RuleCategory, SegmentRollupRule, Severity,
};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
