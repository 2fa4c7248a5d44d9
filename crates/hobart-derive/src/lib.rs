#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/hobart/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod engine;
pub mod formulas;
pub mod metric;
pub mod spec;

pub use engine::{DerivedMetricsEngine, DerivedMetricsResult};
pub use formulas::{Formula, FormulaError, FormulaResult, MetricContext};
pub use metric::{DerivedMetric, DerivedMetricCategory, MetricFailure, MetricFailureReason};
pub use spec::{derived_metric_specs, spec_for, DerivedMetricSpec};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
