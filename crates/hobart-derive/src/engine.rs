//! Derived metrics engine.
//!
//! Evaluates requested metrics independently: one metric's failure never
//! blocks another's success, and no formula error ever propagates out of
//! [`DerivedMetricsEngine::compute`].

use crate::formulas::{FormulaError, MetricContext};
use crate::metric::{DerivedMetric, MetricFailure, MetricFailureReason};
use crate::spec::{derived_metric_specs, spec_for, DerivedMetricSpec};
use hobart_normalize::CanonicalStatementPayload;
use rust_decimal::Decimal;
use std::collections::BTreeMap;

/// Result of computing one or more derived metrics.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DerivedMetricsResult {
    /// Successfully computed values.
    pub values: BTreeMap<DerivedMetric, Decimal>,
    /// Metrics that could not be computed, with structured reasons.
    pub failures: Vec<MetricFailure>,
}

/// Compute derived metrics for canonical statement payloads.
#[derive(Debug, Clone, Copy, Default)]
pub struct DerivedMetricsEngine {}

impl DerivedMetricsEngine {
    /// Creates a new engine.
    pub const fn new() -> Self {
        Self {}
    }

    /// Compute derived metrics for a payload.
    ///
    /// `history` is the ordered sequence of *prior* payloads for the same
    /// company, oldest to newest; it may be empty. When `metrics` is
    /// `None`, every registered metric is attempted.
    pub fn compute(
        &self,
        payload: &CanonicalStatementPayload,
        history: &[CanonicalStatementPayload],
        metrics: Option<&[DerivedMetric]>,
    ) -> DerivedMetricsResult {
        let requested: Vec<DerivedMetric> = match metrics {
            Some(metrics) => metrics.to_vec(),
            None => derived_metric_specs().iter().map(|s| s.metric).collect(),
        };

        let ctx = MetricContext { payload, history };
        let mut result = DerivedMetricsResult::default();

        for metric in requested {
            match compute_metric(metric, &ctx) {
                Ok(value) => {
                    result.values.insert(metric, value);
                }
                Err(failure) => result.failures.push(failure),
            }
        }

        result
    }
}

fn compute_metric(
    metric: DerivedMetric,
    ctx: &MetricContext<'_>,
) -> Result<Decimal, MetricFailure> {
    let Some(spec) = spec_for(metric) else {
        return Err(MetricFailure::with_message(
            metric,
            MetricFailureReason::Other,
            "metric not registered in the derived metric specs",
        ));
    };

    precheck(metric, spec, ctx)?;

    (spec.formula)(ctx).map_err(|err| match err {
        FormulaError::MissingInput(message) => {
            MetricFailure::with_message(metric, MetricFailureReason::MissingInput, message)
        }
        FormulaError::InsufficientHistory(message) => {
            MetricFailure::with_message(metric, MetricFailureReason::InsufficientHistory, message)
        }
        FormulaError::ZeroDenominator(message) => {
            MetricFailure::with_message(metric, MetricFailureReason::ZeroDenominator, message)
        }
        FormulaError::Invalid(message) => {
            MetricFailure::with_message(metric, MetricFailureReason::InvalidOperation, message)
        }
    })
}

/// Spec-driven applicability, input, and history checks that run before
/// the formula itself.
fn precheck(
    metric: DerivedMetric,
    spec: &DerivedMetricSpec,
    ctx: &MetricContext<'_>,
) -> Result<(), MetricFailure> {
    if !spec
        .required_statement_types
        .contains(&ctx.payload.statement_type)
    {
        let mut details = BTreeMap::new();
        details.insert(
            "message".to_string(),
            "unsupported statement_type for metric".to_string(),
        );
        details.insert(
            "statement_type".to_string(),
            ctx.payload.statement_type.to_string(),
        );
        return Err(MetricFailure {
            metric,
            reason: MetricFailureReason::MissingInput,
            details,
        });
    }

    let missing: Vec<&str> = spec
        .required_inputs
        .iter()
        .filter(|input| !ctx.payload.core_metrics.contains_key(input))
        .map(|input| input.as_str())
        .collect();
    if !missing.is_empty() {
        let mut details = BTreeMap::new();
        details.insert("message".to_string(), metric.to_string());
        details.insert("missing_inputs".to_string(), missing.join(","));
        return Err(MetricFailure {
            metric,
            reason: MetricFailureReason::MissingInput,
            details,
        });
    }

    if spec.uses_history && ctx.history.len() < spec.min_history_periods {
        let mut details = BTreeMap::new();
        details.insert("message".to_string(), metric.to_string());
        details.insert(
            "required_history_periods".to_string(),
            spec.min_history_periods.to_string(),
        );
        details.insert(
            "available_history_periods".to_string(),
            ctx.history.len().to_string(),
        );
        return Err(MetricFailure {
            metric,
            reason: MetricFailureReason::InsufficientHistory,
            details,
        });
    }

    Ok(())
}
