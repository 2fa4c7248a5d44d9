//! Derived metric vocabulary and failure records.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Secondary metric derived from canonical statement data.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[allow(missing_docs)]
pub enum DerivedMetric {
    // Margins
    GrossMargin,
    OperatingMargin,
    NetMargin,

    // Growth
    RevenueGrowthYoy,
    RevenueGrowthQoq,
    RevenueGrowthTtm,
    EpsDilutedGrowth,

    // Cash flow
    Ebitda,
    Ebit,
    LeveredFreeCashFlow,
    UnleveredFreeCashFlow,

    // Leverage
    WorkingCapital,
    DebtToEquity,
    InterestCoverage,

    // Returns
    Roe,
    Roa,
    Roic,
}

impl DerivedMetric {
    /// Stable string code for the metric (e.g. `"GROSS_MARGIN"`).
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::GrossMargin => "GROSS_MARGIN",
            Self::OperatingMargin => "OPERATING_MARGIN",
            Self::NetMargin => "NET_MARGIN",
            Self::RevenueGrowthYoy => "REVENUE_GROWTH_YOY",
            Self::RevenueGrowthQoq => "REVENUE_GROWTH_QOQ",
            Self::RevenueGrowthTtm => "REVENUE_GROWTH_TTM",
            Self::EpsDilutedGrowth => "EPS_DILUTED_GROWTH",
            Self::Ebitda => "EBITDA",
            Self::Ebit => "EBIT",
            Self::LeveredFreeCashFlow => "LEVERED_FREE_CASH_FLOW",
            Self::UnleveredFreeCashFlow => "UNLEVERED_FREE_CASH_FLOW",
            Self::WorkingCapital => "WORKING_CAPITAL",
            Self::DebtToEquity => "DEBT_TO_EQUITY",
            Self::InterestCoverage => "INTEREST_COVERAGE",
            Self::Roe => "ROE",
            Self::Roa => "ROA",
            Self::Roic => "ROIC",
        }
    }
}

impl fmt::Display for DerivedMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// High-level derived metric category.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DerivedMetricCategory {
    /// Profitability margins.
    #[display("MARGIN")]
    Margin,
    /// Period-over-period growth rates.
    #[display("GROWTH")]
    Growth,
    /// Cash-flow measures.
    #[display("CASH_FLOW")]
    CashFlow,
    /// Leverage and capital-structure ratios.
    #[display("LEVERAGE")]
    Leverage,
    /// Return measures.
    #[display("RETURN")]
    Return,
}

/// Reason a derived metric could not be computed.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MetricFailureReason {
    /// A required input metric is absent from the payload or a prior
    /// period, or the payload's statement type does not fit the metric.
    #[display("MISSING_INPUT")]
    MissingInput,
    /// The metric is not applicable in this context.
    #[display("NOT_APPLICABLE")]
    NotApplicable,
    /// A denominator was zero or too small in magnitude for a stable
    /// ratio.
    #[display("ZERO_DENOMINATOR")]
    ZeroDenominator,
    /// Not enough prior periods for a history-dependent metric.
    #[display("INSUFFICIENT_HISTORY")]
    InsufficientHistory,
    /// A numeric operation failed (overflow or invalid operation).
    #[display("INVALID_OPERATION")]
    InvalidOperation,
    /// Any other failure.
    #[display("OTHER")]
    Other,
}

/// Structured failure record for a derived metric computation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricFailure {
    /// Metric that failed to compute.
    pub metric: DerivedMetric,
    /// Machine-readable reason.
    pub reason: MetricFailureReason,
    /// Free-form structured details for diagnostics.
    pub details: BTreeMap<String, String>,
}

impl MetricFailure {
    /// Convenience constructor with a single `message` detail.
    pub fn with_message(
        metric: DerivedMetric,
        reason: MetricFailureReason,
        message: impl Into<String>,
    ) -> Self {
        let mut details = BTreeMap::new();
        details.insert("message".to_string(), message.into());
        Self {
            metric,
            reason,
            details,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_codes() {
        assert_eq!(DerivedMetric::GrossMargin.to_string(), "GROSS_MARGIN");
        assert_eq!(DerivedMetric::RevenueGrowthTtm.to_string(), "REVENUE_GROWTH_TTM");
        assert_eq!(MetricFailureReason::ZeroDenominator.to_string(), "ZERO_DENOMINATOR");
        assert_eq!(DerivedMetricCategory::CashFlow.to_string(), "CASH_FLOW");
    }
}
