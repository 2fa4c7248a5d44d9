//! Reconciliation rule specifications and results.
//!
//! Rules form a closed sum type with exhaustive dispatch in the engine,
//! so adding a new rule kind is a compile-time-checked change rather than
//! a silent no-op branch.

use hobart_normalize::{CanonicalMetric, FiscalPeriod, StatementIdentity, StatementType};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Evaluation outcome of a single rule.
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
pub enum ReconciliationStatus {
    /// The check held within tolerance.
    #[display("PASS")]
    Pass,
    /// The check failed beyond tolerance.
    #[display("FAIL")]
    Fail,
    /// Required inputs were missing; no numeric verdict.
    #[display("WARNING")]
    Warning,
}

/// Severity classification for reconciliation outcomes.
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
pub enum Severity {
    /// No materiality impact (passing checks).
    #[display("NONE")]
    None,
    /// Low materiality.
    #[display("LOW")]
    Low,
    /// Medium materiality.
    #[display("MEDIUM")]
    Medium,
    /// High materiality.
    #[display("HIGH")]
    High,
    /// Critical materiality.
    #[display("CRITICAL")]
    Critical,
}

/// Rule category.
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
pub enum RuleCategory {
    /// Accounting identity across statements.
    #[display("IDENTITY")]
    Identity,
    /// Opening + flows = closing rollforward.
    #[display("ROLLFORWARD")]
    Rollforward,
    /// Multi-currency consistency.
    #[display("FX")]
    Fx,
    /// Fiscal-calendar behavior.
    #[display("CALENDAR")]
    Calendar,
    /// Segment / dimensional rollup.
    #[display("SEGMENT")]
    Segment,
}

/// Accounting identity rule across statements
/// (e.g. `Assets = Liabilities + Equity`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityRule {
    /// Stable identifier for the rule.
    pub rule_id: String,
    /// Short human-readable name.
    pub name: String,
    /// Severity for FAIL outcomes.
    pub severity: Severity,
    /// Metrics summed on the left-hand side of the identity.
    pub lhs_metrics: Vec<CanonicalMetric>,
    /// Metrics summed on the right-hand side of the identity.
    pub rhs_metrics: Vec<CanonicalMetric>,
    /// Absolute tolerance; None falls back to the engine default.
    pub tolerance: Option<Decimal>,
    /// Statement types this rule applies to; None or empty applies
    /// wherever the required metrics are present in the aligned bucket.
    pub applicable_statement_types: Option<Vec<StatementType>>,
    /// Optional longer description.
    pub description: Option<String>,
    /// Whether the rule is active.
    pub is_enabled: bool,
}

/// Rollforward rule: `closing = opening + Σ flows` within one payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollforwardRule {
    /// Stable identifier for the rule.
    pub rule_id: String,
    /// Short human-readable name.
    pub name: String,
    /// Severity for FAIL outcomes.
    pub severity: Severity,
    /// Metric representing the opening balance.
    pub opening_metric: CanonicalMetric,
    /// Metrics representing flows during the period.
    pub flow_metrics: Vec<CanonicalMetric>,
    /// Metric representing the closing balance.
    pub closing_metric: CanonicalMetric,
    /// Restricts evaluation to one fiscal period granularity.
    pub period_granularity: Option<FiscalPeriod>,
    /// Absolute tolerance; None falls back to the engine default.
    pub tolerance: Option<Decimal>,
    /// Optional longer description.
    pub description: Option<String>,
    /// Whether the rule is active.
    pub is_enabled: bool,
}

/// Multi-currency consistency rule.
///
/// The current evaluation is an intentional, permanent stub: it always
/// emits WARNING results carrying the declared metric and currency
/// metadata and never performs a numeric comparison. Richer currency
/// checks are deliberately not inferred.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FxRule {
    /// Stable identifier for the rule.
    pub rule_id: String,
    /// Short human-readable name.
    pub name: String,
    /// Severity for FAIL outcomes.
    pub severity: Severity,
    /// Metric in the reporting currency to check.
    pub base_metric: CanonicalMetric,
    /// Metric providing the FX rate, when modeled.
    pub fx_rate_metric: Option<CanonicalMetric>,
    /// Expected local currency code.
    pub local_currency: String,
    /// Expected reporting currency code.
    pub reporting_currency: String,
    /// Relative tolerance in basis points; None falls back to the engine
    /// default.
    pub tolerance_bps: Option<i32>,
    /// Optional longer description.
    pub description: Option<String>,
    /// Whether the rule is active.
    pub is_enabled: bool,
}

/// Fiscal-calendar behavior rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarRule {
    /// Stable identifier for the rule.
    pub rule_id: String,
    /// Short human-readable name.
    pub name: String,
    /// Severity for FAIL outcomes.
    pub severity: Severity,
    /// Allowed fiscal year-end months (1-12).
    pub allowed_fye_months: Vec<u32>,
    /// Whether 53-week years are allowed.
    pub allow_53_week: bool,
    /// Maximum allowed gap in days between statement dates before the
    /// calendar is considered irregular.
    pub max_gap_days: i64,
    /// Optional longer description.
    pub description: Option<String>,
    /// Whether the rule is active.
    pub is_enabled: bool,
}

/// Segment / dimensional rollup rule: segment children along one
/// dimension must sum to the consolidated parent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentRollupRule {
    /// Stable identifier for the rule.
    pub rule_id: String,
    /// Short human-readable name.
    pub name: String,
    /// Severity for FAIL outcomes.
    pub severity: Severity,
    /// Metric representing the consolidated / parent total.
    pub parent_metric: CanonicalMetric,
    /// Metric representing the segment / child values.
    pub child_metric: CanonicalMetric,
    /// Dimension key along which the rollup is evaluated (e.g. `segment`).
    pub rollup_dimension_key: String,
    /// Absolute tolerance; None falls back to the engine default.
    pub tolerance: Option<Decimal>,
    /// Optional longer description.
    pub description: Option<String>,
    /// Whether the rule is active.
    pub is_enabled: bool,
}

/// Closed set of reconciliation rule variants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "category")]
pub enum ReconciliationRule {
    /// Accounting identity rule.
    #[serde(rename = "IDENTITY")]
    Identity(IdentityRule),
    /// Rollforward rule.
    #[serde(rename = "ROLLFORWARD")]
    Rollforward(RollforwardRule),
    /// FX consistency rule.
    #[serde(rename = "FX")]
    Fx(FxRule),
    /// Calendar rule.
    #[serde(rename = "CALENDAR")]
    Calendar(CalendarRule),
    /// Segment rollup rule.
    #[serde(rename = "SEGMENT")]
    SegmentRollup(SegmentRollupRule),
}

impl ReconciliationRule {
    /// Stable identifier of the underlying rule.
    pub fn rule_id(&self) -> &str {
        match self {
            Self::Identity(r) => &r.rule_id,
            Self::Rollforward(r) => &r.rule_id,
            Self::Fx(r) => &r.rule_id,
            Self::Calendar(r) => &r.rule_id,
            Self::SegmentRollup(r) => &r.rule_id,
        }
    }

    /// Category of the underlying rule.
    pub const fn category(&self) -> RuleCategory {
        match self {
            Self::Identity(_) => RuleCategory::Identity,
            Self::Rollforward(_) => RuleCategory::Rollforward,
            Self::Fx(_) => RuleCategory::Fx,
            Self::Calendar(_) => RuleCategory::Calendar,
            Self::SegmentRollup(_) => RuleCategory::Segment,
        }
    }

    /// Whether the underlying rule is active.
    pub const fn is_enabled(&self) -> bool {
        match self {
            Self::Identity(r) => r.is_enabled,
            Self::Rollforward(r) => r.is_enabled,
            Self::Fx(r) => r.is_enabled,
            Self::Calendar(r) => r.is_enabled,
            Self::SegmentRollup(r) => r.is_enabled,
        }
    }
}

/// Single reconciliation rule evaluation result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationResult {
    /// Identity of the statement the rule was evaluated for.
    pub statement_identity: StatementIdentity,
    /// Stable identifier of the evaluated rule.
    pub rule_id: String,
    /// Category of the evaluated rule.
    pub rule_category: RuleCategory,
    /// Evaluation outcome.
    pub status: ReconciliationStatus,
    /// Severity of the outcome.
    pub severity: Severity,
    /// Expected numeric value under the rule, when applicable.
    pub expected_value: Option<Decimal>,
    /// Actual numeric value observed, when applicable.
    pub actual_value: Option<Decimal>,
    /// `actual - expected`, when applicable.
    pub delta: Option<Decimal>,
    /// Dimension key when the result is dimension-specific.
    pub dimension_key: Option<String>,
    /// Human-readable labels for the dimensional slice, when any.
    pub dimension_labels: Option<BTreeMap<String, String>>,
    /// Machine-readable diagnostic notes.
    pub notes: BTreeMap<String, String>,
}
