//! Reconciliation engine.
//!
//! Evaluates identity, rollforward, FX, calendar, and segment rollup
//! rules over canonical statement payloads and optional fact-level
//! detail. The engine is pure: it receives everything it needs and
//! returns a freshly constructed, deterministically ordered result set.

use crate::calendar::{
    align_statements_across_types, infer_statement_period, AlignmentKey, StatementPeriod,
};
use crate::fact::NormalizedFact;
use crate::rules::{
    CalendarRule, FxRule, IdentityRule, ReconciliationResult, ReconciliationRule,
    ReconciliationStatus, RollforwardRule, RuleCategory, SegmentRollupRule, Severity,
};
use chrono::Datelike;
use hobart_normalize::{
    CanonicalMetric, CanonicalStatementPayload, StatementIdentity, StatementType,
};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, BTreeSet};

/// Configuration for the reconciliation engine.
#[derive(Debug, Clone)]
pub struct ReconcilerConfig {
    /// Identifier for the rule set being applied.
    pub rule_set_version: String,
    /// Default absolute tolerance for numeric comparisons when a rule
    /// does not specify its own.
    pub default_tolerance: Decimal,
    /// Default relative tolerance for FX rules in basis points.
    pub fx_tolerance_bps: i32,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            rule_set_version: "v1".to_string(),
            default_tolerance: Decimal::new(1, 2),
            fx_tolerance_bps: 100,
        }
    }
}

/// Fact-level detail keyed by statement identity.
pub type FactsByIdentity = BTreeMap<StatementIdentity, Vec<NormalizedFact>>;

/// Pure reconciliation engine over canonical statements.
#[derive(Debug, Clone, Default)]
pub struct ReconciliationEngine {
    config: ReconcilerConfig,
}

impl ReconciliationEngine {
    /// Creates an engine with the default configuration.
    pub fn new() -> Self {
        Self::with_config(ReconcilerConfig::default())
    }

    /// Creates an engine with a custom configuration.
    pub const fn with_config(config: ReconcilerConfig) -> Self {
        Self { config }
    }

    /// The active configuration.
    pub const fn config(&self) -> &ReconcilerConfig {
        &self.config
    }

    /// Evaluate reconciliation rules over canonical statements.
    ///
    /// Disabled rules are skipped. Statements are grouped into aligned
    /// buckets keyed by (cik, fiscal year, fiscal period) because some
    /// identities span statement types. When `facts_by_identity` is
    /// provided, segment rules use fact-level detail; otherwise they
    /// degrade to WARNING results.
    ///
    /// Results are always returned sorted by (statement identity, rule
    /// category, rule id, dimension key), so two runs over identical
    /// inputs produce byte-identical sequences.
    pub fn run(
        &self,
        rules: &[ReconciliationRule],
        statements: &[CanonicalStatementPayload],
        facts_by_identity: Option<&FactsByIdentity>,
    ) -> Vec<ReconciliationResult> {
        if rules.is_empty() || statements.is_empty() {
            return Vec::new();
        }

        let periods: Vec<StatementPeriod<'_>> =
            statements.iter().map(infer_statement_period).collect();
        let alignment = align_statements_across_types(&periods);
        let empty_facts = FactsByIdentity::new();
        let facts = facts_by_identity.unwrap_or(&empty_facts);

        let mut results: Vec<ReconciliationResult> = Vec::new();

        for rule in rules {
            if !rule.is_enabled() {
                continue;
            }
            match rule {
                ReconciliationRule::Identity(rule) => {
                    self.apply_identity_rule(rule, &alignment, &mut results);
                }
                ReconciliationRule::Rollforward(rule) => {
                    self.apply_rollforward_rule(rule, &periods, &mut results);
                }
                ReconciliationRule::Fx(rule) => {
                    self.apply_fx_rule(rule, &periods, &mut results);
                }
                ReconciliationRule::Calendar(rule) => {
                    self.apply_calendar_rule(rule, &periods, &mut results);
                }
                ReconciliationRule::SegmentRollup(rule) => {
                    self.apply_segment_rule(rule, &periods, facts, &mut results);
                }
            }
        }

        results.sort_by(|a, b| {
            (
                &a.statement_identity,
                a.rule_category,
                &a.rule_id,
                &a.dimension_key,
            )
                .cmp(&(
                    &b.statement_identity,
                    b.rule_category,
                    &b.rule_id,
                    &b.dimension_key,
                ))
        });
        results
    }

    // ------------------------------------------------------------------
    // Identity rules
    // ------------------------------------------------------------------

    fn apply_identity_rule(
        &self,
        rule: &IdentityRule,
        alignment: &BTreeMap<AlignmentKey, BTreeMap<StatementType, StatementPeriod<'_>>>,
        results: &mut Vec<ReconciliationResult>,
    ) {
        let tolerance = rule.tolerance.unwrap_or(self.config.default_tolerance);

        for ((cik, fiscal_year, fiscal_period), type_map) in alignment {
            if let Some(applicable) = &rule.applicable_statement_types
                && !applicable.is_empty()
                && !applicable.iter().any(|st| type_map.contains_key(st))
            {
                continue;
            }

            let bucket: Vec<&StatementPeriod<'_>> = type_map.values().collect();
            let lhs = sum_metrics_for_bucket(&rule.lhs_metrics, &bucket);
            let rhs = sum_metrics_for_bucket(&rule.rhs_metrics, &bucket);

            let representative = bucket[0];
            let identity = StatementIdentity {
                cik: cik.clone(),
                statement_type: representative.statement_type,
                fiscal_year: *fiscal_year,
                fiscal_period: *fiscal_period,
                version_sequence: representative.identity.version_sequence,
            };

            let (status, severity, delta) = match (lhs, rhs) {
                (Some(lhs_value), Some(rhs_value)) => {
                    let delta = rhs_value - lhs_value;
                    if delta.abs() <= tolerance {
                        (ReconciliationStatus::Pass, Severity::None, Some(delta))
                    } else {
                        (ReconciliationStatus::Fail, rule.severity, Some(delta))
                    }
                }
                _ => (ReconciliationStatus::Warning, Severity::Low, None),
            };

            let mut notes = BTreeMap::new();
            notes.insert("lhs_metrics".to_string(), metric_codes(&rule.lhs_metrics));
            notes.insert("rhs_metrics".to_string(), metric_codes(&rule.rhs_metrics));
            notes.insert(
                "statement_types".to_string(),
                type_map
                    .keys()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(","),
            );

            results.push(ReconciliationResult {
                statement_identity: identity,
                rule_id: rule.rule_id.clone(),
                rule_category: RuleCategory::Identity,
                status,
                severity,
                expected_value: lhs,
                actual_value: rhs,
                delta,
                dimension_key: None,
                dimension_labels: None,
                notes,
            });
        }
    }

    // ------------------------------------------------------------------
    // Rollforward rules
    // ------------------------------------------------------------------

    fn apply_rollforward_rule(
        &self,
        rule: &RollforwardRule,
        periods: &[StatementPeriod<'_>],
        results: &mut Vec<ReconciliationResult>,
    ) {
        let tolerance = rule.tolerance.unwrap_or(self.config.default_tolerance);

        for period in periods {
            if let Some(granularity) = rule.period_granularity
                && period.fiscal_period != granularity
            {
                continue;
            }

            let core = &period.payload.core_metrics;
            let opening = core.get(&rule.opening_metric).copied();
            let closing = core.get(&rule.closing_metric).copied();
            let flow_total = sum_present(&rule.flow_metrics, core);

            let result = match (opening, closing, flow_total) {
                (Some(opening), Some(closing), Some(flows)) => {
                    let expected = opening + flows;
                    let delta = closing - expected;
                    let (status, severity) = if delta.abs() <= tolerance {
                        (ReconciliationStatus::Pass, Severity::None)
                    } else {
                        (ReconciliationStatus::Fail, rule.severity)
                    };
                    let mut notes = BTreeMap::new();
                    notes.insert(
                        "opening_metric".to_string(),
                        rule.opening_metric.to_string(),
                    );
                    notes.insert(
                        "closing_metric".to_string(),
                        rule.closing_metric.to_string(),
                    );
                    notes.insert("flow_metrics".to_string(), metric_codes(&rule.flow_metrics));
                    ReconciliationResult {
                        statement_identity: period.identity.clone(),
                        rule_id: rule.rule_id.clone(),
                        rule_category: RuleCategory::Rollforward,
                        status,
                        severity,
                        expected_value: Some(expected),
                        actual_value: Some(closing),
                        delta: Some(delta),
                        dimension_key: None,
                        dimension_labels: None,
                        notes,
                    }
                }
                _ => {
                    let mut notes = BTreeMap::new();
                    notes.insert(
                        "reason".to_string(),
                        "MISSING_ROLLFORWARD_COMPONENTS".to_string(),
                    );
                    notes.insert("has_opening".to_string(), opening.is_some().to_string());
                    notes.insert("has_closing".to_string(), closing.is_some().to_string());
                    notes.insert("has_flow".to_string(), flow_total.is_some().to_string());
                    ReconciliationResult {
                        statement_identity: period.identity.clone(),
                        rule_id: rule.rule_id.clone(),
                        rule_category: RuleCategory::Rollforward,
                        status: ReconciliationStatus::Warning,
                        severity: Severity::Low,
                        expected_value: None,
                        actual_value: None,
                        delta: None,
                        dimension_key: None,
                        dimension_labels: None,
                        notes,
                    }
                }
            };
            results.push(result);
        }
    }

    // ------------------------------------------------------------------
    // FX rules
    // ------------------------------------------------------------------

    /// FX consistency is an intentional, permanent stub: every statement
    /// gets a WARNING carrying the declared metric and currency metadata,
    /// never a numeric comparison.
    fn apply_fx_rule(
        &self,
        rule: &FxRule,
        periods: &[StatementPeriod<'_>],
        results: &mut Vec<ReconciliationResult>,
    ) {
        for period in periods {
            let mut notes = BTreeMap::new();
            notes.insert("reason".to_string(), "FX_RULE_STUB".to_string());
            notes.insert("base_metric".to_string(), rule.base_metric.to_string());
            notes.insert(
                "fx_rate_metric".to_string(),
                rule.fx_rate_metric
                    .map_or_else(String::new, |m| m.to_string()),
            );
            notes.insert("local_currency".to_string(), rule.local_currency.clone());
            notes.insert(
                "reporting_currency".to_string(),
                rule.reporting_currency.clone(),
            );
            notes.insert("statement_currency".to_string(), period.currency.clone());

            results.push(ReconciliationResult {
                statement_identity: period.identity.clone(),
                rule_id: rule.rule_id.clone(),
                rule_category: RuleCategory::Fx,
                status: ReconciliationStatus::Warning,
                severity: Severity::Low,
                expected_value: None,
                actual_value: None,
                delta: None,
                dimension_key: None,
                dimension_labels: None,
                notes,
            });
        }
    }

    // ------------------------------------------------------------------
    // Calendar rules
    // ------------------------------------------------------------------

    fn apply_calendar_rule(
        &self,
        rule: &CalendarRule,
        periods: &[StatementPeriod<'_>],
        results: &mut Vec<ReconciliationResult>,
    ) {
        let allowed: BTreeSet<u32> = rule.allowed_fye_months.iter().copied().collect();
        let mut sorted: Vec<&StatementPeriod<'_>> = periods.iter().collect();
        sorted.sort_by_key(|p| p.statement_date);

        for period in sorted {
            let month = period.statement_date.month();
            let month_ok = allowed.contains(&month);
            let (status, severity) = if month_ok {
                (ReconciliationStatus::Pass, Severity::None)
            } else {
                (ReconciliationStatus::Fail, rule.severity)
            };

            let mut notes = BTreeMap::new();
            notes.insert("fye_month".to_string(), month.to_string());
            notes.insert(
                "allowed_fye_months".to_string(),
                allowed
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(","),
            );

            results.push(ReconciliationResult {
                statement_identity: period.identity.clone(),
                rule_id: rule.rule_id.clone(),
                rule_category: RuleCategory::Calendar,
                status,
                severity,
                expected_value: None,
                actual_value: None,
                delta: None,
                dimension_key: None,
                dimension_labels: None,
                notes,
            });
        }
    }

    // ------------------------------------------------------------------
    // Segment rollup rules
    // ------------------------------------------------------------------

    fn apply_segment_rule(
        &self,
        rule: &SegmentRollupRule,
        periods: &[StatementPeriod<'_>],
        facts_by_identity: &FactsByIdentity,
        results: &mut Vec<ReconciliationResult>,
    ) {
        let tolerance = rule.tolerance.unwrap_or(self.config.default_tolerance);
        let known_identities: BTreeSet<&StatementIdentity> =
            periods.iter().map(|p| &p.identity).collect();

        for (identity, facts) in facts_by_identity {
            // Facts without a corresponding payload are out of scope.
            if !known_identities.contains(identity) {
                continue;
            }

            let parent_code = rule.parent_metric.as_str();
            let child_code = rule.child_metric.as_str();

            let mut parents: Vec<&NormalizedFact> = facts
                .iter()
                .filter(|f| {
                    f.metric_code == parent_code
                        && !f.dimensions.contains_key(&rule.rollup_dimension_key)
                })
                .collect();
            let children: Vec<&NormalizedFact> = facts
                .iter()
                .filter(|f| {
                    f.metric_code == child_code
                        && f.dimensions.contains_key(&rule.rollup_dimension_key)
                })
                .collect();

            if parents.is_empty() || children.is_empty() {
                let mut notes = BTreeMap::new();
                notes.insert(
                    "reason".to_string(),
                    "SEGMENT_PARENT_OR_CHILD_MISSING".to_string(),
                );
                notes.insert(
                    "rollup_dimension_key".to_string(),
                    rule.rollup_dimension_key.clone(),
                );
                notes.insert("parent_count".to_string(), parents.len().to_string());
                notes.insert("child_count".to_string(), children.len().to_string());

                results.push(ReconciliationResult {
                    statement_identity: identity.clone(),
                    rule_id: rule.rule_id.clone(),
                    rule_category: RuleCategory::Segment,
                    status: ReconciliationStatus::Warning,
                    severity: Severity::Low,
                    expected_value: None,
                    actual_value: None,
                    delta: None,
                    dimension_key: None,
                    dimension_labels: None,
                    notes,
                });
                continue;
            }

            // Deterministic parent pick: most recent version of the
            // undimensioned fact.
            parents.sort_by(|a, b| {
                (
                    a.statement_date,
                    a.version_sequence,
                    &a.dimension_key,
                    &a.metric_code,
                )
                    .cmp(&(
                        b.statement_date,
                        b.version_sequence,
                        &b.dimension_key,
                        &b.metric_code,
                    ))
            });
            let parent = parents[parents.len() - 1];

            let child_sum: Decimal = children.iter().map(|f| f.value).sum();
            let delta = child_sum - parent.value;
            let (status, severity) = if delta.abs() <= tolerance {
                (ReconciliationStatus::Pass, Severity::None)
            } else {
                (ReconciliationStatus::Fail, rule.severity)
            };

            let mut notes = BTreeMap::new();
            notes.insert(
                "rollup_dimension_key".to_string(),
                rule.rollup_dimension_key.clone(),
            );
            notes.insert("parent_metric".to_string(), rule.parent_metric.to_string());
            notes.insert("child_metric".to_string(), rule.child_metric.to_string());
            notes.insert(
                "parent_fact_dimension_key".to_string(),
                parent.dimension_key.clone(),
            );
            notes.insert("child_fact_count".to_string(), children.len().to_string());

            results.push(ReconciliationResult {
                statement_identity: identity.clone(),
                rule_id: rule.rule_id.clone(),
                rule_category: RuleCategory::Segment,
                status,
                severity,
                expected_value: Some(parent.value),
                actual_value: Some(child_sum),
                delta: Some(delta),
                dimension_key: Some(rule.rollup_dimension_key.clone()),
                dimension_labels: None,
                notes,
            });
        }
    }
}

/// Sum metric values across an aligned bucket.
///
/// Each metric counts once, taken from the first statement type (in
/// bucket order) that carries it. Returns `None` when no metric is
/// present anywhere in the bucket.
fn sum_metrics_for_bucket(
    metrics: &[CanonicalMetric],
    bucket: &[&StatementPeriod<'_>],
) -> Option<Decimal> {
    if metrics.is_empty() || bucket.is_empty() {
        return None;
    }

    let mut total: Option<Decimal> = None;
    let mut seen: BTreeSet<CanonicalMetric> = BTreeSet::new();

    for metric in metrics {
        if !seen.insert(*metric) {
            continue;
        }
        for period in bucket {
            if let Some(value) = period.payload.core_metrics.get(metric) {
                total = Some(total.unwrap_or_default() + *value);
                break;
            }
        }
    }

    total
}

/// Sum the metric values present on a payload; `None` when none are.
fn sum_present(
    metrics: &[CanonicalMetric],
    core: &BTreeMap<CanonicalMetric, Decimal>,
) -> Option<Decimal> {
    let mut total: Option<Decimal> = None;
    for metric in metrics {
        if let Some(value) = core.get(metric) {
            total = Some(total.unwrap_or_default() + *value);
        }
    }
    total
}

fn metric_codes(metrics: &[CanonicalMetric]) -> String {
    metrics
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}
