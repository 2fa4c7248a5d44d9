//! XBRL mapping override engine for canonical metrics.
//!
//! A deterministic, side-effect-free engine that can remap or suppress
//! canonical metric mappings for individual facts based on a multi-layer
//! precedence model:
//!
//! ```text
//! GLOBAL < INDUSTRY < COMPANY < ANALYST
//! ```
//!
//! Callers load [`MappingOverrideRule`] values from wherever they are
//! configured and pass them in; the engine only decides which canonical
//! metric (if any) a fact should map to. It never performs numeric work.

use crate::statement::CanonicalMetric;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Override scope hierarchy for mapping rules.
///
/// Effective precedence is ANALYST > COMPANY > INDUSTRY > GLOBAL.
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
pub enum OverrideScope {
    /// Applies to all filers unless shadowed by a higher scope.
    #[display("GLOBAL")]
    Global,
    /// Applies to filers within one industry classification.
    #[display("INDUSTRY")]
    Industry,
    /// Applies to a specific CIK.
    #[display("COMPANY")]
    Company,
    /// Applies to a specific analyst or configuration profile.
    #[display("ANALYST")]
    Analyst,
}

/// Scopes in evaluation order: the first scope with a structurally
/// matching rule wins and lower scopes are never consulted.
const SCOPE_PRECEDENCE: [OverrideScope; 4] = [
    OverrideScope::Analyst,
    OverrideScope::Company,
    OverrideScope::Industry,
    OverrideScope::Global,
];

/// Immutable override rule for concept → canonical metric mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingOverrideRule {
    /// Stable identifier for this rule; ties between equal-priority rules
    /// are broken by ascending rule id.
    pub rule_id: String,
    /// Precedence scope of the rule.
    pub scope: OverrideScope,
    /// Concept QName this rule applies to (e.g. `us-gaap:Revenues`).
    pub source_concept: String,
    /// Optional taxonomy filter; None means taxonomy-agnostic.
    pub source_taxonomy: Option<String>,
    /// CIK filter; populated only for COMPANY scope.
    pub match_cik: Option<String>,
    /// Industry classification filter; populated only for INDUSTRY scope.
    pub match_industry_code: Option<String>,
    /// Analyst profile filter; populated only for ANALYST scope.
    pub match_analyst_id: Option<String>,
    /// Dimensional qualifiers that must all be present on the fact
    /// (subset semantics).
    pub match_dimensions: BTreeMap<String, String>,
    /// Metric to apply when this rule wins, or None for suppression.
    pub target_metric: Option<CanonicalMetric>,
    /// When true, forces suppression regardless of `target_metric`.
    pub is_suppression: bool,
    /// Priority within a scope; higher wins.
    pub priority: i32,
}

/// Final override decision for a single fact/concept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverrideDecision {
    /// Metric from the base mapping, before overrides.
    pub base_metric: Option<CanonicalMetric>,
    /// Metric after applying overrides; None when suppressed.
    pub final_metric: Option<CanonicalMetric>,
    /// Scope of the winning rule, when one matched.
    pub applied_scope: Option<OverrideScope>,
    /// Identifier of the winning rule, when one matched.
    pub applied_rule_id: Option<String>,
    /// True when the final metric differs from the base metric or a
    /// suppression was applied.
    pub was_overridden: bool,
}

/// Machine-readable reason a candidate rule failed to match.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, derive_more::Display,
)]
#[serde(rename_all = "snake_case")]
pub enum MatchFailure {
    /// The rule's source concept differs from the fact's concept.
    #[display("concept_mismatch")]
    ConceptMismatch,
    /// The rule is pinned to a different taxonomy.
    #[display("taxonomy_mismatch")]
    TaxonomyMismatch,
    /// COMPANY rule whose CIK differs from the caller's.
    #[display("cik_mismatch")]
    CikMismatch,
    /// INDUSTRY rule whose industry code differs from the caller's.
    #[display("industry_mismatch")]
    IndustryMismatch,
    /// ANALYST rule whose analyst id differs from the caller's.
    #[display("analyst_mismatch")]
    AnalystMismatch,
    /// GLOBAL rule that carries entity qualifiers.
    #[display("global_rule_has_entity_qualifiers")]
    GlobalRuleHasEntityQualifiers,
    /// The rule's required dimensions are not a subset of the fact's.
    #[display("dimension_mismatch")]
    DimensionMismatch,
}

/// Trace entry describing how a single rule was evaluated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleTraceEntry {
    /// Identifier of the rule under consideration.
    pub rule_id: String,
    /// Scope of the rule.
    pub scope: OverrideScope,
    /// Whether the rule matched all criteria.
    pub matched: bool,
    /// Non-match reason, when `matched` is false.
    pub reason: Option<MatchFailure>,
}

/// Structured, serializable trace for a single override evaluation.
///
/// Purely diagnostic; it never affects the decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverrideTrace {
    /// Concept QName of the fact.
    pub concept: String,
    /// Taxonomy identifier from the normalization context.
    pub taxonomy: String,
    /// Dimensional qualifiers attached to the fact.
    pub fact_dimensions: BTreeMap<String, String>,
    /// Company CIK.
    pub cik: String,
    /// Industry classification code, when known.
    pub industry_code: Option<String>,
    /// Analyst profile identifier, when known.
    pub analyst_id: Option<String>,
    /// Metric from the base mapping.
    pub base_metric: Option<CanonicalMetric>,
    /// Final decision produced by the engine.
    pub decision: OverrideDecision,
    /// Every rule considered, in evaluation order.
    pub considered_rules: Vec<RuleTraceEntry>,
}

/// Evaluation context for one fact/concept override lookup.
#[derive(Debug, Clone)]
pub struct OverrideQuery<'a> {
    /// Concept QName of the fact.
    pub concept: &'a str,
    /// Taxonomy identifier from the normalization context.
    pub taxonomy: &'a str,
    /// Dimensional qualifiers attached to the fact.
    pub fact_dimensions: &'a BTreeMap<String, String>,
    /// Company CIK.
    pub cik: &'a str,
    /// Industry classification code, when known.
    pub industry_code: Option<&'a str>,
    /// Analyst profile identifier, when known.
    pub analyst_id: Option<&'a str>,
    /// Metric produced by the base mapping, when any.
    pub base_metric: Option<CanonicalMetric>,
}

/// Deterministic engine for applying mapping overrides.
#[derive(Debug, Clone, Copy, Default)]
pub struct OverrideEngine {}

impl OverrideEngine {
    /// Creates a new override engine.
    pub const fn new() -> Self {
        Self {}
    }

    /// Apply override rules to a single fact/concept in context.
    ///
    /// Returns the decision and, when `debug` is set, a trace recording how
    /// every candidate rule was evaluated.
    pub fn apply(
        &self,
        query: &OverrideQuery<'_>,
        rules: &[MappingOverrideRule],
        debug: bool,
    ) -> (OverrideDecision, Option<OverrideTrace>) {
        let mut trace_entries: Vec<RuleTraceEntry> = Vec::new();

        // Step 1: narrow to rules for this concept and taxonomy.
        let mut candidates: Vec<&MappingOverrideRule> = Vec::new();
        for rule in rules {
            if rule.source_concept != query.concept {
                if debug {
                    trace_entries.push(trace_entry(rule, false, Some(MatchFailure::ConceptMismatch)));
                }
                continue;
            }
            if let Some(taxonomy) = &rule.source_taxonomy
                && taxonomy != query.taxonomy
            {
                if debug {
                    trace_entries.push(trace_entry(rule, false, Some(MatchFailure::TaxonomyMismatch)));
                }
                continue;
            }
            candidates.push(rule);
        }

        // Steps 2-4: first scope in precedence order with a structural
        // match wins; within it, priority DESC then rule_id ASC.
        let mut winner: Option<&MappingOverrideRule> = None;
        for scope in SCOPE_PRECEDENCE {
            let mut scoped_matches: Vec<&MappingOverrideRule> = Vec::new();
            for rule in candidates.iter().filter(|r| r.scope == scope) {
                let reason = rule_match_failure(rule, query);
                if debug {
                    trace_entries.push(trace_entry(rule, reason.is_none(), reason));
                }
                if reason.is_none() {
                    scoped_matches.push(rule);
                }
            }
            if scoped_matches.is_empty() {
                continue;
            }
            scoped_matches
                .sort_by(|a, b| b.priority.cmp(&a.priority).then(a.rule_id.cmp(&b.rule_id)));
            winner = Some(scoped_matches[0]);
            break;
        }

        let decision = match winner {
            None => OverrideDecision {
                base_metric: query.base_metric,
                final_metric: query.base_metric,
                applied_scope: None,
                applied_rule_id: None,
                was_overridden: false,
            },
            Some(rule) => {
                let final_metric = final_metric(rule);
                OverrideDecision {
                    base_metric: query.base_metric,
                    final_metric,
                    applied_scope: Some(rule.scope),
                    applied_rule_id: Some(rule.rule_id.clone()),
                    was_overridden: final_metric != query.base_metric,
                }
            }
        };

        if !debug {
            return (decision, None);
        }

        let trace = OverrideTrace {
            concept: query.concept.to_string(),
            taxonomy: query.taxonomy.to_string(),
            fact_dimensions: query.fact_dimensions.clone(),
            cik: query.cik.to_string(),
            industry_code: query.industry_code.map(str::to_string),
            analyst_id: query.analyst_id.map(str::to_string),
            base_metric: query.base_metric,
            decision: decision.clone(),
            considered_rules: trace_entries,
        };
        (decision, Some(trace))
    }
}

fn trace_entry(
    rule: &MappingOverrideRule,
    matched: bool,
    reason: Option<MatchFailure>,
) -> RuleTraceEntry {
    RuleTraceEntry {
        rule_id: rule.rule_id.clone(),
        scope: rule.scope,
        matched,
        reason,
    }
}

/// Structural match for one rule at its own scope, or the reason it fails.
fn rule_match_failure(
    rule: &MappingOverrideRule,
    query: &OverrideQuery<'_>,
) -> Option<MatchFailure> {
    match rule.scope {
        OverrideScope::Company => {
            if rule.match_cik.as_deref() != Some(query.cik) || query.cik.is_empty() {
                return Some(MatchFailure::CikMismatch);
            }
        }
        OverrideScope::Industry => {
            if rule.match_industry_code.is_none()
                || rule.match_industry_code.as_deref() != query.industry_code
            {
                return Some(MatchFailure::IndustryMismatch);
            }
        }
        OverrideScope::Analyst => {
            if rule.match_analyst_id.is_none()
                || rule.match_analyst_id.as_deref() != query.analyst_id
            {
                return Some(MatchFailure::AnalystMismatch);
            }
        }
        OverrideScope::Global => {
            if rule.match_cik.is_some()
                || rule.match_industry_code.is_some()
                || rule.match_analyst_id.is_some()
            {
                return Some(MatchFailure::GlobalRuleHasEntityQualifiers);
            }
        }
    }

    for (key, expected) in &rule.match_dimensions {
        if query.fact_dimensions.get(key) != Some(expected) {
            return Some(MatchFailure::DimensionMismatch);
        }
    }

    None
}

/// Suppression semantics: an explicitly suppressive rule, or one without a
/// target metric, maps the fact to nothing.
const fn final_metric(rule: &MappingOverrideRule) -> Option<CanonicalMetric> {
    if rule.is_suppression {
        return None;
    }
    rule.target_metric
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(rule_id: &str, scope: OverrideScope, priority: i32) -> MappingOverrideRule {
        MappingOverrideRule {
            rule_id: rule_id.to_string(),
            scope,
            source_concept: "us-gaap:Revenues".to_string(),
            source_taxonomy: None,
            match_cik: matches!(scope, OverrideScope::Company).then(|| "0000123456".to_string()),
            match_industry_code: matches!(scope, OverrideScope::Industry)
                .then(|| "SIC-7372".to_string()),
            match_analyst_id: matches!(scope, OverrideScope::Analyst)
                .then(|| "analyst-1".to_string()),
            match_dimensions: BTreeMap::new(),
            target_metric: Some(CanonicalMetric::OperatingIncome),
            is_suppression: false,
            priority,
        }
    }

    fn query<'a>(dimensions: &'a BTreeMap<String, String>) -> OverrideQuery<'a> {
        OverrideQuery {
            concept: "us-gaap:Revenues",
            taxonomy: "US_GAAP_2024",
            fact_dimensions: dimensions,
            cik: "0000123456",
            industry_code: Some("SIC-7372"),
            analyst_id: Some("analyst-1"),
            base_metric: Some(CanonicalMetric::Revenue),
        }
    }

    #[test]
    fn test_no_rules_means_no_change() {
        let dims = BTreeMap::new();
        let (decision, trace) = OverrideEngine::new().apply(&query(&dims), &[], false);
        assert_eq!(decision.final_metric, Some(CanonicalMetric::Revenue));
        assert!(!decision.was_overridden);
        assert!(trace.is_none());
    }

    #[test]
    fn test_higher_scope_always_wins() {
        let dims = BTreeMap::new();
        let rules = vec![
            rule("global-1", OverrideScope::Global, 100),
            rule("industry-1", OverrideScope::Industry, 100),
            rule("company-1", OverrideScope::Company, 100),
            rule("analyst-1", OverrideScope::Analyst, 1),
        ];

        let (decision, _) = OverrideEngine::new().apply(&query(&dims), &rules, false);
        assert_eq!(decision.applied_scope, Some(OverrideScope::Analyst));
        assert_eq!(decision.applied_rule_id.as_deref(), Some("analyst-1"));
    }

    #[test]
    fn test_priority_then_rule_id_total_order() {
        let dims = BTreeMap::new();
        let mut high = rule("b-rule", OverrideScope::Global, 10);
        high.target_metric = Some(CanonicalMetric::NetIncome);
        let low = rule("a-low", OverrideScope::Global, 5);
        let tie = rule("a-rule", OverrideScope::Global, 10);

        let (decision, _) =
            OverrideEngine::new().apply(&query(&dims), &[high, low, tie], false);
        // Equal priority resolves by ascending rule id.
        assert_eq!(decision.applied_rule_id.as_deref(), Some("a-rule"));
    }

    #[test]
    fn test_taxonomy_filter() {
        let dims = BTreeMap::new();
        let mut pinned = rule("pinned", OverrideScope::Global, 1);
        pinned.source_taxonomy = Some("US_GAAP_1999".to_string());

        let (decision, trace) = OverrideEngine::new().apply(&query(&dims), &[pinned], true);
        assert!(!decision.was_overridden);
        let trace = trace.unwrap();
        assert_eq!(trace.considered_rules.len(), 1);
        assert_eq!(
            trace.considered_rules[0].reason,
            Some(MatchFailure::TaxonomyMismatch)
        );
    }

    #[test]
    fn test_global_rule_with_entity_qualifiers_is_rejected() {
        let dims = BTreeMap::new();
        let mut tainted = rule("tainted", OverrideScope::Global, 1);
        tainted.match_cik = Some("0000123456".to_string());

        let (decision, trace) = OverrideEngine::new().apply(&query(&dims), &[tainted], true);
        assert!(!decision.was_overridden);
        assert_eq!(
            trace.unwrap().considered_rules[0].reason,
            Some(MatchFailure::GlobalRuleHasEntityQualifiers)
        );
    }

    #[test]
    fn test_dimension_subset_matching() {
        let mut rule_dims = BTreeMap::new();
        rule_dims.insert("segment".to_string(), "US".to_string());
        let mut segmented = rule("segmented", OverrideScope::Global, 1);
        segmented.match_dimensions = rule_dims;

        // Fact without the dimension does not match.
        let empty = BTreeMap::new();
        let (decision, _) = OverrideEngine::new().apply(&query(&empty), &[segmented.clone()], false);
        assert!(!decision.was_overridden);

        // Fact with a superset of the required dimensions matches.
        let mut fact_dims = BTreeMap::new();
        fact_dims.insert("segment".to_string(), "US".to_string());
        fact_dims.insert("scenario".to_string(), "ACTUAL".to_string());
        let (decision, _) = OverrideEngine::new().apply(&query(&fact_dims), &[segmented], false);
        assert_eq!(decision.final_metric, Some(CanonicalMetric::OperatingIncome));
        assert!(decision.was_overridden);
    }

    #[test]
    fn test_suppression() {
        let dims = BTreeMap::new();
        let mut suppress = rule("suppress", OverrideScope::Company, 1);
        suppress.is_suppression = true;

        let (decision, _) = OverrideEngine::new().apply(&query(&dims), &[suppress], false);
        assert_eq!(decision.final_metric, None);
        assert!(decision.was_overridden);

        // A rule with no target metric suppresses as well.
        let mut no_target = rule("no-target", OverrideScope::Company, 1);
        no_target.target_metric = None;
        let (decision, _) = OverrideEngine::new().apply(&query(&dims), &[no_target], false);
        assert_eq!(decision.final_metric, None);
    }

    #[test]
    fn test_debug_trace_does_not_change_decision() {
        let dims = BTreeMap::new();
        let rules = vec![
            rule("global-1", OverrideScope::Global, 1),
            rule("company-1", OverrideScope::Company, 1),
        ];
        let engine = OverrideEngine::new();
        let (plain, _) = engine.apply(&query(&dims), &rules, false);
        let (debugged, trace) = engine.apply(&query(&dims), &rules, true);
        assert_eq!(plain, debugged);
        assert!(trace.is_some());
    }
}
