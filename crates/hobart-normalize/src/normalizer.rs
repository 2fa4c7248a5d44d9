//! Canonical statement normalization engine.
//!
//! Turns provider-normalized filing facts into a
//! [`CanonicalStatementPayload`] by walking the canonical metric registry
//! in order, trying each metric's candidate source concepts, and applying
//! mapping overrides. Behavior is deterministic: no reliance on input
//! ordering, no randomness. Missing metrics degrade to warnings; garbled
//! numeric values fail the whole call, because propagating a wrong number
//! is worse than failing loudly.

use crate::error::{NormalizeError, Result};
use crate::overrides::{MappingOverrideRule, OverrideEngine, OverrideQuery, OverrideTrace};
use crate::registry::canonical_metrics;
use crate::statement::{
    AccountingStandard, CanonicalMetric, CanonicalStatementPayload, FiscalPeriod, StatementType,
};
use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;

/// Version identifier stamped on normalization results.
pub const PAYLOAD_VERSION: &str = "v1";

/// A provider-normalized fact ready for canonicalization.
///
/// Upstream adapters map raw XBRL facts into this shape before invoking
/// the normalizer; see the pipeline crate for the standard bridge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilingFact {
    /// Stable identifier for the fact, used for traceability and as the
    /// deterministic tiebreak between same-date duplicates.
    pub fact_id: String,
    /// XBRL concept QName (e.g. `us-gaap:Revenues`).
    pub concept: String,
    /// Raw numeric value as text, safe to parse as a decimal.
    pub value: String,
    /// Unit identifier (e.g. `USD`, `shares`, `pure`).
    pub unit: String,
    /// Optional decimals precision hint.
    pub decimals: Option<u32>,
    /// Period start for duration facts.
    pub period_start: Option<NaiveDate>,
    /// Period end for duration facts.
    pub period_end: Option<NaiveDate>,
    /// Instant date for instant facts.
    pub instant_date: Option<NaiveDate>,
    /// Dimensional qualifiers for the fact.
    pub dimensions: BTreeMap<String, String>,
}

impl FilingFact {
    /// The date used for most-recent-wins selection: the period end, or
    /// the instant date for instant facts.
    pub const fn reference_date(&self) -> Option<NaiveDate> {
        match self.period_end {
            Some(date) => Some(date),
            None => self.instant_date,
        }
    }
}

/// Confidence level for a canonical metric mapping.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, derive_more::Display,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MetricConfidence {
    /// Direct mapping from a registered source concept.
    #[display("HIGH")]
    High,
    /// Mapping involved heuristics or fallbacks.
    #[display("MEDIUM")]
    Medium,
    /// Weak or speculative mapping.
    #[display("LOW")]
    Low,
}

/// Resolved canonical metric value and provenance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricRecord {
    /// Canonical metric identifier (after any override remapping).
    pub metric: CanonicalMetric,
    /// Normalized value in full reporting units.
    pub value: Decimal,
    /// Canonical unit string (e.g. `USD`, `SHARE`, `RATIO`).
    pub unit: String,
    /// Confidence level for the mapping.
    pub confidence: MetricConfidence,
    /// Fact identifiers that contributed to this metric (usually one).
    pub source_fact_ids: Vec<String>,
}

/// Input context for canonical statement normalization.
#[derive(Debug, Clone)]
pub struct NormalizationContext {
    /// Company CIK for which this statement is being normalized.
    pub cik: String,
    /// Statement type.
    pub statement_type: StatementType,
    /// Accounting standard.
    pub accounting_standard: AccountingStandard,
    /// Reporting period end date.
    pub statement_date: NaiveDate,
    /// Fiscal year; must be positive.
    pub fiscal_year: i32,
    /// Fiscal period.
    pub fiscal_period: FiscalPeriod,
    /// Reporting currency ISO code; must be non-blank.
    pub currency: String,
    /// Accession id of the underlying filing.
    pub accession_id: String,
    /// Taxonomy identifier (e.g. `US_GAAP_2024`); must be non-blank.
    pub taxonomy: String,
    /// Statement version sequence; must be positive.
    pub version_sequence: i64,
    /// Candidate facts for this statement.
    pub facts: Vec<FilingFact>,
    /// Industry classification for industry-scoped overrides.
    pub industry_code: Option<String>,
    /// Analyst profile identifier for analyst-scoped overrides.
    pub analyst_profile_id: Option<String>,
    /// Override rules to consider; empty disables override evaluation.
    pub override_rules: Vec<MappingOverrideRule>,
    /// When true, override evaluations record diagnostic traces on the
    /// result. Tracing never affects the produced payload.
    pub enable_override_trace: bool,
}

/// Result of canonical statement normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizationResult {
    /// The produced canonical payload.
    pub payload: CanonicalStatementPayload,
    /// Version identifier for the normalization algorithm and payload schema.
    pub payload_version: String,
    /// Resolved metric records keyed by canonical metric.
    pub metric_records: BTreeMap<CanonicalMetric, MetricRecord>,
    /// Non-fatal anomalies: unresolvable or suppressed metrics.
    pub warnings: Vec<String>,
    /// Override evaluation traces, populated only when tracing is enabled.
    pub override_traces: Vec<OverrideTrace>,
}

/// Canonical statement normalization engine.
#[derive(Debug, Clone)]
pub struct StatementNormalizer {
    payload_version: String,
    override_engine: OverrideEngine,
}

impl Default for StatementNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl StatementNormalizer {
    /// Creates a normalizer stamping [`PAYLOAD_VERSION`] on its results.
    pub fn new() -> Self {
        Self {
            payload_version: PAYLOAD_VERSION.to_string(),
            override_engine: OverrideEngine::new(),
        }
    }

    /// Creates a normalizer with a custom payload version stamp.
    pub fn with_payload_version(payload_version: impl Into<String>) -> Self {
        Self {
            payload_version: payload_version.into(),
            override_engine: OverrideEngine::new(),
        }
    }

    /// Normalize filing facts into a canonical statement payload.
    ///
    /// # Errors
    ///
    /// Fails fast on invalid identity metadata (blank cik/currency/
    /// taxonomy, non-positive fiscal year or version sequence) and on any
    /// selected fact whose value cannot be parsed as a decimal.
    pub fn normalize(&self, context: &NormalizationContext) -> Result<NormalizationResult> {
        validate_context(context)?;

        let mut facts_by_concept: HashMap<&str, Vec<&FilingFact>> = HashMap::new();
        for fact in &context.facts {
            facts_by_concept.entry(fact.concept.as_str()).or_default().push(fact);
        }

        let mut metric_records: BTreeMap<CanonicalMetric, MetricRecord> = BTreeMap::new();
        let mut warnings: Vec<String> = Vec::new();
        let mut override_traces: Vec<OverrideTrace> = Vec::new();

        for entry in canonical_metrics() {
            if entry.source_concepts.is_empty() {
                continue;
            }
            let resolved = self.resolve_metric(
                entry.metric,
                entry.source_concepts,
                context,
                &facts_by_concept,
                &mut override_traces,
            )?;
            match resolved {
                Resolution::Record(record) => {
                    // Keyed by the record's metric so override remapping
                    // between canonical metrics lands on the right slot.
                    metric_records.insert(record.metric, record);
                }
                Resolution::Warning(warning) => warnings.push(warning),
            }
        }

        let core_metrics: BTreeMap<CanonicalMetric, Decimal> = metric_records
            .iter()
            .map(|(metric, record)| (*metric, record.value))
            .collect();

        let mut dimensions = BTreeMap::new();
        dimensions.insert("consolidation".to_string(), "CONSOLIDATED".to_string());

        let payload = CanonicalStatementPayload {
            cik: context.cik.clone(),
            statement_type: context.statement_type,
            accounting_standard: context.accounting_standard,
            statement_date: context.statement_date,
            fiscal_year: context.fiscal_year,
            fiscal_period: context.fiscal_period,
            currency: context.currency.clone(),
            unit_multiplier: 0,
            core_metrics,
            extra_metrics: BTreeMap::new(),
            dimensions,
            source_accession_id: context.accession_id.clone(),
            source_taxonomy: context.taxonomy.clone(),
            source_version_sequence: context.version_sequence,
        };

        Ok(NormalizationResult {
            payload,
            payload_version: self.payload_version.clone(),
            metric_records,
            warnings,
            override_traces,
        })
    }

    fn resolve_metric(
        &self,
        metric: CanonicalMetric,
        concepts: &[&str],
        context: &NormalizationContext,
        facts_by_concept: &HashMap<&str, Vec<&FilingFact>>,
        override_traces: &mut Vec<OverrideTrace>,
    ) -> Result<Resolution> {
        for &concept in concepts {
            let Some(all_candidates) = facts_by_concept.get(concept) else {
                continue;
            };

            // Prefer facts matching the reporting currency when possible.
            let currency = context.currency.trim().to_uppercase();
            let mut candidates: Vec<&FilingFact> = all_candidates
                .iter()
                .copied()
                .filter(|f| f.unit.trim().to_uppercase() == currency)
                .collect();
            if candidates.is_empty() {
                candidates = all_candidates.clone();
            }

            // Most-recent-wins, with fact id as a stable tiebreak for
            // same-date duplicates.
            candidates.sort_by(|a, b| {
                (a.reference_date(), a.fact_id.as_str())
                    .cmp(&(b.reference_date(), b.fact_id.as_str()))
            });
            let chosen = candidates[candidates.len() - 1];

            let value = parse_decimal(&chosen.value, chosen.decimals).ok_or_else(|| {
                NormalizeError::ValueParse {
                    metric,
                    concept: concept.to_string(),
                    fact_id: chosen.fact_id.clone(),
                    value: chosen.value.clone(),
                }
            })?;

            let mut effective_metric = metric;
            if !context.override_rules.is_empty() {
                let query = OverrideQuery {
                    concept,
                    taxonomy: &context.taxonomy,
                    fact_dimensions: &chosen.dimensions,
                    cik: &context.cik,
                    industry_code: context.industry_code.as_deref(),
                    analyst_id: context.analyst_profile_id.as_deref(),
                    base_metric: Some(metric),
                };
                let (decision, trace) = self.override_engine.apply(
                    &query,
                    &context.override_rules,
                    context.enable_override_trace,
                );
                if let Some(trace) = trace {
                    override_traces.push(trace);
                }

                match decision.final_metric {
                    None => {
                        let scope = decision
                            .applied_scope
                            .map_or_else(|| "NONE".to_string(), |s| s.to_string());
                        let rule_id = decision.applied_rule_id.unwrap_or_default();
                        return Ok(Resolution::Warning(format!(
                            "canonical metric {metric} suppressed by override; \
                             scope={scope}, rule_id={rule_id}"
                        )));
                    }
                    Some(final_metric) => effective_metric = final_metric,
                }
            }

            return Ok(Resolution::Record(MetricRecord {
                metric: effective_metric,
                value,
                unit: canonicalize_unit(&chosen.unit),
                confidence: MetricConfidence::High,
                source_fact_ids: vec![chosen.fact_id.clone()],
            }));
        }

        Ok(Resolution::Warning(format!(
            "canonical metric {metric} could not be resolved; \
             no candidate facts found for registered concepts."
        )))
    }
}

enum Resolution {
    Record(MetricRecord),
    Warning(String),
}

fn validate_context(context: &NormalizationContext) -> Result<()> {
    if context.cik.trim().is_empty() {
        return Err(NormalizeError::EmptyCik);
    }
    if context.currency.trim().is_empty() {
        return Err(NormalizeError::EmptyCurrency);
    }
    if context.fiscal_year <= 0 {
        return Err(NormalizeError::InvalidFiscalYear(context.fiscal_year));
    }
    if context.taxonomy.trim().is_empty() {
        return Err(NormalizeError::EmptyTaxonomy);
    }
    if context.version_sequence <= 0 {
        return Err(NormalizeError::InvalidVersionSequence(context.version_sequence));
    }
    Ok(())
}

/// Parse a numeric string into a decimal with deterministic rounding.
fn parse_decimal(value: &str, decimals: Option<u32>) -> Option<Decimal> {
    let text = value.trim();
    let parsed = Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .ok()?;
    Some(match decimals {
        Some(d) => parsed.round_dp_with_strategy(d, RoundingStrategy::MidpointNearestEven),
        None => parsed,
    })
}

/// Canonicalize a unit string into a stable identifier.
fn canonicalize_unit(unit: &str) -> String {
    let cleaned = unit.trim().to_uppercase();
    match cleaned.as_str() {
        "USD" | "US DOLLAR" | "US$" | "$" => "USD".to_string(),
        "SHARES" | "SHARE" => "SHARE".to_string(),
        "PURE" => "RATIO".to_string(),
        _ => cleaned,
    }
}
