//! Filing-ingestion pipeline glue.
//!
//! Bridges a parsed [`XbrlDocument`] into the normalizer's input shape:
//! resolves context references, maps unit measures to currency codes,
//! carries dimensional qualifiers onto facts, and drops what cannot be
//! normalized (nil facts, dangling context refs). Callers that manage
//! their own ingestion flow can use [`filing_facts`] directly; the
//! [`normalize_filing`] convenience runs parse → bridge → normalize in
//! one call.

use chrono::NaiveDate;
use hobart_normalize::{
    AccountingStandard, FilingFact, FiscalPeriod, MappingOverrideRule, NormalizationContext,
    NormalizationResult, NormalizeError, StatementNormalizer, StatementType,
};
use hobart_xbrl::{XbrlDocument, XbrlError, XbrlParser, XbrlPeriod};
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors from the combined parse → normalize pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The filing content could not be parsed as XBRL.
    #[error(transparent)]
    Parse(#[from] XbrlError),

    /// The parsed facts could not be normalized.
    #[error(transparent)]
    Normalize(#[from] NormalizeError),
}

/// Statement identity metadata for one normalization run.
///
/// This is everything [`NormalizationContext`] needs besides the facts,
/// which the pipeline derives from the parsed document.
#[derive(Debug, Clone)]
pub struct StatementMeta {
    /// Company CIK.
    pub cik: String,
    /// Statement type being normalized.
    pub statement_type: StatementType,
    /// Accounting standard.
    pub accounting_standard: AccountingStandard,
    /// Reporting period end date.
    pub statement_date: NaiveDate,
    /// Fiscal year.
    pub fiscal_year: i32,
    /// Fiscal period.
    pub fiscal_period: FiscalPeriod,
    /// Reporting currency ISO code.
    pub currency: String,
    /// Taxonomy identifier (e.g. `US_GAAP_2024`).
    pub taxonomy: String,
    /// Statement version sequence.
    pub version_sequence: i64,
    /// Industry classification for industry-scoped overrides.
    pub industry_code: Option<String>,
    /// Analyst profile identifier for analyst-scoped overrides.
    pub analyst_profile_id: Option<String>,
    /// Mapping override rules to apply during normalization.
    pub override_rules: Vec<MappingOverrideRule>,
    /// Whether to record override evaluation traces on the result.
    pub enable_override_trace: bool,
}

/// A parsed filing together with its normalization result.
#[derive(Debug, Clone)]
pub struct NormalizedFiling {
    /// The parsed XBRL document.
    pub document: XbrlDocument,
    /// The normalization result produced from the document's facts.
    pub result: NormalizationResult,
}

/// Map parsed XBRL facts into normalization inputs.
///
/// Per fact: the context ref must resolve (dangling refs are dropped),
/// nil facts are skipped, the unit measure becomes the fact's currency
/// code (`iso4217:USD` → `USD`) with `fallback_currency` used for
/// unit-less facts, period dates come from the context, and the
/// context's explicit dimensions are carried over as
/// `dimension → member` pairs.
pub fn filing_facts(document: &XbrlDocument, fallback_currency: &str) -> Vec<FilingFact> {
    let mut facts = Vec::with_capacity(document.facts.len());

    for fact in &document.facts {
        let Some(context) = document.contexts.get(&fact.context_ref) else {
            log::debug!(
                "skipping fact {} with dangling contextRef {}",
                fact.concept,
                fact.context_ref
            );
            continue;
        };

        if fact.is_nil {
            continue;
        }

        let unit = fact
            .unit_ref
            .as_ref()
            .and_then(|unit_ref| document.units.get(unit_ref))
            .map_or_else(
                || fallback_currency.to_string(),
                |unit| {
                    let measure = unit.measure.trim().to_uppercase();
                    match measure.split_once(':') {
                        Some((_, local)) => local.to_string(),
                        None => measure,
                    }
                },
            );

        let (period_start, period_end, instant_date) = match &context.period {
            XbrlPeriod::Instant { date } => (None, None, *date),
            XbrlPeriod::Duration { start, end } => (*start, *end, None),
        };

        let dimensions: BTreeMap<String, String> = context
            .dimensions
            .iter()
            .map(|d| (d.dimension.clone(), d.member.clone()))
            .collect();

        facts.push(FilingFact {
            fact_id: fact.id.clone().unwrap_or_else(|| {
                format!("{}:{}", fact.concept, fact.context_ref)
            }),
            concept: fact.concept.clone(),
            value: fact.raw_value.clone(),
            unit,
            decimals: fact.decimals,
            period_start,
            period_end,
            instant_date,
            dimensions,
        });
    }

    facts
}

/// Parse raw filing content and normalize it into a canonical payload.
///
/// # Errors
///
/// Returns [`PipelineError::Parse`] when the content is not well-formed
/// XBRL, and [`PipelineError::Normalize`] when the statement metadata is
/// invalid or a selected fact's value cannot be parsed.
pub fn normalize_filing(
    accession_id: &str,
    content: &[u8],
    meta: &StatementMeta,
) -> Result<NormalizedFiling, PipelineError> {
    let document = XbrlParser::new().parse(accession_id, content)?;
    let facts = filing_facts(&document, &meta.currency);
    log::debug!(
        "parsed filing {accession_id}: {} facts, {} contexts, {} units",
        facts.len(),
        document.contexts.len(),
        document.units.len()
    );

    let context = NormalizationContext {
        cik: meta.cik.clone(),
        statement_type: meta.statement_type,
        accounting_standard: meta.accounting_standard,
        statement_date: meta.statement_date,
        fiscal_year: meta.fiscal_year,
        fiscal_period: meta.fiscal_period,
        currency: meta.currency.clone(),
        accession_id: accession_id.to_string(),
        taxonomy: meta.taxonomy.clone(),
        version_sequence: meta.version_sequence,
        facts,
        industry_code: meta.industry_code.clone(),
        analyst_profile_id: meta.analyst_profile_id.clone(),
        override_rules: meta.override_rules.clone(),
        enable_override_trace: meta.enable_override_trace,
    };

    let result = StatementNormalizer::new().normalize(&context)?;
    for warning in &result.warnings {
        log::warn!("filing {accession_id}: {warning}");
    }

    Ok(NormalizedFiling { document, result })
}
