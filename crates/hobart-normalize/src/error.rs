//! Error types for statement normalization.

use crate::statement::CanonicalMetric;
use thiserror::Error;

/// Result type for normalization operations.
pub type Result<T> = std::result::Result<T, NormalizeError>;

/// Errors that can occur while normalizing a statement.
///
/// All variants are fatal for the normalization call that raised them;
/// non-fatal conditions (an unresolvable metric, a suppressed mapping)
/// are surfaced as warnings on the result instead.
#[derive(Debug, Error)]
pub enum NormalizeError {
    /// The entity identifier (CIK) is missing or blank.
    #[error("cik must be a non-empty string")]
    EmptyCik,

    /// The reporting currency is missing or blank.
    #[error("currency must be a non-empty ISO code")]
    EmptyCurrency,

    /// The fiscal year is not positive.
    #[error("fiscal_year must be positive; got {0}")]
    InvalidFiscalYear(i32),

    /// The taxonomy identifier is missing or blank.
    #[error("taxonomy must be a non-empty string")]
    EmptyTaxonomy,

    /// The statement version sequence is not positive.
    #[error("version_sequence must be positive; got {0}")]
    InvalidVersionSequence(i64),

    /// A selected fact's textual value could not be parsed as a decimal.
    ///
    /// This is intentionally fatal: a garbled number must not silently
    /// become zero.
    #[error(
        "failed to parse value for metric {metric} (concept {concept}, fact {fact_id}): {value:?}"
    )]
    ValueParse {
        /// Canonical metric being resolved when the parse failed.
        metric: CanonicalMetric,
        /// Source concept of the selected fact.
        concept: String,
        /// Identifier of the selected fact.
        fact_id: String,
        /// Raw value that failed to parse.
        value: String,
    },
}
