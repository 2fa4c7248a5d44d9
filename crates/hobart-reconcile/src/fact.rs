//! Fact-level detail backing a normalized statement.

use chrono::NaiveDate;
use hobart_normalize::{AccountingStandard, FiscalPeriod, StatementType};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A normalized fact derived from a canonical statement version.
///
/// Fact-level detail lets dimension-aware rules (segment rollups) see
/// individual slices that the payload's aggregate metrics cannot express.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedFact {
    /// Central Index Key for the filer.
    pub cik: String,
    /// Statement type.
    pub statement_type: StatementType,
    /// Accounting standard used.
    pub accounting_standard: AccountingStandard,
    /// Fiscal year associated with the statement.
    pub fiscal_year: i32,
    /// Fiscal period within the year.
    pub fiscal_period: FiscalPeriod,
    /// Reporting period end date.
    pub statement_date: NaiveDate,
    /// Statement version sequence from the payload identity.
    pub version_sequence: i64,
    /// Canonical metric code (e.g. `REVENUE`).
    pub metric_code: String,
    /// Human-readable label for the metric, when available.
    pub metric_label: Option<String>,
    /// Unit code for the value, typically ISO 4217.
    pub unit: String,
    /// Inclusive start date of the fact's reporting period, when known.
    pub period_start: Option<NaiveDate>,
    /// Inclusive end date of the fact's reporting period.
    pub period_end: NaiveDate,
    /// Value in full units.
    pub value: Decimal,
    /// Dimensional context for the fact (e.g. `{"segment": "US"}`).
    pub dimensions: BTreeMap<String, String>,
    /// Deterministic key derived from `dimensions`, uniquely identifying
    /// the dimensional slice.
    pub dimension_key: String,
    /// Source line-item label from the filing, when available.
    pub source_line_item: Option<String>,
}

impl NormalizedFact {
    /// Build the canonical dimension key for a dimension map:
    /// `key=value` pairs joined by `|` in key order, or `-` when empty.
    pub fn dimension_key_for(dimensions: &BTreeMap<String, String>) -> String {
        if dimensions.is_empty() {
            return "-".to_string();
        }
        dimensions
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("|")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimension_key_is_deterministic() {
        let mut dims = BTreeMap::new();
        assert_eq!(NormalizedFact::dimension_key_for(&dims), "-");

        dims.insert("segment".to_string(), "US".to_string());
        dims.insert("product".to_string(), "HW".to_string());
        // Key order, not insertion order.
        assert_eq!(
            NormalizedFact::dimension_key_for(&dims),
            "product=HW|segment=US"
        );
    }
}
