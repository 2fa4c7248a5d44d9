//! Domain model for parsed XBRL instance documents.
//!
//! These types are immutable value objects: the parser builds a document
//! once and callers only ever read from it. Monetary values stay in their
//! raw lexical form on [`XbrlFact`] and are converted to `Decimal` on
//! demand so that a single garbled number cannot poison a whole parse.

use crate::error::{Result, XbrlError};
use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

/// XBRL reporting period: a single instant, or a start/end duration.
///
/// The two shapes are mutually exclusive by construction. Dates may be
/// absent for synthetic or partially specified contexts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum XbrlPeriod {
    /// Point-in-time period (balance-sheet style facts).
    Instant {
        /// Instant date, when specified.
        date: Option<NaiveDate>,
    },
    /// Duration period (income-statement / cash-flow style facts).
    Duration {
        /// Period start date, when specified.
        start: Option<NaiveDate>,
        /// Period end date, when specified.
        end: Option<NaiveDate>,
    },
}

impl XbrlPeriod {
    /// Returns true for instant periods.
    pub const fn is_instant(&self) -> bool {
        matches!(self, Self::Instant { .. })
    }

    /// The date most representative of this period: the instant date, or
    /// the duration end date.
    pub const fn reference_date(&self) -> Option<NaiveDate> {
        match self {
            Self::Instant { date } => *date,
            Self::Duration { end, .. } => *end,
        }
    }
}

/// Explicit dimension member attached to a context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct XbrlDimension {
    /// Dimension QName (e.g. `us-gaap:StatementBusinessSegmentsAxis`).
    pub dimension: String,
    /// Member QName (e.g. `us-gaap:CommonStockMember`).
    pub member: String,
}

/// XBRL context: entity + period + dimensional qualifiers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct XbrlContext {
    /// Context identifier referenced by facts via `contextRef`.
    pub id: String,
    /// Entity identifier (CIK, LEI, ...); may be empty for synthetic contexts.
    pub entity_identifier: String,
    /// Reporting period for the context.
    pub period: XbrlPeriod,
    /// Explicit dimensions from the context's `segment` element, in document order.
    pub dimensions: Vec<XbrlDimension>,
}

/// XBRL unit definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct XbrlUnit {
    /// Unit identifier referenced by facts via `unitRef`.
    pub id: String,
    /// Measure QName (e.g. `iso4217:USD`, `xbrli:pure`).
    pub measure: String,
}

/// A single reported fact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct XbrlFact {
    /// Optional fact identifier; absent in many instances.
    pub id: Option<String>,
    /// Concept QName (e.g. `us-gaap:Revenues`).
    pub concept: String,
    /// Referenced context id.
    pub context_ref: String,
    /// Referenced unit id, or None for unit-less facts.
    pub unit_ref: Option<String>,
    /// Raw lexical value exactly as found in the instance.
    pub raw_value: String,
    /// `decimals` precision hint, when present and a non-negative integer.
    pub decimals: Option<u32>,
    /// `precision` hint, when present and a non-negative integer.
    pub precision: Option<u32>,
    /// Whether the fact is explicitly nil (`xsi:nil="true"`).
    pub is_nil: bool,
    /// Footnote ids referenced by the fact. Currently always empty.
    pub footnote_refs: Vec<String>,
}

impl XbrlFact {
    /// Convert the raw value into a `Decimal`.
    ///
    /// Nil and blank facts yield `None`. When a `decimals` hint is present
    /// the value is quantized to that many fractional digits (half-up).
    ///
    /// # Errors
    ///
    /// Returns [`XbrlError::InvalidValue`] when the raw value is non-empty
    /// but not parseable as a decimal number.
    pub fn to_decimal(&self) -> Result<Option<Decimal>> {
        if self.is_nil {
            return Ok(None);
        }

        let text = self.raw_value.trim();
        if text.is_empty() {
            return Ok(None);
        }

        let value = Decimal::from_str(text)
            .or_else(|_| Decimal::from_scientific(text))
            .map_err(|_| XbrlError::InvalidValue {
                value: self.raw_value.clone(),
            })?;

        let value = match self.decimals {
            Some(decimals) => {
                value.round_dp_with_strategy(decimals, RoundingStrategy::MidpointAwayFromZero)
            }
            None => value,
        };

        Ok(Some(value))
    }
}

/// Label resource attached to a concept via the label linkbase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct XbrlLabel {
    /// Concept QName this label describes.
    pub concept: String,
    /// Label role URI (standard, terse, verbose, ...).
    pub role: String,
    /// Human-readable label text.
    pub text: String,
}

/// Presentation linkbase arc connecting a parent concept to a child.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct XbrlPresentationArc {
    /// Extended link role URI identifying the presentation network.
    pub role: String,
    /// Parent concept QName.
    pub parent: String,
    /// Child concept QName.
    pub child: String,
    /// Numeric presentation order within the parent.
    pub order: f64,
}

/// Aggregated label and presentation networks for one instance document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct XbrlLinkbases {
    /// Labels grouped by concept QName, in document order.
    pub labels_by_concept: BTreeMap<String, Vec<XbrlLabel>>,
    /// Presentation arcs across all extended link roles, in document order.
    pub presentation_arcs: Vec<XbrlPresentationArc>,
}

impl XbrlLinkbases {
    /// Returns true when no linkbase content was found in the document.
    pub fn is_empty(&self) -> bool {
        self.labels_by_concept.is_empty() && self.presentation_arcs.is_empty()
    }
}

/// Parsed XBRL instance document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct XbrlDocument {
    /// Accession identifier associated with the filing.
    pub accession_id: String,
    /// Contexts keyed by context id.
    pub contexts: BTreeMap<String, XbrlContext>,
    /// Units keyed by unit id.
    pub units: BTreeMap<String, XbrlUnit>,
    /// Facts in document order.
    pub facts: Vec<XbrlFact>,
    /// Label and presentation linkbase networks embedded in the document.
    pub linkbases: XbrlLinkbases,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn fact(raw_value: &str, decimals: Option<u32>, is_nil: bool) -> XbrlFact {
        XbrlFact {
            id: None,
            concept: "us-gaap:Revenues".to_string(),
            context_ref: "c1".to_string(),
            unit_ref: Some("usd".to_string()),
            raw_value: raw_value.to_string(),
            decimals,
            precision: None,
            is_nil,
            footnote_refs: Vec::new(),
        }
    }

    #[test]
    fn test_to_decimal_plain() {
        let value = fact("1234.5", None, false).to_decimal().unwrap();
        assert_eq!(value, Some(dec!(1234.5)));
    }

    #[test]
    fn test_to_decimal_quantizes_with_hint() {
        let value = fact("1234.567", Some(2), false).to_decimal().unwrap();
        assert_eq!(value, Some(dec!(1234.57)));
    }

    #[test]
    fn test_to_decimal_nil_and_blank_are_none() {
        assert_eq!(fact("123", None, true).to_decimal().unwrap(), None);
        assert_eq!(fact("   ", None, false).to_decimal().unwrap(), None);
    }

    #[test]
    fn test_to_decimal_rejects_garbage() {
        let err = fact("12x4", None, false).to_decimal().unwrap_err();
        assert!(matches!(err, XbrlError::InvalidValue { .. }));
    }

    #[test]
    fn test_period_reference_date() {
        let instant = XbrlPeriod::Instant {
            date: NaiveDate::from_ymd_opt(2023, 12, 31),
        };
        let duration = XbrlPeriod::Duration {
            start: NaiveDate::from_ymd_opt(2023, 1, 1),
            end: NaiveDate::from_ymd_opt(2023, 12, 31),
        };

        assert!(instant.is_instant());
        assert!(!duration.is_instant());
        assert_eq!(instant.reference_date(), NaiveDate::from_ymd_opt(2023, 12, 31));
        assert_eq!(duration.reference_date(), NaiveDate::from_ymd_opt(2023, 12, 31));
    }
}
