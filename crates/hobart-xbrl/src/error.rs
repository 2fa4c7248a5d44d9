//! Error types for XBRL parsing.

use thiserror::Error;

/// Result type for XBRL parsing operations.
pub type Result<T> = std::result::Result<T, XbrlError>;

/// Errors that can occur while parsing an XBRL instance.
#[derive(Debug, Error)]
pub enum XbrlError {
    /// The XML content is not well-formed.
    #[error("malformed XML: {0}")]
    Xml(String),

    /// The accession identifier is missing or blank.
    #[error("accession_id must be a non-empty string")]
    EmptyAccessionId,

    /// A period date could not be parsed as an ISO calendar date.
    #[error("invalid period date: {value:?}")]
    InvalidDate {
        /// Raw date text as found in the instance.
        value: String,
    },

    /// A fact's raw value could not be parsed as a decimal number.
    #[error("fact value is not a valid decimal: {value:?}")]
    InvalidValue {
        /// Raw lexical value as found in the instance.
        value: String,
    },
}

impl From<quick_xml::Error> for XbrlError {
    fn from(err: quick_xml::Error) -> Self {
        Self::Xml(err.to_string())
    }
}
