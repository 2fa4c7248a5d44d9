#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/hobart/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod linkbase;
pub mod model;
pub mod parser;

pub use error::{Result, XbrlError};
pub use model::{
    XbrlContext, XbrlDimension, XbrlDocument, XbrlFact, XbrlLabel, XbrlLinkbases, XbrlPeriod,
    XbrlPresentationArc, XbrlUnit,
};
pub use parser::XbrlParser;

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
