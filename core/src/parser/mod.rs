//! Scan report parsing and normalization.
//!
//! `xml` turns report text into a loosely-shaped tree, `normalizer` coerces
//! that tree into a [`ScanDocument`] and extracts domain records from it.

mod document;
pub mod normalizer;
pub mod xml;

pub use document::ScanDocument;
pub use normalizer::{as_list, ScanDocumentNormalizer};
