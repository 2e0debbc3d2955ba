//! Error types for series alignment.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SeriesError {
    /// A bucket date matched none of the accepted formats.
    #[error("Unrecognized bucket date '{input}'")]
    DateParseFailure { input: String },
}
