//! Errors raised while building a CSV export.

use store::StoreError;
use thiserror::Error;

/// What can go wrong when exporting data.
///
/// The first two variants are caller mistakes and are kept distinct
/// from store failures so the HTTP layer can answer 400 rather than
/// 500.
#[derive(Debug, Error)]
pub enum ExportError {
    /// The requested data type is not one of product, order, purchase.
    #[error("unknown data type: {0}")]
    UnknownDataType(String),

    /// The start date did not parse as YYYY-MM-DD.
    #[error("invalid start date: {0}")]
    InvalidDate(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("csv write failed: {0}")]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, ExportError>;
