//! Error types for the utilbill-core library.

use thiserror::Error;

use crate::models::bill::{BillId, MeterId};

/// Main error type for the utilbill library.
#[derive(Error, Debug)]
pub enum UtilbillError {
    /// Document extraction error.
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// Normalization error.
    #[error("normalization error: {0}")]
    Normalization(#[from] NormalizationError),

    /// Invalid field pattern set.
    #[error("pattern set error: {0}")]
    PatternSet(#[from] PatternSetError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors raised while building a field pattern set.
#[derive(Error, Debug)]
pub enum PatternSetError {
    /// A field was declared without any pattern.
    #[error("field '{0}' has no patterns")]
    EmptyField(String),

    /// A pattern failed to compile.
    #[error("invalid pattern for field '{field}': {source}")]
    InvalidPattern {
        field: String,
        #[source]
        source: regex::Error,
    },

    /// The requested capture group does not exist in the pattern.
    #[error("pattern for field '{field}' has no capture group {group}")]
    MissingGroup { field: String, group: usize },
}

/// A date token was present but could not be read in any known format.
#[derive(Error, Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[error("unparsable date '{token}' (tried {tried:?})")]
pub struct DateParseError {
    /// Token as captured from the document.
    pub token: String,
    /// Format hints that were tried, in order.
    pub tried: Vec<String>,
}

/// Fatal, per-document extraction errors.
///
/// Unparsable dates are not fatal; they land in `ParsedBill::anomalies`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    /// Document text is empty or carries no readable characters.
    #[error("unreadable document '{0}'")]
    UnreadableDocument(String),
}

/// A meter type name that matches no known provider.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown meter type '{0}'")]
pub struct UnknownMeterType(pub String);

/// Errors that block turning a parsed bill into canonical entities.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NormalizationError {
    /// Meter identity cannot be derived without an account number.
    #[error("missing account number")]
    MissingAccountNumber,

    /// Month or year was not extracted.
    #[error("missing billing period")]
    MissingBillingPeriod,

    /// Total amount was not extracted.
    #[error("missing total amount")]
    MissingTotal,

    /// Total amount is below zero.
    #[error("negative total amount: {0}")]
    NegativeTotal(rust_decimal::Decimal),

    /// Concurrent write on the same bill key; safe to retry.
    #[error("conflicting write on bill {month}/{year} for meter {meter_id}")]
    Conflict { meter_id: MeterId, month: u32, year: i32 },

    /// Any other storage failure.
    #[error("storage error: {0}")]
    Storage(String),
}

/// Errors reported by a storage collaborator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Another writer touched the same bill key.
    #[error("conflicting write on bill {month}/{year} for meter {meter_id}")]
    Conflict { meter_id: MeterId, month: u32, year: i32 },

    /// Unknown meter id.
    #[error("unknown meter {0}")]
    UnknownMeter(MeterId),

    /// Unknown bill id.
    #[error("unknown bill {0}")]
    UnknownBill(BillId),
}

impl From<StoreError> for NormalizationError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict { meter_id, month, year } => {
                NormalizationError::Conflict { meter_id, month, year }
            }
            other => NormalizationError::Storage(other.to_string()),
        }
    }
}

/// Result type for the utilbill library.
pub type Result<T> = std::result::Result<T, UtilbillError>;
