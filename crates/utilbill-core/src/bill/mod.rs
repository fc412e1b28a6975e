//! Bill field extraction module.

pub mod extractor;
mod parser;
pub mod providers;
pub mod rules;

pub use extractor::{ExtractedFields, FieldPatternSet, TextFieldExtractor};
pub use parser::{BillParser, ProviderParser};
pub use providers::ProviderProfile;

use crate::error::ExtractionError;

/// Result type for extraction operations.
pub type Result<T> = std::result::Result<T, ExtractionError>;

/// Field names used by the provider pattern sets.
pub mod fields {
    pub const TOTAL_AMOUNT: &str = "total_amount";
    pub const ACCOUNT_NUMBER: &str = "account_number";
    pub const EMISSION_DATE: &str = "emission_date";
    pub const DUE_DATE: &str = "due_date";
    pub const INVOICE_NUMBER: &str = "invoice_number";
    pub const TARIFF: &str = "tarifa";
    pub const SERVICE_ADDRESS: &str = "service_address";
}
