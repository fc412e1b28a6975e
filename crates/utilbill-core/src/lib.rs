//! Core library for Chilean utility bill processing.
//!
//! This crate provides:
//! - Provider bill parsing (Aguas Andinas water, Enel electricity)
//! - Spanish date normalization and CLP amount parsing
//! - Normalization into meters, bills and charges with replace-not-merge charges
//! - Batch runs with per-document outcome isolation

pub mod error;
pub mod models;
pub mod bill;
pub mod normalize;
pub mod batch;
pub mod source;

pub use error::{
    DateParseError, ExtractionError, NormalizationError, PatternSetError, Result, StoreError,
    UnknownMeterType, UtilbillError,
};
pub use models::bill::{
    Bill, BillId, BillMetadata, BillingPeriod, Charge, ChargeFragment, Meter, MeterDetails,
    MeterId, MeterType, MissingField, ParsedBill,
};
pub use models::config::UtilbillConfig;
pub use bill::{BillParser, FieldPatternSet, ProviderParser, ProviderProfile, TextFieldExtractor};
pub use normalize::{BillNormalizer, BillStore, MemoryStore};
pub use batch::{BatchOutcome, BatchRunner, BatchSummary};
pub use source::{Document, DocumentSource};
