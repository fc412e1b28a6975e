//! Rule-based helpers shared by the provider parsers.

pub mod amounts;
pub mod charges;
pub mod dates;
pub mod patterns;

pub use amounts::{AmountFormat, format_clp_amount, parse_clp_amount};
pub use charges::{ChargeClass, ChargeTableLayout, scan_charges};
pub use dates::{DateFormat, DateNormalizer, normalize_date};
