//! Bill data models: the transient parse result and the canonical entities.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{DateParseError, UnknownMeterType};

/// Utility type of a meter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MeterType {
    /// Electricity connection (Enel).
    Electricity,
    /// Water connection (Aguas Andinas).
    Water,
}

impl MeterType {
    /// Storage code of the meter type.
    pub fn as_str(&self) -> &'static str {
        match self {
            MeterType::Electricity => "ELECTRICITY",
            MeterType::Water => "WATER",
        }
    }
}

/// Accepts the storage code or a loose provider name, case-insensitively.
impl FromStr for MeterType {
    type Err = UnknownMeterType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "ELECTRICITY" | "ELECTRICIDAD" | "ENEL" => Ok(MeterType::Electricity),
            "WATER" | "AGUA" | "AGUAS_ANDINAS" => Ok(MeterType::Water),
            _ => Err(UnknownMeterType(s.to_string())),
        }
    }
}

impl fmt::Display for MeterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifier of a stored meter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MeterId(pub u64);

impl fmt::Display for MeterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a stored bill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BillId(pub u64);

impl fmt::Display for BillId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A calendar month of a specific year. Orders chronologically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BillingPeriod {
    /// Four-digit year.
    pub year: i32,
    /// Month, 1-12.
    pub month: u32,
}

impl BillingPeriod {
    pub fn new(month: u32, year: i32) -> Self {
        Self { month, year }
    }
}

impl fmt::Display for BillingPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}-{}", self.month, self.year)
    }
}

/// One line of a bill's charge table as read from the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChargeFragment {
    /// Label of the charge line.
    pub name: String,
    /// Amount of the line.
    pub value: Decimal,
    /// Free-form classification (fixed, variable, adjustment, other).
    pub value_type: String,
    /// Position within the charge table.
    pub order: u32,
}

/// Required field that an extraction did not produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingField {
    AccountNumber,
    BillingPeriod,
    Total,
}

impl fmt::Display for MissingField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MissingField::AccountNumber => "account number",
            MissingField::BillingPeriod => "billing period",
            MissingField::Total => "total amount",
        })
    }
}

/// Provisional, possibly incomplete result of parsing one document.
///
/// Absent fields mean the pattern set found nothing for them; a bill without
/// `total_amount` is a partial extraction, not a parser failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedBill {
    /// Identifier of the source document (usually its file name).
    pub source_document_id: String,

    /// Provider the document was parsed as.
    pub meter_type: MeterType,

    /// Client account number.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_number: Option<String>,

    /// Total amount due.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_amount: Option<Decimal>,

    /// Billing month (1-12).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub month: Option<u32>,

    /// Billing year.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,

    /// Charge table lines in document order.
    #[serde(default)]
    pub charges: Vec<ChargeFragment>,

    /// Invoice (boleta) number.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invoice_number: Option<String>,

    /// Tariff code (electricity).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tarifa: Option<String>,

    /// Service address printed on the bill.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_address: Option<String>,

    /// Dates that were present but unparsable.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub anomalies: Vec<DateParseError>,

    /// Full source text, kept for diagnostics.
    #[serde(skip)]
    pub raw_text: String,
}

impl ParsedBill {
    /// Create an empty parse result for a document.
    pub fn new(source_document_id: impl Into<String>, meter_type: MeterType) -> Self {
        Self {
            source_document_id: source_document_id.into(),
            meter_type,
            account_number: None,
            total_amount: None,
            month: None,
            year: None,
            charges: Vec::new(),
            invoice_number: None,
            tarifa: None,
            service_address: None,
            anomalies: Vec::new(),
            raw_text: String::new(),
        }
    }

    /// Billing period, when both month and year were extracted.
    pub fn period(&self) -> Option<BillingPeriod> {
        match (self.month, self.year) {
            (Some(month), Some(year)) => Some(BillingPeriod::new(month, year)),
            _ => None,
        }
    }

    /// Required fields absent from this parse, in normalization order.
    pub fn missing_fields(&self) -> Vec<MissingField> {
        let mut missing = Vec::new();
        if self.account_number.is_none() {
            missing.push(MissingField::AccountNumber);
        }
        if self.period().is_none() {
            missing.push(MissingField::BillingPeriod);
        }
        if self.total_amount.is_none() {
            missing.push(MissingField::Total);
        }
        missing
    }

    /// Whether every required field was extracted.
    pub fn is_complete(&self) -> bool {
        self.missing_fields().is_empty()
    }
}

/// Descriptive meter fields, enriched first-writer-wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeterDetails {
    pub name: String,
    pub macrozona: String,
    pub instalacion: String,
    pub direccion: String,
}

impl MeterDetails {
    /// Fill empty fields from `other`, or replace all non-empty ones when `overwrite`.
    pub fn merge(&mut self, other: &MeterDetails, overwrite: bool) {
        fn merge_field(slot: &mut String, value: &str, overwrite: bool) {
            if value.is_empty() {
                return;
            }
            if slot.is_empty() || overwrite {
                *slot = value.to_string();
            }
        }

        merge_field(&mut self.name, &other.name, overwrite);
        merge_field(&mut self.macrozona, &other.macrozona, overwrite);
        merge_field(&mut self.instalacion, &other.instalacion, overwrite);
        merge_field(&mut self.direccion, &other.direccion, overwrite);
    }

    /// Best display name for the meter.
    pub fn display_name(&self) -> Option<&str> {
        [&self.name, &self.instalacion]
            .into_iter()
            .find(|s| !s.is_empty())
            .map(|s| s.as_str())
    }
}

/// A billed utility connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meter {
    pub id: MeterId,
    pub client_number: String,
    pub meter_type: MeterType,
    pub details: MeterDetails,
}

impl fmt::Display for Meter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.details.display_name().unwrap_or("Sin nombre");
        write!(f, "{} ({})", name, self.client_number)
    }
}

/// Non-key attributes of a bill.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pdf_filename: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tarifa: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invoice_number: Option<String>,
}

/// One billing statement for a meter and month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bill {
    pub id: BillId,
    pub meter_id: MeterId,
    pub month: u32,
    pub year: i32,
    pub total_to_pay: Decimal,
    pub metadata: BillMetadata,
}

impl Bill {
    pub fn period(&self) -> BillingPeriod {
        BillingPeriod::new(self.month, self.year)
    }
}

/// A stored line item of a bill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Charge {
    pub bill_id: BillId,
    pub name: String,
    pub value: Decimal,
    pub value_type: String,
    pub order: u32,
}

impl Charge {
    pub fn from_fragment(bill_id: BillId, fragment: &ChargeFragment) -> Self {
        Self {
            bill_id,
            name: fragment.name.clone(),
            value: fragment.value,
            value_type: fragment.value_type.clone(),
            order: fragment.order,
        }
    }
}
