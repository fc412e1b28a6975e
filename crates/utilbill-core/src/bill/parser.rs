//! Provider bill parser combining the field extractor, date normalizer,
//! amount parsing and charge table scanning.

use std::time::Instant;

use tracing::{debug, info, warn};

use crate::models::bill::{MeterType, ParsedBill};
use crate::models::config::ExtractionConfig;

use super::extractor::{ExtractedFields, TextFieldExtractor};
use super::fields;
use super::providers::ProviderProfile;
use super::rules::charges::scan_charges;
use super::rules::dates::{DateFormat, DateNormalizer};
use super::Result;
use crate::error::ExtractionError;

/// Trait for bill parsing.
pub trait BillParser {
    /// Parse one document's page text.
    ///
    /// Missing optional fields are reported as absent; only empty or
    /// unreadable text is an error.
    fn parse(&self, document_text: &str, source_document_id: &str) -> Result<ParsedBill>;
}

/// Parser for one provider, selected by meter type.
#[derive(Debug, Clone)]
pub struct ProviderParser {
    profile: ProviderProfile,
    /// Overrides the provider's date formats when set.
    date_formats: Option<Vec<DateFormat>>,
    /// Try the due date when the emission date does not parse.
    fallback_on_date_error: bool,
    extractor: TextFieldExtractor,
    normalizer: DateNormalizer,
}

impl ProviderParser {
    /// Create a parser for the given provider.
    pub fn new(meter_type: MeterType) -> Self {
        Self {
            profile: ProviderProfile::for_meter_type(meter_type),
            date_formats: None,
            fallback_on_date_error: true,
            extractor: TextFieldExtractor::new(),
            normalizer: DateNormalizer::new(),
        }
    }

    /// Aguas Andinas parser.
    pub fn water() -> Self {
        Self::new(MeterType::Water)
    }

    /// Enel parser.
    pub fn electricity() -> Self {
        Self::new(MeterType::Electricity)
    }

    /// Create a parser configured from the extraction settings.
    pub fn from_config(meter_type: MeterType, config: &ExtractionConfig) -> Self {
        let parser = Self::new(meter_type).with_date_fallback(config.fallback_on_date_error);
        if config.date_formats.is_empty() {
            parser
        } else {
            parser.with_date_formats(config.date_formats.clone())
        }
    }

    /// Set the date formats tried, in order.
    pub fn with_date_formats(mut self, formats: Vec<DateFormat>) -> Self {
        self.date_formats = Some(formats);
        self
    }

    /// Set whether an unparsable emission date falls back to the due date.
    pub fn with_date_fallback(mut self, fallback: bool) -> Self {
        self.fallback_on_date_error = fallback;
        self
    }

    pub fn meter_type(&self) -> MeterType {
        self.profile.meter_type
    }

    fn date_formats(&self) -> &[DateFormat] {
        self.date_formats.as_deref().unwrap_or(self.profile.date_formats)
    }

    /// Emission date first, due date second.
    fn resolve_period(&self, extracted: &ExtractedFields, bill: &mut ParsedBill) {
        for field in [fields::EMISSION_DATE, fields::DUE_DATE] {
            let Some(token) = extracted.get(field) else {
                continue;
            };

            match self.normalizer.normalize(token, self.date_formats()) {
                Ok(period) => {
                    debug!("{}: billing period {} from {}", bill.source_document_id, period, field);
                    bill.month = Some(period.month);
                    bill.year = Some(period.year);
                    return;
                }
                Err(e) => {
                    warn!("{}: {} ({})", bill.source_document_id, e, field);
                    bill.anomalies.push(e);
                    if !self.fallback_on_date_error {
                        return;
                    }
                }
            }
        }
    }
}

fn is_readable(text: &str) -> bool {
    text.chars().any(char::is_alphanumeric)
}

impl BillParser for ProviderParser {
    fn parse(&self, document_text: &str, source_document_id: &str) -> Result<ParsedBill> {
        let start = Instant::now();

        if !is_readable(document_text) {
            return Err(ExtractionError::UnreadableDocument(source_document_id.to_string()));
        }

        info!(
            "Parsing {} bill '{}' from {} characters of text",
            self.profile.meter_type,
            source_document_id,
            document_text.len()
        );

        let extracted = self.extractor.extract(document_text, self.profile.patterns);
        let mut bill = ParsedBill::new(source_document_id, self.profile.meter_type);

        bill.total_amount = self
            .extractor
            .candidates(document_text, self.profile.patterns, fields::TOTAL_AMOUNT)
            .into_iter()
            .find_map(|candidate| {
                let amount = self.profile.amount_format.parse(&candidate.value);
                if amount.is_none() {
                    warn!(
                        "{}: unparsable total amount '{}' (pattern #{})",
                        source_document_id, candidate.value, candidate.pattern_index
                    );
                }
                amount
            });

        bill.account_number = extracted
            .get(fields::ACCOUNT_NUMBER)
            .map(|s| s.trim().to_uppercase());

        self.resolve_period(&extracted, &mut bill);

        bill.charges = scan_charges(
            document_text,
            self.profile.charge_table,
            self.profile.amount_format,
        );

        bill.invoice_number = extracted.get(fields::INVOICE_NUMBER).map(str::to_string);
        bill.tarifa = extracted.get(fields::TARIFF).map(str::to_string);
        bill.service_address = extracted
            .get(fields::SERVICE_ADDRESS)
            .map(|s| s.split_whitespace().collect::<Vec<_>>().join(" "));
        bill.raw_text = document_text.to_string();

        let missing = bill.missing_fields();
        if !missing.is_empty() {
            debug!("{}: missing {:?}", source_document_id, missing);
        }

        debug!(
            "Parsed '{}' ({} fields, {} charges) in {}ms",
            source_document_id,
            extracted.len(),
            bill.charges.len(),
            start.elapsed().as_millis()
        );

        Ok(bill)
    }
}
