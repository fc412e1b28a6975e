//! Normalization of parsed bills into canonical meters, bills and charges.

mod locks;
pub mod store;

pub use locks::KeyedLocks;
pub use store::{BillStore, MemoryStore, StoreResult};

use std::path::Path;

use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::error::NormalizationError;
use crate::models::bill::{BillId, BillMetadata, MeterDetails, MeterId, MeterType, ParsedBill};

/// Natural key of a bill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BillKey {
    pub meter_id: MeterId,
    pub month: u32,
    pub year: i32,
}

/// Maps parsed bills onto a [`BillStore`].
///
/// Re-applying a bill for an existing `(meter, month, year)` replaces its
/// scalar fields and its whole charge set; charges are never merged.
#[derive(Debug)]
pub struct BillNormalizer<S> {
    store: S,
    locks: KeyedLocks<BillKey>,
}

impl<S: BillStore> BillNormalizer<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            locks: KeyedLocks::new(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Normalize `parsed` as a bill of `provider_type`.
    pub fn apply(
        &self,
        parsed: &ParsedBill,
        provider_type: MeterType,
    ) -> Result<BillId, NormalizationError> {
        let account = parsed
            .account_number
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or(NormalizationError::MissingAccountNumber)?;

        let period = parsed
            .period()
            .filter(|p| (1..=12).contains(&p.month))
            .ok_or(NormalizationError::MissingBillingPeriod)?;

        let total = parsed.total_amount.ok_or(NormalizationError::MissingTotal)?;
        if total < Decimal::ZERO {
            return Err(NormalizationError::NegativeTotal(total));
        }

        let meter_id = self.store.find_or_create_meter(account, provider_type)?;

        if let Some(address) = &parsed.service_address {
            let details = MeterDetails {
                direccion: address.clone(),
                ..Default::default()
            };
            self.store.enrich_meter(meter_id, &details, false)?;
        }

        let metadata = BillMetadata {
            pdf_filename: pdf_filename(&parsed.source_document_id),
            tarifa: parsed.tarifa.clone(),
            invoice_number: parsed.invoice_number.clone(),
        };

        let key = BillKey {
            meter_id,
            month: period.month,
            year: period.year,
        };

        let bill_id = self.locks.with_lock(&key, || {
            let bill_id =
                self.store
                    .upsert_bill(meter_id, period.month, period.year, total, &metadata)?;
            self.store.replace_charges(bill_id, &parsed.charges)?;
            Ok::<_, NormalizationError>(bill_id)
        })?;

        info!(
            "{}: bill {} for meter {} ({}) period {} total {} with {} charges",
            parsed.source_document_id,
            bill_id,
            meter_id,
            provider_type,
            period,
            total,
            parsed.charges.len()
        );

        Ok(bill_id)
    }
}

fn pdf_filename(source_document_id: &str) -> Option<String> {
    let name = Path::new(source_document_id)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(source_document_id);
    if name.is_empty() {
        debug!("document id has no file name");
        None
    } else {
        Some(name.to_string())
    }
}
