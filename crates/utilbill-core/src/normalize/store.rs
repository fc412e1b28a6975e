//! Storage collaborator interface and an in-memory implementation.

use std::collections::{BTreeMap, HashMap};
use std::sync::{PoisonError, RwLock};

use rust_decimal::Decimal;

use crate::error::StoreError;
use crate::models::bill::{
    Bill, BillId, BillMetadata, Charge, ChargeFragment, Meter, MeterDetails, MeterId, MeterType,
};

/// Result type for storage operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Canonical storage for meters, bills and charges.
///
/// `replace_charges` must be atomic: readers never observe a bill with a
/// partially replaced charge set.
pub trait BillStore: Send + Sync {
    /// Meter id for `(client_number, meter_type)`, created on first sighting.
    fn find_or_create_meter(&self, client_number: &str, meter_type: MeterType)
    -> StoreResult<MeterId>;

    /// Fill empty descriptive fields; replace populated ones only with `overwrite`.
    fn enrich_meter(&self, meter_id: MeterId, details: &MeterDetails, overwrite: bool)
    -> StoreResult<()>;

    /// Create or replace the bill keyed by `(meter_id, month, year)`.
    fn upsert_bill(
        &self,
        meter_id: MeterId,
        month: u32,
        year: i32,
        total_to_pay: Decimal,
        metadata: &BillMetadata,
    ) -> StoreResult<BillId>;

    /// Delete every charge of the bill and insert `charges` in order.
    fn replace_charges(&self, bill_id: BillId, charges: &[ChargeFragment]) -> StoreResult<()>;

    /// Delete a bill together with its charges.
    fn delete_bill(&self, bill_id: BillId) -> StoreResult<()>;

    fn meter(&self, meter_id: MeterId) -> Option<Meter>;

    fn meters(&self) -> Vec<Meter>;

    fn bill(&self, bill_id: BillId) -> Option<Bill>;

    fn find_bill(&self, meter_id: MeterId, month: u32, year: i32) -> Option<Bill>;

    /// Bills of a meter ordered by period.
    fn bills_for_meter(&self, meter_id: MeterId) -> Vec<Bill>;

    /// Charges of a bill in table order.
    fn charges(&self, bill_id: BillId) -> Vec<Charge>;
}

#[derive(Debug, Default)]
struct Tables {
    meters: BTreeMap<MeterId, Meter>,
    meter_keys: HashMap<(String, MeterType), MeterId>,
    bills: BTreeMap<BillId, Bill>,
    bill_keys: HashMap<(MeterId, u32, i32), BillId>,
    charges: HashMap<BillId, Vec<Charge>>,
    next_meter: u64,
    next_bill: u64,
}

/// Process-local store behind a single `RwLock`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read<R>(&self, f: impl FnOnce(&Tables) -> R) -> R {
        let tables = self.tables.read().unwrap_or_else(PoisonError::into_inner);
        f(&tables)
    }

    fn write<R>(&self, f: impl FnOnce(&mut Tables) -> R) -> R {
        let mut tables = self.tables.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut tables)
    }

    /// Total number of stored charges.
    pub fn charge_count(&self) -> usize {
        self.read(|t| t.charges.values().map(Vec::len).sum())
    }
}

impl BillStore for MemoryStore {
    fn find_or_create_meter(
        &self,
        client_number: &str,
        meter_type: MeterType,
    ) -> StoreResult<MeterId> {
        self.write(|t| {
            let key = (client_number.to_string(), meter_type);
            if let Some(id) = t.meter_keys.get(&key) {
                return Ok(*id);
            }

            t.next_meter += 1;
            let id = MeterId(t.next_meter);
            t.meters.insert(
                id,
                Meter {
                    id,
                    client_number: client_number.to_string(),
                    meter_type,
                    details: MeterDetails::default(),
                },
            );
            t.meter_keys.insert(key, id);
            Ok(id)
        })
    }

    fn enrich_meter(
        &self,
        meter_id: MeterId,
        details: &MeterDetails,
        overwrite: bool,
    ) -> StoreResult<()> {
        self.write(|t| {
            let meter = t
                .meters
                .get_mut(&meter_id)
                .ok_or(StoreError::UnknownMeter(meter_id))?;
            meter.details.merge(details, overwrite);
            Ok(())
        })
    }

    fn upsert_bill(
        &self,
        meter_id: MeterId,
        month: u32,
        year: i32,
        total_to_pay: Decimal,
        metadata: &BillMetadata,
    ) -> StoreResult<BillId> {
        self.write(|t| {
            if !t.meters.contains_key(&meter_id) {
                return Err(StoreError::UnknownMeter(meter_id));
            }

            let key = (meter_id, month, year);
            let id = match t.bill_keys.get(&key) {
                Some(id) => *id,
                None => {
                    t.next_bill += 1;
                    let id = BillId(t.next_bill);
                    t.bill_keys.insert(key, id);
                    id
                }
            };

            t.bills.insert(
                id,
                Bill {
                    id,
                    meter_id,
                    month,
                    year,
                    total_to_pay,
                    metadata: metadata.clone(),
                },
            );
            Ok(id)
        })
    }

    fn replace_charges(&self, bill_id: BillId, charges: &[ChargeFragment]) -> StoreResult<()> {
        self.write(|t| {
            if !t.bills.contains_key(&bill_id) {
                return Err(StoreError::UnknownBill(bill_id));
            }
            let rows = charges
                .iter()
                .map(|c| Charge::from_fragment(bill_id, c))
                .collect();
            t.charges.insert(bill_id, rows);
            Ok(())
        })
    }

    fn delete_bill(&self, bill_id: BillId) -> StoreResult<()> {
        self.write(|t| {
            let bill = t
                .bills
                .remove(&bill_id)
                .ok_or(StoreError::UnknownBill(bill_id))?;
            t.bill_keys.remove(&(bill.meter_id, bill.month, bill.year));
            t.charges.remove(&bill_id);
            Ok(())
        })
    }

    fn meter(&self, meter_id: MeterId) -> Option<Meter> {
        self.read(|t| t.meters.get(&meter_id).cloned())
    }

    fn meters(&self) -> Vec<Meter> {
        self.read(|t| t.meters.values().cloned().collect())
    }

    fn bill(&self, bill_id: BillId) -> Option<Bill> {
        self.read(|t| t.bills.get(&bill_id).cloned())
    }

    fn find_bill(&self, meter_id: MeterId, month: u32, year: i32) -> Option<Bill> {
        self.read(|t| {
            t.bill_keys
                .get(&(meter_id, month, year))
                .and_then(|id| t.bills.get(id))
                .cloned()
        })
    }

    fn bills_for_meter(&self, meter_id: MeterId) -> Vec<Bill> {
        let mut bills: Vec<Bill> = self.read(|t| {
            t.bills
                .values()
                .filter(|b| b.meter_id == meter_id)
                .cloned()
                .collect()
        });
        bills.sort_by_key(|b| b.period());
        bills
    }

    fn charges(&self, bill_id: BillId) -> Vec<Charge> {
        self.read(|t| t.charges.get(&bill_id).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn fragment(name: &str, value: i64, order: u32) -> ChargeFragment {
        ChargeFragment {
            name: name.to_string(),
            value: Decimal::from(value),
            value_type: "fixed".to_string(),
            order,
        }
    }

    #[test]
    fn test_meter_identity_is_number_and_type() {
        let store = MemoryStore::new();
        let a = store.find_or_create_meter("123456-7", MeterType::Water).unwrap();
        let b = store.find_or_create_meter("123456-7", MeterType::Water).unwrap();
        let c = store.find_or_create_meter("123456-7", MeterType::Electricity).unwrap();

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(store.meters().len(), 2);
    }

    #[test]
    fn test_upsert_keeps_bill_id() {
        let store = MemoryStore::new();
        let meter = store.find_or_create_meter("1-1", MeterType::Water).unwrap();
        let meta = BillMetadata::default();

        let first = store.upsert_bill(meter, 3, 2025, Decimal::from(100), &meta).unwrap();
        let second = store.upsert_bill(meter, 3, 2025, Decimal::from(250), &meta).unwrap();

        assert_eq!(first, second);
        assert_eq!(store.bill(first).unwrap().total_to_pay, Decimal::from(250));
        assert_eq!(store.bills_for_meter(meter).len(), 1);
    }

    #[test]
    fn test_delete_bill_cascades_charges() {
        let store = MemoryStore::new();
        let meter = store.find_or_create_meter("1-1", MeterType::Water).unwrap();
        let bill = store
            .upsert_bill(meter, 1, 2025, Decimal::from(10), &BillMetadata::default())
            .unwrap();
        store
            .replace_charges(bill, &[fragment("Cargo fijo", 10, 0)])
            .unwrap();

        store.delete_bill(bill).unwrap();

        assert!(store.bill(bill).is_none());
        assert!(store.charges(bill).is_empty());
        assert_eq!(store.charge_count(), 0);
        assert!(store.find_bill(meter, 1, 2025).is_none());
    }

    #[test]
    fn test_unknown_ids() {
        let store = MemoryStore::new();
        assert_eq!(
            store.replace_charges(BillId(9), &[]),
            Err(StoreError::UnknownBill(BillId(9)))
        );
        assert_eq!(
            store.upsert_bill(MeterId(4), 1, 2025, Decimal::ZERO, &BillMetadata::default()),
            Err(StoreError::UnknownMeter(MeterId(4)))
        );
    }

    #[test]
    fn test_bills_sorted_by_period() {
        let store = MemoryStore::new();
        let meter = store.find_or_create_meter("1-1", MeterType::Water).unwrap();
        let meta = BillMetadata::default();
        store.upsert_bill(meter, 1, 2025, Decimal::ONE, &meta).unwrap();
        store.upsert_bill(meter, 12, 2024, Decimal::ONE, &meta).unwrap();

        let periods: Vec<(u32, i32)> = store
            .bills_for_meter(meter)
            .iter()
            .map(|b| (b.month, b.year))
            .collect();
        assert_eq!(periods, vec![(12, 2024), (1, 2025)]);
    }
}
