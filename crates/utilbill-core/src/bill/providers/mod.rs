//! Per-provider extraction profiles.
//!
//! Each provider is data: a field pattern set, an amount format, the date
//! formats it prints and the layout of its charge table.

pub mod electricity;
pub mod water;

use crate::bill::extractor::FieldPatternSet;
use crate::bill::rules::amounts::AmountFormat;
use crate::bill::rules::charges::ChargeTableLayout;
use crate::bill::rules::dates::DateFormat;
use crate::models::bill::MeterType;

/// Everything a provider parser needs to read one provider's bills.
#[derive(Debug, Clone, Copy)]
pub struct ProviderProfile {
    pub meter_type: MeterType,
    pub patterns: &'static FieldPatternSet,
    pub amount_format: AmountFormat,
    pub date_formats: &'static [DateFormat],
    pub charge_table: &'static ChargeTableLayout,
}

impl ProviderProfile {
    /// Profile for a meter type.
    pub fn for_meter_type(meter_type: MeterType) -> Self {
        match meter_type {
            MeterType::Water => Self {
                meter_type,
                patterns: &water::PATTERNS,
                amount_format: AmountFormat::ChileanPeso,
                date_formats: water::DATE_FORMATS,
                charge_table: &water::CHARGE_TABLE,
            },
            MeterType::Electricity => Self {
                meter_type,
                patterns: &electricity::PATTERNS,
                amount_format: AmountFormat::ChileanPeso,
                date_formats: electricity::DATE_FORMATS,
                charge_table: &electricity::CHARGE_TABLE,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bill::fields;

    #[test]
    fn test_profiles_declare_core_fields() {
        for meter_type in [MeterType::Water, MeterType::Electricity] {
            let profile = ProviderProfile::for_meter_type(meter_type);
            for field in [
                fields::TOTAL_AMOUNT,
                fields::ACCOUNT_NUMBER,
                fields::EMISSION_DATE,
                fields::DUE_DATE,
            ] {
                assert!(
                    profile.patterns.rule(field).is_some(),
                    "{meter_type} is missing {field}"
                );
            }
        }
    }

    #[test]
    fn test_only_electricity_reads_tariff() {
        let water = ProviderProfile::for_meter_type(MeterType::Water);
        let electricity = ProviderProfile::for_meter_type(MeterType::Electricity);
        assert!(water.patterns.rule(fields::TARIFF).is_none());
        assert!(electricity.patterns.rule(fields::TARIFF).is_some());
    }
}
