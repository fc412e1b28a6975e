//! Charge table scanning.
//!
//! A provider describes its table with a [`ChargeTableLayout`]: where the
//! table starts and ends, how a charge line looks and how lines are
//! classified. The scanner itself is provider-agnostic.

use regex::Regex;
use tracing::{debug, trace};

use super::amounts::AmountFormat;
use crate::models::bill::ChargeFragment;

/// Keyword rule assigning a classification to a charge line.
#[derive(Debug, Clone)]
pub struct ChargeClass {
    pub keywords: Regex,
    pub value_type: &'static str,
}

/// Layout of a provider's charge table.
#[derive(Debug, Clone)]
pub struct ChargeTableLayout {
    /// Line that opens the table.
    pub start: Regex,
    /// Line that closes the table.
    pub end: Regex,
    /// Charge line; must define `name` and `amount` groups and may define
    /// `sign` and `sign_after`.
    pub line: Regex,
    /// Classification rules, first match wins.
    pub classes: Vec<ChargeClass>,
    /// Classification of negative amounts not matched by any rule.
    pub negative_type: &'static str,
    /// Classification when nothing else applies.
    pub default_type: &'static str,
}

impl ChargeTableLayout {
    fn classify(&self, name: &str, negative: bool) -> &'static str {
        self.classes
            .iter()
            .find(|class| class.keywords.is_match(name))
            .map(|class| class.value_type)
            .unwrap_or(if negative { self.negative_type } else { self.default_type })
    }
}

/// Common charge line shape: label, optional sign and `$`, amount at line end.
///
/// The sign may sit before or after the `$`. On two-column lines
/// (`Cargo fijo $ 1.050 $ 1.050`) the last column is the charge.
pub const CHARGE_LINE_PATTERN: &str = r"^\s*(?P<name>[^\d\s$\-][^$\n]*?)(?:\s*:)?\s+(?:-?\s*\$\s*-?\s*(?:\d{1,3}(?:\.\d{3})*|\d+)(?:,\d{1,2})?\s+)?(?P<sign>-)?\s*\$?\s*(?P<sign_after>-)?\s*(?P<amount>\d{1,3}(?:\.\d{3})*(?:,\d{1,2})?|\d+(?:,\d{1,2})?)\s*$";

/// Scan `text` for the charge table described by `layout`.
///
/// Returns charges in table order; no table means no charges.
pub fn scan_charges(
    text: &str,
    layout: &ChargeTableLayout,
    amount_format: AmountFormat,
) -> Vec<ChargeFragment> {
    let mut charges = Vec::new();
    let mut in_table = false;

    for line in text.lines() {
        let line = line.trim_end_matches('\r');

        if !in_table {
            if layout.start.is_match(line) {
                in_table = true;
            }
            continue;
        }

        if layout.end.is_match(line) {
            break;
        }

        let Some(caps) = layout.line.captures(line) else {
            if !line.trim().is_empty() {
                debug!("skipped unrecognized charge line '{}'", line.trim());
            }
            continue;
        };

        let name = caps["name"].trim();
        if !name.chars().any(char::is_alphabetic) {
            continue;
        }

        let Some(amount) = amount_format.parse(&caps["amount"]) else {
            continue;
        };
        let negative = caps.name("sign").is_some() || caps.name("sign_after").is_some();
        let value = if negative { -amount } else { amount };

        let fragment = ChargeFragment {
            name: name.to_string(),
            value,
            value_type: layout.classify(name, negative).to_string(),
            order: charges.len() as u32,
        };
        trace!("charge #{}: {} = {}", fragment.order, fragment.name, fragment.value);
        charges.push(fragment);
    }

    charges
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;

    fn layout() -> ChargeTableLayout {
        ChargeTableLayout {
            start: Regex::new(r"(?i)^\s*DETALLE DE SU CUENTA").unwrap(),
            end: Regex::new(r"(?i)^\s*TOTAL\b").unwrap(),
            line: Regex::new(CHARGE_LINE_PATTERN).unwrap(),
            classes: vec![
                ChargeClass {
                    keywords: Regex::new(r"(?i)cargo\s+fijo").unwrap(),
                    value_type: "fixed",
                },
                ChargeClass {
                    keywords: Regex::new(r"(?i)consumo").unwrap(),
                    value_type: "variable",
                },
            ],
            negative_type: "adjustment",
            default_type: "other",
        }
    }

    #[test]
    fn test_scan_table() {
        let text = "Cliente 123\n\
                    DETALLE DE SU CUENTA\n\
                    Cargo fijo $ 1.050\n\
                    Consumo agua potable 12 m3   15.230\n\
                    Descuento -$ 500\n\
                    Interes por mora: 35\n\
                    TOTAL A PAGAR $ 15.815\n\
                    Cargo fijo $ 9.999\n";

        let charges = scan_charges(text, &layout(), AmountFormat::ChileanPeso);

        assert_eq!(charges.len(), 4);
        assert_eq!(charges[0].name, "Cargo fijo");
        assert_eq!(charges[0].value, Decimal::from(1050));
        assert_eq!(charges[0].value_type, "fixed");
        assert_eq!(charges[1].name, "Consumo agua potable 12 m3");
        assert_eq!(charges[1].value, Decimal::from(15230));
        assert_eq!(charges[1].value_type, "variable");
        assert_eq!(charges[2].value, Decimal::from(-500));
        assert_eq!(charges[2].value_type, "adjustment");
        assert_eq!(charges[3].name, "Interes por mora");
        assert_eq!(charges[3].value_type, "other");
        assert_eq!(
            charges.iter().map(|c| c.order).collect::<Vec<_>>(),
            vec![0, 1, 2, 3]
        );
    }

    #[test]
    fn test_sign_after_currency_and_two_columns() {
        let text = "DETALLE DE SU CUENTA\n\
                    Descuento $ -500\n\
                    Cargo fijo $ 1.050 $ 1.100\n\
                    Consumo agua potable $ 2.000\n\
                    TOTAL A PAGAR $ 2.600\n";

        let charges = scan_charges(text, &layout(), AmountFormat::ChileanPeso);

        assert_eq!(charges.len(), 3);
        assert_eq!(charges[0].name, "Descuento");
        assert_eq!(charges[0].value, Decimal::from(-500));
        assert_eq!(charges[0].value_type, "adjustment");
        assert_eq!(charges[1].name, "Cargo fijo");
        assert_eq!(charges[1].value, Decimal::from(1100));
        assert_eq!(charges[2].value, Decimal::from(2000));
    }

    #[test]
    fn test_no_table_no_charges() {
        let charges = scan_charges("Cargo fijo $ 1.050", &layout(), AmountFormat::ChileanPeso);
        assert!(charges.is_empty());
    }
}
