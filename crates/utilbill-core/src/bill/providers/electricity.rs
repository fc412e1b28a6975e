//! Enel (electricity) bill layout.

use lazy_static::lazy_static;
use regex::Regex;

use crate::bill::extractor::FieldPatternSet;
use crate::bill::fields;
use crate::bill::rules::charges::{CHARGE_LINE_PATTERN, ChargeClass, ChargeTableLayout};
use crate::bill::rules::dates::DateFormat;

pub const DATE_FORMATS: &[DateFormat] = &[
    DateFormat::DayMonthYearNumeric,
    DateFormat::DayMonthAbbrevYear,
    DateFormat::DayLongMonthYear,
];

const DATE_TOKEN: &str = r"(\d{1,2}[\s/.\-][A-Za-z]{3,4}\.?[\s/.\-]\d{4}|\d{1,2}[/.\-]\d{1,2}[/.\-]\d{4}|\d{1,2}\s+de\s+[A-Za-záéíóú]+\s+de\s+\d{4})";

lazy_static! {
    pub static ref PATTERNS: FieldPatternSet = FieldPatternSet::builder("enel")
        .field(fields::TOTAL_AMOUNT, &[
            (r"(?i)total\s+a\s+pagar\s*:?\s*\$\s*(\d[\d.]*(?:,\d+)?)".to_string(), 1),
            (r"(?i)monto\s+(?:total\s+)?a\s+pagar\s*:?\s*\$?\s*(\d[\d.]*(?:,\d+)?)".to_string(), 1),
            (r"(?i)total\s+a\s+pagar\s*:?\s*(\d[\d.]*(?:,\d+)?)".to_string(), 1),
        ])
        .field(fields::ACCOUNT_NUMBER, &[
            (r"(?i)n[úu]mero\s+de\s+cliente\s*:?\s*(\d+-[\dkK])".to_string(), 1),
            (r"(?i)n[°º]\s*(?:de\s+)?cliente\s*:?\s*(\d+-[\dkK])".to_string(), 1),
            (r"\b(\d{6,8}-[\dkK])\b".to_string(), 1),
        ])
        .field(fields::EMISSION_DATE, &[
            (format!(r"(?i)fecha\s+(?:de\s+)?emisi[óo]n\s*:?\s*{DATE_TOKEN}"), 1),
        ])
        .field(fields::DUE_DATE, &[
            (format!(r"(?i)(?:fecha\s+de\s+)?vencimiento\s*:?\s*{DATE_TOKEN}"), 1),
            (format!(r"(?i)pagar\s+hasta\s*(?:el\s*)?:?\s*{DATE_TOKEN}"), 1),
        ])
        .field(fields::TARIFF, &[
            (r"(?i:tarifa)\s*(?:contratada)?\s*:?\s*([A-Z]{2}[A-Z0-9.\-]*)".to_string(), 1),
        ])
        .field(fields::INVOICE_NUMBER, &[
            (r"(?i)boleta\s+electr[óo]nica\s+n[°º]?\s*:?\s*(\d+)".to_string(), 1),
            (r"(?i)n[°º]\s*(?:de\s+)?boleta\s*:?\s*(\d+)".to_string(), 1),
            (r"(?i)folio\s*:?\s*(\d+)".to_string(), 1),
        ])
        .field(fields::SERVICE_ADDRESS, &[
            (r"(?im)^\s*direcci[óo]n(?:\s+de\s+suministro)?\s*:\s*(\S[^\n]*?)\s*$".to_string(), 1),
        ])
        .build()
        .unwrap();

    pub static ref CHARGE_TABLE: ChargeTableLayout = ChargeTableLayout {
        start: Regex::new(r"(?i)^\s*(?:DETALLE\s+DE\s+(?:SU\s+)?CUENTA|DETALLE\s+DE\s+CARGOS|CARGOS\s+DEL\s+MES)").unwrap(),
        end: Regex::new(r"(?i)^\s*(?:TOTAL\b|MONTO\s+TOTAL)").unwrap(),
        line: Regex::new(CHARGE_LINE_PATTERN).unwrap(),
        classes: vec![
            ChargeClass {
                keywords: Regex::new(r"(?i)cargo\s+fijo|arriendo|servicio\s+p[úu]blico|administraci[óo]n").unwrap(),
                value_type: "fixed",
            },
            ChargeClass {
                keywords: Regex::new(r"(?i)electricidad|energ[íi]a|consumo|potencia|transporte|kwh").unwrap(),
                value_type: "variable",
            },
            ChargeClass {
                keywords: Regex::new(r"(?i)ajuste|descuento|inter[eé]s|saldo|redondeo|compensaci[óo]n").unwrap(),
                value_type: "adjustment",
            },
        ],
        negative_type: "adjustment",
        default_type: "other",
    };
}
