//! Aguas Andinas (water) bill layout.

use lazy_static::lazy_static;
use regex::Regex;

use crate::bill::extractor::FieldPatternSet;
use crate::bill::fields;
use crate::bill::rules::charges::{CHARGE_LINE_PATTERN, ChargeClass, ChargeTableLayout};
use crate::bill::rules::dates::DateFormat;

/// Water bills print dates as `11-FEB-2025`; the numeric form shows up on reprints.
pub const DATE_FORMATS: &[DateFormat] = &[
    DateFormat::DayMonthAbbrevYear,
    DateFormat::DayMonthYearNumeric,
];

lazy_static! {
    pub static ref PATTERNS: FieldPatternSet = FieldPatternSet::builder("aguas_andinas")
        .field(fields::TOTAL_AMOUNT, &[
            (r"TOTAL A PAGAR\s*\$\s*(\d[\d.]*(?:,\d+)?)", 1),
            (r"(?i)total\s+a\s+pagar\s*:?\s*\$?\s*(\d[\d.]*(?:,\d+)?)", 1),
        ])
        .field(fields::ACCOUNT_NUMBER, &[
            (r"Nro de cuenta\s*(\d+-\d+)", 1),
            (r"(?i)n(?:ro|[°º])\.?\s*(?:de\s+)?cuenta\s*:?\s*(\d+-\d+)", 1),
            (r"\b(\d{6}-\d)\b", 1),
        ])
        .field(fields::EMISSION_DATE, &[
            (r"FECHA EMISI[ÓO]N\s*:\s*(\d{2}-[A-Z]{3}-\d{4})", 1),
            (r"(?i)fecha\s+(?:de\s+)?emisi[óo]n\s*:?\s*(\d{1,2}[/.\-]\d{1,2}[/.\-]\d{4})", 1),
        ])
        .field(fields::DUE_DATE, &[
            (r"VENCIMIENTO\s*:?\s*(\d{2}-[A-Z]{3}-\d{4})", 1),
            (r"(?i)vencimiento\s*:?\s*(\d{1,2}[/.\-]\d{1,2}[/.\-]\d{4})", 1),
        ])
        .field(fields::INVOICE_NUMBER, &[
            (r"(?i)boleta\s+electr[óo]nica\s+n[°º]?\s*:?\s*(\d+)", 1),
            (r"(?i)n[°º]\s*(?:de\s+)?boleta\s*:?\s*(\d+)", 1),
        ])
        .field(fields::SERVICE_ADDRESS, &[
            (r"(?im)^\s*direcci[óo]n(?:\s+de\s+suministro)?\s*:\s*(\S[^\n]*?)\s*$", 1),
        ])
        .build()
        .unwrap();

    pub static ref CHARGE_TABLE: ChargeTableLayout = ChargeTableLayout {
        start: Regex::new(r"(?i)^\s*DETALLE\s+(?:DE\s+(?:SU\s+)?CUENTA|DEL\s+CONSUMO)").unwrap(),
        end: Regex::new(r"(?i)^\s*(?:TOTAL\b|MONTO\s+TOTAL)").unwrap(),
        line: Regex::new(CHARGE_LINE_PATTERN).unwrap(),
        classes: vec![
            ChargeClass {
                keywords: Regex::new(r"(?i)cargo\s+fijo").unwrap(),
                value_type: "fixed",
            },
            ChargeClass {
                keywords: Regex::new(r"(?i)consumo|sobreconsumo|alcantarillado|tratamiento|\bm3\b").unwrap(),
                value_type: "variable",
            },
            ChargeClass {
                keywords: Regex::new(r"(?i)ajuste|descuento|inter[eé]s|saldo|redondeo").unwrap(),
                value_type: "adjustment",
            },
        ],
        negative_type: "adjustment",
        default_type: "other",
    };
}
