//! Amount parsing for Chilean peso bills.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::patterns::AMOUNT_CLP;

/// How a provider prints amounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmountFormat {
    /// Chilean pesos: `.` groups thousands, `,` separates decimals.
    ChileanPeso,
    /// Plain: `,` groups thousands, `.` separates decimals.
    Plain,
}

impl AmountFormat {
    /// Parse a raw amount captured from the document.
    pub fn parse(&self, raw: &str) -> Option<Decimal> {
        match self {
            AmountFormat::ChileanPeso => parse_clp_amount(raw),
            AmountFormat::Plain => {
                let cleaned: String = strip_currency(raw)
                    .chars()
                    .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
                    .collect();
                Decimal::from_str(&cleaned).ok()
            }
        }
    }
}

fn strip_currency(raw: &str) -> &str {
    raw.trim()
        .trim_start_matches(['$', ' ', '\u{00a0}'])
        .trim_end_matches(['.', ',', ';', ' ', '\u{00a0}'])
}

/// Parse a Chilean-formatted amount (e.g. "45.230", "$ 1.234.567", "12,5").
///
/// Grouping separators are removed and the decimal comma becomes a point.
/// Returns `None` for shapes that do not fit the format.
pub fn parse_clp_amount(raw: &str) -> Option<Decimal> {
    let trimmed = strip_currency(raw);
    let (negative, digits) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest.trim_start_matches(['$', ' '])),
        None => (false, trimmed),
    };

    if !AMOUNT_CLP.is_match(digits) {
        return None;
    }

    let normalized: String = digits
        .chars()
        .filter(|c| !matches!(c, '.' | ' ' | '\u{00a0}'))
        .map(|c| if c == ',' { '.' } else { c })
        .collect();

    let value = Decimal::from_str(&normalized).ok()?;
    Some(if negative { -value } else { value })
}

/// Format amount in Chilean style ($ 45.230).
pub fn format_clp_amount(amount: Decimal) -> String {
    let rounded = amount.round_dp(2).normalize();
    let s = rounded.abs().to_string();
    let (integer_part, decimal_part) = match s.split_once('.') {
        Some((i, d)) => (i.to_string(), Some(d.to_string())),
        None => (s, None),
    };

    let chars: Vec<char> = integer_part.chars().collect();
    let mut formatted = String::new();
    for (i, c) in chars.iter().enumerate() {
        if i > 0 && (chars.len() - i) % 3 == 0 {
            formatted.push('.');
        }
        formatted.push(*c);
    }

    let sign = if amount.is_sign_negative() && !amount.is_zero() { "-" } else { "" };
    match decimal_part {
        Some(d) => format!("{}$ {},{}", sign, formatted, d),
        None => format!("{}$ {}", sign, formatted),
    }
}
