//! Shared regex patterns for date tokens and amounts on Chilean bills.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // 11-FEB-2025, 11 feb 2025, 11/Feb/2025
    pub static ref DATE_DAY_MONTH_ABBREV_YEAR: Regex = Regex::new(
        r"^(\d{1,2})[\s/.\-]+([A-Za-zÁÉÍÓÚáéíóú]{3,4})\.?[\s/.\-]+(\d{4})$"
    ).unwrap();

    // 11/02/2025, 11-02-2025, 11.02.2025
    pub static ref DATE_DAY_MONTH_YEAR_NUMERIC: Regex = Regex::new(
        r"^(\d{1,2})[/.\-](\d{1,2})[/.\-](\d{4})$"
    ).unwrap();

    // 11 de febrero de 2025
    pub static ref DATE_DAY_LONG_MONTH_YEAR: Regex = Regex::new(
        r"(?i)^(\d{1,2})\s+de\s+([a-záéíóú]+)\s+(?:de|del)\s+(\d{4})$"
    ).unwrap();

    // FEBRERO 2025, Febrero-2025, febrero de 2025
    pub static ref DATE_LONG_MONTH_YEAR: Regex = Regex::new(
        r"(?i)^([a-záéíóú]+)[\s/\-]+(?:de\s+)?(\d{4})$"
    ).unwrap();

    // Chilean peso amounts: 45.230 / 1.234.567 / 45230 / 12,5
    pub static ref AMOUNT_CLP: Regex = Regex::new(
        r"^\d{1,3}(?:[.\s\u{00a0}]\d{3})*(?:,\d+)?$|^\d+(?:,\d+)?$"
    ).unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_token_shapes() {
        assert!(DATE_DAY_MONTH_ABBREV_YEAR.is_match("11-FEB-2025"));
        assert!(DATE_DAY_MONTH_ABBREV_YEAR.is_match("5 sept. 2024"));
        assert!(DATE_DAY_MONTH_YEAR_NUMERIC.is_match("05/02/2025"));
        assert!(DATE_DAY_LONG_MONTH_YEAR.is_match("11 de febrero de 2025"));
        assert!(DATE_LONG_MONTH_YEAR.is_match("FEBRERO 2025"));
        assert!(!DATE_DAY_MONTH_YEAR_NUMERIC.is_match("11-FEB-2025"));
    }

    #[test]
    fn test_amount_shapes() {
        assert!(AMOUNT_CLP.is_match("45.230"));
        assert!(AMOUNT_CLP.is_match("1.234.567"));
        assert!(AMOUNT_CLP.is_match("45230"));
        assert!(AMOUNT_CLP.is_match("12,5"));
        assert!(!AMOUNT_CLP.is_match("45.23"));
    }
}
