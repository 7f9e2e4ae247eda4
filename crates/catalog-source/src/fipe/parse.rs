//! Parsing of FIPE text fields.

use crate::error::{Result, SourceError};
use catalog_core::YearId;
use once_cell::sync::Lazy;
use regex::Regex;

static BRL_PRICE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^R\$\s*(\d{1,3}(?:\.\d{3})*|\d+),(\d{2})$").expect("valid price regex")
});

static YEAR_CODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{1,5})-(\d{1,2})$").expect("valid year code regex"));

/// Parse a Brazilian-formatted price such as `"R$ 1.234,56"` into `1234.56`.
///
/// # Errors
/// Returns `SourceError::Parse` if the text is not a BRL amount.
pub fn parse_brl_price(text: &str) -> Result<f64> {
    let text = text.trim();
    let captures = BRL_PRICE.captures(text).ok_or_else(|| SourceError::Parse {
        what: "price".to_string(),
        message: format!("'{text}' is not a BRL amount"),
    })?;

    let units = captures[1].replace('.', "");
    let normalized = format!("{units}.{}", &captures[2]);
    normalized.parse().map_err(|e| SourceError::Parse {
        what: "price".to_string(),
        message: format!("'{text}': {e}"),
    })
}

/// Split a FIPE year code such as `"2024-1"` into the model year and the fuel code.
///
/// # Errors
/// Returns `SourceError::Parse` if the code is not `<year>-<fuel>`.
pub fn parse_year_code(code: &str) -> Result<(YearId, u32)> {
    let code = code.trim();
    let parse_error = || SourceError::Parse {
        what: "year code".to_string(),
        message: format!("'{code}' is not a <year>-<fuel> code"),
    };

    let captures = YEAR_CODE.captures(code).ok_or_else(parse_error)?;
    let year = captures[1].parse().map_err(|_| parse_error())?;
    let fuel = captures[2].parse().map_err(|_| parse_error())?;
    Ok((YearId(year), fuel))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_brl_price() {
        let cases = [
            ("R$ 50.000,00", 50_000.0),
            ("R$ 1.234.567,89", 1_234_567.89),
            ("R$ 999,90", 999.90),
            ("  R$ 12.500,50 ", 12_500.50),
            ("R$12500,50", 12_500.50),
        ];

        for (text, expected) in cases {
            let price = parse_brl_price(text).expect("valid price");
            assert!((price - expected).abs() < 1e-6, "{text} parsed as {price}");
        }
    }

    #[test]
    fn test_parse_brl_price_rejects_garbage() {
        for text in ["", "50000", "R$ abc", "US$ 10,00", "R$ 10.00"] {
            assert!(parse_brl_price(text).is_err(), "{text} should be rejected");
        }
    }

    #[test]
    fn test_parse_year_code() {
        assert_eq!(parse_year_code("2024-1").expect("valid"), (YearId(2024), 1));
        assert_eq!(parse_year_code("32000-3").expect("valid"), (YearId(32000), 3));
        assert!(parse_year_code("2024").is_err());
        assert!(parse_year_code("abcd-1").is_err());
    }
}
