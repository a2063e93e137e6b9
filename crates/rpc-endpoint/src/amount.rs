//! Decimal amount parsing and formatting.
//!
//! API callers may supply amounts either as raw base-unit integers or as
//! decimal strings (`amountFormated`); responses mirror the choice. Excess
//! fractional digits are truncated, matching how balances are displayed.

use crate::errors::ApiError;
use primitive_types::U256;

/// Parse a human decimal amount into base units.
pub fn parse_amount(amount: &str, decimals: u32) -> Result<U256, ApiError> {
    let cleaned: String = amount
        .trim()
        .trim_matches('"')
        .replace(',', ".")
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    if cleaned.is_empty() {
        return Err(ApiError::validation("invalid amount"));
    }
    let (whole, frac) = match cleaned.split_once('.') {
        None => (cleaned.as_str(), ""),
        Some((whole, frac)) => {
            if frac.contains('.') {
                return Err(ApiError::validation("invalid amount"));
            }
            (whole, frac)
        }
    };
    let mut digits = String::with_capacity(whole.len() + decimals as usize);
    digits.push_str(whole);
    let decimals = decimals as usize;
    if frac.len() >= decimals {
        digits.push_str(&frac[..decimals]);
    } else {
        digits.push_str(frac);
        digits.extend(std::iter::repeat('0').take(decimals - frac.len()));
    }
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(ApiError::validation("invalid amount"));
    }
    U256::from_dec_str(&digits).map_err(|_| ApiError::validation("invalid amount"))
}

/// Render base units as a decimal string with the full fractional part.
pub fn format_amount(amount: U256, decimals: u32) -> String {
    let digits = amount.to_string();
    let decimals = decimals as usize;
    if digits.len() > decimals {
        let (whole, frac) = digits.split_at(digits.len() - decimals);
        if decimals == 0 {
            whole.to_string()
        } else {
            format!("{whole}.{frac}")
        }
    } else {
        format!("0.{}{}", "0".repeat(decimals - digits.len()), digits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_whole_and_fractional_amounts() {
        assert_eq!(
            parse_amount("1", 18).unwrap(),
            U256::from(1_000_000_000_000_000_000u64)
        );
        assert_eq!(parse_amount("0.5", 6).unwrap(), U256::from(500_000u64));
        assert_eq!(parse_amount("1,25", 2).unwrap(), U256::from(125u64));
        assert_eq!(parse_amount(" 42 ", 0).unwrap(), U256::from(42u64));
    }

    #[test]
    fn excess_precision_truncates() {
        assert_eq!(parse_amount("0.1234567", 6).unwrap(), U256::from(123_456u64));
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_amount("", 6).is_err());
        assert!(parse_amount("1.2.3", 6).is_err());
        assert!(parse_amount("abc", 6).is_err());
        assert!(parse_amount("-1", 6).is_err());
    }

    #[test]
    fn formats_with_full_precision() {
        assert_eq!(format_amount(U256::from(1_500_000u64), 6), "1.500000");
        assert_eq!(format_amount(U256::from(42u64), 6), "0.000042");
        assert_eq!(format_amount(U256::zero(), 2), "0.00");
        assert_eq!(format_amount(U256::from(7u64), 0), "7");
    }

    #[test]
    fn parse_format_roundtrip() {
        for text in ["1.500000", "0.000042", "123.456789"] {
            let parsed = parse_amount(text, 6).unwrap();
            assert_eq!(format_amount(parsed, 6), text);
        }
    }
}
