use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;

/// Amounts are exact decimals. Floats never enter the ledger.
pub type Amount = Decimal;

/// Format an amount with at least two fractional digits.
/// Example: 50 -> "50.00", -12.5 -> "-12.50", 0.125 -> "0.125"
pub fn format_amount(amount: Amount) -> String {
    let mut display = amount;
    if display.scale() < 2 {
        display.rescale(2);
    }
    display.to_string()
}

/// Sum of `amounts`, or `None` when it does not fit in an [`Amount`].
pub fn checked_sum(amounts: impl IntoIterator<Item = Amount>) -> Option<Amount> {
    amounts
        .into_iter()
        .try_fold(Decimal::ZERO, |total, amount| total.checked_add(amount))
}

/// Parse a decimal string into an exact amount.
/// Example: "50.00" -> 50.00, "12.5" -> 12.5, ".50" -> 0.50
///
/// Sign is preserved; rejecting non-positive amounts is the engine's job.
pub fn parse_amount(input: &str) -> Result<Amount, ParseAmountError> {
    let input = input.trim();
    let (negative, digits) = match input.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, input.strip_prefix('+').unwrap_or(input)),
    };

    if digits.is_empty() || !digits.chars().any(|c| c.is_ascii_digit()) {
        return Err(ParseAmountError::InvalidFormat);
    }
    if !digits.chars().all(|c| c.is_ascii_digit() || c == '.') {
        return Err(ParseAmountError::InvalidFormat);
    }

    // ".5" is accepted as shorthand for "0.5"
    let normalized = if digits.starts_with('.') {
        format!("0{}", digits)
    } else {
        digits.to_string()
    };

    let value = Decimal::from_str(&normalized).map_err(|_| ParseAmountError::InvalidFormat)?;
    Ok(if negative { -value } else { value })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseAmountError {
    InvalidFormat,
}

impl fmt::Display for ParseAmountError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseAmountError::InvalidFormat => write!(f, "invalid money format"),
        }
    }
}

impl std::error::Error for ParseAmountError {}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_checked_sum() {
        assert_eq!(checked_sum([dec!(0.1), dec!(0.2), dec!(2000)]), Some(dec!(2000.3)));
        assert_eq!(checked_sum(Vec::new()), Some(Decimal::ZERO));
        assert_eq!(checked_sum([Decimal::MAX, dec!(1)]), None);
        assert_eq!(checked_sum([Decimal::MAX, dec!(0)]), Some(Decimal::MAX));
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(dec!(50)), "50.00");
        assert_eq!(format_amount(dec!(12.34)), "12.34");
        assert_eq!(format_amount(dec!(1)), "1.00");
        assert_eq!(format_amount(dec!(0.01)), "0.01");
        assert_eq!(format_amount(dec!(0)), "0.00");
        assert_eq!(format_amount(dec!(-50)), "-50.00");
        assert_eq!(format_amount(dec!(0.125)), "0.125");
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("50.00"), Ok(dec!(50.00)));
        assert_eq!(parse_amount("50"), Ok(dec!(50)));
        assert_eq!(parse_amount("12.34"), Ok(dec!(12.34)));
        assert_eq!(parse_amount("12.5"), Ok(dec!(12.5)));
        assert_eq!(parse_amount("0.01"), Ok(dec!(0.01)));
        assert_eq!(parse_amount(".50"), Ok(dec!(0.50)));
        assert_eq!(parse_amount("-100"), Ok(dec!(-100)));
        assert_eq!(parse_amount(" 7 "), Ok(dec!(7)));
    }

    #[test]
    fn test_parse_amount_is_exact() {
        // 0.1 + 0.2 is exactly 0.3, unlike binary floats
        let sum = parse_amount("0.1").unwrap() + parse_amount("0.2").unwrap();
        assert_eq!(sum, dec!(0.3));
    }

    #[test]
    fn test_parse_amount_invalid() {
        assert!(parse_amount("abc").is_err());
        assert!(parse_amount("12.34.56").is_err());
        assert!(parse_amount("").is_err());
        assert!(parse_amount("-").is_err());
        assert!(parse_amount("1e5").is_err());
    }
}
