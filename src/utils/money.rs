use rust_decimal::Decimal;
use std::str::FromStr;

/// Plus grande valeur stockable en NUMERIC(10, 2)
const MAX_AMOUNT: Decimal = Decimal::from_parts(99_999_999, 0, 0, false, 0);

/// Parse un montant saisi ("150", "24.99", " 7.5 ").
/// Refuse : non numérique, plus de 2 décimales, négatif, trop grand.
pub fn parse_amount(raw: &str) -> Result<Decimal, String> {
    let trimmed = raw.trim();
    let value = Decimal::from_str(trimmed).map_err(|_| format!("'{}' is not a valid amount", trimmed))?;

    if value.normalize().scale() > 2 {
        return Err("Amounts cannot have more than 2 decimal places".to_string());
    }
    if value.is_sign_negative() && !value.is_zero() {
        return Err("Amount cannot be negative".to_string());
    }
    if value > MAX_AMOUNT {
        return Err("Amount is too large".to_string());
    }

    Ok(value.round_dp(2))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("150").unwrap(), Decimal::new(150, 0));
        assert_eq!(parse_amount(" 24.99 ").unwrap(), Decimal::new(2499, 2));
        assert_eq!(parse_amount("7.50").unwrap(), Decimal::new(75, 1));
        assert_eq!(parse_amount("0").unwrap(), Decimal::ZERO);
    }

    #[test]
    fn test_parse_amount_rejects() {
        assert!(parse_amount("abc").is_err());
        assert!(parse_amount("").is_err());
        assert!(parse_amount("1.005").is_err());
        assert!(parse_amount("-5").is_err());
        assert!(parse_amount("100000000").is_err());
    }
}
