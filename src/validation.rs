// Validation utilities module
// Provides custom validation functions for domain-specific rules

use validator::ValidationError;

/// Validates that a monetary value is strictly positive
pub fn validate_positive_price(price: f64) -> Result<(), ValidationError> {
    if price <= 0.0 {
        Err(ValidationError::new("price_must_be_positive"))
    } else {
        Ok(())
    }
}

/// Validates that a stock or recipe quantity is non-negative
/// The ledger itself tolerates negative balances; inputs do not.
pub fn validate_non_negative_quantity(quantity: f64) -> Result<(), ValidationError> {
    if quantity < 0.0 {
        Err(ValidationError::new("quantity_must_be_non_negative"))
    } else {
        Ok(())
    }
}

/// Validates that a phone number contains at least one digit
/// Formatting characters are fine; lookups strip them anyway.
pub fn validate_phone(phone: &str) -> Result<(), ValidationError> {
    if phone.chars().any(|c| c.is_ascii_digit()) {
        Ok(())
    } else {
        Err(ValidationError::new("phone_must_contain_digits"))
    }
}

/// Validates a coupon code: non-empty, uppercase letters, digits and dashes
pub fn validate_coupon_code(code: &str) -> Result<(), ValidationError> {
    let re = regex::Regex::new(r"^[A-Z0-9-]{1,50}$").expect("static pattern");
    if re.is_match(code) {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_coupon_code"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positive_price() {
        assert!(validate_positive_price(10.0).is_ok());
        assert!(validate_positive_price(0.0).is_err());
        assert!(validate_positive_price(-5.0).is_err());
    }

    #[test]
    fn test_non_negative_quantity() {
        assert!(validate_non_negative_quantity(0.0).is_ok());
        assert!(validate_non_negative_quantity(2.5).is_ok());
        assert!(validate_non_negative_quantity(-0.1).is_err());
    }

    #[test]
    fn test_phone_requires_digits() {
        assert!(validate_phone("(11) 99999-0000").is_ok());
        assert!(validate_phone("no digits here").is_err());
    }

    #[test]
    fn test_coupon_code_pattern() {
        assert!(validate_coupon_code("WELCOME10").is_ok());
        assert!(validate_coupon_code("BLACK-FRIDAY").is_ok());
        assert!(validate_coupon_code("lowercase").is_err());
        assert!(validate_coupon_code("").is_err());
        assert!(validate_coupon_code("SPA CED").is_err());
    }
}
