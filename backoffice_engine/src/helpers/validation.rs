//! Request field validation shared by the registration flows.

use regex::Regex;

use crate::api::errors::AuthApiError;

pub fn validate_email(email: &str) -> Result<(), AuthApiError> {
    let re = Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap();
    if re.is_match(email) {
        Ok(())
    } else {
        Err(AuthApiError::ValidationError("Invalid email format".to_string()))
    }
}

/// At least 8 characters with an uppercase letter, a lowercase letter, a digit and a special character.
pub fn validate_password_strength(password: &str) -> Result<(), AuthApiError> {
    let long_enough = password.chars().count() >= 8;
    let has_upper = password.chars().any(|c| c.is_ascii_uppercase());
    let has_lower = password.chars().any(|c| c.is_ascii_lowercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    let has_special = password.chars().any(|c| !c.is_ascii_alphanumeric());
    if long_enough && has_upper && has_lower && has_digit && has_special {
        Ok(())
    } else {
        Err(AuthApiError::ValidationError(
            "Password must be at least 8 characters long and contain uppercase, lowercase, number & special \
             character."
                .to_string(),
        ))
    }
}

pub fn validate_person_name(name: &str) -> Result<(), AuthApiError> {
    let re = Regex::new(r"^[a-zA-Z ]{3,50}$").unwrap();
    if re.is_match(name) {
        Ok(())
    } else {
        Err(AuthApiError::ValidationError("Name must be 3-50 letters only".to_string()))
    }
}

pub fn validate_address(address: &str) -> Result<(), AuthApiError> {
    if address.len() < 5 || address.len() > 100 {
        Err(AuthApiError::ValidationError("Address must be 5-100 characters".to_string()))
    } else {
        Ok(())
    }
}

pub fn validate_phone(phone: &str) -> Result<(), AuthApiError> {
    let re = Regex::new(r"^[6-9]\d{9}$").unwrap();
    if re.is_match(phone) {
        Ok(())
    } else {
        Err(AuthApiError::ValidationError("Invalid phone number".to_string()))
    }
}

pub fn validate_pincode(pincode: &str) -> Result<(), AuthApiError> {
    let re = Regex::new(r"^[1-9][0-9]{5}$").unwrap();
    if re.is_match(pincode) {
        Ok(())
    } else {
        Err(AuthApiError::ValidationError("Invalid pincode".to_string()))
    }
}

/// Field checks for the full staff registration form. Returns the first failure.
pub fn validate_staff_registration(
    name: &str,
    address: &str,
    phone: &str,
    pincode: &str,
) -> Result<(), AuthApiError> {
    validate_person_name(name)?;
    validate_address(address)?;
    validate_phone(phone)?;
    validate_pincode(pincode)?;
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn email_validation() {
        assert!(validate_email("a@b.co").is_ok());
        assert!(validate_email("UPPER.case+tag@example.org").is_ok());
        assert!(validate_email("no-at-sign").is_err());
        assert!(validate_email("a b@c.d").is_err());
        assert!(validate_email("a@nodot").is_err());
    }

    #[test]
    fn password_strength() {
        assert!(validate_password_strength("Aa1!aaaa").is_ok());
        assert!(validate_password_strength("short1!").is_err());
        assert!(validate_password_strength("alllower1!").is_err());
        assert!(validate_password_strength("ALLUPPER1!").is_err());
        assert!(validate_password_strength("NoDigits!!").is_err());
        assert!(validate_password_strength("NoSpecial11").is_err());
    }

    #[test]
    fn staff_registration_fields() {
        assert!(validate_staff_registration("Asha Kumar", "12 Market Road", "9876543210", "685566").is_ok());
        assert!(validate_staff_registration("Jo", "12 Market Road", "9876543210", "685566").is_err());
        assert!(validate_staff_registration("Asha Kumar", "x", "9876543210", "685566").is_err());
        assert!(validate_staff_registration("Asha Kumar", "12 Market Road", "1234567890", "685566").is_err());
        assert!(validate_staff_registration("Asha Kumar", "12 Market Road", "9876543210", "068556").is_err());
    }
}
