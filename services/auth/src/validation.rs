//! Input validation utilities

use regex::Regex;
use std::sync::OnceLock;

/// Normalize an email for storage and lookup
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Validate a display name
pub fn validate_name(name: &str) -> Result<(), String> {
    let name = name.trim();
    if name.is_empty() {
        return Err("Name is required".to_string());
    }

    if name.chars().count() > 100 {
        return Err("Name must be at most 100 characters long".to_string());
    }

    Ok(())
}

/// Validate email
pub fn validate_email(email: &str) -> Result<(), String> {
    if email.is_empty() {
        return Err("Email is required".to_string());
    }

    if email.len() > 254 {
        return Err("Email must be at most 254 characters long".to_string());
    }

    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = EMAIL_REGEX.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
            .expect("Failed to compile email regex")
    });

    if !regex.is_match(email) {
        return Err("Invalid email format".to_string());
    }

    Ok(())
}

/// Validate password
///
/// Only presence and an upper bound are enforced; the demo accounts use short
/// passwords such as `user123`.
pub fn validate_password(password: &str) -> Result<(), String> {
    if password.is_empty() {
        return Err("Password is required".to_string());
    }

    if password.len() > 128 {
        return Err("Password must be at most 128 characters long".to_string());
    }

    Ok(())
}

/// Validate an optional phone number: digits, spaces, `+`, `-`, `(`, `)`
pub fn validate_phone(phone: &str) -> Result<(), String> {
    if phone.is_empty() {
        return Ok(());
    }

    if phone.len() > 32 {
        return Err("Phone number must be at most 32 characters long".to_string());
    }

    static PHONE_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = PHONE_REGEX
        .get_or_init(|| Regex::new(r"^\+?[0-9 ()-]+$").expect("Failed to compile phone regex"));

    if !regex.is_match(phone) {
        return Err("Phone number contains invalid characters".to_string());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_validation() {
        assert!(validate_email("alice@x.com").is_ok());
        assert!(validate_email("organizer@eventsphere.com").is_ok());
        assert!(validate_email("").is_err());
        assert!(validate_email("alice").is_err());
        assert!(validate_email("alice@x").is_err());
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Alice@X.com "), "alice@x.com");
    }

    #[test]
    fn test_password_validation_accepts_short_passwords() {
        assert!(validate_password("pw123").is_ok());
        assert!(validate_password("").is_err());
        assert!(validate_password(&"x".repeat(129)).is_err());
    }

    #[test]
    fn test_name_validation() {
        assert!(validate_name("John Attendee").is_ok());
        assert!(validate_name("   ").is_err());
        assert!(validate_name(&"n".repeat(101)).is_err());
    }

    #[test]
    fn test_phone_validation() {
        assert!(validate_phone("").is_ok());
        assert!(validate_phone("+1234567890").is_ok());
        assert!(validate_phone("+1 (555) 010-0000").is_ok());
        assert!(validate_phone("call me").is_err());
    }
}
