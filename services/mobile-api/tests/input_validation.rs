//! Input validation tests
//!
//! Boundary tests for the request validation applied by the auth handlers.

/// Maximum email length (must match handler constant)
const MAX_EMAIL_LEN: usize = 254;

/// Validate an email address (mirrors the handler logic for testing)
fn validate_email(email: &str) -> Result<(), &'static str> {
    if email.is_empty() {
        return Err("Email is required");
    }
    if email.len() > MAX_EMAIL_LEN {
        return Err("Email too long");
    }
    let Some((local, domain)) = email.split_once('@') else {
        return Err("Invalid email address");
    };
    if local.is_empty() || domain.is_empty() || !domain.contains('.') {
        return Err("Invalid email address");
    }
    Ok(())
}

/// Validate an OTP code shape (mirrors the handler logic for testing)
fn validate_code(code: &str) -> bool {
    code.len() == 6 && code.chars().all(|c| c.is_ascii_digit())
}

// ============================================================================
// Emails
// ============================================================================

#[test]
fn test_valid_simple_email() {
    assert!(validate_email("a@x.com").is_ok());
}

#[test]
fn test_valid_plus_address() {
    assert!(validate_email("a+tag@example.co.uk").is_ok());
}

#[test]
fn test_empty_email_rejected() {
    assert!(validate_email("").is_err());
}

#[test]
fn test_missing_at_rejected() {
    assert!(validate_email("not-an-email").is_err());
}

#[test]
fn test_missing_local_part_rejected() {
    assert!(validate_email("@example.com").is_err());
}

#[test]
fn test_missing_domain_rejected() {
    assert!(validate_email("user@").is_err());
}

#[test]
fn test_dotless_domain_rejected() {
    assert!(validate_email("user@localhost").is_err());
}

#[test]
fn test_overlong_email_rejected() {
    let email = format!("{}@example.com", "a".repeat(MAX_EMAIL_LEN));
    assert!(validate_email(&email).is_err());
}

// ============================================================================
// OTP codes
// ============================================================================

#[test]
fn test_valid_code() {
    assert!(validate_code("123456"));
}

#[test]
fn test_short_code_rejected() {
    assert!(!validate_code("12345"));
}

#[test]
fn test_long_code_rejected() {
    assert!(!validate_code("1234567"));
}

#[test]
fn test_alpha_code_rejected() {
    assert!(!validate_code("12a456"));
}

#[test]
fn test_empty_code_rejected() {
    assert!(!validate_code(""));
}

#[test]
fn test_whitespace_code_rejected() {
    assert!(!validate_code("123 56"));
}
