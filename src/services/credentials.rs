//! Temporary credential generation.
//!
//! Approving a signup request does not create the login account. The
//! reviewer hands the generated credential to a super admin, who creates
//! the account with separate tooling.

use crate::error::AppError;
use rand::Rng;

/// Length of a generated temporary credential.
pub const TEMPORARY_CREDENTIAL_LEN: usize = 8;

/// Shortest credential an operator may relay; the account password rule.
pub const MIN_CREDENTIAL_LEN: usize = 6;

const CREDENTIAL_CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Generate an 8-character lowercase alphanumeric credential.
pub fn generate_temporary_credential() -> String {
    let mut rng = rand::thread_rng();
    (0..TEMPORARY_CREDENTIAL_LEN)
        .map(|_| CREDENTIAL_CHARSET[rng.gen_range(0..CREDENTIAL_CHARSET.len())] as char)
        .collect()
}

/// Trim an operator-supplied credential and enforce the minimum length.
pub fn validate_temporary_credential(value: &str) -> Result<String, AppError> {
    let credential = value.trim();
    if credential.chars().count() < MIN_CREDENTIAL_LEN {
        return Err(AppError::invalid_input_field(
            format!("Password must be at least {} characters", MIN_CREDENTIAL_LEN),
            "temporaryPassword",
        ));
    }
    Ok(credential.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_temporary_credential() {
        assert_eq!(validate_temporary_credential(" ab12cd ").unwrap(), "ab12cd");

        let err = validate_temporary_credential("  abc ").unwrap_err();
        assert_eq!(err.to_string(), "Password must be at least 6 characters");
        assert_eq!(err.field(), Some("temporaryPassword"));

        let generated = generate_temporary_credential();
        assert_eq!(validate_temporary_credential(&generated).unwrap(), generated);
    }

    #[test]
    fn test_credential_shape() {
        for _ in 0..100 {
            let credential = generate_temporary_credential();
            assert_eq!(credential.len(), TEMPORARY_CREDENTIAL_LEN);
            assert!(credential
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
        }
    }

    #[test]
    fn test_credentials_differ() {
        let a = generate_temporary_credential();
        let b = generate_temporary_credential();
        let c = generate_temporary_credential();
        // 36^8 possibilities; three equal draws would mean a broken generator
        assert!(!(a == b && b == c));
    }
}
