//! Passphrase policy (§9): a standalone check independent of the cryptographic core.
//!
//! This mirrors the reference tool's own policy rather than anything the
//! container format requires — [`crate::container::encrypt_file`] accepts
//! any non-empty byte string as a password. Callers that want the original
//! tool's stricter rule (alphanumeric, at most 10 characters) can apply
//! [`validate_password`] themselves before encrypting.

/// Maximum password length accepted by [`validate_password`].
pub const MAX_PASSWORD_LEN: usize = 10;

/// Returns `true` if `password` is 1-10 ASCII alphanumeric characters.
#[must_use]
pub fn validate_password(password: &str) -> bool {
    let len = password.len();
    if len == 0 || len > MAX_PASSWORD_LEN {
        return false;
    }
    password.bytes().all(|b| b.is_ascii_alphanumeric())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_alphanumeric_within_length() {
        assert!(validate_password("Passw0rd1"));
        assert!(validate_password("a"));
        assert!(validate_password("1234567890"));
    }

    #[test]
    fn rejects_empty() {
        assert!(!validate_password(""));
    }

    #[test]
    fn rejects_too_long() {
        assert!(!validate_password("12345678901"));
    }

    #[test]
    fn rejects_non_alphanumeric() {
        assert!(!validate_password("pass word"));
        assert!(!validate_password("pass!"));
        assert!(!validate_password("café12"));
    }
}
