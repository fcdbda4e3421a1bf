//! Utility functions for username validation and default file naming.

use crate::error::HandleCheckError;
use std::path::PathBuf;

/// Validate an explicitly-supplied username.
///
/// This is a basic format check for single-identifier mode; the remote
/// service remains the authority on what it accepts.
pub fn validate_username(username: &str) -> Result<(), HandleCheckError> {
    let username = username.trim();

    if username.is_empty() {
        return Err(HandleCheckError::invalid_username(
            username,
            "username cannot be empty",
        ));
    }

    if username.len() > 20 {
        return Err(HandleCheckError::invalid_username(
            username,
            "username longer than 20 characters",
        ));
    }

    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(HandleCheckError::invalid_username(
            username,
            "usernames may only contain letters, digits, '_' and '-'",
        ));
    }

    Ok(())
}

/// Default checkpoint file name for a given candidate length.
pub fn default_checkpoint_file(length: usize) -> PathBuf {
    PathBuf::from(format!("checked_usernames_{}char.txt", length))
}

/// Default result file name for a given candidate length.
pub fn default_results_file(length: usize) -> PathBuf {
    PathBuf::from(format!("available_usernames_{}char.txt", length))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_username() {
        assert!(validate_username("spez").is_ok());
        assert!(validate_username("a1_b-2").is_ok());
        assert!(validate_username("abc").is_ok());

        assert!(validate_username("").is_err());
        assert!(validate_username("   ").is_err());
        assert!(validate_username("has space").is_err());
        assert!(validate_username("exclaim!").is_err());
        assert!(validate_username("waaaaaaaaaaaaaaaaytoolong").is_err());
    }

    #[test]
    fn test_validate_username_trims() {
        assert!(validate_username("  spez  ").is_ok());
    }

    #[test]
    fn test_default_file_names() {
        assert_eq!(
            default_checkpoint_file(3),
            PathBuf::from("checked_usernames_3char.txt")
        );
        assert_eq!(
            default_results_file(4),
            PathBuf::from("available_usernames_4char.txt")
        );
    }
}
