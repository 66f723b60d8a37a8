//! Naming rules for containers and values.
//!
//! The native store addresses containers by backslash-separated paths
//! (`Software\MyApp\Settings`) and compares names case-insensitively.  A
//! container name is a single path segment, so it may not contain the
//! separator itself.

use thiserror::Error;

/// Fixed platform location under which every application root lives.
pub const PLATFORM_LOCATION: &str = "Software";

/// Subcontainer used when the caller does not name one.
pub const DEFAULT_SUBCONTAINER: &str = "Settings";

/// Path separator of the native store.
pub const SEPARATOR: char = '\\';

/// Longest container name the native store accepts.
pub const MAX_KEY_NAME_LEN: usize = 255;

/// Longest value name the native store accepts.
pub const MAX_VALUE_NAME_LEN: usize = 16_383;

/// A container or value name violates the native store's rules.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NameError {
    #[error("container name must not be empty")]
    EmptyKeyName,

    #[error("container name '{0}' contains the path separator '\\'")]
    ContainsSeparator(String),

    #[error("container name is {len} characters long; the limit is {}", MAX_KEY_NAME_LEN)]
    KeyNameTooLong { len: usize },

    #[error("value name is {len} characters long; the limit is {}", MAX_VALUE_NAME_LEN)]
    ValueNameTooLong { len: usize },
}

/// Checks that `name` is usable as a single container path segment.
///
/// # Errors
///
/// Returns [`NameError`] for empty names, names containing `\`, and names
/// longer than [`MAX_KEY_NAME_LEN`] characters.
pub fn validate_key_name(name: &str) -> Result<(), NameError> {
    if name.is_empty() {
        return Err(NameError::EmptyKeyName);
    }
    if name.contains(SEPARATOR) {
        return Err(NameError::ContainsSeparator(name.to_string()));
    }
    let len = name.chars().count();
    if len > MAX_KEY_NAME_LEN {
        return Err(NameError::KeyNameTooLong { len });
    }
    Ok(())
}

/// Checks that `name` is usable as a value name.
///
/// The empty name is valid: it addresses the container's default value.
///
/// # Errors
///
/// Returns [`NameError::ValueNameTooLong`] past [`MAX_VALUE_NAME_LEN`] characters.
pub fn validate_value_name(name: &str) -> Result<(), NameError> {
    let len = name.chars().count();
    if len > MAX_VALUE_NAME_LEN {
        return Err(NameError::ValueNameTooLong { len });
    }
    Ok(())
}

/// Folds a name into the form used for case-insensitive comparison.
pub fn fold(name: &str) -> String {
    name.to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_key_name_accepts_plain_name() {
        assert!(validate_key_name("Settings").is_ok());
    }

    #[test]
    fn test_validate_key_name_rejects_empty() {
        assert_eq!(validate_key_name(""), Err(NameError::EmptyKeyName));
    }

    #[test]
    fn test_validate_key_name_rejects_separator() {
        // Arrange
        let name = r"Settings\Nested";

        // Act
        let result = validate_key_name(name);

        // Assert
        assert_eq!(result, Err(NameError::ContainsSeparator(name.to_string())));
    }

    #[test]
    fn test_validate_key_name_limit_counts_characters_not_bytes() {
        let at_limit: String = "ü".repeat(MAX_KEY_NAME_LEN);
        assert!(validate_key_name(&at_limit).is_ok());

        let over: String = "a".repeat(MAX_KEY_NAME_LEN + 1);
        assert_eq!(
            validate_key_name(&over),
            Err(NameError::KeyNameTooLong { len: MAX_KEY_NAME_LEN + 1 })
        );
    }

    #[test]
    fn test_validate_value_name_accepts_empty_default_value() {
        assert!(validate_value_name("").is_ok());
    }

    #[test]
    fn test_validate_value_name_accepts_separator() {
        // Value names are not path segments.
        assert!(validate_value_name(r"a\b").is_ok());
    }

    #[test]
    fn test_validate_value_name_rejects_over_limit() {
        let over = "v".repeat(MAX_VALUE_NAME_LEN + 1);
        assert!(matches!(
            validate_value_name(&over),
            Err(NameError::ValueNameTooLong { .. })
        ));
    }

    #[test]
    fn test_fold_is_case_insensitive() {
        assert_eq!(fold("TimeOut"), fold("timeout"));
    }
}
