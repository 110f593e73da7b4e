//! Shared validation utilities
//!
//! Common validation for input data across commands and queries.

use thiserror::Error;

use crate::ingest::layers::normalize_name;

/// Maximum stored length of a layer name
pub const MAX_LAYER_NAME_LENGTH: usize = 128;

/// Errors that can occur during layer-name validation
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LayerNameValidationError {
    #[error("Layer name is required and cannot be empty")]
    Required,

    #[error("Layer name must be between 1 and {max_length} characters")]
    TooLong { max_length: usize },

    #[error("Layer name must contain at least one letter or digit")]
    NotAddressable,
}

/// Errors that can occur during spatial-reference validation
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SridValidationError {
    #[error("Spatial reference id must be a positive integer")]
    NotPositive,
}

/// Validate a layer name
///
/// # Rules
/// - Must not be empty (after trimming whitespace)
/// - Must not exceed [`MAX_LAYER_NAME_LENGTH`] characters
/// - Must survive normalization (at least one alphanumeric character),
///   since the normalized form is the storage key
pub fn validate_layer_name(name: &str) -> Result<(), LayerNameValidationError> {
    if name.trim().is_empty() {
        return Err(LayerNameValidationError::Required);
    }

    if name.len() > MAX_LAYER_NAME_LENGTH {
        return Err(LayerNameValidationError::TooLong {
            max_length: MAX_LAYER_NAME_LENGTH,
        });
    }

    if normalize_name(name).is_empty() {
        return Err(LayerNameValidationError::NotAddressable);
    }

    Ok(())
}

/// Validate a source spatial reference id
pub fn validate_srid(srid: i32) -> Result<(), SridValidationError> {
    if srid <= 0 {
        return Err(SridValidationError::NotPositive);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_layer_name_valid() {
        assert!(validate_layer_name("roads").is_ok());
        assert!(validate_layer_name("Pop Density").is_ok());
        assert!(validate_layer_name("census-2020").is_ok());
    }

    #[test]
    fn test_validate_layer_name_empty() {
        assert_eq!(validate_layer_name(""), Err(LayerNameValidationError::Required));
        assert_eq!(validate_layer_name("   "), Err(LayerNameValidationError::Required));
    }

    #[test]
    fn test_validate_layer_name_too_long() {
        let long = "a".repeat(MAX_LAYER_NAME_LENGTH + 1);
        assert_eq!(
            validate_layer_name(&long),
            Err(LayerNameValidationError::TooLong {
                max_length: MAX_LAYER_NAME_LENGTH
            })
        );
    }

    #[test]
    fn test_validate_layer_name_not_addressable() {
        assert_eq!(validate_layer_name("???"), Err(LayerNameValidationError::NotAddressable));
        assert_eq!(validate_layer_name("---"), Err(LayerNameValidationError::NotAddressable));
    }

    #[test]
    fn test_validate_srid() {
        assert!(validate_srid(4326).is_ok());
        assert!(validate_srid(3857).is_ok());
        assert_eq!(validate_srid(0), Err(SridValidationError::NotPositive));
        assert_eq!(validate_srid(-1), Err(SridValidationError::NotPositive));
    }
}
