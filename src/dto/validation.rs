//! Validation helpers for DTOs.

use validator::{ValidationError, ValidationErrors};

/// Longest room code accepted.
pub const MAX_ROOM_CODE_LENGTH: usize = 32;

/// Validates that a room code is 1 to 32 uppercase ASCII alphanumerics.
///
/// # Examples
///
/// ```ignore
/// validate_room_code("AB12CD") // Ok
/// validate_room_code("ab12cd") // Err - lowercase
/// validate_room_code("")       // Err - empty
/// ```
pub fn validate_room_code(code: &str) -> Result<(), ValidationError> {
    if code.is_empty() || code.len() > MAX_ROOM_CODE_LENGTH {
        let mut err = ValidationError::new("room_code_length");
        err.message = Some(
            format!(
                "Room code must be 1 to {MAX_ROOM_CODE_LENGTH} characters (got {})",
                code.len()
            )
            .into(),
        );
        return Err(err);
    }

    if !code
        .chars()
        .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase())
    {
        let mut err = ValidationError::new("room_code_format");
        err.message = Some("Room code must contain only uppercase letters and digits".into());
        return Err(err);
    }

    Ok(())
}

/// Rejects strings that are empty once surrounding whitespace is removed.
pub fn validate_not_blank(value: &str, message: String) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some(message.into());
        return Err(err);
    }
    Ok(())
}

/// First human readable message recorded for `field`, if any.
pub fn first_message(errors: &ValidationErrors, field: &str) -> Option<String> {
    errors
        .field_errors()
        .get(field)
        .and_then(|list| list.first())
        .and_then(|err| err.message.as_ref())
        .map(|message| message.to_string())
}
