//! Common validation utilities.

use validator::ValidationError;

/// Longest accepted device identifier.
const MAX_DEVICE_ID_LEN: usize = 255;

/// Rejects strings that are empty after trimming whitespace.
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("Hodnota nesmí být prázdná".into());
        Err(err)
    } else {
        Ok(())
    }
}

/// Device identifiers are opaque client strings limited to a safe charset.
pub fn validate_device_id(device_id: &str) -> Result<(), ValidationError> {
    let valid_chars = device_id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | ':'));

    if device_id.is_empty() || device_id.len() > MAX_DEVICE_ID_LEN || !valid_chars {
        let mut err = ValidationError::new("device_id_format");
        err.message = Some("Neplatný identifikátor zařízení".into());
        Err(err)
    } else {
        Ok(())
    }
}
