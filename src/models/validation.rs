use crate::errors::WriterError;

/// The audit table name is interpolated into SQL as a quoted identifier, so
/// only plain identifier characters are allowed and `"` can never appear.
pub fn validate_table_name(name: &str) -> Result<(), WriterError> {
    if name.is_empty() {
        return Err(WriterError::Config("Audit table name cannot be empty".to_string()));
    }

    if name.len() > 63 {
        return Err(WriterError::Config(
            "Audit table name too long (maximum 63 characters)".to_string(),
        ));
    }

    if name.starts_with(|c: char| c.is_ascii_digit()) {
        return Err(WriterError::Config(
            "Audit table name cannot start with a digit".to_string(),
        ));
    }

    let valid_chars = name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');

    if !valid_chars {
        return Err(WriterError::Config(
            "Audit table name contains invalid characters".to_string(),
        ));
    }

    Ok(())
}
