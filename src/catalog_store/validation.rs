//! Validation for catalog entries.
//!
//! Runs before anything reaches the store so that handlers can tell a bad
//! request apart from a storage failure.

use super::models::NewMusicEntry;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Field '{field}' is required but was empty")]
    EmptyField { field: &'static str },

    #[error("Field '{field}' is not a valid timestamp: {value}")]
    InvalidTimestamp { field: &'static str, value: String },

    #[error("Search query must not be empty")]
    EmptyQuery,

    #[error("No valid items to import")]
    NoValidItems,
}

pub type ValidationResult<T> = Result<T, ValidationError>;

/// Returns the trimmed value, or an error naming the field when it is blank.
pub fn require_non_empty(field: &'static str, value: &str) -> ValidationResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField { field });
    }
    Ok(trimmed.to_string())
}

pub fn validate_new_entry(entry: &NewMusicEntry) -> ValidationResult<()> {
    require_non_empty("url", &entry.url)?;
    require_non_empty("title", &entry.title)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(url: &str, title: &str) -> NewMusicEntry {
        NewMusicEntry {
            url: url.to_string(),
            title: title.to_string(),
            shared_by: None,
            shared_at: None,
        }
    }

    #[test]
    fn accepts_url_and_title() {
        assert!(validate_new_entry(&entry("https://youtu.be/abc", "Song")).is_ok());
    }

    #[test]
    fn rejects_blank_fields() {
        assert_eq!(
            validate_new_entry(&entry("  ", "Song")),
            Err(ValidationError::EmptyField { field: "url" })
        );
        assert_eq!(
            validate_new_entry(&entry("https://youtu.be/abc", "")),
            Err(ValidationError::EmptyField { field: "title" })
        );
    }

    #[test]
    fn require_non_empty_trims() {
        assert_eq!(require_non_empty("q", "  bob ").unwrap(), "bob");
    }
}
