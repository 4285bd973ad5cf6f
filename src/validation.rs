//! Request checks run by handlers before a request reaches the services.

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::{AccountError, AccountResult};

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Trimmed, lower-cased form used for every store lookup and write.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn validate_email(email: &str) -> AccountResult<()> {
    if !is_valid_email(email.trim()) {
        return Err(AccountError::InvalidInput("Invalid email".into()));
    }
    Ok(())
}

pub fn require_non_blank(field: &str, value: &str) -> AccountResult<()> {
    if value.trim().is_empty() {
        return Err(AccountError::InvalidInput(format!("{field} must not be blank")));
    }
    Ok(())
}

pub fn optional_non_blank(field: &str, value: Option<&str>) -> AccountResult<()> {
    match value {
        Some(v) => require_non_blank(field, v),
        None => Ok(()),
    }
}
