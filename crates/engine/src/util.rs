//! Internal helpers for input validation.
//!
//! These utilities are **not** part of the public API. They centralize
//! trimming and emptiness checks so every operation rejects the same inputs.

use sea_orm::{DbErr, SqlErr};

use crate::{EngineError, ResultEngine};

/// Trimmed `value`, or `Validation` when nothing is left.
pub(crate) fn normalize_required_text(value: &str, label: &str) -> ResultEngine<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EngineError::Validation(format!("{label} must not be empty")));
    }
    Ok(trimmed.to_string())
}

pub(crate) fn normalize_optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

/// Remark for a transition that must be explained.
pub(crate) fn required_remark(remark: &str) -> ResultEngine<String> {
    normalize_required_text(remark, "remark")
}

/// Remark for a transition where one is optional.
pub(crate) fn remark_or(remark: Option<&str>, default: &str) -> String {
    normalize_optional_text(remark).unwrap_or_else(|| default.to_string())
}

/// The write lost a race against a unique index.
pub(crate) fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

pub(crate) fn require_positive(amount_minor: i64, label: &str) -> ResultEngine<i64> {
    if amount_minor <= 0 {
        return Err(EngineError::InvalidAmount(format!("{label} must be > 0")));
    }
    Ok(amount_minor)
}

/// Indian mobile number: ten digits, optionally prefixed with `+91` or `0`.
pub(crate) fn normalize_phone(value: &str) -> ResultEngine<String> {
    let digits: String = value
        .chars()
        .filter(|c| !matches!(c, ' ' | '-'))
        .collect();
    let local = digits
        .strip_prefix("+91")
        .or_else(|| digits.strip_prefix('0'))
        .unwrap_or(&digits);
    if local.len() != 10 || !local.chars().all(|c| c.is_ascii_digit()) {
        return Err(EngineError::Validation(format!(
            "invalid phone number: {}",
            value.trim()
        )));
    }
    Ok(local.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remarks() {
        assert!(required_remark("   ").is_err());
        assert_eq!(required_remark(" wrong address ").unwrap(), "wrong address");
        assert_eq!(remark_or(Some("  "), "Task accepted"), "Task accepted");
        assert_eq!(remark_or(Some("on it"), "Task accepted"), "on it");
    }

    #[test]
    fn phones() {
        assert_eq!(normalize_phone("+91 98765-43210").unwrap(), "9876543210");
        assert_eq!(normalize_phone("09876543210").unwrap(), "9876543210");
        assert!(normalize_phone("12345").is_err());
        assert!(normalize_phone("98765abcde").is_err());
    }
}
