use crate::error::{AppError, AppResult};
use regex::Regex;
use std::sync::OnceLock;

fn phone_regex() -> &'static Regex {
    static PHONE_REGEX: OnceLock<Regex> = OnceLock::new();
    // leading +, then 7-15 digits; spaces, dashes and parentheses allowed between
    PHONE_REGEX.get_or_init(|| Regex::new(r"^\+(?:[\s\-()]*\d){7,15}[\s\-()]*$").unwrap())
}

/// Validates an optional international phone number as typed by an admin.
///
/// Blank input means "no phone". The display form (e.g. `+233 24 123 4567`) is kept.
pub fn validate_optional_phone(phone: Option<&str>) -> AppResult<Option<String>> {
    let Some(phone) = phone.map(str::trim).filter(|p| !p.is_empty()) else {
        return Ok(None);
    };

    if !phone_regex().is_match(phone) {
        return Err(AppError::ValidationError(
            "Phone number must be in international format, e.g. +233 24 123 4567".to_string(),
        ));
    }

    Ok(Some(phone.to_string()))
}

/// E.164 form for the SMS gateway: `+` followed by digits only.
pub fn to_e164(phone: &str) -> String {
    let digits: String = phone.chars().filter(|c| c.is_ascii_digit()).collect();
    format!("+{digits}")
}
