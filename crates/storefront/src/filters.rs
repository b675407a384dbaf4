//! Custom Askama template filters.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// Shortens an address to its first 8 and last 6 characters.
///
/// Usage in templates: `{{ purchase.address|short_address }}`
#[askama::filter_fn]
pub fn short_address(value: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    Ok(icarus_market_core::shorten(&value.to_string()))
}
