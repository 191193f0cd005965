use std::sync::LazyLock;

use regex::Regex;

static CONFORMING_POSTCODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^60[0-9]{3}$").expect("postal code pattern is valid"));

/// Whether a postal code is a five-digit code starting with `60`.
///
/// Codes are never rewritten; non-conforming ones are only counted by the
/// audit pass.
///
/// # Examples
/// ```
/// use wrangle_core::is_conforming_postcode;
///
/// assert!(is_conforming_postcode("60614"));
/// assert!(!is_conforming_postcode("IL 60614"));
/// ```
#[must_use]
pub fn is_conforming_postcode(code: &str) -> bool {
    CONFORMING_POSTCODE.is_match(code)
}
