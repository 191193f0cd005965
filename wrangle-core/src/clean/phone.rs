use std::sync::LazyLock;

use regex::Regex;

/// Maximum number of `/` separators rewritten per number.
const MAX_SLASH_REPLACEMENTS: usize = 3;

static CONFORMING_PHONE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\+1[\s-]\d{3}[\s-]\d{3}[\s-]\d{4}$").expect("phone pattern is valid")
});

/// Replace up to the first three `/` characters with `-`.
///
/// Nothing else is reformatted; malformed numbers pass through.
///
/// # Examples
/// ```
/// use wrangle_core::normalise_phone;
///
/// assert_eq!(normalise_phone("+1 312/555/0100"), "+1 312-555-0100");
/// assert_eq!(normalise_phone("(312) 920-9100"), "(312) 920-9100");
/// ```
#[must_use]
pub fn normalise_phone(number: &str) -> String {
    number.replacen('/', "-", MAX_SLASH_REPLACEMENTS)
}

/// Whether a number already ends in the `+1 NNN NNN NNNN` shape.
///
/// Used by the audit pass to list numbers needing attention.
#[must_use]
pub fn is_conforming_phone(number: &str) -> bool {
    CONFORMING_PHONE.is_match(number)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("1/2/3/4/5", "1-2-3-4/5")]
    #[case("////", "---/")]
    #[case("312/555", "312-555")]
    #[case("", "")]
    #[case("+1-312-372-0072", "+1-312-372-0072")]
    fn rewrites_at_most_three_slashes(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(normalise_phone(input), expected);
    }

    #[rstest]
    #[case("+1 312 555 0100", true)]
    #[case("+1-312-372-0072", true)]
    #[case("tel +1 312-555-0100", true)]
    #[case("+13122650580", false)]
    #[case("(312) 920-9100", false)]
    #[case("800 DL MOODY", false)]
    fn recognises_conforming_numbers(#[case] number: &str, #[case] expected: bool) {
        assert_eq!(is_conforming_phone(number), expected);
    }
}
