use super::CleaningRules;

/// Trailing whitespace-delimited token of a street name.
///
/// # Examples
/// ```
/// use wrangle_core::street_type;
///
/// assert_eq!(street_type("North Sangamon Ave"), Some("Ave"));
/// assert_eq!(street_type("   "), None);
/// ```
#[must_use]
pub fn street_type(name: &str) -> Option<&str> {
    name.split_whitespace().next_back()
}

/// Expand abbreviated tokens and repair misclassified names.
///
/// Every space-separated token present in [`CleaningRules::abbreviations`] is
/// replaced by its full form. If the raw name, or failing that the expanded
/// name, matches a key of [`CleaningRules::corrected_names`] exactly, the
/// whole name is replaced by the expanded correction.
/// Anything else passes through unchanged, including the original spacing.
///
/// # Examples
/// ```
/// use wrangle_core::{CleaningRules, normalise_street};
///
/// let rules = CleaningRules::default();
/// assert_eq!(normalise_street("123 Main Ave", &rules), "123 Main Avenue");
/// assert_eq!(normalise_street("Sangamon", &rules), "Sangamon Street");
/// assert_eq!(normalise_street("Avenue Ave", &rules), "Avenue Avenue");
/// ```
#[must_use]
pub fn normalise_street(name: &str, rules: &CleaningRules) -> String {
    let expanded = expand_tokens(name, rules);
    match rules
        .corrected_names
        .get(name)
        .or_else(|| rules.corrected_names.get(&expanded))
    {
        Some(corrected) => expand_tokens(corrected, rules),
        None => expanded,
    }
}

fn expand_tokens(name: &str, rules: &CleaningRules) -> String {
    name.split(' ')
        .map(|token| {
            rules
                .abbreviations
                .get(token)
                .map_or(token, String::as_str)
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn rules() -> CleaningRules {
        CleaningRules::default()
    }

    #[rstest]
    #[case("West Ave Ave", "West Avenue Avenue")]
    #[case("Ave", "Avenue")]
    #[case("North Michigan Avenue", "North Michigan Avenue")]
    #[case("Main  Ave", "Main  Avenue")]
    #[case("Avenida Central", "Avenida Central")]
    #[case("Average Ave.", "Average Ave.")]
    #[case("", "")]
    fn expands_only_whole_tokens(
        rules: CleaningRules,
        #[case] input: &str,
        #[case] expected: &str,
    ) {
        assert_eq!(normalise_street(input, &rules), expected);
    }

    #[rstest]
    fn corrected_names_need_an_exact_match(rules: CleaningRules) {
        assert_eq!(normalise_street("Sangamon", &rules), "Sangamon Street");
        assert_eq!(
            normalise_street("North Sangamon", &rules),
            "North Sangamon",
            "partial matches stay untouched"
        );
    }

    #[rstest]
    fn corrected_output_is_stable(rules: CleaningRules) {
        let once = normalise_street("Sangamon", &rules);
        assert_eq!(normalise_street(&once, &rules), once);
    }

    #[rstest]
    #[case(r#"{"corrected_names": {"Ohio Ave": "West Ohio Street"}}"#, "Ohio Ave", "West Ohio Street")]
    #[case(r#"{"corrected_names": {"Ohio Avenue": "W Ohio Ave"}}"#, "Ohio Ave", "W Ohio Avenue")]
    #[case(r#"{"corrected_names": {"Ohio Ave": "W Ohio Ave"}}"#, "Ohio Ave", "W Ohio Avenue")]
    #[case(r#"{"corrected_names": {"Ohio Ave": "W Ohio Street"}}"#, "Ohio Avenue", "Ohio Avenue")]
    fn corrected_names_match_raw_or_expanded_keys(
        #[case] rules_json: &str,
        #[case] input: &str,
        #[case] expected: &str,
    ) {
        let rules = CleaningRules::from_json_str(rules_json).expect("valid rules");
        let corrected = normalise_street(input, &rules);
        assert_eq!(corrected, expected);
        assert_eq!(normalise_street(&corrected, &rules), corrected);
    }

    #[rstest]
    #[case("123 Main Ave", Some("Ave"))]
    #[case("Lake Shore Dr.", Some("Dr."))]
    #[case("Broadway\t", Some("Broadway"))]
    #[case("", None)]
    fn trailing_token_is_the_street_type(#[case] name: &str, #[case] expected: Option<&str>) {
        assert_eq!(street_type(name), expected);
    }
}
