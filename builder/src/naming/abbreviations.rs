//! Short-flag generation.

use std::fmt::Debug;

/// Produces short aliases for long names.
///
/// A generator must never return a value that is already in `taken`, and
/// records whatever it returns there.
pub trait AbbreviationGenerator: Debug + Send + Sync {
    /// Returns a free abbreviation for `value`, or `None`.
    fn generate(&self, value: &str, taken: &mut Vec<String>) -> Option<String>;
}

/// Tries three candidates in order for a name such as `foo_bar_baz`:
/// `f`, then `fbb`, then `fo`.
///
/// # Examples
///
/// ```
/// use interface_schema_builder::naming::{AbbreviationGenerator, DefaultAbbreviationGenerator};
///
/// let generator = DefaultAbbreviationGenerator;
/// let mut taken = Vec::new();
/// assert_eq!(generator.generate("hello_world", &mut taken).as_deref(), Some("h"));
/// assert_eq!(generator.generate("hello_world", &mut taken).as_deref(), Some("hw"));
/// assert_eq!(generator.generate("hello_world", &mut taken).as_deref(), Some("he"));
/// assert_eq!(generator.generate("hello_world", &mut taken), None);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultAbbreviationGenerator;

impl AbbreviationGenerator for DefaultAbbreviationGenerator {
    fn generate(&self, value: &str, taken: &mut Vec<String>) -> Option<String> {
        let segments: Vec<&str> = value.split('_').collect();
        let first = segments.first().copied().unwrap_or_default();

        let candidates = [
            first.chars().take(1).collect::<String>(),
            segments
                .iter()
                .filter_map(|segment| segment.chars().next())
                .collect::<String>(),
            first.chars().take(2).collect::<String>(),
        ];

        let chosen = candidates.into_iter().find(|candidate| {
            !candidate.is_empty() && candidate != value && !taken.contains(candidate)
        })?;
        taken.push(chosen.clone());
        Some(chosen)
    }
}

/// Never produces short flags.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAbbreviations;

impl AbbreviationGenerator for NoAbbreviations {
    fn generate(&self, _value: &str, _taken: &mut Vec<String>) -> Option<String> {
        None
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn test_single_character_name_has_no_abbreviation() {
        let mut taken = Vec::new();
        assert_eq!(DefaultAbbreviationGenerator.generate("x", &mut taken), None);
        assert!(taken.is_empty());
    }

    #[test]
    fn test_empty_name_has_no_abbreviation() {
        let mut taken = Vec::new();
        assert_eq!(DefaultAbbreviationGenerator.generate("", &mut taken), None);
    }

    #[test]
    fn test_skips_taken_candidates() {
        let mut taken = vec!["v".to_string()];
        assert_eq!(
            DefaultAbbreviationGenerator.generate("verbose", &mut taken).as_deref(),
            Some("ve")
        );
        assert_eq!(taken, vec!["v", "ve"]);
    }

    #[test]
    fn test_no_abbreviations() {
        let mut taken = Vec::new();
        assert_eq!(NoAbbreviations.generate("verbose", &mut taken), None);
    }

    proptest! {
        #[test]
        fn test_exhausted_names_yield_none(name in "[a-z]{1,6}(_[a-z]{1,6}){0,3}") {
            let generator = DefaultAbbreviationGenerator;
            let mut taken = Vec::new();
            while let Some(short) = generator.generate(&name, &mut taken) {
                prop_assert_ne!(&short, &name);
                prop_assert_eq!(taken.iter().filter(|t| **t == short).count(), 1);
            }
            prop_assert_eq!(generator.generate(&name, &mut taken), None);
        }
    }
}
