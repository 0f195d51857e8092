//! Identifier to CLI name translation with a reversible record.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use convert_case::{Boundary, Case, Casing};
use interface_schema_core::SchemaError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Case style applied to identifiers when they become CLI names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TranslationMode {
    /// Keep identifiers verbatim.
    None,
    /// `user_name` becomes `user-name`.
    #[default]
    Kebab,
    /// `userName` becomes `user_name`.
    Snake,
}

impl TranslationMode {
    /// Applies the case transform.
    ///
    /// Digits stay attached to their word: `ipv4_address` becomes
    /// `ipv4-address`, never `ipv-4-address`.
    pub fn apply(self, name: &str) -> String {
        let case = match self {
            Self::None => return name.to_string(),
            Self::Kebab => Case::Kebab,
            Self::Snake => Case::Snake,
        };
        name.remove_boundaries(&Boundary::digits()).to_case(case)
    }
}

impl fmt::Display for TranslationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("none"),
            Self::Kebab => f.write_str("kebab"),
            Self::Snake => f.write_str("snake"),
        }
    }
}

impl FromStr for TranslationMode {
    type Err = SchemaError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "none" => Ok(Self::None),
            "kebab" => Ok(Self::Kebab),
            "snake" => Ok(Self::Snake),
            other => Err(SchemaError::Configuration(format!(
                "invalid translation mode '{other}', valid modes are: none, kebab, snake"
            ))),
        }
    }
}

/// Caches forward translations so that `reverse` is their exact inverse.
///
/// One mapping is created per schema build; nothing is shared between builds.
///
/// # Examples
///
/// ```
/// use interface_schema_builder::naming::{NameMapping, TranslationMode};
///
/// let mut mapping = NameMapping::new(TranslationMode::Kebab);
/// assert_eq!(mapping.translate("dry_run"), "dry-run");
/// assert_eq!(mapping.reverse("dry-run"), "dry_run");
///
/// mapping.ignore("keep_me");
/// assert_eq!(mapping.translate("keep_me"), "keep_me");
/// assert_eq!(mapping.reverse("unknown-name"), "unknown-name");
/// ```
#[derive(Debug, Clone, Default)]
pub struct NameMapping {
    mode: TranslationMode,
    ignored: HashSet<String>,
    translations: HashMap<String, String>,
}

impl NameMapping {
    /// Creates an empty mapping for `mode`.
    pub fn new(mode: TranslationMode) -> Self {
        Self {
            mode,
            ignored: HashSet::new(),
            translations: HashMap::new(),
        }
    }

    pub fn mode(&self) -> TranslationMode {
        self.mode
    }

    /// Passes `name` through unchanged in both directions.
    pub fn ignore(&mut self, name: &str) {
        self.ignored.insert(name.to_string());
    }

    /// Translates an identifier and records the pair.
    pub fn translate(&mut self, key: &str) -> String {
        if self.ignored.contains(key) {
            return key.to_string();
        }
        let translated = self.mode.apply(key);
        self.translations.insert(translated.clone(), key.to_string());
        translated
    }

    /// Original identifier for a translated name, or the name itself.
    pub fn reverse(&self, translated: &str) -> String {
        if self.ignored.contains(translated) {
            return translated.to_string();
        }
        self.translations
            .get(translated)
            .cloned()
            .unwrap_or_else(|| translated.to_string())
    }

    /// Returns `true` if `name` was translated before.
    pub fn contains_key(&self, name: &str) -> bool {
        self.translations.values().any(|original| original == name)
    }

    /// Returns `true` if `name` is a recorded translation.
    pub fn contains_translation(&self, name: &str) -> bool {
        self.translations.contains_key(name)
    }
}

/// Re-keys a CLI-name mapping by original identifiers.
pub fn reverse_translations(args: &Map<String, Value>, mapping: &NameMapping) -> Map<String, Value> {
    args.iter()
        .map(|(key, value)| (mapping.reverse(key), value.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_translation_modes() {
        assert_eq!(TranslationMode::None.apply("dry_run"), "dry_run");
        assert_eq!(TranslationMode::Kebab.apply("dry_run"), "dry-run");
        assert_eq!(TranslationMode::Snake.apply("dryRun"), "dry_run");
    }

    #[test]
    fn test_translation_keeps_digits_in_words() {
        assert_eq!(TranslationMode::Kebab.apply("ipv4_address"), "ipv4-address");
        assert_eq!(TranslationMode::Kebab.apply("list_v2"), "list-v2");
        assert_eq!(TranslationMode::Snake.apply("page2_name"), "page2_name");

        let mut mapping = NameMapping::new(TranslationMode::Kebab);
        let joined = mapping.translate("arg1");
        let split = mapping.translate("arg_1");
        assert_eq!(joined, "arg1");
        assert_eq!(split, "arg-1");
        assert_eq!(mapping.reverse("arg1"), "arg1");
        assert_eq!(mapping.reverse("arg-1"), "arg_1");
    }

    #[test]
    fn test_translation_mode_from_str_rejects_unknown() {
        assert_eq!("snake".parse::<TranslationMode>().unwrap(), TranslationMode::Snake);
        assert!(matches!(
            "camel".parse::<TranslationMode>(),
            Err(SchemaError::Configuration(_))
        ));
    }

    #[test]
    fn test_contains_key_and_translation() {
        let mut mapping = NameMapping::new(TranslationMode::Kebab);
        mapping.translate("output_dir");
        assert!(mapping.contains_key("output_dir"));
        assert!(mapping.contains_translation("output-dir"));
        assert!(!mapping.contains_translation("output_dir"));
    }

    #[test]
    fn test_reverse_translations() {
        let mut mapping = NameMapping::new(TranslationMode::Kebab);
        mapping.translate("output_dir");
        let args = json!({"output-dir": "/tmp", "other": 1});
        let reversed = reverse_translations(args.as_object().unwrap(), &mapping);
        assert_eq!(Value::Object(reversed), json!({"output_dir": "/tmp", "other": 1}));
    }
}
