//! Canonical command names and their aliases.

use std::collections::{HashMap, HashSet};

use interface_schema_core::{Result, SchemaError};

use super::mapping::NameMapping;

/// Tracks canonical command names and the aliases that resolve to them.
///
/// # Examples
///
/// ```
/// use interface_schema_builder::naming::{CommandNameRegistry, NameMapping, TranslationMode};
///
/// let mut registry = CommandNameRegistry::new(NameMapping::new(TranslationMode::Kebab));
/// let (canonical, aliases) = registry
///     .register("list_items", None, &["ls".to_string()])
///     .unwrap();
/// assert_eq!(canonical, "list-items");
/// assert_eq!(aliases, vec!["ls"]);
/// assert_eq!(registry.canonical_for("ls"), Some("list-items"));
///
/// assert!(registry.register("ls", None, &[]).is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct CommandNameRegistry {
    translator: NameMapping,
    canonical: HashSet<String>,
    alias_to_canonical: HashMap<String, String>,
}

impl CommandNameRegistry {
    pub fn new(translator: NameMapping) -> Self {
        Self {
            translator,
            canonical: HashSet::new(),
            alias_to_canonical: HashMap::new(),
        }
    }

    /// Mapping used for translating default names.
    pub fn translator(&self) -> &NameMapping {
        &self.translator
    }

    /// Stores a command name and its aliases.
    ///
    /// `explicit_name` is used verbatim; otherwise `default_name` is
    /// translated.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::DuplicateCommand`] if the canonical name or any
    /// alias is empty, repeats within the call, or collides with a name that
    /// is already registered.
    pub fn register(
        &mut self,
        default_name: &str,
        explicit_name: Option<&str>,
        aliases: &[String],
    ) -> Result<(String, Vec<String>)> {
        let canonical = match explicit_name {
            Some(name) => name.to_string(),
            None => self.translator.translate(default_name),
        };
        self.ensure_unique(&canonical, aliases)?;

        self.canonical.insert(canonical.clone());
        for alias in aliases {
            self.alias_to_canonical
                .insert(alias.clone(), canonical.clone());
        }
        Ok((canonical, aliases.to_vec()))
    }

    /// Resolves a canonical name or alias to the canonical name.
    pub fn canonical_for(&self, cli_name: &str) -> Option<&str> {
        if let Some(canonical) = self.canonical.get(cli_name) {
            return Some(canonical);
        }
        self.alias_to_canonical.get(cli_name).map(String::as_str)
    }

    fn is_registered(&self, name: &str) -> bool {
        self.canonical.contains(name) || self.alias_to_canonical.contains_key(name)
    }

    fn ensure_unique(&self, canonical: &str, aliases: &[String]) -> Result<()> {
        if canonical.is_empty() || self.is_registered(canonical) {
            return Err(SchemaError::DuplicateCommand(canonical.to_string()));
        }

        let mut seen: HashSet<&str> = HashSet::new();
        for alias in aliases {
            if alias.is_empty()
                || alias == canonical
                || !seen.insert(alias)
                || self.is_registered(alias)
            {
                return Err(SchemaError::DuplicateCommand(alias.clone()));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::naming::TranslationMode;

    fn registry() -> CommandNameRegistry {
        CommandNameRegistry::new(NameMapping::new(TranslationMode::Kebab))
    }

    #[test]
    fn test_alias_matching_existing_canonical_is_rejected() {
        let mut registry = registry();
        registry.register("x", None, &[]).unwrap();
        assert_eq!(
            registry.register("other", None, &["x".to_string()]),
            Err(SchemaError::DuplicateCommand("x".to_string()))
        );
    }

    #[test]
    fn test_alias_equal_to_own_canonical_is_rejected() {
        let mut registry = registry();
        assert!(registry.register("run", None, &["run".to_string()]).is_err());
    }

    #[test]
    fn test_repeated_alias_in_one_call_is_rejected() {
        let mut registry = registry();
        let aliases = vec!["r".to_string(), "r".to_string()];
        assert!(registry.register("run", None, &aliases).is_err());
    }

    #[test]
    fn test_empty_names_are_rejected() {
        let mut registry = registry();
        assert!(registry.register("", None, &[]).is_err());
        assert!(registry.register("run", None, &[String::new()]).is_err());
    }

    #[test]
    fn test_explicit_name_is_used_verbatim() {
        let mut registry = registry();
        let (canonical, _) = registry.register("list_items", Some("list_items"), &[]).unwrap();
        assert_eq!(canonical, "list_items");
        assert_eq!(registry.canonical_for("list_items"), Some("list_items"));
        assert_eq!(registry.canonical_for("list-items"), None);
    }

    #[test]
    fn test_disjoint_registrations_succeed() {
        let mut registry = registry();
        registry.register("add", None, &["a".to_string()]).unwrap();
        registry.register("remove", None, &["rm".to_string()]).unwrap();
        assert_eq!(registry.canonical_for("rm"), Some("remove"));
        assert_eq!(registry.canonical_for("missing"), None);
    }
}
