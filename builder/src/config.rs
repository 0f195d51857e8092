//! YAML configuration for [`SchemaBuilder`].
//!
//! # Example YAML
//!
//! ```yaml
//! flag_style: required_positional
//! translation_mode: kebab
//! abbreviations: true
//! reserved_flags: [h, help]
//! command_key: command
//! expand_model_params: true
//! model_expansion_max_depth: 3
//! expansion_separator: "."
//! pipe:
//!   default: [text]
//!   bindings:
//!     - command: convert
//!       targets:
//!         parameters: [source, target]
//!         delimiter: ","
//!         priority: pipe
//! ```

use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::builder::{
    CommandEntry, CommandGroup, DEFAULT_COMMAND_KEY, DEFAULT_METHOD_SKIPS, DEFAULT_RESERVED_FLAGS,
    SchemaBuilder,
};
use crate::error::{ConfigError, Result};
use crate::expansion::{DEFAULT_MAX_DEPTH, DEFAULT_SEPARATOR};
use crate::naming::{DefaultFlagStrategy, FlagStyle, NoAbbreviations, TranslationMode};
use crate::pipe::PipeTargetsInput;

/// Pipe targets for one command or subcommand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipeBinding {
    /// Canonical name, callable name, or alias.
    pub command: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subcommand: Option<String>,
    pub targets: PipeTargetsInput,
}

/// Pipe-target declarations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipeConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<PipeTargetsInput>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bindings: Vec<PipeBinding>,
}

/// Builder settings.
///
/// # Examples
///
/// ```
/// use interface_schema_builder::{BuilderConfig, naming::FlagStyle};
///
/// let config = BuilderConfig::default();
/// assert_eq!(config.flag_style, FlagStyle::RequiredPositional);
/// assert_eq!(config.reserved_flags, vec!["h", "help"]);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuilderConfig {
    pub flag_style: FlagStyle,
    pub translation_mode: TranslationMode,
    /// Generate short flags.
    pub abbreviations: bool,
    pub reserved_flags: Vec<String>,
    pub command_key: String,
    /// Methods never exposed as subcommands.
    pub method_skips: Vec<String>,
    pub expand_model_params: bool,
    pub model_expansion_max_depth: usize,
    pub expansion_separator: String,
    pub pipe: PipeConfig,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            flag_style: FlagStyle::default(),
            translation_mode: TranslationMode::default(),
            abbreviations: true,
            reserved_flags: DEFAULT_RESERVED_FLAGS.map(String::from).to_vec(),
            command_key: DEFAULT_COMMAND_KEY.to_string(),
            method_skips: DEFAULT_METHOD_SKIPS.map(String::from).to_vec(),
            expand_model_params: true,
            model_expansion_max_depth: DEFAULT_MAX_DEPTH,
            expansion_separator: DEFAULT_SEPARATOR.to_string(),
            pipe: PipeConfig::default(),
        }
    }
}

impl BuilderConfig {
    /// Loads a configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if parsing fails.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let reader = BufReader::new(file);
        let config = serde_yaml::from_reader(reader)?;
        Ok(config)
    }

    /// Saves the configuration as YAML.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = BufWriter::new(file);
        serde_yaml::to_writer(writer, self)?;
        Ok(())
    }

    /// Rejects settings the builder cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.model_expansion_max_depth == 0 {
            return Err(ConfigError::Invalid(
                "model_expansion_max_depth must be at least 1".to_string(),
            ));
        }
        if self.expansion_separator.is_empty() {
            return Err(ConfigError::Invalid(
                "expansion_separator must not be empty".to_string(),
            ));
        }
        if self.command_key.is_empty() {
            return Err(ConfigError::Invalid("command_key must not be empty".to_string()));
        }
        Ok(())
    }
}

impl SchemaBuilder {
    /// Creates a builder from validated settings.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Invalid`] from [`BuilderConfig::validate`], or
    /// [`ConfigError::Schema`] when a pipe declaration is malformed.
    pub fn from_config(config: &BuilderConfig) -> Result<Self> {
        config.validate()?;

        let mut builder = SchemaBuilder::new()
            .with_flag_strategy(DefaultFlagStrategy::new(config.flag_style))
            .with_translation_mode(config.translation_mode)
            .with_reserved_flags(config.reserved_flags.iter().cloned())
            .with_command_key(&config.command_key)
            .with_method_skips(config.method_skips.iter().cloned())
            .with_model_expansion(config.expand_model_params)
            .with_max_depth(config.model_expansion_max_depth)
            .with_separator(&config.expansion_separator);
        if !config.abbreviations {
            builder = builder.with_abbreviations(NoAbbreviations);
        }

        if let Some(default) = &config.pipe.default {
            builder.set_default_pipe_targets(default.clone())?;
        }
        for binding in &config.pipe.bindings {
            builder.set_pipe_targets(
                &binding.command,
                binding.subcommand.as_deref(),
                binding.targets.clone(),
            )?;
        }
        Ok(builder)
    }
}

/// Callables to register, as read from a JSON descriptor file.
///
/// # Examples
///
/// ```
/// use interface_schema_builder::{DescriptorSet, SchemaBuilder};
///
/// let set: DescriptorSet = serde_json::from_str(r#"{
///     "description": "Service tools",
///     "commands": [{"callable": {"kind": "function", "name": "restart_all"}}]
/// }"#).unwrap();
/// let schema = set.register(SchemaBuilder::new()).unwrap().build().unwrap();
/// assert_eq!(schema.description.as_deref(), Some("Service tools"));
/// assert_eq!(schema.canonical_names(), vec!["restart-all"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DescriptorSet {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub epilog: Option<String>,
    #[serde(default)]
    pub commands: Vec<CommandEntry>,
    #[serde(default)]
    pub groups: Vec<CommandGroup>,
}

impl DescriptorSet {
    /// Loads a descriptor set from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Json`] if parsing fails.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let reader = BufReader::new(file);
        let set = serde_json::from_reader(reader)?;
        Ok(set)
    }

    /// Registers every command, then every group, on `builder`.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Schema`] for an unsupported callable or a name clash.
    pub fn register(self, builder: SchemaBuilder) -> Result<SchemaBuilder> {
        let mut builder = builder;
        if let Some(description) = self.description.as_deref() {
            builder = builder.with_description(description);
        }
        if let Some(epilog) = self.epilog.as_deref() {
            builder = builder.with_epilog(epilog);
        }
        for entry in self.commands {
            builder.add_entry(entry)?;
        }
        for group in self.groups {
            builder.add_group(group)?;
        }
        Ok(builder)
    }
}

#[cfg(test)]
mod tests {
    use interface_schema_core::PipePriority;

    use super::*;
    use crate::pipe::{PipeOverrides, build_pipe_targets_config};

    fn sample_yaml() -> &'static str {
        r#"
flag_style: keyword_only
translation_mode: snake
abbreviations: false
reserved_flags: [h, help, version]
model_expansion_max_depth: 2
pipe:
  default: text
  bindings:
    - command: convert
      targets:
        parameters: [source, target]
        delimiter: ","
        priority: pipe
    - command: Store
      subcommand: __init__
      targets: [root]
"#
    }

    #[test]
    fn test_parse_sample_yaml() {
        let config: BuilderConfig = serde_yaml::from_str(sample_yaml()).unwrap();
        assert_eq!(config.flag_style, FlagStyle::KeywordOnly);
        assert_eq!(config.translation_mode, TranslationMode::Snake);
        assert!(!config.abbreviations);
        assert_eq!(config.reserved_flags, vec!["h", "help", "version"]);
        assert_eq!(config.model_expansion_max_depth, 2);
        // Unlisted keys fall back to defaults.
        assert_eq!(config.command_key, "command");
        assert_eq!(config.expansion_separator, ".");
        assert_eq!(config.pipe.bindings.len(), 2);
        assert_eq!(config.pipe.bindings[1].subcommand.as_deref(), Some("__init__"));
    }

    #[test]
    fn test_binding_targets_normalize() {
        let config: BuilderConfig = serde_yaml::from_str(sample_yaml()).unwrap();
        let targets = build_pipe_targets_config(
            config.pipe.bindings[0].targets.clone(),
            PipeOverrides::default(),
        )
        .unwrap();
        assert_eq!(targets.targets, vec!["source", "target"]);
        assert_eq!(targets.delimiter.as_deref(), Some(","));
        assert_eq!(targets.priority, PipePriority::Pipe);
    }

    #[test]
    fn test_validate_rejects_zero_depth_and_empty_separator() {
        let config = BuilderConfig {
            model_expansion_max_depth: 0,
            ..BuilderConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let config = BuilderConfig {
            expansion_separator: String::new(),
            ..BuilderConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_from_config_rejects_bad_priority() {
        let yaml = r#"
pipe:
  default:
    parameters: [text]
    priority: stdin
"#;
        let config: BuilderConfig = serde_yaml::from_str(yaml).unwrap();
        assert!(matches!(
            SchemaBuilder::from_config(&config),
            Err(ConfigError::Schema(_))
        ));
    }

    #[test]
    fn test_save_and_load() {
        let dir = std::env::temp_dir().join(format!("schema-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("builder.yml");

        let config: BuilderConfig = serde_yaml::from_str(sample_yaml()).unwrap();
        config.save(&path).unwrap();
        let loaded = BuilderConfig::load(&path).unwrap();
        assert_eq!(loaded, config);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_descriptor_set_load_and_register() {
        let dir = std::env::temp_dir().join(format!("schema-descriptors-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("callables.json");
        std::fs::write(
            &path,
            r#"{
                "epilog": "See the manual.",
                "commands": [{"callable": {"kind": "function", "name": "sync_all"}, "aliases": ["sa"]}],
                "groups": [{"name": "cache", "commands": [
                    {"callable": {"kind": "function", "name": "clear"}}
                ]}]
            }"#,
        )
        .unwrap();

        let set = DescriptorSet::load(&path).unwrap();
        assert_eq!(set.commands.len(), 1);
        let schema = set.register(SchemaBuilder::new()).unwrap().build().unwrap();
        assert_eq!(schema.epilog.as_deref(), Some("See the manual."));
        assert_eq!(schema.canonical_names(), vec!["sync-all", "cache"]);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_descriptor_set_errors() {
        let dir = std::env::temp_dir().join(format!("schema-bad-descriptors-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("callables.json");
        std::fs::write(&path, "{\"commands\": [").unwrap();
        assert!(matches!(DescriptorSet::load(&path), Err(ConfigError::Json(_))));
        std::fs::remove_dir_all(&dir).ok();

        let set: DescriptorSet = serde_json::from_str(
            r#"{"commands": [{"callable": {"kind": "module", "name": "os"}}]}"#,
        )
        .unwrap();
        assert!(matches!(
            set.register(SchemaBuilder::new()),
            Err(ConfigError::Schema(_))
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let result = BuilderConfig::load("/nonexistent/builder.yml");
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }
}
