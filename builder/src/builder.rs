//! The schema builder.
//!
//! [`SchemaBuilder`] collects callables (functions, methods, classes) and
//! [`CommandGroup`]s, then turns them into an immutable [`ParserSchema`].
//! Every call to [`SchemaBuilder::build`] starts from fresh translation
//! tables, so one builder can produce any number of independent schemas.
//!
//! # Examples
//!
//! ```
//! use interface_schema_builder::SchemaBuilder;
//! use interface_schema_core::{
//!     ArgumentKind, CallableDescriptor, FunctionDescriptor, ParameterDescriptor, TypeTag,
//!     ValueShape,
//! };
//!
//! let greet = FunctionDescriptor::new(
//!     "greet_user",
//!     vec![
//!         ParameterDescriptor::required("name", TypeTag::Str),
//!         ParameterDescriptor::optional("times", TypeTag::Int, 1),
//!         ParameterDescriptor::optional("shout", TypeTag::Bool, false),
//!     ],
//! );
//!
//! let mut builder = SchemaBuilder::new();
//! let canonical = builder
//!     .add_command(CallableDescriptor::Function(greet), None, None, &[])
//!     .unwrap();
//! assert_eq!(canonical, "greet-user");
//!
//! let schema = builder.build().unwrap();
//! let command = &schema.commands[0];
//! assert_eq!(command.parameters[0].kind, ArgumentKind::Positional);
//! assert_eq!(command.parameters[1].flags, vec!["-t", "--times"]);
//! assert_eq!(command.parameters[2].value_shape, ValueShape::Flag);
//! ```

use std::collections::HashSet;
use std::sync::Arc;

use interface_schema_core::{
    Argument, ArgumentKind, ArgumentParser, BooleanBehavior, CallableDescriptor, ClassDescriptor,
    Command, CommandType, DefaultValue, FunctionDescriptor, MethodDescriptor, Nargs,
    ParameterDescriptor, ParameterKind, ParserSchema, PipeTargets, Result, SchemaError, TypeTag,
    ValueParser, ValueShape,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::convert::{DefaultTypeConverter, TypeConverter};
use crate::expansion::{DEFAULT_SEPARATOR, ExpandedLeaf, ModelExpander, record_type_of};
use crate::naming::{
    AbbreviationGenerator, CommandNameRegistry, DefaultAbbreviationGenerator, DefaultFlagStrategy,
    FlagScope, FlagStrategy, NameMapping, TranslationMode, inverted_bool_flag_name,
};
use crate::pipe::{PipeOverrides, PipeTargetRegistry, PipeTargetsInput, build_pipe_targets_config};

/// Flags reserved for help output.
pub const DEFAULT_RESERVED_FLAGS: [&str; 2] = ["h", "help"];

/// Name of the dispatch field for multi-command schemas.
pub const DEFAULT_COMMAND_KEY: &str = "command";

/// Methods never exposed as subcommands.
pub const DEFAULT_METHOD_SKIPS: [&str; 3] = ["__init__", "__repr__", "repr"];

/// Pipe-target subcommand key for constructor parameters.
pub const INIT_PIPE_KEY: &str = "__init__";

/// One callable inside a [`CommandGroup`] or a descriptor file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandEntry {
    pub callable: CallableDescriptor,
    /// Explicit CLI name, used verbatim.
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub aliases: Vec<String>,
}

impl CommandEntry {
    pub fn new(callable: CallableDescriptor) -> Self {
        Self {
            callable,
            name: None,
            description: None,
            aliases: Vec::new(),
        }
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    pub fn with_aliases(mut self, aliases: &[&str]) -> Self {
        self.aliases = aliases.iter().map(|alias| alias.to_string()).collect();
        self
    }
}

/// A named grouping node whose children are commands and nested groups.
///
/// # Examples
///
/// ```
/// use interface_schema_builder::{CommandEntry, CommandGroup, SchemaBuilder};
/// use interface_schema_core::{CallableDescriptor, CommandType, FunctionDescriptor};
///
/// let start = FunctionDescriptor::new("start", Vec::new());
/// let stop = FunctionDescriptor::new("stop", Vec::new());
/// let group = CommandGroup::new("service")
///     .with_command(CommandEntry::new(CallableDescriptor::Function(start)))
///     .with_command(CommandEntry::new(CallableDescriptor::Function(stop)).with_aliases(&["halt"]));
///
/// let mut builder = SchemaBuilder::new();
/// builder.add_group(group).unwrap();
/// let schema = builder.build().unwrap();
///
/// let service = &schema.commands[0];
/// assert_eq!(service.command_type, CommandType::Group);
/// assert!(service.find_subcommand("halt").is_some());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandGroup {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub commands: Vec<CommandEntry>,
    #[serde(default, alias = "groups")]
    pub subgroups: Vec<CommandGroup>,
    /// Source of group-level arguments: a function's parameters or a class
    /// constructor.
    #[serde(default)]
    pub args: Option<CallableDescriptor>,
}

impl CommandGroup {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            description: None,
            aliases: Vec::new(),
            commands: Vec::new(),
            subgroups: Vec::new(),
            args: None,
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    pub fn with_aliases(mut self, aliases: &[&str]) -> Self {
        self.aliases = aliases.iter().map(|alias| alias.to_string()).collect();
        self
    }

    pub fn with_command(mut self, entry: CommandEntry) -> Self {
        self.commands.push(entry);
        self
    }

    pub fn with_subgroup(mut self, group: CommandGroup) -> Self {
        self.subgroups.push(group);
        self
    }

    pub fn with_args(mut self, source: CallableDescriptor) -> Self {
        self.args = Some(source);
        self
    }
}

#[derive(Debug, Clone)]
enum Entry {
    Callable {
        entry: CommandEntry,
        canonical: String,
    },
    Group {
        group: CommandGroup,
        canonical: String,
    },
}

/// Translation tables scoped to one build.
#[derive(Debug)]
struct BuildContext {
    arguments: NameMapping,
    commands: NameMapping,
}

impl BuildContext {
    fn new(mode: TranslationMode) -> Self {
        Self {
            arguments: NameMapping::new(mode),
            commands: NameMapping::new(mode),
        }
    }
}

/// Turns reflected callables into a [`ParserSchema`].
///
/// Settings are applied with the `with_*` methods before any command is
/// added; [`with_translation_mode`](Self::with_translation_mode) resets the
/// command registry.
#[derive(Debug)]
pub struct SchemaBuilder {
    description: Option<String>,
    epilog: Option<String>,
    flag_strategy: Box<dyn FlagStrategy>,
    abbreviations: Box<dyn AbbreviationGenerator>,
    converter: Arc<dyn TypeConverter>,
    translation_mode: TranslationMode,
    reserved_flags: Vec<String>,
    command_key: String,
    method_skips: Vec<String>,
    expand_model_params: bool,
    expander: ModelExpander,
    separator: String,
    pipe: PipeTargetRegistry,
    registry: CommandNameRegistry,
    entries: Vec<Entry>,
}

impl Default for SchemaBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaBuilder {
    pub fn new() -> Self {
        let translation_mode = TranslationMode::default();
        Self {
            description: None,
            epilog: None,
            flag_strategy: Box::new(DefaultFlagStrategy::default()),
            abbreviations: Box::new(DefaultAbbreviationGenerator),
            converter: Arc::new(DefaultTypeConverter::new()),
            translation_mode,
            reserved_flags: DEFAULT_RESERVED_FLAGS.map(String::from).to_vec(),
            command_key: DEFAULT_COMMAND_KEY.to_string(),
            method_skips: DEFAULT_METHOD_SKIPS.map(String::from).to_vec(),
            expand_model_params: true,
            expander: ModelExpander::default(),
            separator: DEFAULT_SEPARATOR.to_string(),
            pipe: PipeTargetRegistry::default(),
            registry: CommandNameRegistry::new(NameMapping::new(translation_mode)),
            entries: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    pub fn with_epilog(mut self, epilog: &str) -> Self {
        self.epilog = Some(epilog.to_string());
        self
    }

    pub fn with_flag_strategy(mut self, strategy: impl FlagStrategy + 'static) -> Self {
        self.flag_strategy = Box::new(strategy);
        self
    }

    pub fn with_abbreviations(mut self, generator: impl AbbreviationGenerator + 'static) -> Self {
        self.abbreviations = Box::new(generator);
        self
    }

    pub fn with_converter(mut self, converter: impl TypeConverter + 'static) -> Self {
        self.converter = Arc::new(converter);
        self
    }

    pub fn with_translation_mode(mut self, mode: TranslationMode) -> Self {
        self.translation_mode = mode;
        self.registry = CommandNameRegistry::new(NameMapping::new(mode));
        self
    }

    pub fn with_reserved_flags<I, S>(mut self, flags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.reserved_flags = flags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_command_key(mut self, key: &str) -> Self {
        self.command_key = key.to_string();
        self
    }

    pub fn with_method_skips<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.method_skips = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_model_expansion(mut self, enabled: bool) -> Self {
        self.expand_model_params = enabled;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.expander = ModelExpander::new(max_depth);
        self
    }

    pub fn with_separator(mut self, separator: &str) -> Self {
        self.separator = separator.to_string();
        self
    }

    /// Converter shared with the runner for piped chunks.
    pub fn converter(&self) -> &dyn TypeConverter {
        self.converter.as_ref()
    }

    pub fn command_key(&self) -> &str {
        &self.command_key
    }

    /// Registers a callable as a top-level command.
    ///
    /// Returns the canonical CLI name: `name` verbatim when given, otherwise
    /// the translated callable name.
    ///
    /// # Errors
    ///
    /// - [`SchemaError::InvalidCommand`] for an unsupported callable.
    /// - [`SchemaError::DuplicateCommand`] when the name or an alias is taken.
    pub fn add_command(
        &mut self,
        callable: CallableDescriptor,
        name: Option<&str>,
        description: Option<&str>,
        aliases: &[String],
    ) -> Result<String> {
        let entry = CommandEntry {
            callable,
            name: name.map(str::to_string),
            description: description.map(str::to_string),
            aliases: aliases.to_vec(),
        };
        self.add_entry(entry)
    }

    /// Registers a prepared [`CommandEntry`].
    pub fn add_entry(&mut self, mut entry: CommandEntry) -> Result<String> {
        let Some(default_name) = entry.callable.name().map(str::to_string) else {
            return Err(SchemaError::InvalidCommand(
                entry
                    .name
                    .unwrap_or_else(|| "unsupported callable".to_string()),
            ));
        };
        let (canonical, aliases) =
            self.registry
                .register(&default_name, entry.name.as_deref(), &entry.aliases)?;
        debug!(command = %canonical, aliases = ?aliases, "Registered command");

        entry.aliases = aliases;
        self.entries.push(Entry::Callable {
            entry,
            canonical: canonical.clone(),
        });
        Ok(canonical)
    }

    /// Registers a command group; its name is used verbatim.
    pub fn add_group(&mut self, group: CommandGroup) -> Result<String> {
        let (canonical, aliases) =
            self.registry
                .register(&group.name, Some(&group.name), &group.aliases)?;
        debug!(group = %canonical, aliases = ?aliases, "Registered command group");

        self.entries.push(Entry::Group {
            group: CommandGroup { aliases, ..group },
            canonical: canonical.clone(),
        });
        Ok(canonical)
    }

    /// Declares pipe targets for `command` or one of its subcommands.
    ///
    /// `command` may be the canonical name, the callable's own name, or an
    /// alias. Use `"__init__"` as the subcommand for constructor parameters.
    pub fn set_pipe_targets(
        &mut self,
        command: &str,
        subcommand: Option<&str>,
        targets: impl Into<PipeTargetsInput>,
    ) -> Result<()> {
        let config = build_pipe_targets_config(targets, PipeOverrides::default())?;
        self.pipe.insert(command, subcommand, config);
        Ok(())
    }

    /// Declares the schema-wide pipe-target default.
    pub fn set_default_pipe_targets(&mut self, targets: impl Into<PipeTargetsInput>) -> Result<()> {
        let config = build_pipe_targets_config(targets, PipeOverrides::default())?;
        self.pipe.set_default(Some(config));
        Ok(())
    }

    /// Builds the schema for every registered command.
    ///
    /// # Errors
    ///
    /// [`SchemaError::NoCommands`] when nothing was registered, otherwise the
    /// first error raised while building a command. No partial schema is
    /// returned.
    pub fn build(&self) -> Result<ParserSchema> {
        if self.entries.is_empty() {
            return Err(SchemaError::NoCommands);
        }

        let mut ctx = BuildContext::new(self.translation_mode);
        let commands = self
            .entries
            .iter()
            .map(|entry| match entry {
                Entry::Callable { entry, canonical } => self.command_spec(
                    &mut ctx,
                    &entry.callable,
                    canonical,
                    entry.description.as_deref(),
                    &entry.aliases,
                ),
                Entry::Group { group, canonical } => {
                    self.group_command(&mut ctx, group, canonical, &group.aliases)
                }
            })
            .collect::<Result<Vec<_>>>()?;

        info!(commands = commands.len(), "Built parser schema");
        Ok(ParserSchema {
            description: self.description.clone(),
            epilog: self.epilog.clone(),
            commands,
            command_key: Some(self.command_key.clone()),
            pipe_targets: self.pipe.default_targets().cloned(),
        })
    }

    /// Builds one command without registering it.
    pub fn build_command_spec_for(
        &self,
        callable: &CallableDescriptor,
        canonical_name: &str,
        description: Option<&str>,
        aliases: &[String],
    ) -> Result<Command> {
        let mut ctx = BuildContext::new(self.translation_mode);
        self.command_spec(&mut ctx, callable, canonical_name, description, aliases)
    }

    fn command_spec(
        &self,
        ctx: &mut BuildContext,
        callable: &CallableDescriptor,
        canonical_name: &str,
        description: Option<&str>,
        aliases: &[String],
    ) -> Result<Command> {
        match callable {
            CallableDescriptor::Function(function) => {
                self.function_command(ctx, callable, function, canonical_name, description, aliases)
            }
            CallableDescriptor::Method(method) => {
                self.method_command(ctx, callable, method, canonical_name, description, aliases)
            }
            CallableDescriptor::Class(class) => {
                self.class_command(ctx, callable, class, canonical_name, description, aliases)
            }
            CallableDescriptor::Unsupported => {
                Err(SchemaError::InvalidCommand(canonical_name.to_string()))
            }
        }
    }

    fn function_command(
        &self,
        ctx: &mut BuildContext,
        callable: &CallableDescriptor,
        function: &FunctionDescriptor,
        canonical_name: &str,
        description: Option<&str>,
        aliases: &[String],
    ) -> Result<Command> {
        let pipe_targets =
            self.pipe
                .resolve_by_names(canonical_name, &function.name, aliases, None, false);
        let mut taken = self.reserved_flags.clone();
        let parameters = self.build_arguments(
            ctx,
            &function.parameters,
            &mut taken,
            &mut FlagScope::new(),
            pipe_targets.as_ref(),
        )?;

        Ok(Command {
            target: Some(callable.clone()),
            canonical_name: canonical_name.to_string(),
            cli_name: canonical_name.to_string(),
            aliases: aliases.to_vec(),
            description: description
                .map(str::to_string)
                .or_else(|| function.description.clone()),
            epilog: None,
            pipe_targets,
            parameters,
            initializer: Vec::new(),
            subcommands: None,
            command_type: CommandType::Function,
        })
    }

    fn method_command(
        &self,
        ctx: &mut BuildContext,
        callable: &CallableDescriptor,
        method: &MethodDescriptor,
        canonical_name: &str,
        description: Option<&str>,
        aliases: &[String],
    ) -> Result<Command> {
        let pipe_targets =
            self.pipe
                .resolve_by_names(canonical_name, &method.name, aliases, None, false);
        let mut taken = self.reserved_flags.clone();
        let mut scope = FlagScope::new();

        let mut init_pipe = None;
        let initializer = match (&method.constructor_parameters, method.bound) {
            (Some(constructor), false) => {
                init_pipe = self.pipe.resolve_by_names(
                    canonical_name,
                    &method.name,
                    aliases,
                    Some(INIT_PIPE_KEY),
                    false,
                );
                self.build_arguments(ctx, constructor, &mut taken, &mut scope, init_pipe.as_ref())?
            }
            _ => Vec::new(),
        };
        let parameters = self.build_arguments(
            ctx,
            &method.parameters,
            &mut taken,
            &mut scope,
            pipe_targets.as_ref(),
        )?;

        Ok(Command {
            target: Some(callable.clone()),
            canonical_name: canonical_name.to_string(),
            cli_name: canonical_name.to_string(),
            aliases: aliases.to_vec(),
            description: description
                .map(str::to_string)
                .or_else(|| method.description.clone()),
            epilog: None,
            pipe_targets: pipe_targets.or(init_pipe),
            parameters,
            initializer,
            subcommands: None,
            command_type: CommandType::Method,
        })
    }

    fn class_command(
        &self,
        ctx: &mut BuildContext,
        callable: &CallableDescriptor,
        class: &ClassDescriptor,
        canonical_name: &str,
        description: Option<&str>,
        aliases: &[String],
    ) -> Result<Command> {
        let class_pipe =
            self.pipe
                .resolve_by_names(canonical_name, &class.name, aliases, None, false);
        let init_pipe = self
            .pipe
            .resolve_by_names(canonical_name, &class.name, aliases, Some(INIT_PIPE_KEY), false)
            .or_else(|| class_pipe.clone());

        let mut taken = self.reserved_flags.clone();
        taken.push(self.command_key.clone());
        let initializer = match (&class.constructor_parameters, class.initialized) {
            (Some(constructor), false) => self.build_arguments(
                ctx,
                constructor,
                &mut taken,
                &mut FlagScope::new(),
                init_pipe.as_ref(),
            )?,
            _ => Vec::new(),
        };

        let mut names = CommandNameRegistry::new(NameMapping::new(self.translation_mode));
        let mut subcommands = Vec::new();
        for method in &class.methods {
            if self.method_skips.contains(&method.name) {
                continue;
            }
            let cli_name = ctx.commands.translate(&method.name);
            names.register(&method.name, Some(&cli_name), &[])?;

            let pipe_targets = [cli_name.as_str(), method.name.as_str()]
                .into_iter()
                .find_map(|sub| {
                    self.pipe
                        .resolve_by_names(canonical_name, &class.name, aliases, Some(sub), false)
                })
                .or_else(|| class_pipe.clone());

            let mut method_taken = self.reserved_flags.clone();
            let parameters = self.build_arguments(
                ctx,
                &method.parameters,
                &mut method_taken,
                &mut FlagScope::new(),
                pipe_targets.as_ref(),
            )?;

            let target = MethodDescriptor {
                name: method.name.clone(),
                description: method.description.clone(),
                parameters: method.parameters.clone(),
                owner: class.name.clone(),
                bound: class.initialized,
                constructor_parameters: class.constructor_parameters.clone(),
            };
            subcommands.push(Command {
                target: Some(CallableDescriptor::Method(target)),
                canonical_name: method.name.clone(),
                cli_name,
                aliases: Vec::new(),
                description: method.description.clone(),
                epilog: None,
                pipe_targets,
                parameters,
                initializer: Vec::new(),
                subcommands: None,
                command_type: CommandType::Method,
            });
        }

        if subcommands.is_empty() {
            return Err(SchemaError::EmptyGroup(canonical_name.to_string()));
        }
        debug!(
            command = %canonical_name,
            subcommands = subcommands.len(),
            initialized = class.initialized,
            "Built class command"
        );

        Ok(Command {
            target: Some(callable.clone()),
            canonical_name: canonical_name.to_string(),
            cli_name: canonical_name.to_string(),
            aliases: aliases.to_vec(),
            description: description
                .map(str::to_string)
                .or_else(|| class.description.clone()),
            epilog: None,
            // Subcommands already carry their own resolution.
            pipe_targets: init_pipe,
            parameters: Vec::new(),
            initializer,
            subcommands: Some(subcommands),
            command_type: if class.initialized {
                CommandType::Instance
            } else {
                CommandType::Class
            },
        })
    }

    fn group_command(
        &self,
        ctx: &mut BuildContext,
        group: &CommandGroup,
        canonical_name: &str,
        aliases: &[String],
    ) -> Result<Command> {
        if group.commands.is_empty() && group.subgroups.is_empty() {
            return Err(SchemaError::EmptyGroup(group.name.clone()));
        }

        let mut taken = self.reserved_flags.clone();
        taken.push(self.command_key.clone());
        let source: &[ParameterDescriptor] = match &group.args {
            None => &[],
            Some(CallableDescriptor::Function(function)) => &function.parameters,
            Some(CallableDescriptor::Method(method)) => &method.parameters,
            Some(CallableDescriptor::Class(class)) => {
                class.constructor_parameters.as_deref().unwrap_or_default()
            }
            Some(CallableDescriptor::Unsupported) => {
                return Err(SchemaError::InvalidCommand(format!(
                    "group '{}' has unsupported args source",
                    group.name
                )));
            }
        };
        let initializer =
            self.build_arguments(ctx, source, &mut taken, &mut FlagScope::new(), None)?;

        let mut names = CommandNameRegistry::new(NameMapping::new(self.translation_mode));
        let mut subcommands = Vec::new();
        for entry in &group.commands {
            let Some(default_name) = entry.callable.name() else {
                return Err(SchemaError::InvalidCommand(format!(
                    "unsupported callable in group '{}'",
                    group.name
                )));
            };
            let (canonical, entry_aliases) =
                names.register(default_name, entry.name.as_deref(), &entry.aliases)?;
            subcommands.push(self.command_spec(
                ctx,
                &entry.callable,
                &canonical,
                entry.description.as_deref(),
                &entry_aliases,
            )?);
        }
        for subgroup in &group.subgroups {
            let (canonical, sub_aliases) =
                names.register(&subgroup.name, Some(&subgroup.name), &subgroup.aliases)?;
            subcommands.push(self.group_command(ctx, subgroup, &canonical, &sub_aliases)?);
        }

        Ok(Command {
            target: None,
            canonical_name: canonical_name.to_string(),
            cli_name: canonical_name.to_string(),
            aliases: aliases.to_vec(),
            description: group.description.clone(),
            epilog: None,
            pipe_targets: None,
            parameters: Vec::new(),
            initializer,
            subcommands: Some(subcommands),
            command_type: CommandType::Group,
        })
    }

    fn build_arguments(
        &self,
        ctx: &mut BuildContext,
        parameters: &[ParameterDescriptor],
        taken: &mut Vec<String>,
        scope: &mut FlagScope,
        pipe_targets: Option<&PipeTargets>,
    ) -> Result<Vec<Argument>> {
        let pipe_names: HashSet<&str> = pipe_targets
            .map(PipeTargets::targeted_parameters)
            .unwrap_or_default();
        for name in &pipe_names {
            if !parameters.iter().any(|param| param.name == *name) {
                warn!(parameter = %name, "Pipe target does not match any parameter");
            }
        }

        let mut arguments = Vec::new();
        for param in parameters {
            if param.kind == ParameterKind::VarKeyword {
                debug!(parameter = %param.name, "Skipping keyword collector");
                continue;
            }
            if self.expand_model_params && !pipe_names.contains(param.name.as_str()) {
                if let Some(leaves) = self.expander.expand_parameter(param) {
                    arguments.extend(self.expanded_arguments(ctx, param, leaves, taken)?);
                    continue;
                }
            }
            arguments.push(self.argument_from_parameter(ctx, param, taken, scope, &pipe_names)?);
        }
        Ok(arguments)
    }

    /// Maps one parameter to a single argument.
    fn argument_from_parameter(
        &self,
        ctx: &mut BuildContext,
        param: &ParameterDescriptor,
        taken: &mut Vec<String>,
        scope: &mut FlagScope,
        pipe_names: &HashSet<&str>,
    ) -> Result<Argument> {
        let variadic = param.kind == ParameterKind::VarPositional;
        let param = if variadic {
            collector_as_list(param)
        } else {
            param.clone()
        };

        let display_name = ctx.arguments.translate(&param.name);
        let flags = self.flag_strategy.arg_flags(
            &display_name,
            &param,
            taken,
            self.abbreviations.as_ref(),
            scope,
        )?;
        taken.push(display_name.clone());

        let kind = if flags.iter().any(|flag| flag.starts_with('-')) {
            ArgumentKind::Option
        } else {
            ArgumentKind::Positional
        };
        let mut argument = Argument {
            name: param.name.clone(),
            display_name,
            kind,
            value_shape: ValueShape::Single,
            flags,
            required: param.required && !variadic,
            default: param.default.clone(),
            help: param.description.clone(),
            ty: param.ty.clone(),
            parser: None,
            nargs: None,
            boolean_behavior: None,
            choices: None,
            accepts_stdin: false,
            pipe_required: false,
            is_expanded_from: None,
            expansion_path: Vec::new(),
            original_model_type: None,
            parent_is_optional: false,
            model_default: DefaultValue::Unset,
        };
        self.apply_value_shape(&mut argument, param.ty.as_ref());

        if pipe_names.contains(param.name.as_str()) {
            argument.accepts_stdin = true;
            argument.pipe_required = argument.required;
            argument.required = false;
            if argument.is_positional()
                && argument.value_shape == ValueShape::Single
                && argument.nargs.is_none()
            {
                argument.nargs = Some(Nargs::Optional);
            }
        }
        Ok(argument)
    }

    /// Leaf arguments for a record-typed parameter.
    fn expanded_arguments(
        &self,
        ctx: &mut BuildContext,
        param: &ParameterDescriptor,
        leaves: Vec<ExpandedLeaf>,
        taken: &mut Vec<String>,
    ) -> Result<Vec<Argument>> {
        let model = record_type_of(param).cloned();
        let parent_is_optional =
            !param.required || param.ty.as_ref().is_some_and(|ty| ty.unwrap_optional().1);

        let mut arguments = Vec::with_capacity(leaves.len());
        for leaf in leaves {
            let display_name = leaf
                .path
                .iter()
                .map(|segment| ctx.arguments.translate(segment))
                .collect::<Vec<_>>()
                .join(&self.separator);
            if taken.contains(&display_name) {
                return Err(SchemaError::ReservedFlag(display_name));
            }
            taken.push(display_name.clone());

            let mut argument = Argument {
                name: leaf.joined(&self.separator),
                flags: vec![format!("--{display_name}")],
                display_name,
                kind: ArgumentKind::Option,
                value_shape: ValueShape::Single,
                required: leaf.required,
                default: DefaultValue::Unset,
                help: leaf.description,
                ty: leaf.ty.clone(),
                parser: None,
                nargs: None,
                boolean_behavior: None,
                choices: None,
                accepts_stdin: false,
                pipe_required: false,
                is_expanded_from: Some(param.name.clone()),
                expansion_path: leaf.path,
                original_model_type: model.clone(),
                parent_is_optional,
                model_default: param.default.clone(),
            };
            self.apply_value_shape(&mut argument, leaf.ty.as_ref());

            // Leaves stay absent unless supplied so reconstruction can fall
            // back to field and model defaults.
            argument.default = DefaultValue::Unset;
            if let Some(behavior) = argument.boolean_behavior.as_mut() {
                behavior.default = None;
            }
            arguments.push(argument);
        }
        Ok(arguments)
    }

    /// Infers value shape, nargs, parser, and choices from the declared type.
    fn apply_value_shape(&self, argument: &mut Argument, ty: Option<&TypeTag>) {
        let Some(ty) = ty else {
            return;
        };
        let (inner, optional) = ty.unwrap_optional();

        match inner {
            TypeTag::List { item } => self.apply_list_shape(argument, item.as_deref(), optional),
            TypeTag::Tuple { items } if items.is_empty() => {
                self.apply_list_shape(argument, None, optional);
            }
            TypeTag::Tuple { items } => {
                argument.value_shape = ValueShape::FixedTuple;
                argument.nargs = Some(Nargs::Exactly(items.len()));
                let mut parsers: Vec<ValueParser> = items
                    .iter()
                    .map(|item| {
                        self.converter
                            .parse_func(item)
                            .unwrap_or_else(verbatim_parser)
                    })
                    .collect();
                let homogeneous = items.windows(2).all(|pair| pair[0] == pair[1]);
                argument.parser = Some(if homogeneous {
                    ArgumentParser::Single(parsers.swap_remove(0))
                } else {
                    ArgumentParser::PerPosition(parsers)
                });
            }
            TypeTag::Bool if !optional => self.apply_flag_shape(argument),
            _ => {
                argument.parser = self.converter.parse_func(ty).map(ArgumentParser::Single);
                argument.choices = ty.choices();
            }
        }
    }

    fn apply_list_shape(&self, argument: &mut Argument, item: Option<&TypeTag>, optional: bool) {
        argument.value_shape = ValueShape::List;
        argument.nargs = Some(Nargs::ZeroOrMore);
        argument.ty = item.cloned();
        argument.parser = item
            .and_then(|item| self.converter.parse_func(item))
            .map(ArgumentParser::Single);
        argument.choices = item.and_then(TypeTag::choices);

        if argument.default.is_unset() {
            argument.default = DefaultValue::Set(Value::Array(Vec::new()));
            if optional {
                argument.required = false;
            }
        }
    }

    fn apply_flag_shape(&self, argument: &mut Argument) {
        argument.value_shape = ValueShape::Flag;
        argument.required = false;

        let long_name = argument
            .long_flag()
            .map(|flag| flag.trim_start_matches("--").to_string());
        if argument.default.is_unset() {
            argument.default = DefaultValue::Set(Value::Bool(false));
        }
        let default = argument.default.value().and_then(Value::as_bool);

        argument.boolean_behavior = Some(BooleanBehavior {
            supports_negative: long_name.is_some(),
            negative_form: long_name.map(|name| format!("--{}", inverted_bool_flag_name(&name))),
            default,
        });
    }
}

/// A variadic-positional parameter seen as a list of its declared item type.
fn collector_as_list(param: &ParameterDescriptor) -> ParameterDescriptor {
    let ty = match &param.ty {
        Some(ty) if ty.is_list() => ty.clone(),
        Some(ty) => TypeTag::list_of(ty.clone()),
        None => TypeTag::List { item: None },
    };
    ParameterDescriptor {
        ty: Some(ty),
        required: true,
        ..param.clone()
    }
}

fn verbatim_parser() -> ValueParser {
    ValueParser::new("str", |raw: &str| Ok(Value::String(raw.to_string())))
}
