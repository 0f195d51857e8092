//! Schema validation.
//!
//! Checks the structural invariants of a built [`ParserSchema`]: every
//! argument has at least one flag, flags are unique within a command, grouping
//! commands actually have children, and subcommand names do not collide.
//!
//! # Examples
//!
//! ```
//! use interface_schema_core::*;
//!
//! let schema = ParserSchema {
//!     description: None,
//!     epilog: None,
//!     commands: Vec::new(),
//!     command_key: None,
//!     pipe_targets: None,
//! };
//! assert_eq!(validate_schema(&schema), vec![ValidationError::NoCommands]);
//! ```

use std::collections::HashSet;

use thiserror::Error;

use crate::{Argument, ArgumentKind, Command, CommandType, ParserSchema};

/// Schema validation errors.
///
/// Each variant names one broken invariant. The `Display` impl provides a
/// human-readable message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The schema has no top-level command.
    #[error("schema has no commands")]
    NoCommands,
    /// A command has an empty CLI name.
    #[error("command name cannot be empty")]
    EmptyCommandName,
    /// Two commands in the same scope share a name or alias.
    #[error("duplicate command in scope: {0}")]
    DuplicateCommand(String),
    /// An argument declares no flags.
    #[error("argument '{0}' has no flags")]
    MissingFlags(String),
    /// An option flag does not start with a dash.
    #[error("invalid option flag format: {0}")]
    InvalidOptionFlag(String),
    /// Two arguments of one command share a flag.
    #[error("duplicate flag in command '{command}': {flag}")]
    DuplicateFlag {
        /// CLI name of the command.
        command: String,
        /// Repeated flag.
        flag: String,
    },
    /// A class, instance, or group command has no subcommands.
    #[error("command '{0}' groups nothing")]
    EmptyGroup(String),
    /// A function or method command carries subcommands.
    #[error("command '{0}' is callable but has subcommands")]
    UnexpectedSubcommands(String),
}

/// Validates a built schema.
///
/// Returns the first problem found in each command scope, or an empty vector
/// when the schema is consistent.
pub fn validate_schema(schema: &ParserSchema) -> Vec<ValidationError> {
    if schema.commands.is_empty() {
        return vec![ValidationError::NoCommands];
    }
    validate_commands(&schema.commands)
}

fn validate_commands(commands: &[Command]) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let mut seen: HashSet<&str> = HashSet::new();

    for command in commands {
        if command.cli_name.trim().is_empty() {
            errors.push(ValidationError::EmptyCommandName);
            return errors;
        }

        let names = std::iter::once(&command.cli_name).chain(command.aliases.iter());
        for name in names {
            if !seen.insert(name.as_str()) {
                errors.push(ValidationError::DuplicateCommand(name.clone()));
                return errors;
            }
        }

        errors.extend(validate_command(command));
        if !errors.is_empty() {
            return errors;
        }
    }

    errors
}

fn validate_command(command: &Command) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    match command.command_type {
        CommandType::Function | CommandType::Method if !command.is_leaf() => {
            errors.push(ValidationError::UnexpectedSubcommands(
                command.cli_name.clone(),
            ));
            return errors;
        }
        CommandType::Class | CommandType::Instance | CommandType::Group
            if command.is_leaf() =>
        {
            errors.push(ValidationError::EmptyGroup(command.cli_name.clone()));
            return errors;
        }
        _ => {}
    }

    errors.extend(validate_flags(&command.cli_name, command.all_arguments()));
    if !errors.is_empty() {
        return errors;
    }

    if let Some(subcommands) = &command.subcommands {
        errors.extend(validate_commands(subcommands));
    }

    errors
}

fn validate_flags<'a>(
    command: &str,
    arguments: impl Iterator<Item = &'a Argument>,
) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let mut seen = HashSet::new();

    for argument in arguments {
        if argument.flags.is_empty() {
            errors.push(ValidationError::MissingFlags(argument.name.clone()));
            return errors;
        }

        for flag in &argument.flags {
            if argument.kind == ArgumentKind::Option && !flag.starts_with('-') {
                errors.push(ValidationError::InvalidOptionFlag(flag.clone()));
                return errors;
            }
            if !seen.insert(flag.as_str()) {
                errors.push(ValidationError::DuplicateFlag {
                    command: command.to_string(),
                    flag: flag.clone(),
                });
                return errors;
            }
        }
    }

    errors
}
