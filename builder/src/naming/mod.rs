//! Naming and flag strategy.
//!
//! Turns identifiers into CLI names ([`NameMapping`]), picks flags for
//! parameters ([`FlagStrategy`]), shortens names into short flags
//! ([`AbbreviationGenerator`]), and keeps command names and aliases unique
//! ([`CommandNameRegistry`]).

mod abbreviations;
mod flags;
mod mapping;
mod registry;

pub use abbreviations::{AbbreviationGenerator, DefaultAbbreviationGenerator, NoAbbreviations};
pub use flags::{DefaultFlagStrategy, FlagScope, FlagStrategy, FlagStyle, inverted_bool_flag_name};
pub use mapping::{NameMapping, TranslationMode, reverse_translations};
pub use registry::CommandNameRegistry;
