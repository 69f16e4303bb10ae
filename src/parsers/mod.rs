//! Ready-made rule registries for the merge-and-shrink experiments.

mod merge_strategies;
mod symmetries;

pub use merge_strategies::merge_strategies;
pub use symmetries::symmetries;

use crate::derived::RatioPolicy;
use crate::error::ParserError;
use crate::parser::Parser;

/// Names accepted by [`builtin`], in their default evaluation order.
pub const BUILTIN_NAMES: &[&str] = &["merge_strategies", "symmetries"];

/// Look up a built-in parser by name.
pub fn builtin(name: &str, policy: RatioPolicy) -> Result<Parser, ParserError> {
    match name {
        "merge_strategies" => merge_strategies(),
        "symmetries" => symmetries(policy),
        other => Err(ParserError::UnknownParser(other.to_string())),
    }
}
