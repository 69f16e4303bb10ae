use crate::derived::RatioPolicy;
use crate::error::ConfigError;
use crate::parser::Parser;
use crate::parsers;
use crate::value::ValueType;
use serde::Deserialize;
use std::path::Path;

/// Top-level configuration loaded from `runprops.toml`.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    /// Built-in parsers to run, in order.
    pub parsers: Vec<String>,
    pub ratio_policy: RatioPolicy,
    /// Extra pattern rules, evaluated after the built-in parsers.
    #[serde(rename = "pattern")]
    pub patterns: Vec<PatternConfig>,
}

/// A pattern rule declared in the config file.
#[derive(Debug, Clone, Deserialize)]
pub struct PatternConfig {
    pub name: String,
    pub regex: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default, rename = "type")]
    pub value_type: ValueType,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            parsers: parsers::BUILTIN_NAMES.iter().map(|s| s.to_string()).collect(),
            ratio_policy: RatioPolicy::default(),
            patterns: Vec::new(),
        }
    }
}

impl ExtractConfig {
    /// Load config from `path`; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file, using defaults");
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source: e,
                })
            }
        };
        toml::from_str(&contents).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Assemble the rule registry: built-in parsers first, then config patterns.
    pub fn build_parser(&self) -> Result<Parser, ConfigError> {
        let mut parser = Parser::new();
        for name in &self.parsers {
            parser.extend(parsers::builtin(name, self.ratio_policy)?);
        }
        for pattern in &self.patterns {
            parser.add_pattern(
                pattern.name.clone(),
                &pattern.regex,
                pattern.required,
                pattern.value_type,
            )?;
        }
        Ok(parser)
    }
}
