//! Errors for the conditions that are fatal to a caller.
//!
//! Per-rule extraction problems are not errors; they are recorded on the
//! run's [`PropertyRecord`](crate::record::PropertyRecord) instead.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while building a rule registry.
#[derive(Debug, Error)]
pub enum ParserError {
    #[error("invalid pattern for {name}: {source}")]
    Regex {
        name: String,
        #[source]
        source: regex::Error,
    },
    #[error("pattern for {name} must have exactly one capture group, found {found}")]
    CaptureGroups { name: String, found: usize },
    #[error("unknown parser {0:?} (expected one of: {known})", known = crate::parsers::BUILTIN_NAMES.join(", "))]
    UnknownParser(String),
}

/// Errors from loading the TOML configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error(transparent)]
    Rule(#[from] ParserError),
}

/// Errors from reading logs and writing properties files.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("failed to read log {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decompress log {}: {source}", path.display())]
    Decompress {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("log {} is not valid UTF-8", path.display())]
    Encoding { path: PathBuf },
    #[error("invalid log path pattern {pattern:?}: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },
    #[error("failed to parse existing properties {}: {source}", path.display())]
    Properties {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to serialize properties: {0}")]
    Serialize(#[source] serde_json::Error),
    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to rename {} -> {}: {source}", from.display(), to.display())]
    Rename {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
