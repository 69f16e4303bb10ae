//! Rule registry and extraction pipeline.
//!
//! A [`Parser`] holds rules in registration order and evaluates all of them,
//! in that order, against one shared [`PropertyRecord`] per log. Later rules
//! see everything earlier rules wrote. Failures stay local to the rule that
//! produced them; the pipeline never stops early.

use crate::error::ParserError;
use crate::record::PropertyRecord;
use crate::rule::{FunctionRule, PatternRule, Rule};
use crate::value::ValueType;
use std::collections::HashMap;
use std::fmt;

/// An ordering hazard found by [`Parser::validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleWarning {
    /// `reader` reads `key`, but `writer` (registered later) produces it.
    ReadBeforeWrite {
        key: String,
        reader: String,
        writer: String,
    },
    /// Both rules write `key`; the later one overwrites the earlier.
    DuplicateWriter {
        key: String,
        first: String,
        second: String,
    },
}

impl fmt::Display for RuleWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleWarning::ReadBeforeWrite {
                key,
                reader,
                writer,
            } => write!(
                f,
                "rule {reader} reads {key} before rule {writer} writes it"
            ),
            RuleWarning::DuplicateWriter { key, first, second } => write!(
                f,
                "rules {first} and {second} both write {key}; {second} wins"
            ),
        }
    }
}

/// Ordered registry of extraction rules.
#[derive(Debug, Default)]
pub struct Parser {
    rules: Vec<Rule>,
}

impl Parser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a pattern rule at the end of the evaluation order.
    pub fn add_pattern(
        &mut self,
        name: impl Into<String>,
        pattern: &str,
        required: bool,
        value_type: ValueType,
    ) -> Result<&mut Self, ParserError> {
        let rule = PatternRule::new(name, pattern, required, value_type)?;
        Ok(self.push(Rule::Pattern(rule)))
    }

    /// Register a function rule at the end of the evaluation order.
    pub fn add_function(&mut self, rule: FunctionRule) -> &mut Self {
        self.push(Rule::Function(rule))
    }

    /// Register any rule, warning about ordering hazards it introduces.
    pub fn push(&mut self, rule: Rule) -> &mut Self {
        for warning in self.hazards_of(&rule) {
            tracing::warn!(rule = %rule.name(), "{warning}");
        }
        self.rules.push(rule);
        self
    }

    /// Append every rule of `other`, keeping its order.
    pub fn extend(&mut self, other: Parser) -> &mut Self {
        for rule in other.rules {
            self.push(rule);
        }
        self
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Evaluate every rule against `text` into a fresh record.
    pub fn parse(&self, text: &str) -> PropertyRecord {
        let mut record = PropertyRecord::new();
        self.parse_into(text, &mut record);
        record
    }

    /// Evaluate every rule against `text`, writing into an existing record.
    pub fn parse_into(&self, text: &str, record: &mut PropertyRecord) {
        let failures_before = record.failures().len();
        for rule in &self.rules {
            tracing::trace!(rule = %rule.name(), "evaluating rule");
            rule.apply(text, record);
        }
        tracing::debug!(
            rules = self.rules.len(),
            properties = record.len(),
            failures = record.failures().len() - failures_before,
            "extraction finished"
        );
    }

    /// Check declared reads and writes against registration order.
    ///
    /// Reports every read that a later rule satisfies and every key written
    /// by more than one rule. A read nobody writes is not a hazard: the
    /// reading rule falls back to its default.
    pub fn validate(&self) -> Vec<RuleWarning> {
        let mut warnings = Vec::new();
        let mut first_writer: HashMap<&str, &str> = HashMap::new();

        for (idx, rule) in self.rules.iter().enumerate() {
            for key in rule.reads() {
                if let Some(later) = self.rules[idx + 1..]
                    .iter()
                    .find(|r| r.writes().contains(key))
                {
                    warnings.push(RuleWarning::ReadBeforeWrite {
                        key: key.clone(),
                        reader: rule.name().to_string(),
                        writer: later.name().to_string(),
                    });
                }
            }
            for key in rule.writes() {
                match first_writer.get(key.as_str()) {
                    Some(first) => warnings.push(RuleWarning::DuplicateWriter {
                        key: key.clone(),
                        first: (*first).to_string(),
                        second: rule.name().to_string(),
                    }),
                    None => {
                        first_writer.insert(key.as_str(), rule.name());
                    }
                }
            }
        }
        warnings
    }

    /// Hazards `rule` would add if appended now.
    fn hazards_of(&self, rule: &Rule) -> Vec<RuleWarning> {
        let mut warnings = Vec::new();
        for key in rule.writes() {
            if let Some(reader) = self.rules.iter().find(|r| r.reads().contains(key)) {
                warnings.push(RuleWarning::ReadBeforeWrite {
                    key: key.clone(),
                    reader: reader.name().to_string(),
                    writer: rule.name().to_string(),
                });
            }
            if let Some(first) = self.rules.iter().find(|r| r.writes().contains(key)) {
                warnings.push(RuleWarning::DuplicateWriter {
                    key: key.clone(),
                    first: first.name().to_string(),
                    second: rule.name().to_string(),
                });
            }
        }
        warnings
    }
}
