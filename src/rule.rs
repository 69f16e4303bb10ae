//! Extraction rules: declarative pattern rules and imperative function rules.

use crate::error::ParserError;
use crate::record::{ExtractionFailure, PropertyRecord};
use crate::value::ValueType;
use regex::Regex;
use std::fmt;

/// Declarative single-capture rule: first match in the log wins.
#[derive(Debug, Clone)]
pub struct PatternRule {
    name: String,
    regex: Regex,
    required: bool,
    value_type: ValueType,
}

impl PatternRule {
    /// Compile a pattern rule. The pattern must contain exactly one capture group.
    pub fn new(
        name: impl Into<String>,
        pattern: &str,
        required: bool,
        value_type: ValueType,
    ) -> Result<Self, ParserError> {
        let name = name.into();
        let regex = Regex::new(pattern).map_err(|source| ParserError::Regex {
            name: name.clone(),
            source,
        })?;
        Self::from_regex(name, regex, required, value_type)
    }

    /// Build a pattern rule around an already compiled regex.
    pub fn from_regex(
        name: impl Into<String>,
        regex: Regex,
        required: bool,
        value_type: ValueType,
    ) -> Result<Self, ParserError> {
        let name = name.into();
        // captures_len counts the implicit whole-match group
        let found = regex.captures_len() - 1;
        if found != 1 {
            return Err(ParserError::CaptureGroups { name, found });
        }
        Ok(Self {
            name,
            regex,
            required,
            value_type,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn pattern(&self) -> &str {
        self.regex.as_str()
    }

    pub fn required(&self) -> bool {
        self.required
    }

    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    /// Search the whole log once and write the coerced capture, or record why not.
    pub fn apply(&self, text: &str, record: &mut PropertyRecord) {
        let raw = match self.regex.captures(text).and_then(|caps| caps.get(1)) {
            Some(m) => m.as_str(),
            None => {
                if self.required {
                    tracing::warn!(attribute = %self.name, "required attribute not found");
                    record.record_failure(ExtractionFailure::MissingRequired {
                        attribute: self.name.clone(),
                    });
                } else {
                    tracing::trace!(attribute = %self.name, "optional attribute not found");
                }
                return;
            }
        };

        match self.value_type.coerce(raw) {
            Some(value) => {
                tracing::trace!(attribute = %self.name, ?value, "pattern matched");
                record.insert(self.name.clone(), value);
            }
            None => {
                tracing::warn!(
                    attribute = %self.name,
                    raw,
                    expected = %self.value_type,
                    "captured text has the wrong type"
                );
                record.record_failure(ExtractionFailure::Coercion {
                    attribute: self.name.clone(),
                    raw: raw.to_string(),
                    expected: self.value_type,
                });
            }
        }
    }
}

type Procedure = dyn Fn(&str, &mut PropertyRecord) + Send + Sync;

/// Imperative rule with access to the log and every property produced before it.
///
/// `reads` and `writes` declare the keys the procedure touches. They are not
/// enforced at evaluation time; the registry uses them to check ordering.
pub struct FunctionRule {
    name: String,
    reads: Vec<String>,
    writes: Vec<String>,
    procedure: Box<Procedure>,
}

impl FunctionRule {
    pub fn new<F>(name: impl Into<String>, procedure: F) -> Self
    where
        F: Fn(&str, &mut PropertyRecord) + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            reads: Vec::new(),
            writes: Vec::new(),
            procedure: Box::new(procedure),
        }
    }

    /// Declare keys this rule reads from the record.
    pub fn reads<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.reads.extend(keys.into_iter().map(Into::into));
        self
    }

    /// Declare keys this rule writes to the record.
    pub fn writes<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.writes.extend(keys.into_iter().map(Into::into));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn apply(&self, text: &str, record: &mut PropertyRecord) {
        (self.procedure)(text, record);
    }
}

impl fmt::Debug for FunctionRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionRule")
            .field("name", &self.name)
            .field("reads", &self.reads)
            .field("writes", &self.writes)
            .finish_non_exhaustive()
    }
}

/// A registered extraction unit.
#[derive(Debug)]
pub enum Rule {
    Pattern(PatternRule),
    Function(FunctionRule),
}

impl Rule {
    pub fn name(&self) -> &str {
        match self {
            Rule::Pattern(p) => p.name(),
            Rule::Function(f) => f.name(),
        }
    }

    /// Keys read from the record. Pattern rules read only the log.
    pub fn reads(&self) -> &[String] {
        match self {
            Rule::Pattern(_) => &[],
            Rule::Function(f) => &f.reads,
        }
    }

    /// Keys the rule may write.
    pub fn writes(&self) -> &[String] {
        match self {
            Rule::Pattern(p) => std::slice::from_ref(&p.name),
            Rule::Function(f) => &f.writes,
        }
    }

    pub fn apply(&self, text: &str, record: &mut PropertyRecord) {
        match self {
            Rule::Pattern(p) => p.apply(text, record),
            Rule::Function(f) => f.apply(text, record),
        }
    }
}

impl From<PatternRule> for Rule {
    fn from(rule: PatternRule) -> Self {
        Rule::Pattern(rule)
    }
}

impl From<FunctionRule> for Rule {
    fn from(rule: FunctionRule) -> Self {
        Rule::Function(rule)
    }
}
