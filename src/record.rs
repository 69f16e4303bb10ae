//! The per-run property record that rules populate.

use crate::value::{PropertyValue, ValueType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Reserved key under which extraction failures are serialized.
pub const FAILURES_KEY: &str = "extraction_failures";

/// A rule-local failure. Never aborts the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExtractionFailure {
    /// A required pattern rule found no match.
    MissingRequired { attribute: String },
    /// The captured text did not parse as the declared type.
    Coercion {
        attribute: String,
        raw: String,
        expected: ValueType,
    },
}

impl ExtractionFailure {
    pub fn attribute(&self) -> &str {
        match self {
            ExtractionFailure::MissingRequired { attribute } => attribute,
            ExtractionFailure::Coercion { attribute, .. } => attribute,
        }
    }
}

impl fmt::Display for ExtractionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractionFailure::MissingRequired { attribute } => {
                write!(f, "required attribute {attribute} not found")
            }
            ExtractionFailure::Coercion {
                attribute,
                raw,
                expected,
            } => write!(f, "attribute {attribute}: cannot read {raw:?} as {expected}"),
        }
    }
}

/// Properties extracted from one run's log.
///
/// Absence of a key means no rule produced it; there are no null values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PropertyRecord {
    #[serde(flatten)]
    values: BTreeMap<String, PropertyValue>,
    #[serde(
        rename = "extraction_failures",
        default,
        skip_serializing_if = "Vec::is_empty"
    )]
    failures: Vec<ExtractionFailure>,
}

impl PropertyRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite a property. Returns the previous value, if any.
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: impl Into<PropertyValue>,
    ) -> Option<PropertyValue> {
        self.values.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&PropertyValue> {
        self.values.get(key)
    }

    /// Value for `key`, or `default` when no rule has produced it yet.
    pub fn get_or(&self, key: &str, default: PropertyValue) -> PropertyValue {
        self.values.get(key).cloned().unwrap_or(default)
    }

    /// Integer view of `key`, falling back to `default` when absent or not an integer.
    pub fn int_or(&self, key: &str, default: i64) -> i64 {
        self.get(key).and_then(PropertyValue::as_i64).unwrap_or(default)
    }

    /// Numeric view of `key`; integers widen to `f64`.
    pub fn float_or(&self, key: &str, default: f64) -> f64 {
        self.get(key).and_then(PropertyValue::as_f64).unwrap_or(default)
    }

    pub fn bool_or(&self, key: &str, default: bool) -> bool {
        self.get(key).and_then(PropertyValue::as_bool).unwrap_or(default)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Properties in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropertyValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn record_failure(&mut self, failure: ExtractionFailure) {
        self.failures.push(failure);
    }

    pub fn failures(&self) -> &[ExtractionFailure] {
        &self.failures
    }

    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    /// Whether a required attribute was reported missing.
    pub fn is_missing_required(&self, attribute: &str) -> bool {
        self.failures.iter().any(|f| {
            matches!(f, ExtractionFailure::MissingRequired { attribute: a } if a == attribute)
        })
    }
}
