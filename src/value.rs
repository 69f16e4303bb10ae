//! Typed property values and the coercions pattern rules apply to captures.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single extracted property value.
///
/// Serialized untagged, so a record becomes a flat JSON object such as
/// `{"bliss_total_calls": 4, "ms_one_scc": false}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<String>),
}

impl PropertyValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropertyValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            PropertyValue::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Numeric view of the value. Integers widen to `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            PropertyValue::Int(n) => Some(*n as f64),
            PropertyValue::Float(x) => Some(*x),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            PropertyValue::List(items) => Some(items),
            _ => None,
        }
    }
}

impl From<bool> for PropertyValue {
    fn from(b: bool) -> Self {
        PropertyValue::Bool(b)
    }
}

impl From<i64> for PropertyValue {
    fn from(n: i64) -> Self {
        PropertyValue::Int(n)
    }
}

impl From<f64> for PropertyValue {
    fn from(x: f64) -> Self {
        PropertyValue::Float(x)
    }
}

impl From<String> for PropertyValue {
    fn from(s: String) -> Self {
        PropertyValue::Str(s)
    }
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        PropertyValue::Str(s.to_string())
    }
}

impl From<Vec<String>> for PropertyValue {
    fn from(items: Vec<String>) -> Self {
        PropertyValue::List(items)
    }
}

/// Target type a pattern rule coerces its capture group to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    Int,
    Float,
    #[default]
    Str,
}

impl ValueType {
    /// Coerce captured text to this type.
    ///
    /// Numeric types are parsed after trimming surrounding whitespace;
    /// strings pass through untouched. Returns `None` when the text does
    /// not parse.
    ///
    /// Integers are limited to the `i64` range; longer digit runs are
    /// rejected. Floats must be finite: `nan` and `inf` have no JSON
    /// representation and would be written as `null`.
    pub fn coerce(self, raw: &str) -> Option<PropertyValue> {
        match self {
            ValueType::Int => raw.trim().parse::<i64>().ok().map(PropertyValue::Int),
            ValueType::Float => raw
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|x| x.is_finite())
                .map(PropertyValue::Float),
            ValueType::Str => Some(PropertyValue::Str(raw.to_string())),
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueType::Int => write!(f, "int"),
            ValueType::Float => write!(f, "float"),
            ValueType::Str => write!(f, "str"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[yare::parameterized(
        int_plain      = { ValueType::Int,   "42",     Some(PropertyValue::Int(42)) },
        int_padded     = { ValueType::Int,   " 7\r",   Some(PropertyValue::Int(7)) },
        int_garbage    = { ValueType::Int,   "4x",     None },
        int_from_float = { ValueType::Int,   "3.5",    None },
        float_plain    = { ValueType::Float, "3.5",    Some(PropertyValue::Float(3.5)) },
        float_integral = { ValueType::Float, "2",      Some(PropertyValue::Float(2.0)) },
        float_trailing = { ValueType::Float, "0.25s",  None },
        float_nan      = { ValueType::Float, "nan",    None },
        float_inf      = { ValueType::Float, "inf",    None },
        float_neg_inf  = { ValueType::Float, "-inf",   None },
        float_overflow = { ValueType::Float, "1e400",  None },
        int_max        = { ValueType::Int,   "9223372036854775807",  Some(PropertyValue::Int(i64::MAX)) },
        int_too_long   = { ValueType::Int,   "9223372036854775808",  None },
        str_untouched  = { ValueType::Str,   " a b ",  Some(PropertyValue::Str(" a b ".into())) },
    )]
    fn coerce_capture(ty: ValueType, raw: &str, expected: Option<PropertyValue>) {
        assert_eq!(ty.coerce(raw), expected);
    }

    #[test]
    fn int_widens_to_float_view() {
        assert_eq!(PropertyValue::Int(10).as_f64(), Some(10.0));
        assert_eq!(PropertyValue::Str("10".into()).as_f64(), None);
    }

    #[test]
    fn serializes_untagged() {
        let v = PropertyValue::List(vec!["a, b".into()]);
        assert_eq!(serde_json::to_string(&v).unwrap(), r#"["a, b"]"#);
        assert_eq!(
            serde_json::to_string(&PropertyValue::Float(0.7)).unwrap(),
            "0.7"
        );
        assert_eq!(serde_json::to_string(&PropertyValue::Bool(true)).unwrap(), "true");
    }

    #[test]
    fn deserializes_json_numbers_by_shape() {
        let int: PropertyValue = serde_json::from_str("4").unwrap();
        let float: PropertyValue = serde_json::from_str("4.5").unwrap();
        assert_eq!(int, PropertyValue::Int(4));
        assert_eq!(float, PropertyValue::Float(4.5));
    }

    #[test]
    fn value_type_from_config_name() {
        #[derive(Deserialize)]
        struct Holder {
            ty: ValueType,
        }
        let h: Holder = toml::from_str("ty = \"float\"").unwrap();
        assert_eq!(h.ty, ValueType::Float);
        assert_eq!(h.ty.to_string(), "float");
    }
}
