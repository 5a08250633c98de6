//! Boolean-aware config values.
//!
//! Config files store everything as text. Strings that look like flags are
//! turned into booleans before anything else sees them; every other string
//! is passed through untouched.

use serde::Serialize;
use std::fmt;

const TRUTHY: &[&str] = &["yes", "y", "true", "t", "1"];
const FALSY: &[&str] = &["no", "n", "false", "f", "0", "0.0", "", "none", "[]", "{}"];

/// A configuration value after boolean coercion
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Text(String),
}

impl ParamValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::Text(s) => Some(s),
            ParamValue::Bool(_) => None,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Bool(b) => write!(f, "{b}"),
            ParamValue::Text(s) => f.write_str(s),
        }
    }
}

/// Coerce a raw config string into a [`ParamValue`].
///
/// Matching is case-insensitive against the fixed truthy and falsy sets.
pub fn coerce(raw: &str) -> ParamValue {
    let lowered = raw.to_lowercase();
    if TRUTHY.contains(&lowered.as_str()) {
        ParamValue::Bool(true)
    } else if FALSY.contains(&lowered.as_str()) {
        ParamValue::Bool(false)
    } else {
        ParamValue::Text(raw.to_string())
    }
}

/// Flatten a parsed JSON/TOML scalar to the string form an INI-style store would hold
pub(crate) fn raw_string(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => String::new(),
        serde_json::Value::Bool(b) => b.to_string(),
        serde_json::Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_truthy_values() {
        for raw in ["yes", "y", "true", "tRue", "t", "T", "1", "YES"] {
            assert_eq!(coerce(raw), ParamValue::Bool(true), "{raw}");
        }
    }

    #[test]
    fn test_falsy_values() {
        for raw in ["no", "No", "n", "f", "fAlse", "False", "0", "0.0", "", "none", "None", "[]", "{}"] {
            assert_eq!(coerce(raw), ParamValue::Bool(false), "{raw:?}");
        }
    }

    #[test]
    fn test_other_values_pass_through() {
        assert_eq!(coerce("FooBar"), ParamValue::Text("FooBar".to_string()));
        assert_eq!(
            coerce("http://httpbin.org/post"),
            ParamValue::Text("http://httpbin.org/post".to_string())
        );
        assert_eq!(coerce("2"), ParamValue::Text("2".to_string()));
    }

    #[test]
    fn test_raw_string_flattens_scalars() {
        assert_eq!(raw_string(&json!("text")), "text");
        assert_eq!(raw_string(&json!(true)), "true");
        assert_eq!(raw_string(&json!(8080)), "8080");
        assert_eq!(raw_string(&json!(null)), "");
        assert_eq!(raw_string(&json!([])), "[]");
    }

    #[test]
    fn test_accessors() {
        assert_eq!(ParamValue::Bool(true).as_str(), None);
        assert_eq!(ParamValue::Text("x".into()).as_str(), Some("x"));
        assert_eq!(ParamValue::Text("x".into()).to_string(), "x");
    }
}
