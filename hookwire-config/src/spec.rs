// Hook and translator definitions handed out by GatewayConfig

use crate::{ConfigError, ParamValue, Result};
use std::collections::BTreeMap;
use std::sync::Arc;

/// A named inbound hook and the translators it feeds, in configured order
#[derive(Debug, Clone, PartialEq)]
pub struct HookDefinition {
    pub name: String,
    pub translators: Vec<String>,
    /// Any other options in the hook section, already coerced
    pub options: BTreeMap<String, ParamValue>,
}

impl HookDefinition {
    /// Whether translators should receive the whole request instead of just its payload
    pub fn envelope(&self) -> bool {
        matches!(self.options.get("envelope"), Some(ParamValue::Bool(true)))
    }
}

/// Everything a variant constructor needs to build one translator
#[derive(Debug, Clone)]
pub struct TranslatorSpec {
    /// Config section name
    pub name: String,
    /// Variant identifier from the `translator` field
    pub variant: String,
    /// Parameters with `type`, `translator` and `template` removed
    pub params: TranslatorParams,
    /// Inline `template` parameter, or the contents of `<templates>/<name>.tmpl`
    pub template: Option<Arc<str>>,
}

impl TranslatorSpec {
    pub fn new(name: impl Into<String>, variant: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            variant: variant.into(),
            params: TranslatorParams::default(),
            template: None,
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: ParamValue) -> Self {
        self.params.insert(key, value);
        self
    }

    pub fn with_template(mut self, template: impl Into<Arc<str>>) -> Self {
        self.template = Some(template.into());
        self
    }

    /// The template, or a `MissingParameter` error for variants that need one
    pub fn require_template(&self) -> Result<Arc<str>> {
        self.template
            .clone()
            .ok_or_else(|| ConfigError::MissingParameter("template".to_string()))
    }
}

/// Coerced translator parameters
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TranslatorParams {
    values: BTreeMap<String, ParamValue>,
}

impl TranslatorParams {
    pub fn insert(&mut self, key: impl Into<String>, value: ParamValue) {
        self.values.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.values.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// A parameter that must be present and textual
    pub fn require_str(&self, key: &str) -> Result<&str> {
        match self.values.get(key) {
            Some(ParamValue::Text(s)) => Ok(s),
            Some(ParamValue::Bool(_)) => Err(ConfigError::invalid(key, "expected text, found a flag")),
            None => Err(ConfigError::MissingParameter(key.to_string())),
        }
    }

    /// A textual parameter where any flag value (`none`, `false`, `""`, ...) means "not set"
    pub fn optional_str(&self, key: &str) -> Option<&str> {
        self.values.get(key).and_then(ParamValue::as_str)
    }
}

impl FromIterator<(String, ParamValue)> for TranslatorParams {
    fn from_iter<I: IntoIterator<Item = (String, ParamValue)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}
