//! The gateway configuration: hooks, translators and where their templates live.
//!
//! A configuration is a set of named sections. `general` holds gateway-wide
//! settings, and every other section declares what it is through its `type`
//! field:
//!
//! ```toml
//! [general]
//! templates = "templates"
//!
//! [github]
//! type = "hook"
//! translators = "notify"
//!
//! [notify]
//! type = "translator"
//! translator = "post"
//! url = "https://chat.example.com/api"
//! content_type = "application/json"
//! ```

use crate::loader::{ConfigLoader, FileFormat};
use crate::spec::{HookDefinition, TranslatorParams, TranslatorSpec};
use crate::templates::TemplateCache;
use crate::value::{coerce, raw_string};
use crate::{ConfigError, ParamValue, Result};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

const GENERAL_SECTION: &str = "general";
const DEFAULT_TEMPLATE_DIR: &str = "templates";
const TEMPLATE_EXTENSION: &str = "tmpl";

/// Loaded gateway configuration.
///
/// Built once at startup and shared read-only afterwards. Template text is
/// cached here for the life of the process.
#[derive(Debug)]
pub struct GatewayConfig {
    general: BTreeMap<String, String>,
    hooks: BTreeMap<String, HookDefinition>,
    translators: BTreeMap<String, Map<String, Value>>,
    template_dir: PathBuf,
    templates: TemplateCache,
}

impl GatewayConfig {
    /// Load a configuration file, picking the format from its extension
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let format = FileFormat::detect(path);
        let data = ConfigLoader::new(format).load_file(path)?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));

        tracing::info!(path = %path.display(), ?format, "Loaded configuration file");
        Self::from_value(data, base_dir)
    }

    /// Parse configuration text; relative template paths resolve against `base_dir`
    pub fn parse(content: &str, format: FileFormat, base_dir: impl AsRef<Path>) -> Result<Self> {
        let data = ConfigLoader::new(format).parse(content)?;
        Self::from_value(data, base_dir.as_ref())
    }

    fn from_value(data: Value, base_dir: &Path) -> Result<Self> {
        let Value::Object(sections) = data else {
            return Err(ConfigError::ParseError(
                "top level of the configuration must be a set of sections".to_string(),
            ));
        };

        let mut general = BTreeMap::new();
        let mut hooks = BTreeMap::new();
        let mut translators = BTreeMap::new();

        for (name, section) in sections {
            let Value::Object(fields) = section else {
                tracing::warn!(section = %name, "Ignoring configuration entry that is not a section");
                continue;
            };

            if name == GENERAL_SECTION {
                general = fields
                    .iter()
                    .map(|(key, value)| (key.clone(), raw_string(value)))
                    .collect();
                continue;
            }

            match fields.get("type").map(raw_string).as_deref() {
                Some("hook") => {
                    let hook = parse_hook(&name, &fields)?;
                    hooks.insert(name, hook);
                }
                Some("translator") => {
                    if !fields.contains_key("translator") {
                        return Err(ConfigError::MissingField {
                            section: name,
                            field: "translator".to_string(),
                        });
                    }
                    translators.insert(name, fields);
                }
                Some(other) => {
                    tracing::warn!(section = %name, kind = %other, "Ignoring section of unknown type");
                }
                None => {
                    tracing::debug!(section = %name, "Ignoring section without a type");
                }
            }
        }

        let configured = general
            .get("templates")
            .map(String::as_str)
            .filter(|dir| !dir.is_empty())
            .unwrap_or(DEFAULT_TEMPLATE_DIR);
        let template_dir = base_dir.join(configured);

        tracing::debug!(
            hooks = hooks.len(),
            translators = translators.len(),
            template_dir = %template_dir.display(),
            "Parsed gateway configuration"
        );

        Ok(Self {
            general,
            hooks,
            translators,
            template_dir,
            templates: TemplateCache::new(),
        })
    }

    /// Raw value from the `general` section
    pub fn general(&self, key: &str) -> Option<&str> {
        self.general.get(key).map(String::as_str)
    }

    pub fn template_dir(&self) -> &Path {
        &self.template_dir
    }

    pub fn templates(&self) -> &TemplateCache {
        &self.templates
    }

    /// Hook names in sorted order
    pub fn hook_names(&self) -> impl Iterator<Item = &str> {
        self.hooks.keys().map(String::as_str)
    }

    pub fn hook(&self, name: &str) -> Result<&HookDefinition> {
        self.hooks
            .get(name)
            .ok_or_else(|| ConfigError::UnknownHook(name.to_string()))
    }

    /// Build the constructor input for one translator section.
    ///
    /// The `type` and `translator` fields are stripped. An inline `template`
    /// is taken verbatim; otherwise `<templates>/<name>.tmpl` is consulted.
    pub fn translator_spec(&self, name: &str) -> Result<TranslatorSpec> {
        let fields = self
            .translators
            .get(name)
            .ok_or_else(|| ConfigError::UnknownTranslator(name.to_string()))?;

        let variant = fields.get("translator").map(raw_string).unwrap_or_default();

        let mut inline_template = None;
        let mut params = TranslatorParams::default();
        for (key, value) in fields {
            match key.as_str() {
                "type" | "translator" => {}
                "template" => inline_template = Some(raw_string(value)),
                _ => params.insert(key.clone(), coerce(&raw_string(value))),
            }
        }

        let template: Option<Arc<str>> = match inline_template {
            Some(text) => Some(text.into()),
            None => {
                let path = self
                    .template_dir
                    .join(format!("{name}.{TEMPLATE_EXTENSION}"));
                self.templates.load(&path)?
            }
        };

        Ok(TranslatorSpec {
            name: name.to_string(),
            variant,
            params,
            template,
        })
    }
}

fn parse_hook(name: &str, fields: &Map<String, Value>) -> Result<HookDefinition> {
    let translators: Vec<String> = match fields.get("translators") {
        Some(Value::Array(items)) => items
            .iter()
            .map(raw_string)
            .map(|item| item.trim().to_string())
            .filter(|item| !item.is_empty())
            .collect(),
        Some(value) => raw_string(value)
            .split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(str::to_string)
            .collect(),
        None => Vec::new(),
    };

    if translators.is_empty() {
        return Err(ConfigError::MissingField {
            section: name.to_string(),
            field: "translators".to_string(),
        });
    }

    let options: BTreeMap<String, ParamValue> = fields
        .iter()
        .filter(|(key, _)| !matches!(key.as_str(), "type" | "translators"))
        .map(|(key, value)| (key.clone(), coerce(&raw_string(value))))
        .collect();

    Ok(HookDefinition {
        name: name.to_string(),
        translators,
        options,
    })
}
