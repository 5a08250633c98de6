//! Variant lookup and hook resolution.

use crate::translator::Translator;
use crate::{delivery, diagnostic};
use hookwire_config::{ConfigError, GatewayConfig, TranslatorSpec};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Builds one translator from its configuration
pub type Constructor = fn(TranslatorSpec) -> Result<Arc<dyn Translator>, ConfigError>;

/// Maps variant identifiers to constructors
#[derive(Debug, Clone, Default)]
pub struct TranslatorFactory {
    constructors: HashMap<String, Constructor>,
}

impl TranslatorFactory {
    /// A factory that knows no variants
    pub fn empty() -> Self {
        Self::default()
    }

    /// A factory with the built-in `diagnostic` and `post` variants
    pub fn with_defaults() -> Self {
        let mut factory = Self::empty();
        factory.register(diagnostic::VARIANT, diagnostic::DiagnosticTranslator::from_spec);
        factory.register(delivery::VARIANT, delivery::DeliveryTranslator::from_spec);
        factory
    }

    pub fn register(&mut self, variant: impl Into<String>, constructor: Constructor) {
        self.constructors.insert(variant.into(), constructor);
    }

    pub fn contains(&self, variant: &str) -> bool {
        self.constructors.contains_key(variant)
    }

    pub fn variants(&self) -> Vec<&str> {
        let mut variants: Vec<_> = self.constructors.keys().map(String::as_str).collect();
        variants.sort_unstable();
        variants
    }

    /// Construct a translator, naming it in any constructor failure
    pub fn build(&self, spec: TranslatorSpec) -> Result<Arc<dyn Translator>, ConfigError> {
        let constructor =
            self.constructors
                .get(&spec.variant)
                .ok_or_else(|| ConfigError::UnknownVariant {
                    translator: spec.name.clone(),
                    variant: spec.variant.clone(),
                })?;

        let name = spec.name.clone();
        constructor(spec).map_err(|source| ConfigError::Construction {
            translator: name,
            source: Box::new(source),
        })
    }
}

/// A translator together with the config section it came from
#[derive(Debug, Clone)]
pub struct HookTranslator {
    pub name: String,
    pub translator: Arc<dyn Translator>,
}

/// Resolves hook names into live translators
#[derive(Debug, Clone)]
pub struct TranslatorRegistry {
    config: Arc<GatewayConfig>,
    factory: TranslatorFactory,
}

impl TranslatorRegistry {
    pub fn new(config: Arc<GatewayConfig>, factory: TranslatorFactory) -> Self {
        Self { config, factory }
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Build the translators of one hook, in configured order
    pub fn resolve(&self, hook: &str) -> Result<Vec<HookTranslator>, ConfigError> {
        let definition = self.config.hook(hook)?;

        definition
            .translators
            .iter()
            .map(|name| -> Result<HookTranslator, ConfigError> {
                let spec = self.config.translator_spec(name)?;
                tracing::debug!(hook = %hook, translator = %name, variant = %spec.variant, "Building translator");
                Ok(HookTranslator {
                    name: name.clone(),
                    translator: self.factory.build(spec)?,
                })
            })
            .collect()
    }

    /// Resolve every configured hook, failing on the first misconfiguration.
    ///
    /// The error names the hook that could not be resolved.
    pub fn resolve_all(&self) -> Result<BTreeMap<String, Vec<HookTranslator>>, ConfigError> {
        self.config
            .hook_names()
            .map(|hook| -> Result<_, ConfigError> {
                let translators = self.resolve(hook).map_err(|source| ConfigError::InvalidHook {
                    hook: hook.to_string(),
                    source: Box::new(source),
                })?;
                Ok((hook.to_string(), translators))
            })
            .collect()
    }
}
