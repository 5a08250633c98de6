//! The `diagnostic` variant: lists every key a payload offers.

use crate::payload::Payload;
use crate::render::{TemplateRenderer, discovery_template};
use crate::translator::{DeliveryResult, Translator};
use async_trait::async_trait;
use hookwire_config::{ConfigError, TranslatorSpec};
use std::sync::Arc;

pub const VARIANT: &str = "diagnostic";

/// Renders a key listing for whatever it receives, to help write templates
#[derive(Debug, Default)]
pub struct DiagnosticTranslator {
    renderer: TemplateRenderer,
}

impl DiagnosticTranslator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_spec(spec: TranslatorSpec) -> Result<Arc<dyn Translator>, ConfigError> {
        for key in spec.params.keys() {
            tracing::warn!(translator = %spec.name, parameter = %key, "Ignoring unused parameter");
        }
        Ok(Arc::new(Self::new()))
    }
}

#[async_trait]
impl Translator for DiagnosticTranslator {
    fn variant(&self) -> &'static str {
        VARIANT
    }

    async fn submit(&self, payload: &Payload) -> DeliveryResult {
        let document = match payload.normalize() {
            Ok(document) => document,
            Err(err) => {
                tracing::debug!(error = %err, "Diagnostic translator could not read payload");
                return DeliveryResult::failure(err.to_string());
            }
        };

        let template = discovery_template(&document);
        match self.renderer.render_source(&template, &document) {
            Ok(listing) => DeliveryResult::success(listing),
            Err(err) => DeliveryResult::failure(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use serde_json::json;

    #[tokio::test]
    async fn test_lists_keys_of_json_payload() {
        let translator = DiagnosticTranslator::new();
        let payload = Payload::Content(Bytes::from_static(br#"{"foo": "bar", "foobar": {"xyz": "123"}}"#));

        let result = translator.submit(&payload).await;
        assert!(result.success);
        assert_eq!(
            result.message,
            "Key Name => Key value\n{{foo}} => bar\n{{foobar.xyz}} => 123"
        );
    }

    #[tokio::test]
    async fn test_lists_keys_of_document_payload() {
        let translator = DiagnosticTranslator::new();
        let document = json!({"a": "1"}).as_object().cloned().unwrap();

        let result = translator.submit(&Payload::Document(document)).await;
        assert!(result.success);
        assert!(result.message.contains("{{a}} => 1"));
    }

    #[tokio::test]
    async fn test_lists_awkward_keys() {
        let translator = DiagnosticTranslator::new();
        let payload = Payload::Content(Bytes::from_static(br##"{"": "x", "#tag": "y", "a>b": "z"}"##));

        let result = translator.submit(&payload).await;
        assert!(result.success, "{}", result.message);
        assert_eq!(
            result.message,
            "Key Name => Key value\n{{}} => x\n{{#tag}} => y\n{{a>b}} => z"
        );
    }

    #[tokio::test]
    async fn test_reports_unreadable_content() {
        let translator = DiagnosticTranslator::new();
        let payload = Payload::Content(Bytes::from_static(b"bogus data"));

        let result = translator.submit(&payload).await;
        assert!(!result.success);
        assert!(result.message.contains("not valid"));
    }

    #[test]
    fn test_from_spec_ignores_params() {
        let spec = TranslatorSpec::new("debug", VARIANT)
            .with_param("color", hookwire_config::coerce("blue"));
        let translator = DiagnosticTranslator::from_spec(spec).unwrap();
        assert_eq!(translator.variant(), VARIANT);
    }
}
