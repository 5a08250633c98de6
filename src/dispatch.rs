//! Hook dispatch.
//!
//! A request for a hook goes through four steps: look the hook up, pick a
//! payload (or show the submission form when there is none), hand the payload
//! to the hook's first translator, and map its result onto a response.

use crate::error::{DispatchError, GatewayError};
use crate::pages::Pages;
use hookwire_core::{HttpRequest, HttpResponse};
use hookwire_translators::{HookTranslator, InboundRequest, Payload, TranslatorRegistry, group_pairs};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

struct ResolvedHook {
    translators: Vec<HookTranslator>,
    envelope: bool,
}

/// Owns every resolved hook for the life of the process
pub struct HookDispatcher {
    hooks: BTreeMap<String, ResolvedHook>,
    pages: Pages,
}

impl HookDispatcher {
    /// Resolve all configured hooks up front
    pub fn new(registry: &TranslatorRegistry) -> Result<Self, GatewayError> {
        let mut hooks = BTreeMap::new();

        for (name, translators) in registry.resolve_all()? {
            let envelope = registry.config().hook(&name)?.envelope();
            if translators.len() > 1 {
                warn!(
                    hook = %name,
                    configured = translators.len(),
                    "Only the first translator of a hook is invoked"
                );
            }
            if let Some(first) = translators.first() {
                info!(hook = %name, translator = %first.name, envelope, "Hook ready");
            }
            hooks.insert(
                name,
                ResolvedHook {
                    translators,
                    envelope,
                },
            );
        }

        Ok(Self {
            hooks,
            pages: Pages::new()?,
        })
    }

    pub fn hook_names(&self) -> impl Iterator<Item = &str> {
        self.hooks.keys().map(String::as_str)
    }

    /// The hook listing page
    pub fn index(&self) -> Result<HttpResponse, DispatchError> {
        Ok(HttpResponse::html(self.pages.index(self.hook_names())?))
    }

    /// Answer one request for `hook`
    pub async fn dispatch(
        &self,
        hook: &str,
        request: &HttpRequest,
    ) -> Result<HttpResponse, DispatchError> {
        let resolved = self
            .hooks
            .get(hook)
            .ok_or_else(|| DispatchError::UnknownHook(hook.to_string()))?;

        let Some(payload) = select_payload(request, resolved.envelope) else {
            debug!(hook = %hook, "No payload supplied, rendering submission form");
            let form = self.pages.submit_form(hook, &resolved.translators)?;
            return Ok(HttpResponse::html(form));
        };

        let first = resolved.translators.first().ok_or_else(|| {
            DispatchError::MalformedResult(format!("hook \"{hook}\" has no translators"))
        })?;
        debug!(hook = %hook, translator = %first.name, "Passing payload to translator");

        // Spawned so that a client hanging up does not abort the delivery.
        let translator = Arc::clone(&first.translator);
        let result = tokio::spawn(async move { translator.submit(&payload).await })
            .await
            .map_err(|err| DispatchError::MalformedResult(err.to_string()))?;

        if result.success {
            info!(hook = %hook, translator = %first.name, "Translation succeeded");
            Ok(HttpResponse::text(200, result.message))
        } else {
            error!(hook = %hook, translator = %first.name, message = %result.message, "Translator returned failure");
            Ok(HttpResponse::text(502, result.message))
        }
    }
}

/// Pick what a hook's translator receives.
///
/// A non-empty body wins over query arguments. `None` means there is nothing
/// to translate.
pub fn select_payload(request: &HttpRequest, envelope: bool) -> Option<Payload> {
    let has_body = !request.body.is_empty();
    let has_arguments = !request.query_params.is_empty();

    if !has_body && !has_arguments {
        return None;
    }

    if envelope {
        return Some(Payload::Request(inbound_request(request)));
    }

    if has_body {
        Some(Payload::Content(request.body.clone()))
    } else {
        Some(Payload::Document(group_pairs(&request.query_params)))
    }
}

fn inbound_request(request: &HttpRequest) -> InboundRequest {
    let mut headers: Vec<(String, String)> = request
        .headers
        .iter()
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect();
    headers.sort();

    InboundRequest {
        method: request.method.to_string(),
        uri: request.uri(),
        remote_addr: request.remote_addr.map(|addr| addr.ip().to_string()),
        headers,
        arguments: request.query_params.clone(),
        body: request.body.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hookwire_core::Method;

    fn request() -> HttpRequest {
        HttpRequest::new(Method::POST, "/hook/github")
    }

    #[test]
    fn test_empty_request_has_no_payload() {
        assert!(select_payload(&request(), false).is_none());
        assert!(select_payload(&request(), true).is_none());
    }

    #[test]
    fn test_body_wins_over_arguments() {
        let mut req = request().with_body("{\"a\": 1}");
        req.query_params = vec![("b".into(), "2".into())];

        match select_payload(&req, false) {
            Some(Payload::Content(body)) => assert_eq!(&body[..], b"{\"a\": 1}"),
            other => panic!("unexpected payload {other:?}"),
        }
    }

    #[test]
    fn test_arguments_become_document() {
        let mut req = HttpRequest::new(Method::GET, "/hook/github");
        req.query_params = vec![
            ("a".into(), "1".into()),
            ("a".into(), "2".into()),
            ("b".into(), "3".into()),
        ];

        match select_payload(&req, false) {
            Some(Payload::Document(doc)) => {
                assert_eq!(doc["a"], serde_json::json!(["1", "2"]));
                assert_eq!(doc["b"], "3");
            }
            other => panic!("unexpected payload {other:?}"),
        }
    }

    #[test]
    fn test_envelope_wraps_whole_request() {
        let mut req = request()
            .with_body("<a>1</a>")
            .with_header("X-Event", "push");
        req.query = Some("x=1".into());
        req.query_params = vec![("x".into(), "1".into())];

        match select_payload(&req, true) {
            Some(Payload::Request(inbound)) => {
                assert_eq!(inbound.method, "POST");
                assert_eq!(inbound.uri, "/hook/github?x=1");
                assert_eq!(inbound.headers, vec![("x-event".to_string(), "push".to_string())]);
                assert_eq!(inbound.arguments, vec![("x".to_string(), "1".to_string())]);
            }
            other => panic!("unexpected payload {other:?}"),
        }
    }
}
