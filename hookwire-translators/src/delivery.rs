//! The `post` variant: render a template and POST it to a remote endpoint.

use crate::payload::Payload;
use crate::render::TemplateRenderer;
use crate::translator::{DeliveryResult, Translator};
use async_trait::async_trait;
use hookwire_config::{ConfigError, TranslatorSpec};
use reqwest::header::{CONTENT_TYPE, HeaderValue};
use reqwest::{Client, redirect};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

pub const VARIANT: &str = "post";

/// Redirect hops followed before a delivery is treated as failed
pub const MAX_REDIRECTS: usize = 10;

const BODY_TEMPLATE: &str = "body";
const KNOWN_PARAMS: &[&str] = &["url", "content_type", "auth", "auth_mode", "user_agent"];

fn default_user_agent() -> String {
    format!("hookwire/{}", env!("CARGO_PKG_VERSION"))
}

/// Credentials parsed from a `user:pass` auth parameter
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let (username, password) = raw
            .split_once(':')
            .ok_or_else(|| ConfigError::invalid("auth", "expected \"user:pass\""))?;

        Ok(Self {
            username: username.to_string(),
            password: password.to_string(),
        })
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AuthMode {
    #[default]
    Basic,
}

impl FromStr for AuthMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "basic" => Ok(AuthMode::Basic),
            other => Err(ConfigError::invalid(
                "auth_mode",
                format!("unsupported mode \"{other}\""),
            )),
        }
    }
}

/// Renders its template against each payload and POSTs the result
#[derive(Debug)]
pub struct DeliveryTranslator {
    name: String,
    url: String,
    content_type: HeaderValue,
    credentials: Option<Credentials>,
    auth_mode: AuthMode,
    renderer: TemplateRenderer,
    client: Client,
}

impl DeliveryTranslator {
    /// Validate parameters, compile the template and build the HTTP client
    pub fn new(spec: TranslatorSpec) -> Result<Self, ConfigError> {
        let params = &spec.params;

        let url = params.require_str("url")?.to_string();
        let content_type = HeaderValue::from_str(params.require_str("content_type")?)
            .map_err(|e| ConfigError::invalid("content_type", e.to_string()))?;
        let template = spec.require_template()?;

        let credentials = params
            .optional_str("auth")
            .map(Credentials::parse)
            .transpose()?;
        let auth_mode = params
            .optional_str("auth_mode")
            .map(AuthMode::from_str)
            .transpose()?
            .unwrap_or_default();
        let user_agent = params
            .optional_str("user_agent")
            .map(str::to_string)
            .unwrap_or_else(default_user_agent);

        for key in params.keys().filter(|key| !KNOWN_PARAMS.contains(key)) {
            tracing::warn!(translator = %spec.name, parameter = %key, "Ignoring unknown parameter");
        }

        let mut renderer = TemplateRenderer::new();
        renderer
            .register(BODY_TEMPLATE, &template)
            .map_err(|e| ConfigError::invalid("template", e.to_string()))?;

        let client = Client::builder()
            .user_agent(user_agent)
            .redirect(redirect::Policy::limited(MAX_REDIRECTS))
            .build()
            .map_err(|e| ConfigError::invalid("user_agent", e.to_string()))?;

        tracing::debug!(translator = %spec.name, url = %url, "Built delivery translator");

        Ok(Self {
            name: spec.name,
            url,
            content_type,
            credentials,
            auth_mode,
            renderer,
            client,
        })
    }

    pub fn from_spec(spec: TranslatorSpec) -> Result<Arc<dyn Translator>, ConfigError> {
        Ok(Arc::new(Self::new(spec)?))
    }

    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }
}

#[async_trait]
impl Translator for DeliveryTranslator {
    fn variant(&self) -> &'static str {
        VARIANT
    }

    async fn submit(&self, payload: &Payload) -> DeliveryResult {
        let document = match payload.normalize() {
            Ok(document) => document,
            Err(err) => return DeliveryResult::failure(err.to_string()),
        };

        let body = match self.renderer.render(BODY_TEMPLATE, &document) {
            Ok(body) => body,
            Err(err) => {
                tracing::warn!(translator = %self.name, error = %err, "Template rendering failed");
                return DeliveryResult::failure(err.to_string());
            }
        };

        let mut request = self
            .client
            .post(&self.url)
            .header(CONTENT_TYPE, self.content_type.clone())
            .body(body);

        if let Some(credentials) = &self.credentials {
            request = match self.auth_mode {
                AuthMode::Basic => {
                    request.basic_auth(&credentials.username, Some(&credentials.password))
                }
            };
        }

        tracing::debug!(translator = %self.name, url = %self.url, "Delivering rendered payload");

        let result = match request.send().await {
            Ok(response) => {
                let status = response.status();
                let reason = status.canonical_reason().unwrap_or("Unknown");
                if status.is_success() {
                    DeliveryResult::success(reason)
                } else {
                    DeliveryResult::failure(format!(
                        "2XX not returned: HTTP {}: {}",
                        status.as_u16(),
                        reason
                    ))
                }
            }
            Err(err) => DeliveryResult::failure(format!("2XX not returned: {err}")),
        };

        if result.success {
            tracing::info!(translator = %self.name, url = %self.url, "Delivery succeeded");
        } else {
            tracing::warn!(translator = %self.name, url = %self.url, message = %result.message, "Delivery failed");
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use hookwire_config::{ParamValue, coerce};
    use wiremock::matchers::{body_string, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn spec(url: &str) -> TranslatorSpec {
        TranslatorSpec::new("notify", VARIANT)
            .with_param("url", coerce(url))
            .with_param("content_type", coerce("application/json"))
            .with_template("{\"text\": \"{{foo}}\"}")
    }

    fn json_payload() -> Payload {
        Payload::Content(Bytes::from_static(br#"{"foo": "bar"}"#))
    }

    #[test]
    fn test_credentials_parse() {
        let creds = Credentials::parse("user:pass").unwrap();
        assert_eq!(creds.username, "user");
        assert_eq!(creds.password, "pass");

        let creds = Credentials::parse("user:pa:ss").unwrap();
        assert_eq!(creds.password, "pa:ss");

        assert!(matches!(
            Credentials::parse("bad_auth_info"),
            Err(ConfigError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_credentials_debug_hides_password() {
        let creds = Credentials::parse("user:secret").unwrap();
        assert!(!format!("{creds:?}").contains("secret"));
    }

    #[test]
    fn test_auth_is_optional() {
        let translator = DeliveryTranslator::new(spec("http://localhost/")).unwrap();
        assert!(translator.credentials().is_none());

        let translator =
            DeliveryTranslator::new(spec("http://localhost/").with_param("auth", coerce("none")))
                .unwrap();
        assert!(translator.credentials().is_none());
    }

    #[test]
    fn test_bad_auth_fails_construction() {
        let result = DeliveryTranslator::new(
            spec("http://localhost/").with_param("auth", coerce("bad_auth_info")),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_auth_mode() {
        let ok = DeliveryTranslator::new(
            spec("http://localhost/").with_param("auth_mode", coerce("Basic")),
        );
        assert!(ok.is_ok());

        let unsupported = DeliveryTranslator::new(
            spec("http://localhost/").with_param("auth_mode", coerce("digest")),
        );
        assert!(matches!(unsupported, Err(ConfigError::InvalidParameter { name, .. }) if name == "auth_mode"));
    }

    #[test]
    fn test_required_parameters() {
        let missing_url = TranslatorSpec::new("notify", VARIANT)
            .with_param("content_type", coerce("text/plain"))
            .with_template("x");
        assert!(matches!(
            DeliveryTranslator::new(missing_url),
            Err(ConfigError::MissingParameter(name)) if name == "url"
        ));

        let missing_template = TranslatorSpec::new("notify", VARIANT)
            .with_param("url", coerce("http://localhost/"))
            .with_param("content_type", coerce("text/plain"));
        assert!(matches!(
            DeliveryTranslator::new(missing_template),
            Err(ConfigError::MissingParameter(name)) if name == "template"
        ));
    }

    #[test]
    fn test_broken_template_fails_construction() {
        let result = DeliveryTranslator::new(spec("http://localhost/").with_template("{{#open}}"));
        assert!(matches!(result, Err(ConfigError::InvalidParameter { name, .. }) if name == "template"));
    }

    #[test]
    fn test_flag_url_is_rejected() {
        let result = DeliveryTranslator::new(
            spec("http://localhost/").with_param("url", ParamValue::Bool(true)),
        );
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_successful_delivery() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/hook"))
            .and(header("content-type", "application/json"))
            .and(header("authorization", "Basic dXNlcjpwYXNz"))
            .and(body_string("{\"text\": \"bar\"}"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let translator = DeliveryTranslator::new(
            spec(&format!("{}/hook", server.uri())).with_param("auth", coerce("user:pass")),
        )
        .unwrap();

        let result = translator.submit(&json_payload()).await;
        assert_eq!(result, DeliveryResult::success("OK"));
    }

    #[tokio::test]
    async fn test_non_2xx_is_a_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(405))
            .mount(&server)
            .await;

        let translator = DeliveryTranslator::new(spec(&server.uri())).unwrap();
        let result = translator.submit(&json_payload()).await;

        assert!(!result.success);
        assert_eq!(result.message, "2XX not returned: HTTP 405: Method Not Allowed");
    }

    #[tokio::test]
    async fn test_redirects_are_followed() {
        let server = MockServer::start().await;
        Mock::given(path("/old"))
            .respond_with(
                ResponseTemplate::new(302).insert_header("Location", format!("{}/new", server.uri())),
            )
            .mount(&server)
            .await;
        Mock::given(path("/new"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let translator = DeliveryTranslator::new(spec(&format!("{}/old", server.uri()))).unwrap();
        let result = translator.submit(&json_payload()).await;
        assert!(result.success, "{}", result.message);
    }

    #[tokio::test]
    async fn test_invalid_content_is_not_sent() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let translator = DeliveryTranslator::new(spec(&server.uri())).unwrap();
        let result = translator
            .submit(&Payload::Content(Bytes::from_static(b"bogus data")))
            .await;

        assert!(!result.success);
        assert!(result.message.contains("not valid"));
    }

    #[tokio::test]
    async fn test_transport_failure() {
        // Nothing listens on port 1.
        let translator = DeliveryTranslator::new(spec("http://127.0.0.1:1/hook")).unwrap();
        let result = translator.submit(&json_payload()).await;

        assert!(!result.success);
        assert!(result.message.starts_with("2XX not returned: "));
    }
}
