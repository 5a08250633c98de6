//! Translators for the hookwire gateway
//!
//! A translator takes whatever a hook received, normalizes it into a
//! [`Document`], renders a Mustache-style template against it and acts on
//! the result.
//!
//! # Features
//!
//! - **Normalization**: JSON objects, XML documents, decoded arguments or a
//!   whole request all become one nested document shape
//! - **Templates**: Mustache templates rendered on a handlebars registry
//! - **Variants**: `diagnostic` lists available keys, `post` delivers the
//!   rendered body to a remote endpoint
//! - **Registry**: variant identifiers resolve to constructors at startup
//!
//! # Example
//!
//! ```rust,no_run
//! use hookwire_config::GatewayConfig;
//! use hookwire_translators::{Payload, TranslatorFactory, TranslatorRegistry};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Arc::new(GatewayConfig::load("config.toml")?);
//!     let registry = TranslatorRegistry::new(config, TranslatorFactory::with_defaults());
//!
//!     let translators = registry.resolve("github")?;
//!     let payload = Payload::Content(r#"{"foo": "bar"}"#.into());
//!     let result = translators[0].translator.submit(&payload).await;
//!     println!("{}", result.message);
//!     Ok(())
//! }
//! ```

pub mod delivery;
pub mod diagnostic;
mod error;
pub mod payload;
pub mod registry;
pub mod render;
mod translator;
pub mod xml;

pub use delivery::{AuthMode, Credentials, DeliveryTranslator};
pub use diagnostic::DiagnosticTranslator;
pub use error::{ContentError, EXCERPT_LIMIT, RenderError};
pub use payload::{Document, InboundRequest, Payload, group_pairs};
pub use registry::{Constructor, HookTranslator, TranslatorFactory, TranslatorRegistry};
pub use render::{TemplateRenderer, discovery_template};
pub use translator::{DeliveryResult, Translator};

pub use async_trait::async_trait;
