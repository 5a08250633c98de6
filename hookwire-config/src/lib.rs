//! Configuration for the hookwire gateway.
//!
//! Loads the section-based configuration file, coerces flag-like values to
//! booleans, and hands out [`HookDefinition`]s and [`TranslatorSpec`]s with
//! their templates already resolved.
//!
//! ```no_run
//! use hookwire_config::GatewayConfig;
//!
//! let config = GatewayConfig::load("config.toml")?;
//! for hook in config.hook_names() {
//!     println!("{hook}");
//! }
//! # Ok::<(), hookwire_config::ConfigError>(())
//! ```

pub mod error;
pub mod gateway;
pub mod loader;
pub mod spec;
pub mod templates;
pub mod value;

pub use error::{ConfigError, Result};
pub use gateway::GatewayConfig;
pub use loader::{ConfigLoader, FileFormat};
pub use spec::{HookDefinition, TranslatorParams, TranslatorSpec};
pub use templates::TemplateCache;
pub use value::{ParamValue, coerce};
