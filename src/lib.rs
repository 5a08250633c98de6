//! hookwire - a webhook translation gateway
//!
//! Receives a call on `/hook/<name>`, normalizes the body or query arguments
//! into a document, renders it through the hook's translator and reports the
//! outcome back to the caller.
//!
//! ```no_run
//! use hookwire::app;
//! use hookwire_core::Application;
//!
//! #[tokio::main]
//! async fn main() -> hookwire::Result<()> {
//!     let router = app::load("config.toml")?;
//!     Application::new(router)
//!         .listen("127.0.0.1:8080".parse().expect("address"))
//!         .await?;
//!     Ok(())
//! }
//! ```

pub mod app;
pub mod dispatch;
pub mod error;
mod pages;

pub use dispatch::{HookDispatcher, select_payload};
pub use error::{DispatchError, GatewayError, Result};
