// HTTP plumbing for the hookwire gateway
// Request/response types, a small path router and the hyper server loop.

pub mod application;
pub mod error;
pub mod http;
pub mod logging;
pub mod routing;

pub use application::Application;
pub use error::{Error, Result};
pub use http::{HttpRequest, HttpResponse};
pub use routing::{HandlerFn, HandlerFuture, Route, Router};

// Re-exported so handlers can name methods without pulling in `http` themselves
pub use ::http::Method;
