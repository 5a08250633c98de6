// Error types for the hookwire gateway

use hookwire_config::ConfigError;
use hookwire_core::HttpResponse;
use thiserror::Error;

/// Failures while answering a single hook request
#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("Hook \"{0}\" does not exist")]
    UnknownHook(String),

    #[error("Translator returned a malformed result: {0}")]
    MalformedResult(String),

    #[error("Unable to render page: {0}")]
    Page(#[from] handlebars::RenderError),
}

impl DispatchError {
    pub fn status_code(&self) -> u16 {
        match self {
            DispatchError::UnknownHook(_) => 404,
            DispatchError::MalformedResult(_) => 503,
            DispatchError::Page(_) => 500,
        }
    }

    pub fn into_response(self) -> HttpResponse {
        HttpResponse::text(self.status_code(), self.to_string())
    }
}

/// Failures while starting or running the gateway
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Unable to compile built-in page: {0}")]
    Page(#[from] handlebars::TemplateError),

    #[error("Server error: {0}")]
    Server(#[from] hookwire_core::Error),

    #[error("Unable to set up logging: {0}")]
    Logging(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, GatewayError>;
