//! Error types for translation

use thiserror::Error;

/// Longest excerpt of rejected content quoted back in a [`ContentError`]
pub const EXCERPT_LIMIT: usize = 100;

/// Inbound content that is neither a document, JSON, nor XML
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Supplied content is not valid JSON or XML: {excerpt}")]
pub struct ContentError {
    pub excerpt: String,
}

impl ContentError {
    pub fn new(content: &[u8]) -> Self {
        let text = String::from_utf8_lossy(content);
        let excerpt = match text.char_indices().nth(EXCERPT_LIMIT) {
            Some((end, _)) => text[..end].to_string(),
            None => text.into_owned(),
        };
        Self { excerpt }
    }
}

/// Template lowering, registration, or rendering failures
#[derive(Error, Debug)]
pub enum RenderError {
    /// The Mustache source is malformed
    #[error("Template syntax error: {0}")]
    Syntax(String),

    /// The lowered template was rejected
    #[error("Template parsing error: {0}")]
    Template(String),

    /// Rendering against a document failed
    #[error("Template rendering error: {0}")]
    Render(String),
}

impl From<handlebars::RenderError> for RenderError {
    fn from(err: handlebars::RenderError) -> Self {
        RenderError::Render(err.to_string())
    }
}

impl From<handlebars::TemplateError> for RenderError {
    fn from(err: handlebars::TemplateError) -> Self {
        RenderError::Template(err.to_string())
    }
}
