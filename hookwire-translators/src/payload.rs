//! Inbound payloads and their normalization into a [`Document`].

use crate::error::ContentError;
use crate::xml;
use bytes::Bytes;
use serde_json::{Map, Value};

/// The canonical, nested string-keyed form every translator works from
pub type Document = Map<String, Value>;

/// What a hook hands to its translator
#[derive(Debug, Clone)]
pub enum Payload {
    /// Already structured, e.g. decoded query arguments
    Document(Document),
    /// A raw request body
    Content(Bytes),
    /// The whole inbound request
    Request(InboundRequest),
}

/// Request metadata carried by [`Payload::Request`]
#[derive(Debug, Clone, Default)]
pub struct InboundRequest {
    pub method: String,
    pub uri: String,
    pub remote_addr: Option<String>,
    pub headers: Vec<(String, String)>,
    pub arguments: Vec<(String, String)>,
    pub body: Bytes,
}

impl Payload {
    /// Normalize into a [`Document`].
    ///
    /// Content is tried as JSON first, then as XML. Only a JSON object counts
    /// as a document. A full request never fails: a body that parses as
    /// neither is simply left out.
    pub fn normalize(&self) -> Result<Document, ContentError> {
        match self {
            Payload::Document(document) => {
                tracing::debug!("Payload is already a document");
                Ok(document.clone())
            }
            Payload::Content(content) => parse_content(content),
            Payload::Request(request) => Ok(request.to_document()),
        }
    }
}

impl InboundRequest {
    fn to_document(&self) -> Document {
        let mut request = Map::new();
        request.insert("method".into(), Value::String(self.method.clone()));
        request.insert("uri".into(), Value::String(self.uri.clone()));
        if let Some(addr) = &self.remote_addr {
            request.insert("remote_ip".into(), Value::String(addr.clone()));
        }

        let mut document = Map::new();
        document.insert("request".into(), Value::Object(request));
        document.insert("headers".into(), Value::Object(group_pairs(&self.headers)));
        document.insert("arguments".into(), Value::Object(group_pairs(&self.arguments)));

        if !self.body.is_empty() {
            match parse_content(&self.body) {
                Ok(body) => {
                    document.insert("body".into(), Value::Object(body));
                }
                Err(err) => tracing::debug!(error = %err, "Leaving unparsable body out of request document"),
            }
        }

        document
    }
}

/// Group key/value pairs; a key seen once maps to a string, a repeated key to a list
pub fn group_pairs(pairs: &[(String, String)]) -> Document {
    let mut grouped = Map::new();
    for (key, value) in pairs {
        let value = Value::String(value.clone());
        match grouped.get_mut(key) {
            Some(Value::Array(values)) => values.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, value]);
            }
            None => {
                grouped.insert(key.clone(), value);
            }
        }
    }
    grouped
}

fn parse_content(content: &[u8]) -> Result<Document, ContentError> {
    tracing::debug!("Attempting to parse supplied content as JSON");
    match serde_json::from_slice::<Value>(content) {
        Ok(Value::Object(document)) => {
            tracing::debug!("Content is JSON");
            return Ok(document);
        }
        Ok(_) => tracing::debug!("Content is JSON but not an object"),
        Err(_) => tracing::debug!("Content is not JSON"),
    }

    tracing::debug!("Attempting to parse supplied content as XML");
    let text = String::from_utf8_lossy(content);
    match xml::parse(&text) {
        Ok(document) => {
            tracing::debug!("Content is XML");
            Ok(document)
        }
        Err(err) => {
            tracing::debug!(error = %err, "Content is not XML");
            Err(ContentError::new(content))
        }
    }
}
