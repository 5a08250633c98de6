//! XML to document mapping.
//!
//! The root element name becomes the single top-level key. Attributes are
//! stored under `@name`, text that sits next to attributes or children under
//! `#text`, repeated siblings are collected into a list, and an element with
//! nothing in it maps to null.

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid XML: {0}")]
pub struct XmlError(String);

impl XmlError {
    fn new(reason: impl ToString) -> Self {
        XmlError(reason.to_string())
    }
}

#[derive(Debug)]
struct Element {
    name: String,
    fields: Map<String, Value>,
    text: String,
}

impl Element {
    fn open(start: &BytesStart<'_>) -> Result<Self, XmlError> {
        let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
        let mut fields = Map::new();

        for attr in start.attributes() {
            let attr = attr.map_err(XmlError::new)?;
            let key = format!("@{}", String::from_utf8_lossy(attr.key.as_ref()));
            let value = attr.unescape_value().map_err(XmlError::new)?;
            fields.insert(key, Value::String(value.into_owned()));
        }

        Ok(Self {
            name,
            fields,
            text: String::new(),
        })
    }

    fn append_text(&mut self, text: &str) {
        self.text.push_str(text);
    }

    fn close(self) -> (String, Value) {
        let Element {
            name,
            mut fields,
            text,
        } = self;

        let value = match (fields.is_empty(), text.is_empty()) {
            (true, true) => Value::Null,
            (true, false) => Value::String(text),
            (false, _) => {
                if !text.is_empty() {
                    fields.insert("#text".to_string(), Value::String(text));
                }
                Value::Object(fields)
            }
        };

        (name, value)
    }
}

/// Parse an XML document into a map keyed by its root element
pub fn parse(text: &str) -> Result<Map<String, Value>, XmlError> {
    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<(String, Value)> = None;

    loop {
        match reader.read_event().map_err(XmlError::new)? {
            Event::Start(start) => {
                ensure_single_root(&stack, &root)?;
                stack.push(Element::open(&start)?);
            }
            Event::Empty(start) => {
                ensure_single_root(&stack, &root)?;
                let element = Element::open(&start)?;
                finish(element, &mut stack, &mut root)?;
            }
            Event::End(_) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| XmlError::new("closing tag without an open element"))?;
                finish(element, &mut stack, &mut root)?;
            }
            Event::Text(content) => {
                let unescaped = content.unescape().map_err(XmlError::new)?;
                push_text(unescaped.trim(), &mut stack)?;
            }
            Event::CData(content) => {
                let raw = content.into_inner();
                push_text(String::from_utf8_lossy(&raw).trim(), &mut stack)?;
            }
            Event::Eof => break,
            // Declarations, comments, processing instructions, doctypes
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(XmlError::new(format!("unclosed element <{}>", open.name)));
    }

    let (name, value) = root.ok_or_else(|| XmlError::new("no root element"))?;
    let mut document = Map::new();
    document.insert(name, value);
    Ok(document)
}

fn ensure_single_root(stack: &[Element], root: &Option<(String, Value)>) -> Result<(), XmlError> {
    if stack.is_empty() && root.is_some() {
        return Err(XmlError::new("content after the root element"));
    }
    Ok(())
}

fn push_text(text: &str, stack: &mut [Element]) -> Result<(), XmlError> {
    if text.is_empty() {
        return Ok(());
    }
    match stack.last_mut() {
        Some(element) => {
            element.append_text(text);
            Ok(())
        }
        None => Err(XmlError::new("text outside the root element")),
    }
}

fn finish(
    element: Element,
    stack: &mut [Element],
    root: &mut Option<(String, Value)>,
) -> Result<(), XmlError> {
    let (name, value) = element.close();

    match stack.last_mut() {
        Some(parent) => {
            attach(&mut parent.fields, name, value);
            Ok(())
        }
        None if root.is_none() => {
            *root = Some((name, value));
            Ok(())
        }
        None => Err(XmlError::new("content after the root element")),
    }
}

// Element values are never arrays themselves, so an array here means repeats.
fn attach(fields: &mut Map<String, Value>, name: String, value: Value) {
    match fields.get_mut(&name) {
        Some(Value::Array(items)) => items.push(value),
        Some(existing) => {
            let first = existing.take();
            *existing = Value::Array(vec![first, value]);
        }
        None => {
            fields.insert(name, value);
        }
    }
}
