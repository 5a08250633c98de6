//! Mustache-style template rendering.
//!
//! Templates are written in Mustache: dotted names, sections, inverted
//! sections, comments, set-delimiter tags and the implicit iterator. The
//! source is lowered onto handlebars syntax and rendered by a handlebars
//! registry. Every tag becomes a call to one of our helpers, which resolve
//! names the Mustache way: the first segment of a dotted name is looked up
//! through the enclosing section contexts from the innermost outwards, the
//! remaining segments strictly inside whatever it found.

use crate::error::RenderError;
use crate::payload::Document;
use handlebars::{
    BlockContext, Context, Handlebars, Helper, HelperDef, HelperResult, JsonRender, Output,
    RenderContext, Renderable, Template,
};
use serde_json::Value;
use std::fmt;

const VARIABLE_HELPER: &str = "__var";
const RAW_HELPER: &str = "__raw";
const SECTION_HELPER: &str = "__section";
const INVERTED_HELPER: &str = "__inverted";
const LEFT_BRACE_HELPER: &str = "__lbrace";
const BACKSLASH_HELPER: &str = "__backslash";

const DEFAULT_OPEN: &str = "{{";
const DEFAULT_CLOSE: &str = "}}";

/// Handlebars registry configured for lowered Mustache templates
pub struct TemplateRenderer {
    registry: Handlebars<'static>,
}

impl TemplateRenderer {
    pub fn new() -> Self {
        let mut registry = Handlebars::new();
        registry.set_strict_mode(false);
        registry.register_escape_fn(escape_html);
        registry.register_helper(VARIABLE_HELPER, Box::new(VariableHelper { escape: true }));
        registry.register_helper(RAW_HELPER, Box::new(VariableHelper { escape: false }));
        registry.register_helper(SECTION_HELPER, Box::new(SectionHelper { inverted: false }));
        registry.register_helper(INVERTED_HELPER, Box::new(SectionHelper { inverted: true }));
        registry.register_helper(LEFT_BRACE_HELPER, Box::new(left_brace_helper));
        registry.register_helper(BACKSLASH_HELPER, Box::new(backslash_helper));

        Self { registry }
    }

    /// Compile a Mustache template and keep it under `name`
    pub fn register(&mut self, name: &str, source: &str) -> Result<(), RenderError> {
        let lowered = lower(source)?;
        self.registry.register_template_string(name, lowered)?;
        Ok(())
    }

    /// Render a template previously added with [`register`](Self::register)
    pub fn render(&self, name: &str, document: &Document) -> Result<String, RenderError> {
        Ok(self.registry.render(name, document)?)
    }

    /// Compile and render a one-off Mustache template
    pub fn render_source(&self, source: &str, document: &Document) -> Result<String, RenderError> {
        let lowered = lower(source)?;
        Ok(self.registry.render_template(&lowered, document)?)
    }
}

impl Default for TemplateRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TemplateRenderer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.registry.get_templates().keys().collect();
        names.sort();
        f.debug_struct("TemplateRenderer")
            .field("templates", &names)
            .finish()
    }
}

/// Build a template listing every leaf key path of `document`.
///
/// After the header line the delimiters switch away from `{{ }}`, so each
/// line shows the literal `{{path}}` a template author would write, followed
/// by the value found there. The delimiters are `< >` unless some path
/// contains them, in which case `<% %>`, `<%% %%>` and so on are tried.
///
/// A path that cannot be written as a tag, or that a tag would resolve to a
/// different value (a key containing dots shadowed by a nested object, an
/// empty key, a key starting with a tag sigil), gets its value written into
/// the template as escaped text instead.
pub fn discovery_template(document: &Document) -> String {
    let root = Value::Object(document.clone());
    let mut leaves = Vec::new();
    if let Value::Object(fields) = &root {
        collect_leaves(fields, "", &mut leaves);
    }
    leaves.sort_by(|a, b| a.0.cmp(&b.0));

    let (open, close) = pick_delimiters(leaves.iter().map(|(path, _)| path.as_str()));

    let mut template = format!("Key Name => Key value\n{{{{={open} {close}=}}}}");
    for (path, value) in &leaves {
        template.push_str(&format!("\n{{{{{path}}}}} => "));
        if is_taggable(&root, path, value) {
            template.push_str(&format!("{open} {path} {close}"));
        } else {
            // escaped text never contains `<`, so it cannot open a tag
            template.push_str(&escape_html(&value.render()));
        }
    }
    template
}

fn collect_leaves<'a>(fields: &'a Document, prefix: &str, leaves: &mut Vec<(String, &'a Value)>) {
    for (name, value) in fields {
        let path = format!("{prefix}{name}");
        match value {
            Value::Object(nested) => collect_leaves(nested, &format!("{path}."), leaves),
            _ => leaves.push((path, value)),
        }
    }
}

fn pick_delimiters<'a>(paths: impl Iterator<Item = &'a str> + Clone) -> (String, String) {
    let mut padding = String::new();
    loop {
        let open = format!("<{padding}");
        let close = format!("{padding}>");
        if paths
            .clone()
            .all(|path| !path.contains(open.as_str()) && !path.contains(close.as_str()))
        {
            return (open, close);
        }
        padding.push('%');
    }
}

fn is_taggable(root: &Value, path: &str, value: &Value) -> bool {
    !path.is_empty()
        && path.trim() == path
        && !path.starts_with(['!', '>', '#', '^', '/', '&', '{', '='])
        && usable_name(path)
        && lookup(root, &[String::new()], path).is_some_and(|(_, found)| std::ptr::eq(found, value))
}

fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

// Python-style truthiness, which is what Mustache sections test against
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(fields) => !fields.is_empty(),
    }
}

/// Context stack of the block being rendered, outermost first.
///
/// Each entry is a JSON pointer into the rendered document; sections keep the
/// stack as the base value of the block they push.
fn scopes(rc: &RenderContext<'_, '_>) -> Vec<String> {
    let stack: Vec<String> = rc
        .block()
        .and_then(|block| block.base_value())
        .and_then(Value::as_array)
        .map(|entries| {
            entries
                .iter()
                .filter_map(|entry| entry.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default();

    if stack.is_empty() {
        vec![String::new()]
    } else {
        stack
    }
}

/// Resolve a Mustache name against `root` given the context stack.
///
/// Returns the JSON pointer of the value along with the value itself.
fn lookup<'a>(root: &'a Value, scopes: &[String], name: &str) -> Option<(String, &'a Value)> {
    if name == "." {
        let innermost = scopes.last().map_or("", String::as_str);
        return root.pointer(innermost).map(|value| (innermost.to_string(), value));
    }

    let mut segments = name.split('.');
    let first = segments.next()?;
    let (mut pointer, mut value) = scopes.iter().rev().find_map(|scope| {
        let found = root.pointer(scope)?.as_object()?.get(first)?;
        Some((format!("{scope}/{}", pointer_segment(first)), found))
    })?;

    for segment in segments {
        value = value.as_object()?.get(segment)?;
        pointer.push('/');
        pointer.push_str(&pointer_segment(segment));
    }
    Some((pointer, value))
}

fn pointer_segment(segment: &str) -> String {
    segment.replace('~', "~0").replace('/', "~1")
}

fn tag_name<'a>(h: &'a Helper<'_>) -> &'a str {
    h.param(0)
        .and_then(|param| param.value().as_str())
        .unwrap_or_default()
}

/// `{{__var "name"}}` / `{{__raw "name"}}`
#[derive(Clone, Copy)]
struct VariableHelper {
    escape: bool,
}

impl HelperDef for VariableHelper {
    fn call<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'rc>,
        _: &'reg Handlebars<'reg>,
        ctx: &'rc Context,
        rc: &mut RenderContext<'reg, 'rc>,
        out: &mut dyn Output,
    ) -> HelperResult {
        if let Some((_, value)) = lookup(ctx.data(), &scopes(rc), tag_name(h)) {
            let text = value.render();
            if self.escape {
                out.write(&escape_html(&text))?;
            } else {
                out.write(&text)?;
            }
        }
        Ok(())
    }
}

/// `{{#__section "name"}}` / `{{#__inverted "name"}}`
///
/// Lists render the block once per item with the item pushed as context,
/// objects render it once with the object pushed, other truthy values render
/// it once in the surrounding context.
#[derive(Clone, Copy)]
struct SectionHelper {
    inverted: bool,
}

impl HelperDef for SectionHelper {
    fn call<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'rc>,
        r: &'reg Handlebars<'reg>,
        ctx: &'rc Context,
        rc: &mut RenderContext<'reg, 'rc>,
        out: &mut dyn Output,
    ) -> HelperResult {
        let Some(template) = h.template() else {
            return Ok(());
        };
        let scopes = scopes(rc);
        let found = lookup(ctx.data(), &scopes, tag_name(h));
        let value = found.as_ref().map_or(&Value::Null, |(_, value)| *value);

        if self.inverted {
            if !is_truthy(value) {
                template.render(r, ctx, rc, out)?;
            }
            return Ok(());
        }

        let Some((pointer, value)) = found else {
            return Ok(());
        };
        match value {
            Value::Array(items) => {
                for index in 0..items.len() {
                    let item = format!("{pointer}/{index}");
                    render_in_scope(template, &scopes, item, r, ctx, rc, out)?;
                }
                Ok(())
            }
            Value::Object(_) if is_truthy(value) => {
                render_in_scope(template, &scopes, pointer, r, ctx, rc, out)
            }
            other if is_truthy(other) => template.render(r, ctx, rc, out),
            _ => Ok(()),
        }
    }
}

fn render_in_scope<'reg: 'rc, 'rc>(
    template: &'rc Template,
    scopes: &[String],
    pointer: String,
    r: &'reg Handlebars<'reg>,
    ctx: &'rc Context,
    rc: &mut RenderContext<'reg, 'rc>,
    out: &mut dyn Output,
) -> HelperResult {
    let mut stack: Vec<Value> = scopes.iter().cloned().map(Value::String).collect();
    stack.push(Value::String(pointer));

    let mut block = BlockContext::new();
    block.set_base_value(Value::Array(stack));
    rc.push_block(block);
    let rendered = template.render(r, ctx, rc, out);
    rc.pop_block();
    rendered
}

fn left_brace_helper(
    _: &Helper,
    _: &Handlebars,
    _: &Context,
    _: &mut RenderContext,
    out: &mut dyn Output,
) -> HelperResult {
    out.write("{")?;
    Ok(())
}

fn backslash_helper(
    _: &Helper,
    _: &Handlebars,
    _: &Context,
    _: &mut RenderContext,
    out: &mut dyn Output,
) -> HelperResult {
    out.write("\\")?;
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tag<'a> {
    Escaped(&'a str),
    Raw(&'a str),
    Section(&'a str),
    Inverted(&'a str),
    Close(&'a str),
    Comment,
    Partial,
    Delimiters(&'a str),
}

impl<'a> Tag<'a> {
    fn parse(content: &'a str) -> Result<Self, RenderError> {
        let Some(sigil) = content.chars().next() else {
            return Err(RenderError::Syntax("empty tag".to_string()));
        };
        let rest = content[sigil.len_utf8()..].trim();

        let tag = match sigil {
            '!' => Tag::Comment,
            '>' => Tag::Partial,
            '#' => Tag::Section(rest),
            '^' => Tag::Inverted(rest),
            '/' => Tag::Close(rest),
            '&' => Tag::Raw(rest),
            '{' => Tag::Raw(rest.strip_suffix('}').unwrap_or(rest).trim()),
            '=' => {
                let inner = content
                    .strip_prefix('=')
                    .and_then(|c| c.strip_suffix('='))
                    .ok_or_else(|| RenderError::Syntax(format!("bad delimiter tag \"{content}\"")))?;
                Tag::Delimiters(inner.trim())
            }
            _ => Tag::Escaped(content),
        };
        Ok(tag)
    }

    fn can_stand_alone(&self) -> bool {
        !matches!(self, Tag::Escaped(_) | Tag::Raw(_))
    }
}

/// Translate Mustache source into an equivalent handlebars template
pub(crate) fn lower(source: &str) -> Result<String, RenderError> {
    let mut out = String::with_capacity(source.len() + 16);
    let mut open = DEFAULT_OPEN.to_string();
    let mut close = DEFAULT_CLOSE.to_string();
    let mut sections: Vec<(&str, &'static str)> = Vec::new();
    let mut pos = 0;

    while let Some(found) = source[pos..].find(open.as_str()) {
        let tag_start = pos + found;
        push_text(&mut out, &source[pos..tag_start]);

        let inner_start = tag_start + open.len();
        let triple = open == DEFAULT_OPEN
            && close == DEFAULT_CLOSE
            && source[inner_start..].starts_with('{');

        let (tag, tag_end) = if triple {
            let body_start = inner_start + 1;
            let len = source[body_start..]
                .find("}}}")
                .ok_or_else(|| unclosed_tag(source, tag_start))?;
            (Tag::Raw(source[body_start..body_start + len].trim()), body_start + len + 3)
        } else {
            let len = source[inner_start..]
                .find(close.as_str())
                .ok_or_else(|| unclosed_tag(source, tag_start))?;
            let content = source[inner_start..inner_start + len].trim();
            (Tag::parse(content)?, inner_start + len + close.len())
        };

        pos = tag_end;
        if tag.can_stand_alone() {
            if let Some((indent, line_end)) = standalone_line(source, tag_start, tag_end) {
                out.truncate(out.len() - indent);
                pos = line_end;
            }
        }

        match tag {
            Tag::Escaped(name) => {
                out.push_str(&format!("{{{{{}}}}}", helper_call(VARIABLE_HELPER, name)?));
            }
            Tag::Raw(name) => {
                out.push_str(&format!("{{{{{}}}}}", helper_call(RAW_HELPER, name)?));
            }
            Tag::Section(name) | Tag::Inverted(name) => {
                let helper = if matches!(tag, Tag::Section(_)) {
                    SECTION_HELPER
                } else {
                    INVERTED_HELPER
                };
                out.push_str(&format!("{{{{#{}}}}}", helper_call(helper, name)?));
                sections.push((name, helper));
            }
            Tag::Close(name) => match sections.pop() {
                Some((opened, helper)) if opened == name => {
                    out.push_str(&format!("{{{{/{helper}}}}}"));
                }
                Some((opened, _)) => {
                    return Err(RenderError::Syntax(format!(
                        "section \"{opened}\" closed by \"{name}\""
                    )));
                }
                None => {
                    return Err(RenderError::Syntax(format!(
                        "closing tag \"{name}\" without an open section"
                    )));
                }
            },
            Tag::Comment | Tag::Partial => {}
            Tag::Delimiters(spec) => {
                let mut parts = spec.split_whitespace();
                match (parts.next(), parts.next(), parts.next()) {
                    (Some(o), Some(c), None) if !o.contains('=') && !c.contains('=') => {
                        open = o.to_string();
                        close = c.to_string();
                    }
                    _ => {
                        return Err(RenderError::Syntax(format!(
                            "bad delimiter tag \"{spec}\""
                        )));
                    }
                }
            }
        }
    }

    push_text(&mut out, &source[pos..]);

    if let Some((name, _)) = sections.last() {
        return Err(RenderError::Syntax(format!("section \"{name}\" is never closed")));
    }

    Ok(out)
}

// Literal text that handlebars would otherwise read as markup goes through helpers.
fn push_text(out: &mut String, text: &str) {
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        let next = chars.peek().copied();
        match (c, next) {
            ('{', Some('{') | None) => {
                out.push_str("{{");
                out.push_str(LEFT_BRACE_HELPER);
                out.push_str("}}");
            }
            ('\\', Some('{') | None) => {
                out.push_str("{{");
                out.push_str(BACKSLASH_HELPER);
                out.push_str("}}");
            }
            _ => out.push(c),
        }
    }
}

/// When a tag is alone on its line, the indent to drop from the output and
/// where the line ends in the source
fn standalone_line(source: &str, tag_start: usize, tag_end: usize) -> Option<(usize, usize)> {
    let is_blank = |s: &str| s.chars().all(|c| c == ' ' || c == '\t');

    let line_start = source[..tag_start].rfind('\n').map_or(0, |i| i + 1);
    let indent = &source[line_start..tag_start];
    if !is_blank(indent) {
        return None;
    }

    let rest = &source[tag_end..];
    let line_len = rest.find('\n').map_or(rest.len(), |i| i + 1);
    let trailing = rest[..line_len].trim_end_matches('\n').trim_end_matches('\r');
    if !is_blank(trailing) {
        return None;
    }

    Some((indent.len(), tag_end + line_len))
}

/// `helper "name"`, with the tag name passed as a string literal
fn helper_call(helper: &str, name: &str) -> Result<String, RenderError> {
    if name.is_empty() {
        return Err(RenderError::Syntax("tag without a name".to_string()));
    }
    if !usable_name(name) {
        return Err(RenderError::Syntax(format!("unusable name \"{name}\"")));
    }
    Ok(format!("{helper} \"{name}\""))
}

// Names travel inside a handlebars string literal
fn usable_name(name: &str) -> bool {
    !name.contains(['"', '\\']) && !name.contains("{{") && !name.contains("}}")
}

fn unclosed_tag(source: &str, tag_start: usize) -> RenderError {
    let excerpt: String = source[tag_start..].chars().take(20).collect();
    RenderError::Syntax(format!("unclosed tag at \"{excerpt}\""))
}
