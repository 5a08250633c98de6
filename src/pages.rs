// Built-in HTML pages: the hook index and the manual submission form

use handlebars::{Handlebars, RenderError, TemplateError};
use hookwire_translators::HookTranslator;
use serde::Serialize;

const INDEX_PAGE: &str = "index";
const SUBMIT_PAGE: &str = "submit";

#[derive(Serialize)]
struct IndexContext<'a> {
    hooks: Vec<&'a str>,
}

#[derive(Serialize)]
struct SubmitContext<'a> {
    hook: &'a str,
    translators: Vec<TranslatorSummary<'a>>,
}

#[derive(Serialize)]
struct TranslatorSummary<'a> {
    name: &'a str,
    variant: &'a str,
}

pub struct Pages {
    registry: Handlebars<'static>,
}

impl Pages {
    pub fn new() -> Result<Self, TemplateError> {
        let mut registry = Handlebars::new();
        registry.register_template_string(INDEX_PAGE, include_str!("pages/index.hbs"))?;
        registry.register_template_string(SUBMIT_PAGE, include_str!("pages/submit.hbs"))?;
        Ok(Self { registry })
    }

    /// Links to every hook
    pub fn index<'a>(&self, hooks: impl IntoIterator<Item = &'a str>) -> Result<String, RenderError> {
        let context = IndexContext {
            hooks: hooks.into_iter().collect(),
        };
        self.registry.render(INDEX_PAGE, &context)
    }

    /// Form for posting a payload to `hook` by hand
    pub fn submit_form(&self, hook: &str, translators: &[HookTranslator]) -> Result<String, RenderError> {
        let context = SubmitContext {
            hook,
            translators: translators
                .iter()
                .map(|t| TranslatorSummary {
                    name: &t.name,
                    variant: t.translator.variant(),
                })
                .collect(),
        };
        self.registry.render(SUBMIT_PAGE, &context)
    }
}
