//! Page composition: main templates, named components and their styles
//!
//! Every page is compiled once, at startup, into its own template registry
//! holding the page and every component it reaches. A reference to a
//! component that was never supplied fails the build, not the first
//! request that happens to render it.

use crate::helpers::register_builtin_helpers;
use crate::style::{Style, StyleRegistry};
use crate::{Result, TemplateError};
use board_log::debug;
use handlebars::{Context, Handlebars, Helper, HelperResult, Output, RenderContext};
use once_cell::sync::{Lazy, OnceCell};
use regex::Regex;
use serde::Serialize;
use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::Arc;

/// A template helper function.
pub type HelperFn = for<'reg, 'rc> fn(
    &Helper<'rc>,
    &'reg Handlebars<'reg>,
    &'rc Context,
    &mut RenderContext<'reg, 'rc>,
    &mut dyn Output,
) -> HelperResult;

/// `{{> name}}`, `{{~> name}}` and `{{#> name}}` partial references.
static PARTIAL_REF: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"\{\{~?\s*#?>\s*"?([@A-Za-z0-9_./-]+)"?"#).unwrap());

/// `{{#*inline "name"}}` partials defined inside a template.
static INLINE_PARTIAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"\{\{~?\s*#\*inline\s+"([^"]+)""#).unwrap());

/// Comments and raw blocks, which never reference partials.
static UNSCANNED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?s)\{\{~?!--.*?--~?\}\}|\{\{~?![^}]*\}\}|\{\{\{\{[^}]*\}\}\}\}.*?\{\{\{\{/[^}]*\}\}\}\}",
    )
    .unwrap()
});

const LAYOUT: &str = include_str!("../templates/layout.hbs");

/// A template fragment plus the named components it may reference.
///
/// A page is a component too: its template is the main template and its
/// components fill the slots it names.
#[derive(Clone, Default)]
pub struct Component {
    template: Cow<'static, str>,
    components: Vec<(String, Component)>,
    styles: Vec<Style>,
    helpers: Vec<(String, HelperFn)>,
}

/// The definition of a page.
pub type Page = Component;

impl Component {
    pub fn new(template: impl Into<Cow<'static, str>>) -> Self {
        Self {
            template: template.into(),
            ..Self::default()
        }
    }

    /// Read the template from disk.
    pub fn file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        Ok(Self::new(std::fs::read_to_string(path)?))
    }

    /// Make `component` available under `name`. Registration order is the
    /// order its styles end up in.
    pub fn with_component(mut self, name: &str, component: Component) -> Self {
        self.components.push((name.to_string(), component));
        self
    }

    pub fn with_style(mut self, style: Style) -> Self {
        self.styles.push(style);
        self
    }

    pub fn with_helper(mut self, name: &str, helper: HelperFn) -> Self {
        self.helpers.push((name.to_string(), helper));
        self
    }

    pub fn template(&self) -> &str {
        &self.template
    }
}

/// A compiled page, immutable and shared by every request.
pub struct PageTemplate {
    name: String,
    registry: Handlebars<'static>,
}

impl PageTemplate {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn render<T: Serialize>(&self, data: &T) -> Result<String> {
        Ok(self.registry.render(&self.name, data)?)
    }

    /// Whether the page ended up with a component under `name`.
    pub fn has_component(&self, name: &str) -> bool {
        self.registry.has_template(name) && name != self.name
    }
}

impl std::fmt::Debug for PageTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageTemplate").field("name", &self.name).finish()
    }
}

/// Collects page definitions and stylesheets during startup.
#[derive(Default)]
pub struct Composer {
    pages: HashMap<String, Arc<PageTemplate>>,
    styles: StyleRegistry,
    layout: Option<Component>,
}

impl Composer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a stylesheet that belongs to no particular component.
    pub fn register_style(&mut self, style: Style) -> bool {
        self.styles.register(style)
    }

    /// Replace the bundled outer layout.
    pub fn set_layout(&mut self, layout: Component) {
        self.layout = Some(layout);
    }

    /// Compile `page` under `name` and collect its styles.
    pub fn build_page(&mut self, name: &str, page: Page) -> Result<Arc<PageTemplate>> {
        if self.pages.contains_key(name) {
            return Err(TemplateError::DuplicatePage(name.to_string()));
        }

        let template = Arc::new(compile(name, &page)?);
        collect_styles(&page, &mut self.styles);

        debug!("Built page {:?}", name);
        self.pages.insert(name.to_string(), template.clone());
        Ok(template)
    }

    /// Freeze everything built so far.
    pub fn finish(mut self) -> Result<Templates> {
        let layout = self.layout.take().unwrap_or_else(|| Component::new(LAYOUT));
        let compiled = compile("layout", &layout)?;
        collect_styles(&layout, &mut self.styles);

        Ok(Templates {
            components_css: self.styles.css(),
            pages: self.pages,
            styles: self.styles,
            layout: compiled,
        })
    }
}

/// Everything the composer built: pages, the layout and the style bundle.
pub struct Templates {
    pages: HashMap<String, Arc<PageTemplate>>,
    styles: StyleRegistry,
    components_css: String,
    layout: PageTemplate,
}

impl Templates {
    pub fn page(&self, name: &str) -> Result<Arc<PageTemplate>> {
        self.pages
            .get(name)
            .cloned()
            .ok_or_else(|| TemplateError::PageNotFound(name.to_string()))
    }

    pub fn layout(&self) -> &PageTemplate {
        &self.layout
    }

    pub fn styles(&self) -> &StyleRegistry {
        &self.styles
    }

    /// Every registered stylesheet, concatenated in registration order.
    pub fn components_css(&self) -> &str {
        &self.components_css
    }
}

static TEMPLATES: OnceCell<Arc<Templates>> = OnceCell::new();

/// Build the process-wide templates with `setup`. Only the first call runs
/// `setup`; later calls return what it built. Concurrent callers wait for
/// the first one to finish.
pub fn init<F>(setup: F) -> Result<Arc<Templates>>
where
    F: FnOnce(&mut Composer) -> Result<()>,
{
    TEMPLATES
        .get_or_try_init(|| {
            let mut composer = Composer::new();
            setup(&mut composer)?;
            composer.finish().map(Arc::new)
        })
        .cloned()
}

/// The process-wide templates, once [`init`] has succeeded.
pub fn templates() -> Option<Arc<Templates>> {
    TEMPLATES.get().cloned()
}

fn compile(name: &str, page: &Component) -> Result<PageTemplate> {
    let mut resolver = Resolver {
        page: name,
        resolved: Vec::new(),
        stack: Vec::new(),
    };
    let mut scopes = vec![page.components.as_slice()];
    resolver.visit(&page.template, &mut scopes)?;

    let mut registry = Handlebars::new();
    register_builtin_helpers(&mut registry);
    registry.register_template_string(name, page.template.as_ref())?;

    for (helper_name, helper) in &page.helpers {
        registry.register_helper(helper_name, Box::new(*helper));
    }
    for (component_name, component) in &resolver.resolved {
        registry.register_partial(component_name, component.template.as_ref())?;
        for (helper_name, helper) in &component.helpers {
            registry.register_helper(helper_name, Box::new(*helper));
        }
    }

    Ok(PageTemplate {
        name: name.to_string(),
        registry,
    })
}

/// Walks partial references depth first. Names resolve against the
/// components of the referencing template first, then outwards.
struct Resolver<'a> {
    page: &'a str,
    resolved: Vec<(String, &'a Component)>,
    stack: Vec<String>,
}

impl<'a> Resolver<'a> {
    fn visit(&mut self, template: &str, scopes: &mut Vec<&'a [(String, Component)]>) -> Result<()> {
        let template = UNSCANNED.replace_all(template, "");

        let inline: Vec<&str> = INLINE_PARTIAL
            .captures_iter(&template)
            .filter_map(|c| c.get(1).map(|m| m.as_str()))
            .collect();

        let references: Vec<String> = PARTIAL_REF
            .captures_iter(&template)
            .filter_map(|c| c.get(1).map(|m| m.as_str().to_string()))
            .filter(|name| !name.starts_with('@') && !inline.contains(&name.as_str()))
            .collect();

        for name in references {
            if self.stack.contains(&name) {
                let mut chain = self.stack.clone();
                chain.push(name);
                return Err(TemplateError::ComponentCycle {
                    page: self.page.to_string(),
                    chain,
                });
            }

            let component = scopes
                .iter()
                .rev()
                .copied()
                .find_map(|scope| scope.iter().find(|(n, _)| *n == name).map(|(_, c)| c))
                .ok_or_else(|| TemplateError::UnknownComponent {
                    page: self.page.to_string(),
                    component: name.clone(),
                })?;

            if let Some((_, existing)) = self.resolved.iter().find(|(n, _)| *n == name) {
                if existing.template != component.template {
                    return Err(TemplateError::ComponentConflict {
                        page: self.page.to_string(),
                        component: name,
                    });
                }
                continue;
            }

            self.stack.push(name.clone());
            scopes.push(component.components.as_slice());
            self.visit(&component.template, scopes)?;
            scopes.pop();
            self.stack.pop();

            self.resolved.push((name, component));
        }

        Ok(())
    }
}

/// Styles in declaration order: each component's own styles, then those of
/// its components, then the page's own.
fn collect_styles(page: &Component, styles: &mut StyleRegistry) {
    for (_, component) in &page.components {
        collect_component_styles(component, styles);
    }
    for style in &page.styles {
        styles.register(style.clone());
    }
}

fn collect_component_styles(component: &Component, styles: &mut StyleRegistry) {
    for style in &component.styles {
        styles.register(style.clone());
    }
    for (_, child) in &component.components {
        collect_component_styles(child, styles);
    }
}
