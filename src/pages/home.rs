//! The landing page

use super::components;
use async_trait::async_trait;
use board_render::{
    Composer, Page, PageError, PageTemplate, Render, Renderer, Request, Style, Templates,
};
use std::sync::Arc;

pub const PAGE: &str = "home";

pub fn register(composer: &mut Composer) -> board_render::Result<()> {
    composer.build_page(
        PAGE,
        Page::new(include_str!("templates/home.hbs"))
            .with_component("search", components::search())
            .with_component("footer", components::footer())
            .with_style(Style::embedded("pages/home.css", include_str!("templates/home.css"))),
    )?;
    Ok(())
}

pub struct Home {
    page: Arc<PageTemplate>,
}

impl Home {
    pub fn new(templates: &Templates) -> board_render::Result<Self> {
        Ok(Self {
            page: templates.page(PAGE)?,
        })
    }
}

#[async_trait]
impl Renderer for Home {
    async fn render(&self, r: &mut Request) -> Result<Render, PageError> {
        Ok(Render::new(self.page.render(&r.common())?))
    }
}
