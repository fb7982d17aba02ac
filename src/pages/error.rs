//! The page shown when another page fails

use super::components;
use async_trait::async_trait;
use board_render::{
    CommonContext, Composer, ErrorRenderer, Page, PageError, PageTemplate, Render, Request, Style,
    Templates,
};
use serde::Serialize;
use std::sync::Arc;

pub const PAGE: &str = "error";

pub fn register(composer: &mut Composer) -> board_render::Result<()> {
    composer.build_page(
        PAGE,
        Page::new(include_str!("templates/error.hbs"))
            .with_component("nav", components::nav())
            .with_style(Style::embedded("pages/error.css", include_str!("templates/error.css"))),
    )?;
    Ok(())
}

#[derive(Serialize)]
struct ErrorContext<'a> {
    #[serde(flatten)]
    common: CommonContext<'a>,
    status: u16,
    message: String,
    unauthenticated: bool,
}

pub struct ErrorPage {
    page: Arc<PageTemplate>,
}

impl ErrorPage {
    pub fn new(templates: &Templates) -> board_render::Result<Self> {
        Ok(Self {
            page: templates.page(PAGE)?,
        })
    }
}

#[async_trait]
impl ErrorRenderer for ErrorPage {
    async fn render_error(&self, r: &mut Request, err: &PageError) -> Result<Render, PageError> {
        let body = self.page.render(&ErrorContext {
            common: r.common(),
            status: err.status_code(),
            message: err.to_string(),
            unauthenticated: err.is_unauthenticated(),
        })?;

        Ok(Render::new(body).with_title("Error"))
    }
}
