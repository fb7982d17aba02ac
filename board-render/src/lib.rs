//! Page rendering for the smolboard frontend
//!
//! This crate drives every page request: it builds the request context,
//! runs the page renderer, reconciles the session's cookies with the
//! response and wraps the page body in the site layout.
//!
//! ## Features
//!
//! - 🧩 Pages composed from named, reusable components, checked at startup
//! - 🎨 Component stylesheets bundled into `/static/components.css`
//! - 🍪 Session cookies flushed exactly as the backend issued them
//! - 🌗 Theme preference kept in a cookie, outside the session
//! - 🛟 Pluggable error page with a bare-text fallback
//!
//! ## Example
//!
//! ```no_run
//! use async_trait::async_trait;
//! use board_render::{Mux, Page, PageError, Render, RenderConfig, Renderer, Request, init, templates};
//! use board_session::HttpBackend;
//! use std::sync::Arc;
//!
//! struct Home;
//!
//! #[async_trait]
//! impl Renderer for Home {
//!     async fn render(&self, r: &mut Request) -> Result<Render, PageError> {
//!         let page = templates().and_then(|t| t.page("home").ok()).ok_or_else(|| {
//!             PageError::Other("templates not initialised".to_string())
//!         })?;
//!         Ok(Render::new(page.render(&r.common())?))
//!     }
//! }
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let templates = init(|composer| {
//!     composer.build_page("home", Page::new("<h1>Hi {{username}}</h1>"))?;
//!     Ok(())
//! })?;
//!
//! let backend = Arc::new(HttpBackend::new("http://localhost:8080")?);
//! let mut mux = Mux::new(RenderConfig::default(), backend, templates);
//! mux.get("/", Home);
//!
//! board_core::Server::new(mux.into_router()).listen("127.0.0.1:8000").await?;
//! # Ok(())
//! # }
//! ```

pub mod composer;
pub mod config;
pub mod error;
pub mod helpers;
pub mod mux;
pub mod render;
pub mod request;
pub mod style;
pub mod theme;

pub use composer::{Component, Composer, HelperFn, Page, PageTemplate, Templates, init, templates};
pub use config::{DEFAULT_SITE_NAME, RenderConfig};
pub use error::{PageError, Result, TemplateError};
pub use mux::{ErrorRenderer, Mux, Renderer, Scope};
pub use render::Render;
pub use request::{CommonContext, Request, ThemeOption};
pub use style::{Style, StyleRegistry};
pub use theme::Theme;
