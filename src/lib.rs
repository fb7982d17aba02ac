//! smolboard frontend
//!
//! Server-rendered pages for the smolboard content board. Each request gets
//! its own session proxy against the backend, the pages are composed from
//! shared components at startup, and every response carries the cookies
//! the backend issued while serving it.
//!
//! ```no_run
//! use frontend::{FrontendConfig, HttpBackend, Server, app};
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<(), frontend::FrontendError> {
//! let config = FrontendConfig::load("frontend.toml")?;
//! let backend = Arc::new(HttpBackend::new(&config.backend)?);
//! Server::new(app(&config, backend)?)
//!     .listen(&config.listen_address())
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod pages;

pub use config::FrontendConfig;

// Re-export the building blocks
pub use board_core::{Cookie, HttpRequest, HttpResponse, HttpStatus, Router, Server};
pub use board_render::{
    Component, Composer, ErrorRenderer, Mux, Page, PageError, Render, RenderConfig, Renderer,
    Request, Style, Templates,
};
pub use board_session::{Backend, HttpBackend, Identity, Session, SessionError, SessionProxy};

pub use board_config;
pub use board_log;

use board_log::warn;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Everything that can stop the frontend from starting or serving.
#[derive(Error, Debug)]
pub enum FrontendError {
    #[error("Configuration error: {0}")]
    Config(#[from] board_config::ConfigError),

    #[error("Backend error: {0}")]
    Session(#[from] SessionError),

    #[error("Template error: {0}")]
    Template(#[from] board_render::TemplateError),

    #[error("Server error: {0}")]
    Http(#[from] board_core::Error),
}

/// Build the bundled pages (once per process) and route them.
pub fn app(config: &FrontendConfig, backend: Arc<dyn Backend>) -> Result<Router, FrontendError> {
    let templates = board_render::init(pages::register)?;

    let mut mux = Mux::new(config.frontend.clone(), backend, templates.clone());
    if Path::new(&config.static_dir).is_dir() {
        mux.set_static_dir(&config.static_dir)?;
    } else {
        warn!(
            "Static directory {:?} not found; only /static/components.css is served",
            config.static_dir
        );
    }

    pages::mount(&mut mux, &templates)?;
    Ok(mux.into_router())
}
