//! Error types for page composition and page handlers

use board_session::SessionError;
use thiserror::Error;

/// Result type for template operations
pub type Result<T> = std::result::Result<T, TemplateError>;

/// Errors raised while building or executing page templates
#[derive(Error, Debug)]
pub enum TemplateError {
    /// A template references a component nobody registered.
    #[error("Page {page:?} references unknown component {component:?}")]
    UnknownComponent { page: String, component: String },

    /// Components reference each other in a loop.
    #[error("Page {page:?} has a component cycle: {}", .chain.join(" -> "))]
    ComponentCycle { page: String, chain: Vec<String> },

    /// Two different components were registered under one name.
    #[error("Page {page:?} registers component {component:?} twice with different templates")]
    ComponentConflict { page: String, component: String },

    /// A page was looked up but never built.
    #[error("Page not found: {0}")]
    PageNotFound(String),

    /// A page name was built twice.
    #[error("Page {0:?} is already built")]
    DuplicatePage(String),

    /// Template parsing error
    #[error("Template parsing error: {0}")]
    Parse(String),

    /// Template rendering error
    #[error("Template rendering error: {0}")]
    Render(String),

    /// IO error when loading templates or styles
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<handlebars::RenderError> for TemplateError {
    fn from(err: handlebars::RenderError) -> Self {
        TemplateError::Render(err.to_string())
    }
}

impl From<handlebars::TemplateError> for TemplateError {
    fn from(err: handlebars::TemplateError) -> Self {
        TemplateError::Parse(err.to_string())
    }
}

/// Everything a page handler can fail with.
#[derive(Error, Debug)]
pub enum PageError {
    #[error("{0}")]
    Session(#[from] SessionError),

    #[error("{0}")]
    Template(#[from] TemplateError),

    #[error("{0}")]
    Http(#[from] board_core::Error),

    #[error("Missing URL parameter {0:?}")]
    MissingParam(String),

    #[error("Invalid URL parameter {name:?}: {message}")]
    InvalidParam { name: String, message: String },

    #[error("Missing form field {0:?}")]
    MissingField(String),

    /// Another error with a description of what was being attempted.
    #[error("{context}: {source}")]
    Context {
        context: String,
        #[source]
        source: Box<PageError>,
    },

    #[error("{0}")]
    Other(String),
}

impl PageError {
    /// Prefix the error with what was being attempted. The status code is
    /// that of the wrapped error.
    pub fn context(self, context: impl Into<String>) -> Self {
        PageError::Context {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// The status code the response carries when this error reaches the
    /// dispatcher.
    pub fn status_code(&self) -> u16 {
        match self {
            PageError::Session(err) => err.status_code(),
            PageError::Http(err) => err.status_code(),
            PageError::MissingParam(_)
            | PageError::InvalidParam { .. }
            | PageError::MissingField(_) => 400,
            PageError::Context { source, .. } => source.status_code(),
            PageError::Template(_) | PageError::Other(_) => 500,
        }
    }

    /// The session error at the bottom of the chain, if any.
    pub fn session_error(&self) -> Option<&SessionError> {
        match self {
            PageError::Session(err) => Some(err),
            PageError::Context { source, .. } => source.session_error(),
            _ => None,
        }
    }

    pub fn is_unauthenticated(&self) -> bool {
        self.session_error().is_some_and(SessionError::is_unauthenticated)
    }
}
