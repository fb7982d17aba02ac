//! Logging for the smolboard frontend.
//!
//! The workspace logs through the `tracing` macros re-exported here.
//! [`init`] installs a `tracing-subscriber` pipeline configured from the
//! environment. Output goes to stderr, as JSON by default.
//!
//! # Usage
//!
//! ```rust
//! use board_log::{debug, error, info, warn};
//!
//! board_log::init();
//!
//! info!("Listening on {}", "127.0.0.1:8080");
//! debug!(target: "board::mux", "Matched route {}", "/settings");
//! warn!("Backend slow to respond");
//! error!("Error rendering error page: {}", "boom");
//! ```
//!
//! # Environment Variables
//!
//! - `BOARD_LOG_LEVEL` - filter directives, e.g. `info` or
//!   `warn,board_render=debug` (default `info`)
//! - `BOARD_DEBUG=1` - shorthand for `BOARD_LOG_LEVEL=debug`
//! - `BOARD_LOG_FORMAT=json|pretty|compact` - output format
//! - `BOARD_LOG_TIMESTAMPS=1|0` - include timestamps (default on)

use std::env;
use std::io;
use tracing::Subscriber;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{EnvFilter, Layer, fmt, prelude::*};

pub use tracing::{debug, error, info, trace, warn};

const DEFAULT_FILTER: &str = "info";

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    /// One JSON object per event, fields flattened.
    #[default]
    Json,
    /// Multi-line, human-oriented.
    Pretty,
    /// One line per event.
    Compact,
}

impl Format {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "json" => Some(Format::Json),
            "pretty" => Some(Format::Pretty),
            "compact" => Some(Format::Compact),
            _ => None,
        }
    }
}

/// What [`init`] installs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    /// `EnvFilter` directives.
    pub filter: String,
    pub format: Format,
    pub timestamps: bool,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            filter: DEFAULT_FILTER.to_string(),
            format: Format::default(),
            timestamps: true,
        }
    }
}

impl LogSettings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build settings from any variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let debug = lookup("BOARD_DEBUG").is_some_and(|v| is_truthy(&v));

        let filter = lookup("BOARD_LOG_LEVEL")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| if debug { "debug" } else { DEFAULT_FILTER }.to_string());

        let format = lookup("BOARD_LOG_FORMAT")
            .and_then(|v| Format::parse(&v))
            .unwrap_or_default();

        let timestamps = lookup("BOARD_LOG_TIMESTAMPS").is_none_or(|v| is_truthy(&v));

        Self {
            filter,
            format,
            timestamps,
        }
    }

    /// The filter to install. Directives that fail to parse fall back to
    /// the default level.
    pub fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_new(&self.filter).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Install the global subscriber from the environment.
///
/// Returns `false` when a subscriber was already installed, in which case
/// nothing changes.
pub fn init() -> bool {
    init_with(&LogSettings::from_env())
}

pub fn init_with(settings: &LogSettings) -> bool {
    tracing_subscriber::registry()
        .with(settings.env_filter())
        .with(fmt_layer(settings))
        .try_init()
        .is_ok()
}

fn fmt_layer<S>(settings: &LogSettings) -> Box<dyn Layer<S> + Send + Sync>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    let layer = fmt::layer().with_writer(io::stderr).with_target(true);

    match (settings.format, settings.timestamps) {
        (Format::Json, true) => layer.json().flatten_event(true).boxed(),
        (Format::Json, false) => layer.json().flatten_event(true).without_time().boxed(),
        (Format::Pretty, true) => layer.pretty().boxed(),
        (Format::Pretty, false) => layer.pretty().without_time().boxed(),
        (Format::Compact, true) => layer.compact().boxed(),
        (Format::Compact, false) => layer.compact().without_time().boxed(),
    }
}
