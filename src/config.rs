//! Frontend configuration: where to listen, which backend to call and how
//! the site presents itself.

use board_config::{ConfigBuilder, ConfigValidator, Validate};
use board_render::RenderConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Prefix of the environment variables that override the file.
pub const ENV_PREFIX: &str = "BOARD";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrontendConfig {
    /// `host:port`, or `:port` for every interface.
    pub address: String,
    /// Base URL of the board backend.
    pub backend: String,
    #[serde(rename = "staticDir", default = "default_static_dir")]
    pub static_dir: String,
    #[serde(flatten)]
    pub frontend: RenderConfig,
}

fn default_static_dir() -> String {
    "static".to_string()
}

impl FrontendConfig {
    /// Load `path` (TOML, JSON or `.env`), then apply `BOARD_*` overrides.
    pub fn load(path: impl AsRef<Path>) -> board_config::Result<Self> {
        Self::builder()
            .dotenv(None)?
            .file(path)?
            .with_overrides()
            .build()
    }

    /// Like [`FrontendConfig::load`], but everything may come from the
    /// environment when the file does not exist.
    pub fn load_optional(path: impl AsRef<Path>) -> board_config::Result<Self> {
        Self::builder()
            .dotenv(None)?
            .optional_file(path)?
            .with_overrides()
            .build()
    }

    fn builder() -> ConfigBuilder {
        ConfigBuilder::new().with_env_prefix(ENV_PREFIX)
    }

    /// The address to bind, with `:port` expanded to all interfaces.
    pub fn listen_address(&self) -> String {
        if self.address.starts_with(':') {
            format!("0.0.0.0{}", self.address)
        } else {
            self.address.clone()
        }
    }
}

trait Overrides {
    fn with_overrides(self) -> Self;
}

impl Overrides for ConfigBuilder {
    fn with_overrides(self) -> Self {
        self.env_override("ADDRESS", "address")
            .env_override("BACKEND", "backend")
            .env_override("STATIC_DIR", "staticDir")
            .env_override("SITE_NAME", "siteName")
    }
}

impl Validate for FrontendConfig {
    fn validate(&self) -> board_config::Result<()> {
        ConfigValidator::is_listen_address(&self.address, "address")?;
        ConfigValidator::is_url(&self.backend, "backend")?;
        ConfigValidator::not_empty(&self.static_dir, "staticDir")?;
        self.frontend.validate()
    }
}
