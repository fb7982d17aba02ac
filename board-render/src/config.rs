//! Site-wide display settings

use board_config::{ConfigValidator, Validate};
use serde::{Deserialize, Serialize};

pub const DEFAULT_SITE_NAME: &str = "smolboard";

/// Read-only settings shared by every request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderConfig {
    #[serde(rename = "siteName", default = "default_site_name")]
    pub site_name: String,
}

fn default_site_name() -> String {
    DEFAULT_SITE_NAME.to_string()
}

impl RenderConfig {
    pub fn new(site_name: impl Into<String>) -> Self {
        Self {
            site_name: site_name.into(),
        }
    }

    /// The document title: the site name alone, or `"<title> - <site name>"`.
    pub fn format_title(&self, title: &str) -> String {
        if title.is_empty() {
            self.site_name.clone()
        } else {
            format!("{} - {}", title, self.site_name)
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self::new(DEFAULT_SITE_NAME)
    }
}

impl Validate for RenderConfig {
    fn validate(&self) -> board_config::Result<()> {
        ConfigValidator::not_empty(&self.site_name, "siteName")
    }
}
