// Layered configuration for the smolboard frontend
//
// Sources are applied in the order they are added; later layers override
// earlier ones key by key, and nested tables merge rather than replace.

pub mod env;
pub mod error;
pub mod loader;
pub mod validation;

pub use env::EnvLoader;
pub use error::{ConfigError, Result};
pub use loader::{ConfigLoader, FileFormat};
pub use validation::{ConfigValidator, Validate};

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::path::Path;

/// Builds a typed configuration out of files, `.env` files and
/// environment overrides.
///
/// ```no_run
/// # use board_config::{ConfigBuilder, Validate};
/// # #[derive(serde::Deserialize)] struct Settings { address: String }
/// # impl Validate for Settings { fn validate(&self) -> board_config::Result<()> { Ok(()) } }
/// let settings: Settings = ConfigBuilder::new()
///     .with_env_prefix("BOARD")
///     .file("frontend.toml")?
///     .env_override("ADDRESS", "address")
///     .build()?;
/// # Ok::<(), board_config::ConfigError>(())
/// ```
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    values: Map<String, Value>,
    env: EnvLoader,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read overrides from `PREFIX_*` variables of the process environment.
    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env = EnvLoader::new(Some(prefix.into()));
        self
    }

    /// Read overrides from the given loader instead.
    pub fn with_env(mut self, env: EnvLoader) -> Self {
        self.env = env;
        self
    }

    /// Merge a configuration file; the format follows the file name.
    pub fn file(mut self, path: impl AsRef<Path>) -> Result<Self> {
        let value = ConfigLoader::auto(path.as_ref())?.load_file(path.as_ref())?;
        self.merge(value)?;
        Ok(self)
    }

    /// Like [`ConfigBuilder::file`], but a missing file is skipped.
    pub fn optional_file(self, path: impl AsRef<Path>) -> Result<Self> {
        if path.as_ref().exists() {
            self.file(path)
        } else {
            Ok(self)
        }
    }

    /// Load a `.env` file into the process environment so that later
    /// [`ConfigBuilder::env_override`] calls see it. A missing default
    /// `.env` is ignored; an explicit path must exist.
    pub fn dotenv(self, path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                dotenvy::from_path(path).map_err(|e| match e {
                    dotenvy::Error::Io(err) if err.kind() == std::io::ErrorKind::NotFound => {
                        ConfigError::FileNotFound(path.to_path_buf())
                    }
                    other => ConfigError::ParseError {
                        format: "env",
                        message: other.to_string(),
                    },
                })?;
            }
            None => {
                dotenvy::dotenv().ok();
            }
        }
        Ok(self)
    }

    /// Set `key` (a dotted path such as `frontend.siteName`) directly.
    pub fn set<T: Serialize>(mut self, key: &str, value: T) -> Result<Self> {
        let value = serde_json::to_value(value)
            .map_err(|e| ConfigError::DeserializationError(e.to_string()))?;
        insert_path(&mut self.values, key, value);
        Ok(self)
    }

    /// If the variable `PREFIX_<var>` is set, its value replaces `key`.
    pub fn env_override(mut self, var: &str, key: &str) -> Self {
        if let Ok(value) = self.env.load_var(var) {
            insert_path(&mut self.values, key, Value::String(value));
        }
        self
    }

    /// The merged value tree.
    pub fn values(&self) -> &Map<String, Value> {
        &self.values
    }

    /// Deserialize the merged tree and run its validation rules.
    pub fn build<T: DeserializeOwned + Validate>(self) -> Result<T> {
        let config: T = serde_json::from_value(Value::Object(self.values))
            .map_err(|e| ConfigError::DeserializationError(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    fn merge(&mut self, value: Value) -> Result<()> {
        match value {
            Value::Object(map) => {
                merge_maps(&mut self.values, map);
                Ok(())
            }
            other => Err(ConfigError::DeserializationError(format!(
                "configuration root must be a table, found {}",
                other
            ))),
        }
    }
}

fn merge_maps(target: &mut Map<String, Value>, source: Map<String, Value>) {
    for (key, value) in source {
        if let Value::Object(incoming) = value {
            if let Some(Value::Object(existing)) = target.get_mut(&key) {
                merge_maps(existing, incoming);
                continue;
            }
            target.insert(key, Value::Object(incoming));
        } else {
            target.insert(key, value);
        }
    }
}

fn insert_path(target: &mut Map<String, Value>, key: &str, value: Value) {
    match key.split_once('.') {
        None => {
            target.insert(key.to_string(), value);
        }
        Some((head, rest)) => {
            let entry = target
                .entry(head.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !entry.is_object() {
                *entry = Value::Object(Map::new());
            }
            if let Value::Object(inner) = entry {
                insert_path(inner, rest, value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Site {
        #[serde(rename = "siteName", default = "default_name")]
        site_name: String,
        #[serde(default)]
        theme: Option<String>,
    }

    fn default_name() -> String {
        "smolboard".to_string()
    }

    impl Validate for Site {
        fn validate(&self) -> Result<()> {
            ConfigValidator::not_empty(&self.site_name, "siteName")
        }
    }

    #[test]
    fn test_defaults_apply() {
        let site: Site = ConfigBuilder::new().build().unwrap();
        assert_eq!(site.site_name, "smolboard");
        assert!(site.theme.is_none());
    }

    #[test]
    fn test_later_layers_win() {
        let env = EnvLoader::from_vars(Some("BOARD".to_string()), [("BOARD_SITE_NAME", "from env")]);

        let site: Site = ConfigBuilder::new()
            .with_env(env)
            .set("siteName", "from set")
            .unwrap()
            .set("theme", "dark")
            .unwrap()
            .env_override("SITE_NAME", "siteName")
            .env_override("THEME", "theme")
            .build()
            .unwrap();

        assert_eq!(site.site_name, "from env");
        assert_eq!(site.theme.as_deref(), Some("dark"));
    }

    #[test]
    fn test_validation_runs() {
        let err = ConfigBuilder::new()
            .set("siteName", "")
            .unwrap()
            .build::<Site>()
            .unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError { .. }));
    }

    #[test]
    fn test_nested_tables_merge() {
        let mut target = Map::new();
        insert_path(&mut target, "frontend.siteName", Value::from("a"));
        insert_path(&mut target, "frontend.theme", Value::from("dark"));

        let mut incoming = Map::new();
        insert_path(&mut incoming, "frontend.siteName", Value::from("b"));
        merge_maps(&mut target, incoming);

        assert_eq!(target["frontend"]["siteName"], "b");
        assert_eq!(target["frontend"]["theme"], "dark");
    }
}
