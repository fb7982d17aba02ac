// Configuration file parsing

use crate::{ConfigError, Result};
use serde_json::Value;
use std::path::Path;

/// Supported configuration file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Json,
    Toml,
    /// `KEY=value` lines, as in a `.env` file.
    Env,
}

impl FileFormat {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "json" => Some(FileFormat::Json),
            "toml" => Some(FileFormat::Toml),
            "env" => Some(FileFormat::Env),
            _ => None,
        }
    }

    /// Detect the format from a file name. `.env` has no extension of its
    /// own, so it is matched by name.
    pub fn from_path(path: &Path) -> Result<Self> {
        if path.file_name().and_then(|n| n.to_str()) == Some(".env") {
            return Ok(FileFormat::Env);
        }

        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .ok_or_else(|| ConfigError::UnsupportedFormat(path.display().to_string()))?;

        Self::from_extension(ext).ok_or_else(|| ConfigError::UnsupportedFormat(ext.to_string()))
    }

    fn name(&self) -> &'static str {
        match self {
            FileFormat::Json => "JSON",
            FileFormat::Toml => "TOML",
            FileFormat::Env => "env",
        }
    }
}

/// Reads configuration files into a JSON value tree.
pub struct ConfigLoader {
    format: FileFormat,
}

impl ConfigLoader {
    pub fn new(format: FileFormat) -> Self {
        Self { format }
    }

    /// Pick the loader from the file name.
    pub fn auto(path: impl AsRef<Path>) -> Result<Self> {
        FileFormat::from_path(path.as_ref()).map(Self::new)
    }

    pub fn format(&self) -> FileFormat {
        self.format
    }

    pub fn load_file(&self, path: impl AsRef<Path>) -> Result<Value> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ConfigError::FileNotFound(path.to_path_buf()),
            _ => ConfigError::IoError(e),
        })?;

        self.parse(&content)
    }

    pub fn parse(&self, content: &str) -> Result<Value> {
        match self.format {
            FileFormat::Json => serde_json::from_str(content).map_err(|e| self.parse_error(e)),
            FileFormat::Toml => {
                let table: toml::Table = toml::from_str(content).map_err(|e| self.parse_error(e))?;
                serde_json::to_value(table).map_err(|e| self.parse_error(e))
            }
            FileFormat::Env => Ok(parse_env(content)),
        }
    }

    fn parse_error(&self, err: impl std::fmt::Display) -> ConfigError {
        ConfigError::ParseError {
            format: self.format.name(),
            message: err.to_string(),
        }
    }
}

fn parse_env(content: &str) -> Value {
    let mut map = serde_json::Map::new();

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let line = line.strip_prefix("export ").unwrap_or(line);
        if let Some((key, value)) = line.split_once('=') {
            let value = value.trim().trim_matches('"').trim_matches('\'');
            map.insert(key.trim().to_string(), Value::String(value.to_string()));
        }
    }

    Value::Object(map)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_json() {
        let loader = ConfigLoader::new(FileFormat::Json);
        let value = loader.parse(r#"{"siteName": "board", "port": 8080}"#).unwrap();
        assert_eq!(value["siteName"], "board");
        assert_eq!(value["port"], 8080);
    }

    #[test]
    fn test_parse_toml() {
        let loader = ConfigLoader::new(FileFormat::Toml);
        let value = loader
            .parse(
                r#"
                address = "127.0.0.1:8081"

                [frontend]
                siteName = "board"
                "#,
            )
            .unwrap();

        assert_eq!(value["address"], "127.0.0.1:8081");
        assert_eq!(value["frontend"]["siteName"], "board");
    }

    #[test]
    fn test_parse_env() {
        let loader = ConfigLoader::new(FileFormat::Env);
        let value = loader
            .parse(
                r#"
                # Comment
                ADDRESS=:8081
                export SITE_NAME="quoted value"
                "#,
            )
            .unwrap();

        assert_eq!(value["ADDRESS"], ":8081");
        assert_eq!(value["SITE_NAME"], "quoted value");
    }

    #[test]
    fn test_parse_errors_name_format() {
        let err = ConfigLoader::new(FileFormat::Toml).parse("= nope").unwrap_err();
        assert!(err.to_string().contains("TOML"));
    }

    #[test]
    fn test_format_detection() {
        assert_eq!(FileFormat::from_extension("JSON"), Some(FileFormat::Json));
        assert_eq!(FileFormat::from_path(Path::new("frontend.toml")).unwrap(), FileFormat::Toml);
        assert_eq!(FileFormat::from_path(Path::new("/etc/.env")).unwrap(), FileFormat::Env);
        assert!(FileFormat::from_path(Path::new("frontend.yaml")).is_err());
        assert!(FileFormat::from_path(Path::new("frontend")).is_err());
    }

    #[test]
    fn test_missing_file() {
        let err = ConfigLoader::new(FileFormat::Toml)
            .load_file("/definitely/not/here.toml")
            .unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound(_)));
    }
}
