// Configuration validation

use crate::{ConfigError, Result};

/// Implemented by configuration structs that have rules beyond their types.
pub trait Validate {
    fn validate(&self) -> Result<()>;
}

/// Reusable validation rules
pub struct ConfigValidator;

impl ConfigValidator {
    pub fn not_empty(value: &str, field: &str) -> Result<()> {
        if value.trim().is_empty() {
            return Err(ConfigError::invalid(field, "cannot be empty"));
        }
        Ok(())
    }

    pub fn one_of<T: PartialEq>(value: &T, allowed: &[T], field: &str) -> Result<()> {
        if !allowed.contains(value) {
            return Err(ConfigError::invalid(field, "must be one of the allowed values"));
        }
        Ok(())
    }

    /// An absolute http or https URL with a host.
    pub fn is_url(value: &str, field: &str) -> Result<()> {
        let rest = value
            .strip_prefix("http://")
            .or_else(|| value.strip_prefix("https://"))
            .ok_or_else(|| ConfigError::invalid(field, "must be an http or https URL"))?;

        if rest.split('/').next().unwrap_or("").is_empty() {
            return Err(ConfigError::invalid(field, "URL has no host"));
        }
        Ok(())
    }

    /// A listen address: `host:port` or `:port`.
    pub fn is_listen_address(value: &str, field: &str) -> Result<()> {
        let (_, port) = value
            .rsplit_once(':')
            .ok_or_else(|| ConfigError::invalid(field, "must be host:port"))?;

        match port.parse::<u16>() {
            Ok(0) | Err(_) => Err(ConfigError::invalid(field, "must end in a valid port number")),
            Ok(_) => Ok(()),
        }
    }
}
