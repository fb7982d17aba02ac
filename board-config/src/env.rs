// Environment variable loading

use crate::{ConfigError, Result};
use std::collections::HashMap;
use std::env;

/// Reads `PREFIX_NAME` variables, either from the process environment or
/// from a fixed set of variables handed in up front.
#[derive(Debug, Clone, Default)]
pub struct EnvLoader {
    prefix: Option<String>,
    vars: Option<HashMap<String, String>>,
}

impl EnvLoader {
    pub fn new(prefix: Option<String>) -> Self {
        Self { prefix, vars: None }
    }

    /// Read from `vars` instead of the process environment.
    pub fn from_vars<I, K, V>(prefix: Option<String>, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            prefix,
            vars: Some(vars.into_iter().map(|(k, v)| (k.into(), v.into())).collect()),
        }
    }

    /// Every variable under the prefix, keyed by the lowercased name with
    /// the prefix removed.
    pub fn load(&self) -> HashMap<String, String> {
        let vars: Box<dyn Iterator<Item = (String, String)>> = match self.vars {
            Some(ref vars) => Box::new(vars.clone().into_iter()),
            None => Box::new(env::vars()),
        };

        vars.filter_map(|(key, value)| match self.prefix {
            Some(ref prefix) => key
                .strip_prefix(prefix.as_str())
                .and_then(|rest| rest.strip_prefix('_'))
                .map(|rest| (rest.to_lowercase(), value)),
            None => Some((key.to_lowercase(), value)),
        })
        .collect()
    }

    /// The full variable name for `key`: `PREFIX_KEY`.
    pub fn var_name(&self, key: &str) -> String {
        match self.prefix {
            Some(ref prefix) => format!("{}_{}", prefix, key.to_uppercase()),
            None => key.to_uppercase(),
        }
    }

    pub fn load_var(&self, key: &str) -> Result<String> {
        let name = self.var_name(key);
        match self.vars {
            Some(ref vars) => vars
                .get(&name)
                .cloned()
                .ok_or(ConfigError::EnvError(env::VarError::NotPresent)),
            None => env::var(&name).map_err(ConfigError::EnvError),
        }
    }

    pub fn load_var_or(&self, key: &str, default: &str) -> String {
        self.load_var(key).unwrap_or_else(|_| default.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loader() -> EnvLoader {
        EnvLoader::from_vars(
            Some("BOARD".to_string()),
            [
                ("BOARD_SITE_NAME", "board"),
                ("BOARD_ADDRESS", ":8081"),
                ("BOARDING", "no"),
                ("HOME", "/root"),
            ],
        )
    }

    #[test]
    fn test_load_strips_prefix() {
        let vars = loader().load();
        assert_eq!(vars.len(), 2);
        assert_eq!(vars.get("site_name"), Some(&"board".to_string()));
        assert_eq!(vars.get("address"), Some(&":8081".to_string()));
    }

    #[test]
    fn test_load_var() {
        let loader = loader();
        assert_eq!(loader.var_name("site_name"), "BOARD_SITE_NAME");
        assert_eq!(loader.load_var("site_name").unwrap(), "board");
        assert!(loader.load_var("backend").is_err());
        assert_eq!(loader.load_var_or("backend", "http://localhost"), "http://localhost");
    }

    #[test]
    fn test_process_env_missing_var() {
        let loader = EnvLoader::new(Some("BOARD_TEST".to_string()));
        assert!(loader.load_var("MISSING_VAR_67890").is_err());
    }
}
