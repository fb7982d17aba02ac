//! Component stylesheets and their aggregation into `components.css`

use crate::Result;
use std::borrow::Cow;
use std::collections::HashSet;
use std::path::Path;

/// A stylesheet identified by its source path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Style {
    pub path: String,
    pub content: Cow<'static, str>,
}

impl Style {
    /// A stylesheet compiled into the binary, usually through `include_str!`.
    pub fn embedded(path: &str, content: &'static str) -> Self {
        Self {
            path: path.to_string(),
            content: Cow::Borrowed(content),
        }
    }

    /// Read a stylesheet from disk.
    pub fn file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        Ok(Self {
            path: path.to_string_lossy().replace('\\', "/"),
            content: Cow::Owned(content),
        })
    }
}

/// Stylesheets in registration order, at most one per path.
#[derive(Debug, Clone, Default)]
pub struct StyleRegistry {
    styles: Vec<Style>,
    seen: HashSet<String>,
}

impl StyleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a stylesheet. Returns false if its path was already registered.
    pub fn register(&mut self, style: Style) -> bool {
        if !self.seen.insert(style.path.clone()) {
            return false;
        }
        self.styles.push(style);
        true
    }

    pub fn len(&self) -> usize {
        self.styles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.styles.is_empty()
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.styles.iter().map(|s| s.path.as_str())
    }

    /// Every stylesheet concatenated in registration order.
    pub fn css(&self) -> String {
        let mut out = String::new();
        for style in &self.styles {
            out.push_str("/* ");
            out.push_str(&style.path);
            out.push_str(" */\n");
            out.push_str(&style.content);
            if !style.content.ends_with('\n') {
                out.push('\n');
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_registration_order_and_dedup() {
        let mut registry = StyleRegistry::new();
        assert!(registry.register(Style::embedded("a.css", ".a {}")));
        assert!(registry.register(Style::embedded("b.css", ".b {}")));
        assert!(!registry.register(Style::embedded("a.css", ".a { changed }")));

        let css = registry.css();
        assert_eq!(registry.len(), 2);
        assert!(css.find(".a {}").unwrap() < css.find(".b {}").unwrap());
        assert!(!css.contains("changed"));
    }

    #[test]
    fn test_style_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nav.css");
        std::fs::write(&path, "nav { display: flex; }").unwrap();

        let style = Style::file(&path).unwrap();
        assert_eq!(style.content, "nav { display: flex; }");
        assert!(Style::file(dir.path().join("missing.css")).is_err());
    }
}
