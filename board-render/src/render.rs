//! The value a page handler produces

use serde::Serialize;

/// A rendered page: metadata for the layout plus the body fragment.
///
/// `body` is trusted HTML and is written into the layout unescaped. The
/// empty render means "nothing to write", typically after a redirect.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Render {
    /// og:title and `<title>`
    pub title: String,
    /// og:description
    pub description: String,
    /// og:image
    pub image_url: String,
    pub body: String,
}

impl Render {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn new(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            ..Self::default()
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_image_url(mut self, image_url: impl Into<String>) -> Self {
        self.image_url = image_url.into();
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty() {
        assert!(Render::empty().is_empty());
        assert!(!Render::new("<p>hi</p>").is_empty());
        assert!(!Render::empty().with_title("Settings").is_empty());
    }
}
