//! Static asset serving with configurable caching.
//!
//! Read-only and safe to share between requests: the server holds nothing
//! but its configuration, and every request reads straight from disk.

use crate::{Error, HttpRequest, HttpResponse};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

/// Cache strategy for static assets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStrategy {
    /// No caching (Cache-Control: no-cache, no-store)
    NoCache,

    /// Public cache with max-age (Cache-Control: public, max-age=N)
    Public(Duration),

    /// Immutable assets (Cache-Control: public, max-age=31536000, immutable)
    Immutable,
}

impl CacheStrategy {
    /// Convert strategy to Cache-Control header value
    pub fn to_header_value(&self) -> String {
        match self {
            CacheStrategy::NoCache => "no-cache, no-store, must-revalidate".to_string(),
            CacheStrategy::Public(duration) => {
                format!("public, max-age={}", duration.as_secs())
            }
            CacheStrategy::Immutable => "public, max-age=31536000, immutable".to_string(),
        }
    }
}

/// File type classification for cache policies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileType {
    JavaScript,
    Stylesheet,
    Image,
    Font,
    Html,
    Other,
}

impl FileType {
    /// Detect file type from path extension
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("js") | Some("mjs") => FileType::JavaScript,
            Some("css") => FileType::Stylesheet,
            Some("png") | Some("jpg") | Some("jpeg") | Some("gif") | Some("svg")
            | Some("webp") | Some("avif") | Some("ico") => FileType::Image,
            Some("woff") | Some("woff2") | Some("ttf") | Some("otf") => FileType::Font,
            Some("html") | Some("htm") => FileType::Html,
            _ => FileType::Other,
        }
    }

    /// Get MIME type for file type
    pub fn mime_type(&self, path: &Path) -> &'static str {
        let ext = path.extension().and_then(|ext| ext.to_str());
        match self {
            FileType::JavaScript => "application/javascript",
            FileType::Stylesheet => "text/css; charset=utf-8",
            FileType::Image => match ext {
                Some("png") => "image/png",
                Some("jpg") | Some("jpeg") => "image/jpeg",
                Some("gif") => "image/gif",
                Some("svg") => "image/svg+xml",
                Some("webp") => "image/webp",
                Some("avif") => "image/avif",
                Some("ico") => "image/x-icon",
                _ => "application/octet-stream",
            },
            FileType::Font => match ext {
                Some("woff") => "font/woff",
                Some("woff2") => "font/woff2",
                Some("ttf") => "font/ttf",
                Some("otf") => "font/otf",
                _ => "application/octet-stream",
            },
            FileType::Html => "text/html; charset=utf-8",
            FileType::Other => "application/octet-stream",
        }
    }
}

/// Configuration for static asset serving
#[derive(Debug, Clone)]
pub struct StaticAssetsConfig {
    /// Root directory for static files
    pub root_dir: PathBuf,

    /// Default cache strategy
    pub default_strategy: CacheStrategy,

    /// File type-specific cache strategies
    pub type_strategies: HashMap<FileType, CacheStrategy>,

    /// Enable ETag generation and validation
    pub enable_etag: bool,
}

impl StaticAssetsConfig {
    /// Create a new configuration with root directory
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        let mut type_strategies = HashMap::new();
        type_strategies.insert(FileType::JavaScript, CacheStrategy::Public(Duration::from_secs(3600)));
        type_strategies.insert(FileType::Stylesheet, CacheStrategy::Public(Duration::from_secs(3600)));
        type_strategies.insert(FileType::Image, CacheStrategy::Public(Duration::from_secs(86400)));
        type_strategies.insert(FileType::Font, CacheStrategy::Immutable);
        type_strategies.insert(FileType::Html, CacheStrategy::NoCache);

        Self {
            root_dir: root_dir.into(),
            default_strategy: CacheStrategy::Public(Duration::from_secs(3600)),
            type_strategies,
            enable_etag: true,
        }
    }

    /// Set default cache strategy
    pub fn with_default_strategy(mut self, strategy: CacheStrategy) -> Self {
        self.default_strategy = strategy;
        self
    }

    /// Enable/disable ETag support
    pub fn with_etag(mut self, enable: bool) -> Self {
        self.enable_etag = enable;
        self
    }

    /// Configure for development (no caching)
    pub fn development(self) -> Self {
        let mut config = self.with_default_strategy(CacheStrategy::NoCache).with_etag(false);
        config.type_strategies.clear();
        config
    }
}

/// Static asset server
#[derive(Debug, Clone)]
pub struct StaticAssetServer {
    config: StaticAssetsConfig,
}

impl StaticAssetServer {
    /// Create a new static asset server
    pub fn new(config: StaticAssetsConfig) -> Result<Self, Error> {
        if !config.root_dir.is_dir() {
            return Err(Error::Internal(format!(
                "Static assets directory not found: {:?}",
                config.root_dir
            )));
        }

        Ok(Self { config })
    }

    pub fn root_dir(&self) -> &Path {
        &self.config.root_dir
    }

    /// Serve the file at `relative_path` under the root directory.
    pub async fn serve(&self, relative_path: &str, req: &HttpRequest) -> Result<HttpResponse, Error> {
        let path = self.resolve_path(relative_path)?;

        if !path.is_file() {
            return Err(Error::NotFound(format!("File not found: {}", relative_path)));
        }

        let metadata = tokio::fs::metadata(&path)
            .await
            .map_err(|e| Error::Internal(format!("Failed to read file metadata: {}", e)))?;

        let etag = self
            .config
            .enable_etag
            .then(|| generate_etag(&path, &metadata));

        if let Some(ref etag_value) = etag
            && req.header("If-None-Match") == Some(etag_value.as_str())
        {
            return Ok(HttpResponse::new(304).with_header("ETag".to_string(), etag_value.clone()));
        }

        let content = tokio::fs::read(&path)
            .await
            .map_err(|e| Error::Internal(format!("Failed to read file: {}", e)))?;

        let file_type = FileType::from_path(&path);
        let cache_strategy = self
            .config
            .type_strategies
            .get(&file_type)
            .copied()
            .unwrap_or(self.config.default_strategy);

        let mut response = HttpResponse::ok()
            .content_type(file_type.mime_type(&path))
            .cache_control(&cache_strategy.to_header_value())
            .with_body(content);

        if let Some(etag_value) = etag {
            response.headers.insert("ETag".to_string(), etag_value);
        }

        if let Ok(modified) = metadata.modified() {
            response
                .headers
                .insert("Last-Modified".to_string(), httpdate::fmt_http_date(modified));
        }

        Ok(response)
    }

    /// Resolve a request path to a file system path inside the root.
    fn resolve_path(&self, request_path: &str) -> Result<PathBuf, Error> {
        let clean_path = request_path
            .trim_start_matches('/')
            .split('?')
            .next()
            .unwrap_or("");

        let full_path = self.config.root_dir.join(clean_path);

        let canonical_root = self
            .config
            .root_dir
            .canonicalize()
            .map_err(|_| Error::Internal("Failed to canonicalize root directory".to_string()))?;

        let canonical_path = full_path
            .canonicalize()
            .map_err(|_| Error::NotFound(format!("File not found: {}", request_path)))?;

        if !canonical_path.starts_with(&canonical_root) {
            return Err(Error::Forbidden("Access denied: path traversal attempt".to_string()));
        }

        Ok(canonical_path)
    }
}

/// Generate ETag for a file
fn generate_etag(path: &Path, metadata: &std::fs::Metadata) -> String {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    let mut hasher = DefaultHasher::new();
    path.to_string_lossy().hash(&mut hasher);
    metadata.len().hash(&mut hasher);

    if let Ok(modified) = metadata.modified()
        && let Ok(duration) = modified.duration_since(SystemTime::UNIX_EPOCH)
    {
        duration.as_secs().hash(&mut hasher);
    }

    format!("\"{:x}\"", hasher.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn create_assets() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("themes")).unwrap();
        fs::write(dir.path().join("themes/dark.css"), "body { background: #000; }").unwrap();
        fs::write(dir.path().join("logo.svg"), "<svg/>").unwrap();
        dir
    }

    #[test]
    fn test_cache_strategy_headers() {
        assert_eq!(
            CacheStrategy::NoCache.to_header_value(),
            "no-cache, no-store, must-revalidate"
        );
        assert_eq!(
            CacheStrategy::Public(Duration::from_secs(3600)).to_header_value(),
            "public, max-age=3600"
        );
    }

    #[test]
    fn test_file_type_detection() {
        assert_eq!(FileType::from_path(Path::new("a.css")), FileType::Stylesheet);
        assert_eq!(FileType::from_path(Path::new("a.woff2")), FileType::Font);
        assert_eq!(FileType::from_path(Path::new("a.bin")), FileType::Other);
    }

    #[test]
    fn test_missing_root_is_rejected() {
        assert!(StaticAssetServer::new(StaticAssetsConfig::new("/definitely/not/here")).is_err());
    }

    #[tokio::test]
    async fn test_serve_file() {
        let dir = create_assets();
        let server = StaticAssetServer::new(StaticAssetsConfig::new(dir.path())).unwrap();

        let res = server
            .serve("themes/dark.css", &HttpRequest::new("GET", "/static/themes/dark.css"))
            .await
            .unwrap();

        assert_eq!(res.status, 200);
        assert_eq!(res.header("Content-Type"), Some("text/css; charset=utf-8"));
        assert_eq!(res.body_string(), "body { background: #000; }");
        assert!(res.header("ETag").is_some());
    }

    #[tokio::test]
    async fn test_serve_not_modified() {
        let dir = create_assets();
        let server = StaticAssetServer::new(StaticAssetsConfig::new(dir.path())).unwrap();
        let req = HttpRequest::new("GET", "/static/logo.svg");

        let first = server.serve("logo.svg", &req).await.unwrap();
        let etag = first.header("ETag").unwrap().to_string();

        let req = req.with_header("If-None-Match", etag);
        let second = server.serve("logo.svg", &req).await.unwrap();
        assert_eq!(second.status, 304);
        assert!(second.body.is_empty());
    }

    #[tokio::test]
    async fn test_serve_rejects_traversal_and_missing() {
        let dir = create_assets();
        let server = StaticAssetServer::new(StaticAssetsConfig::new(dir.path().join("themes"))).unwrap();
        let req = HttpRequest::new("GET", "/");

        let err = server.serve("../logo.svg", &req).await.unwrap_err();
        assert_eq!(err.status_code(), 403);

        let err = server.serve("missing.css", &req).await.unwrap_err();
        assert_eq!(err.status_code(), 404);
    }
}
