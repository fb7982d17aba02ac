//! The per-request context handed to page renderers

use crate::config::RenderConfig;
use crate::error::PageError;
use crate::theme::Theme;
use board_core::cookie::{max_expiry, zero_expiry};
use board_core::{Cookie, HttpRequest, HttpResponse, HttpStatus, SameSite};
use board_log::debug;
use board_session::{
    Backend, Identity, SessionProxy, THEME_COOKIE, TOKEN_COOKIE, USERNAME_COOKIE,
};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

/// Headers every page response starts with.
const PAGE_HEADERS: [(&str, &str); 4] = [
    ("Content-Type", "text/html; charset=utf-8"),
    ("Cache-Control", "no-cache, no-store, must-revalidate, private, max-age=0"),
    ("Pragma", "no-cache"),
    ("Expires", "Thu, 01 Jan 1970 00:00:00 GMT"),
];

/// Everything a page renderer needs to know about the request it serves.
///
/// Owns the request's [`SessionProxy`] and the head of the response being
/// built. Nothing here is shared with another request.
pub struct Request {
    pub(crate) http: HttpRequest,
    pub(crate) config: Arc<RenderConfig>,
    pub(crate) username: String,
    pub(crate) session: SessionProxy,
    pub(crate) theme: Theme,
    pub(crate) head: HttpResponse,
    form: Option<HashMap<String, String>>,
    carried_username: bool,
    username_resolved: bool,
    username_cleared: bool,
}

/// Values every page template can use.
#[derive(Debug, Serialize)]
pub struct CommonContext<'a> {
    pub username: &'a str,
    pub site_name: &'a str,
    pub theme: Theme,
    pub themes: Vec<ThemeOption>,
}

/// One entry of the theme picker.
#[derive(Debug, Serialize)]
pub struct ThemeOption {
    pub name: &'static str,
    pub selected: bool,
}

impl Request {
    pub fn new(http: HttpRequest, config: Arc<RenderConfig>, backend: Arc<dyn Backend>) -> Self {
        let inbound = http.cookies();
        let username = inbound
            .iter()
            .find(|c| c.name == USERNAME_COOKIE)
            .map(|c| c.value.clone());
        let theme = Theme::from_cookie(
            inbound
                .iter()
                .find(|c| c.name == THEME_COOKIE)
                .map(|c| c.value.as_str()),
        );

        let mut head = HttpResponse::ok();
        for (name, value) in PAGE_HEADERS {
            head.headers.insert(name.to_string(), value.to_string());
        }
        head.headers.insert(
            "Link".to_string(),
            format!(
                "</static/components.css>; rel=preload; as=style, <{}>; rel=preload; as=style",
                theme.url()
            ),
        );

        Self {
            session: SessionProxy::new(backend, &inbound),
            carried_username: username.is_some(),
            username_resolved: username.is_some(),
            username: username.unwrap_or_default(),
            username_cleared: false,
            form: None,
            http,
            config,
            theme,
            head,
        }
    }

    /// Work out the display name of the caller.
    ///
    /// A `username` cookie is taken as is. Otherwise a non-empty token is
    /// looked up once through the backend, and on success the name is
    /// cached in a browser-session `username` cookie. Lookup failures are
    /// not errors: the name simply stays empty.
    pub async fn resolve_username(&mut self) -> &str {
        if self.username_resolved {
            return &self.username;
        }
        self.username_resolved = true;

        let has_token = self.session.token().is_some_and(|c| !c.value.is_empty());
        if has_token {
            match self.session.me().await {
                Ok(identity) => {
                    self.head
                        .set_cookie(Cookie::new(USERNAME_COOKIE, identity.username.as_str()).with_path("/"));
                    self.username = identity.username;
                }
                Err(err) => debug!("Could not resolve username: {}", err),
            }
        }

        &self.username
    }

    /// The display name; empty when nobody is signed in.
    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn http(&self) -> &HttpRequest {
        &self.http
    }

    pub fn session(&self) -> &SessionProxy {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut SessionProxy {
        &mut self.session
    }

    /// The signed-in user. Also refreshes the display name.
    pub async fn me(&mut self) -> Result<Identity, PageError> {
        let identity = self.session.me().await?;
        self.username = identity.username.clone();
        Ok(identity)
    }

    /// The cookie `name` as the client sent it.
    pub fn cookie(&self, name: &str) -> Option<Cookie> {
        self.http.cookie(name)
    }

    pub fn cookie_value(&self, name: &str) -> Option<String> {
        self.cookie(name).map(|c| c.value)
    }

    /// The token in effect for this request, including one issued by the
    /// backend since the request came in.
    pub fn token_cookie(&self) -> Option<&Cookie> {
        self.session.token()
    }

    pub fn referer(&self) -> Option<&str> {
        self.http.header("Referer").filter(|r| !r.is_empty())
    }

    /// A URL path parameter.
    pub fn param(&self, name: &str) -> Result<&str, PageError> {
        self.http
            .param(name)
            .map(String::as_str)
            .ok_or_else(|| PageError::MissingParam(name.to_string()))
    }

    /// A URL path parameter holding an integer ID.
    pub fn id_param(&self, name: &str) -> Result<i64, PageError> {
        let value = self.param(name)?;
        value.parse().map_err(|_| PageError::InvalidParam {
            name: name.to_string(),
            message: format!("{:?} is not a valid ID", value),
        })
    }

    /// A field of the url-encoded request body.
    pub fn form_value(&mut self, name: &str) -> Result<String, PageError> {
        if self.form.is_none() {
            self.form = Some(self.http.form()?);
        }

        self.form
            .as_ref()
            .and_then(|form| form.get(name))
            .cloned()
            .ok_or_else(|| PageError::MissingField(name.to_string()))
    }

    /// Set a preference cookie. An empty value deletes it.
    pub fn set_weak_cookie(&mut self, name: &str, value: &str) {
        let expires = if value.is_empty() {
            zero_expiry()
        } else {
            max_expiry()
        };

        self.head.cookies.retain(|c| c.name != name);
        self.head.set_cookie(
            Cookie::new(name, value)
                .with_path("/")
                .with_expires(expires)
                .with_same_site(SameSite::Lax),
        );
    }

    /// Flush the session cookies and answer with a redirect. The renderer
    /// should return [`crate::Render::empty`] afterwards.
    pub fn redirect(&mut self, location: &str, status: HttpStatus) {
        self.flush_cookies();
        self.head.status = status.code();
        self.head
            .headers
            .insert("Location".to_string(), location.to_string());
    }

    /// Set the response status without writing anything else.
    pub fn set_status(&mut self, status: u16) {
        self.head.status = status;
    }

    /// Move the cookies queued by the session into the response.
    ///
    /// Clearing the token also clears the `username` cookie, as does a
    /// rejected session on a request that had a username to show.
    /// Calling this again only writes what was queued since.
    pub fn flush_cookies(&mut self) {
        let cookies = self.session.drain_cookies();
        let token_cleared = cookies
            .iter()
            .rev()
            .find(|c| c.name == TOKEN_COOKIE)
            .is_some_and(|c| c.value.is_empty());

        for cookie in cookies {
            self.head.set_cookie(cookie);
        }

        let shows_username =
            self.carried_username || self.head.cookie(USERNAME_COOKIE).is_some();
        let stale = self.session.is_invalidated() && shows_username;

        if (token_cleared || stale) && !self.username_cleared {
            self.head.cookies.retain(|c| c.name != USERNAME_COOKIE);
            self.head.set_cookie(Cookie::removal(USERNAME_COOKIE));
            self.username.clear();
            self.username_cleared = true;
        }
    }

    /// Template values shared by every page.
    pub fn common(&self) -> CommonContext<'_> {
        CommonContext {
            username: &self.username,
            site_name: &self.config.site_name,
            theme: self.theme,
            themes: Theme::ALL
                .iter()
                .map(|theme| ThemeOption {
                    name: theme.as_str(),
                    selected: *theme == self.theme,
                })
                .collect(),
        }
    }

    pub(crate) fn into_response(self) -> HttpResponse {
        self.head
    }
}

impl std::fmt::Debug for Request {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Request")
            .field("method", &self.http.method)
            .field("path", &self.http.path)
            .field("username", &self.username)
            .field("theme", &self.theme)
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use board_session::SessionError;
    use board_session::testing::MockBackend;

    fn request(http: HttpRequest, backend: &MockBackend) -> Request {
        Request::new(http, Arc::new(RenderConfig::default()), Arc::new(backend.clone()))
    }

    #[tokio::test]
    async fn test_username_from_cookie_skips_backend() {
        let backend = MockBackend::new().with_user("alice", "t1");
        let http = HttpRequest::new("GET", "/")
            .with_cookie(TOKEN_COOKIE, "t1")
            .with_cookie(USERNAME_COOKIE, "alice");
        let mut req = request(http, &backend);

        assert_eq!(req.resolve_username().await, "alice");
        assert!(!backend.was_called("me"));
        assert!(req.head.cookies.is_empty());
    }

    #[tokio::test]
    async fn test_username_from_token_sets_session_cookie() {
        let backend = MockBackend::new().with_user("alice", "t1");
        let http = HttpRequest::new("GET", "/").with_cookie(TOKEN_COOKIE, "t1");
        let mut req = request(http, &backend);

        assert_eq!(req.resolve_username().await, "alice");
        assert_eq!(req.resolve_username().await, "alice");
        assert_eq!(backend.call_count("me"), 1);

        let cookie = req.head.cookie(USERNAME_COOKIE).unwrap();
        assert_eq!(cookie.value, "alice");
        assert_eq!(cookie.path.as_deref(), Some("/"));
        assert!(cookie.expires.is_none());
    }

    #[tokio::test]
    async fn test_username_lookup_failure_is_silent() {
        let backend = MockBackend::new()
            .with_error("me", SessionError::Connection("refused".to_string()));
        let http = HttpRequest::new("GET", "/").with_cookie(TOKEN_COOKIE, "t1");
        let mut req = request(http, &backend);

        assert_eq!(req.resolve_username().await, "");
        assert!(req.head.cookies.is_empty());
    }

    #[tokio::test]
    async fn test_empty_token_is_not_looked_up() {
        let backend = MockBackend::new();
        let http = HttpRequest::new("GET", "/").with_cookie(TOKEN_COOKIE, "");
        let mut req = request(http, &backend);

        assert_eq!(req.resolve_username().await, "");
        assert!(!backend.was_called("me"));
    }

    #[tokio::test]
    async fn test_sign_out_clears_username() {
        let backend = MockBackend::new().with_user("alice", "t1");
        let http = HttpRequest::new("POST", "/signout").with_cookie(TOKEN_COOKIE, "t1");
        let mut req = request(http, &backend);

        req.resolve_username().await;
        req.session_mut().sign_out().await.unwrap();
        req.flush_cookies();
        req.flush_cookies();

        assert!(req.head.cookie(TOKEN_COOKIE).unwrap().is_removal());
        assert!(req.head.cookie(USERNAME_COOKIE).unwrap().is_removal());
        let username_cookies = req
            .head
            .cookies
            .iter()
            .filter(|c| c.name == USERNAME_COOKIE)
            .count();
        assert_eq!(username_cookies, 1);
        assert_eq!(req.username(), "");
    }

    #[tokio::test]
    async fn test_rejected_session_clears_carried_username() {
        let backend = MockBackend::new();
        let http = HttpRequest::new("GET", "/settings")
            .with_cookie(TOKEN_COOKIE, "expired")
            .with_cookie(USERNAME_COOKIE, "alice");
        let mut req = request(http, &backend);

        assert!(req.me().await.is_err());
        req.flush_cookies();

        assert!(req.head.cookie(USERNAME_COOKIE).unwrap().is_removal());
    }

    #[test]
    fn test_weak_cookie_expiry() {
        let backend = MockBackend::new();
        let mut req = request(HttpRequest::new("POST", "/theme"), &backend);

        req.set_weak_cookie(THEME_COOKIE, "dark");
        let cookie = req.head.cookie(THEME_COOKIE).unwrap();
        assert_eq!(cookie.expires, Some(max_expiry()));
        assert_eq!(cookie.same_site, Some(SameSite::Lax));

        req.set_weak_cookie(THEME_COOKIE, "");
        assert_eq!(req.head.cookies.len(), 1);
        assert_eq!(req.head.cookie(THEME_COOKIE).unwrap().expires, Some(zero_expiry()));
    }

    #[test]
    fn test_accessors() {
        let backend = MockBackend::new();
        let mut http = HttpRequest::new("POST", "/sessions/12/delete")
            .with_header("Referer", "/settings")
            .with_body("password=hunter2");
        http.path_params.insert("sessionID".to_string(), "12".to_string());
        http.path_params.insert("bad".to_string(), "twelve".to_string());
        let mut req = request(http, &backend);

        assert_eq!(req.id_param("sessionID").unwrap(), 12);
        assert_eq!(req.id_param("bad").unwrap_err().status_code(), 400);
        assert!(matches!(req.param("missing"), Err(PageError::MissingParam(_))));
        assert_eq!(req.form_value("password").unwrap(), "hunter2");
        assert!(matches!(req.form_value("nope"), Err(PageError::MissingField(_))));
        assert_eq!(req.referer(), Some("/settings"));
    }

    #[test]
    fn test_redirect() {
        let backend = MockBackend::new();
        let mut req = request(HttpRequest::new("POST", "/"), &backend);
        req.redirect("/", HttpStatus::SeeOther);

        let res = req.into_response();
        assert_eq!(res.status, 303);
        assert_eq!(res.header("Location"), Some("/"));
    }

    #[test]
    fn test_theme_and_headers() {
        let backend = MockBackend::new();
        let http = HttpRequest::new("GET", "/").with_cookie(THEME_COOKIE, "dark");
        let req = request(http, &backend);

        assert_eq!(req.theme(), Theme::Dark);
        assert_eq!(req.head.header("content-type"), Some("text/html; charset=utf-8"));
        assert!(req.head.header("Link").unwrap().contains("/static/themes/dark.css"));
        assert!(req.common().themes.iter().any(|t| t.name == "dark" && t.selected));
    }
}
