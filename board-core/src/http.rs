// HTTP request and response types

use crate::cookie::{self, Cookie};
use crate::{Error, HttpStatus};
use std::collections::HashMap;

/// HTTP request wrapper
///
/// Header names are stored lowercase; use [`HttpRequest::header`] for
/// case-insensitive lookups.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: String,
    pub path: String,
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
    pub path_params: HashMap<String, String>,
    pub query_params: HashMap<String, String>,
}

impl HttpRequest {
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            headers: HashMap::new(),
            body: Vec::new(),
            path_params: HashMap::new(),
            query_params: HashMap::new(),
        }
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Append a cookie to the `Cookie` header.
    pub fn with_cookie(mut self, name: &str, value: &str) -> Self {
        let pair = format!("{}={}", name, value);
        self.headers
            .entry("cookie".to_string())
            .and_modify(|existing| {
                existing.push_str("; ");
                existing.push_str(&pair);
            })
            .or_insert(pair);
        self
    }

    /// Get a header value by case-insensitive name
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Get a path parameter by name
    pub fn param(&self, name: &str) -> Option<&String> {
        self.path_params.get(name)
    }

    /// Get a query parameter by name
    pub fn query(&self, name: &str) -> Option<&String> {
        self.query_params.get(name)
    }

    /// All cookies sent with the request, in header order.
    pub fn cookies(&self) -> Vec<Cookie> {
        self.header("cookie")
            .map(cookie::parse_cookie_header)
            .unwrap_or_default()
    }

    /// The first cookie with the given name.
    pub fn cookie(&self, name: &str) -> Option<Cookie> {
        self.cookies().into_iter().find(|c| c.name == name)
    }

    /// Decode an `application/x-www-form-urlencoded` body.
    pub fn form(&self) -> Result<HashMap<String, String>, Error> {
        crate::form::parse_form_map(&self.body)
    }
}

/// HTTP response wrapper
///
/// `Set-Cookie` headers are kept apart from `headers` since a response may
/// carry any number of them.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub cookies: Vec<Cookie>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            cookies: Vec::new(),
            body: Vec::new(),
        }
    }

    pub fn ok() -> Self {
        Self::new(HttpStatus::Ok.code())
    }

    pub fn not_found() -> Self {
        Self::new(HttpStatus::NotFound.code())
    }

    pub fn internal_server_error() -> Self {
        Self::new(HttpStatus::InternalServerError.code())
    }

    /// HTML response with the UTF-8 content type.
    pub fn html(body: impl Into<String>) -> Self {
        Self::ok()
            .content_type("text/html; charset=utf-8")
            .with_body(body.into().into_bytes())
    }

    /// Plain text response.
    pub fn text(body: impl Into<String>) -> Self {
        Self::ok()
            .content_type("text/plain; charset=utf-8")
            .with_body(body.into().into_bytes())
    }

    /// Redirect with an explicit status code.
    pub fn redirect_with(location: impl Into<String>, status: HttpStatus) -> Self {
        Self::new(status.code()).with_header("Location".to_string(), location.into())
    }

    /// 303 See Other, the conventional answer to a form post.
    pub fn see_other(location: impl Into<String>) -> Self {
        Self::redirect_with(location, HttpStatus::SeeOther)
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    pub fn with_body(mut self, body: Vec<u8>) -> Self {
        self.body = body;
        self
    }

    pub fn with_header(mut self, key: String, value: String) -> Self {
        self.headers.insert(key, value);
        self
    }

    pub fn content_type(self, value: &str) -> Self {
        self.with_header("Content-Type".to_string(), value.to_string())
    }

    pub fn cache_control(self, value: &str) -> Self {
        self.with_header("Cache-Control".to_string(), value.to_string())
    }

    /// Queue a `Set-Cookie` header.
    pub fn set_cookie(&mut self, cookie: Cookie) {
        self.cookies.push(cookie);
    }

    /// Get a header value by case-insensitive name
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// The last `Set-Cookie` issued for `name`, which is the one a client keeps.
    pub fn cookie(&self, name: &str) -> Option<&Cookie> {
        self.cookies.iter().rev().find(|c| c.name == name)
    }

    pub fn body_string(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_header_case_insensitive() {
        let req = HttpRequest::new("GET", "/").with_header("Referer", "/settings");
        assert_eq!(req.header("referer"), Some("/settings"));
        assert_eq!(req.header("REFERER"), Some("/settings"));
    }

    #[test]
    fn test_request_cookies() {
        let req = HttpRequest::new("GET", "/")
            .with_cookie("token", "abc")
            .with_cookie("theme", "dark");

        assert_eq!(req.cookies().len(), 2);
        assert_eq!(req.cookie("theme").map(|c| c.value), Some("dark".to_string()));
        assert!(req.cookie("username").is_none());
    }

    #[test]
    fn test_request_form() {
        let req = HttpRequest::new("POST", "/theme").with_body("theme=dark&x=%2F");
        let form = req.form().unwrap();
        assert_eq!(form.get("theme"), Some(&"dark".to_string()));
        assert_eq!(form.get("x"), Some(&"/".to_string()));
    }

    #[test]
    fn test_html_response() {
        let res = HttpResponse::html("<p>hi</p>");
        assert_eq!(res.status, 200);
        assert_eq!(res.header("content-type"), Some("text/html; charset=utf-8"));
        assert_eq!(res.body_string(), "<p>hi</p>");
    }

    #[test]
    fn test_see_other() {
        let res = HttpResponse::see_other("/");
        assert_eq!(res.status, 303);
        assert_eq!(res.header("Location"), Some("/"));
    }

    #[test]
    fn test_last_cookie_wins() {
        let mut res = HttpResponse::ok();
        res.set_cookie(Cookie::new("username", "alice"));
        res.set_cookie(Cookie::removal("username"));
        assert!(res.cookie("username").unwrap().is_removal());
    }
}
