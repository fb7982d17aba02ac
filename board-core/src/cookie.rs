//! Cookies as they travel in `Cookie` request headers and `Set-Cookie`
//! response headers.
//!
//! A cookie whose value is empty and whose expiry lies in the past is the
//! canonical "delete this cookie" instruction; see [`Cookie::removal`].
//!
//! Values are held decoded. On the wire, bytes outside the RFC 6265
//! cookie-octet set (and `%`) are percent-encoded.

use std::borrow::Cow;
use std::fmt;
use std::time::{Duration, SystemTime};

/// Latest expiry handed out for long-lived cookies (2038-01-19T03:14:07Z).
pub fn max_expiry() -> SystemTime {
    SystemTime::UNIX_EPOCH + Duration::from_secs(i32::MAX as u64)
}

/// Expiry used to delete a cookie (the Unix epoch).
pub fn zero_expiry() -> SystemTime {
    SystemTime::UNIX_EPOCH
}

/// Cookie SameSite attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SameSite {
    Strict,
    Lax,
    None,
}

impl SameSite {
    pub fn as_str(&self) -> &'static str {
        match self {
            SameSite::Strict => "Strict",
            SameSite::Lax => "Lax",
            SameSite::None => "None",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "strict" => Some(SameSite::Strict),
            "lax" => Some(SameSite::Lax),
            "none" => Some(SameSite::None),
            _ => None,
        }
    }
}

/// An HTTP cookie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    pub path: Option<String>,
    pub domain: Option<String>,
    /// `None` makes this a session cookie that expires with the browser.
    pub expires: Option<SystemTime>,
    pub max_age: Option<i64>,
    pub secure: bool,
    pub http_only: bool,
    pub same_site: Option<SameSite>,
}

impl Cookie {
    /// Create a session cookie with no attributes.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            path: None,
            domain: None,
            expires: None,
            max_age: None,
            secure: false,
            http_only: false,
            same_site: None,
        }
    }

    /// A cookie that instructs the client to drop `name` immediately.
    pub fn removal(name: impl Into<String>) -> Self {
        Self::new(name, "").with_path("/").with_expires(zero_expiry())
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    pub fn with_expires(mut self, expires: SystemTime) -> Self {
        self.expires = Some(expires);
        self
    }

    pub fn with_max_age(mut self, seconds: i64) -> Self {
        self.max_age = Some(seconds);
        self
    }

    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    pub fn with_http_only(mut self, http_only: bool) -> Self {
        self.http_only = http_only;
        self
    }

    pub fn with_same_site(mut self, same_site: SameSite) -> Self {
        self.same_site = Some(same_site);
        self
    }

    /// Whether this cookie deletes its name on the client: an empty value,
    /// a non-positive max-age, or an expiry in the past.
    pub fn is_removal(&self) -> bool {
        if self.value.is_empty() {
            return true;
        }
        if matches!(self.max_age, Some(age) if age <= 0) {
            return true;
        }
        matches!(self.expires, Some(at) if at <= SystemTime::now())
    }

    /// Render as the value of a `Set-Cookie` header.
    pub fn to_header_value(&self) -> String {
        let mut out = format!("{}={}", self.name, encode_value(&self.value));

        if let Some(ref path) = self.path {
            out.push_str("; Path=");
            out.push_str(path);
        }
        if let Some(ref domain) = self.domain {
            out.push_str("; Domain=");
            out.push_str(domain);
        }
        if let Some(expires) = self.expires {
            out.push_str("; Expires=");
            out.push_str(&httpdate::fmt_http_date(expires));
        }
        if let Some(max_age) = self.max_age {
            out.push_str(&format!("; Max-Age={}", max_age.max(0)));
        }
        if self.http_only {
            out.push_str("; HttpOnly");
        }
        if self.secure {
            out.push_str("; Secure");
        }
        if let Some(same_site) = self.same_site {
            out.push_str("; SameSite=");
            out.push_str(same_site.as_str());
        }

        out
    }

    /// Parse the value of a `Set-Cookie` header. Unknown attributes are
    /// ignored; a header without a `name=value` pair yields `None`.
    pub fn parse_set_cookie(header: &str) -> Option<Self> {
        let mut parts = header.split(';');
        let (name, value) = parts.next()?.split_once('=')?;
        let name = name.trim();
        if name.is_empty() {
            return None;
        }

        let mut cookie = Cookie::new(name, decode_value(value));

        for attr in parts {
            let (key, val) = match attr.split_once('=') {
                Some((k, v)) => (k.trim(), v.trim()),
                None => (attr.trim(), ""),
            };

            match key.to_ascii_lowercase().as_str() {
                "path" => cookie.path = Some(val.to_string()),
                "domain" => cookie.domain = Some(val.to_string()),
                "expires" => cookie.expires = httpdate::parse_http_date(val).ok(),
                "max-age" => cookie.max_age = val.parse().ok(),
                "secure" => cookie.secure = true,
                "httponly" => cookie.http_only = true,
                "samesite" => cookie.same_site = SameSite::parse(val),
                _ => {}
            }
        }

        Some(cookie)
    }
}

impl fmt::Display for Cookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_header_value())
    }
}

/// Parse a `Cookie` request header into name/value pairs, in order.
/// Request cookies carry nothing but their value.
pub fn parse_cookie_header(header: &str) -> Vec<Cookie> {
    header
        .split(';')
        .filter_map(|pair| {
            let (name, value) = pair.split_once('=')?;
            let name = name.trim();
            if name.is_empty() {
                return None;
            }
            Some(Cookie::new(name, decode_value(value)))
        })
        .collect()
}

/// Render cookies as a `Cookie` request header value.
pub fn to_cookie_header<'a>(cookies: impl IntoIterator<Item = &'a Cookie>) -> String {
    cookies
        .into_iter()
        .map(|c| format!("{}={}", c.name, encode_value(&c.value)))
        .collect::<Vec<_>>()
        .join("; ")
}

fn is_cookie_octet(byte: u8) -> bool {
    matches!(byte, 0x21 | 0x23..=0x24 | 0x26..=0x2B | 0x2D..=0x3A | 0x3C..=0x5B | 0x5D..=0x7E)
}

fn encode_value(value: &str) -> Cow<'_, str> {
    if value.bytes().all(is_cookie_octet) {
        return Cow::Borrowed(value);
    }

    let mut out = String::with_capacity(value.len() + 8);
    for byte in value.bytes() {
        if is_cookie_octet(byte) {
            out.push(byte as char);
        } else {
            out.push_str(&format!("%{:02X}", byte));
        }
    }
    Cow::Owned(out)
}

/// Malformed escapes are kept as sent.
fn decode_value(raw: &str) -> String {
    let raw = raw.trim().trim_matches('"');
    urlencoding::decode(raw)
        .map(Cow::into_owned)
        .unwrap_or_else(|_| raw.to_string())
}
