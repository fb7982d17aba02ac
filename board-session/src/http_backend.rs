//! Backend reached over HTTP.

use crate::backend::{Backend, BackendResult, Failure, Reply};
use crate::error::{SessionError, SessionResult};
use crate::types::{Identity, Session, UserEditParams};
use async_trait::async_trait;
use board_core::{Cookie, cookie::to_cookie_header};
use board_log::debug;
use reqwest::header::{COOKIE, SET_COOKIE};
use reqwest::{Method, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use url::Url;

/// Default per-call timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Talks to the board backend's HTTP API.
///
/// Cheap to clone; clones share one connection pool.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(base_url: &str) -> SessionResult<Self> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> SessionResult<Self> {
        let parsed = Url::parse(base_url)?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(SessionError::Config(format!(
                "backend URL must be http or https, got {}",
                parsed.scheme()
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| SessionError::Config(e.to_string()))?;

        Ok(Self {
            client,
            base_url: parsed.as_str().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> SessionResult<Url> {
        Ok(Url::parse(&format!("{}{}", self.base_url, path))?)
    }

    /// Issue one call and return the cookies it set and the raw body. A
    /// failed call keeps the cookies of the error reply.
    async fn call(
        &self,
        method: Method,
        path: &str,
        credentials: &[Cookie],
        form: Option<&[(&str, &str)]>,
    ) -> Result<(Vec<Cookie>, Vec<u8>), Failure> {
        let mut request = self.client.request(method.clone(), self.url(path)?);

        if !credentials.is_empty() {
            request = request.header(COOKIE, to_cookie_header(credentials));
        }
        if let Some(form) = form {
            request = request.form(form);
        }

        let response = request.send().await?;
        let status = response.status();
        debug!("Backend {} {} answered {}", method, path, status.as_u16());

        let cookies: Vec<Cookie> = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .filter_map(Cookie::parse_set_cookie)
            .collect();

        let body = response.bytes().await?.to_vec();

        if status == StatusCode::UNAUTHORIZED {
            let error = SessionError::Unauthenticated(error_message(status, &body));
            return Err(Failure::with_cookies(error, cookies));
        }
        if !status.is_success() {
            let error = SessionError::Response {
                status: status.as_u16(),
                message: error_message(status, &body),
            };
            return Err(Failure::with_cookies(error, cookies));
        }

        Ok((cookies, body))
    }

    async fn call_json<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        credentials: &[Cookie],
        form: Option<&[(&str, &str)]>,
    ) -> BackendResult<T> {
        let (cookies, body) = self.call(method, path, credentials, form).await?;
        match serde_json::from_slice(&body) {
            Ok(value) => Ok(Reply { value, cookies }),
            Err(e) => {
                let error = SessionError::InvalidResponse(format!("{}: {}", path, e));
                Err(Failure::with_cookies(error, cookies))
            }
        }
    }

    async fn call_empty(
        &self,
        method: Method,
        path: &str,
        credentials: &[Cookie],
        form: Option<&[(&str, &str)]>,
    ) -> BackendResult<()> {
        let (cookies, _) = self.call(method, path, credentials, form).await?;
        Ok(Reply { value: (), cookies })
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// Prefer the backend's `{"error": ...}` message, then the raw body, then
/// the status reason.
fn error_message(status: StatusCode, body: &[u8]) -> String {
    if let Ok(parsed) = serde_json::from_slice::<ErrorBody>(body) {
        return parsed.error;
    }

    let text = String::from_utf8_lossy(body).trim().to_string();
    if !text.is_empty() {
        return text;
    }

    status.canonical_reason().unwrap_or("unknown error").to_string()
}

#[async_trait]
impl Backend for HttpBackend {
    async fn me(&self, credentials: &[Cookie]) -> BackendResult<Identity> {
        self.call_json(Method::GET, "/users/@me", credentials, None).await
    }

    async fn sessions(&self, credentials: &[Cookie]) -> BackendResult<Vec<Session>> {
        self.call_json(Method::GET, "/users/@me/sessions", credentials, None)
            .await
    }

    async fn edit_me(
        &self,
        credentials: &[Cookie],
        params: &UserEditParams,
    ) -> BackendResult<Identity> {
        let mut form = Vec::new();
        if let Some(ref password) = params.password {
            form.push(("password", password.as_str()));
        }

        self.call_json(Method::PATCH, "/users/@me", credentials, Some(&form[..]))
            .await
    }

    async fn delete_me(&self, credentials: &[Cookie]) -> BackendResult<()> {
        self.call_empty(Method::DELETE, "/users/@me", credentials, None)
            .await
    }

    async fn delete_session(&self, credentials: &[Cookie], id: i64) -> BackendResult<()> {
        let path = format!("/users/@me/sessions/{}", id);
        self.call_empty(Method::DELETE, &path, credentials, None).await
    }

    async fn sign_in(
        &self,
        credentials: &[Cookie],
        username: &str,
        password: &str,
    ) -> BackendResult<Session> {
        let form = [("username", username), ("password", password)];
        self.call_json(Method::POST, "/signin", credentials, Some(&form[..]))
            .await
    }

    async fn sign_up(
        &self,
        credentials: &[Cookie],
        username: &str,
        password: &str,
        token: &str,
    ) -> BackendResult<Session> {
        let form = [("username", username), ("password", password), ("token", token)];
        self.call_json(Method::POST, "/signup", credentials, Some(&form[..]))
            .await
    }

    async fn sign_out(&self, credentials: &[Cookie]) -> BackendResult<()> {
        self.call_empty(Method::POST, "/signout", credentials, None)
            .await
    }
}
