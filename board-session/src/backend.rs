//! The backend collaborator the session proxy talks to.

use crate::error::SessionError;
use crate::types::{Identity, Session, UserEditParams};
use async_trait::async_trait;
use board_core::Cookie;
use thiserror::Error;

/// Result of one backend call.
pub type BackendResult<T> = Result<Reply<T>, Failure>;

/// A successful backend reply: the value plus any cookies the backend
/// wants set on the client.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply<T> {
    pub value: T,
    pub cookies: Vec<Cookie>,
}

impl<T> Reply<T> {
    pub fn new(value: T) -> Self {
        Self {
            value,
            cookies: Vec::new(),
        }
    }

    pub fn with_cookie(mut self, cookie: Cookie) -> Self {
        self.cookies.push(cookie);
        self
    }
}

/// A failed backend call. Error replies may still carry `Set-Cookie`
/// headers, typically the removal of a token the backend no longer accepts.
#[derive(Debug, Clone, Error)]
#[error("{error}")]
pub struct Failure {
    pub error: SessionError,
    pub cookies: Vec<Cookie>,
}

impl Failure {
    pub fn with_cookies(error: SessionError, cookies: Vec<Cookie>) -> Self {
        Self { error, cookies }
    }
}

impl From<SessionError> for Failure {
    fn from(error: SessionError) -> Self {
        Self::with_cookies(error, Vec::new())
    }
}

impl From<reqwest::Error> for Failure {
    fn from(err: reqwest::Error) -> Self {
        SessionError::from(err).into()
    }
}

impl From<url::ParseError> for Failure {
    fn from(err: url::ParseError) -> Self {
        SessionError::from(err).into()
    }
}

/// Identity and session operations offered by the board backend.
///
/// Every call receives the caller's credentials, the strong cookies
/// currently held for the request. Implementations must not keep state
/// between calls; the proxy owns everything request-scoped.
#[async_trait]
pub trait Backend: Send + Sync {
    /// The user owning the credentials.
    async fn me(&self, credentials: &[Cookie]) -> BackendResult<Identity>;

    /// Active sessions of the current user.
    async fn sessions(&self, credentials: &[Cookie]) -> BackendResult<Vec<Session>>;

    /// Apply a partial update to the current user.
    async fn edit_me(
        &self,
        credentials: &[Cookie],
        params: &UserEditParams,
    ) -> BackendResult<Identity>;

    /// Delete the current user's account.
    async fn delete_me(&self, credentials: &[Cookie]) -> BackendResult<()>;

    /// Revoke one session of the current user.
    async fn delete_session(&self, credentials: &[Cookie], id: i64) -> BackendResult<()>;

    async fn sign_in(
        &self,
        credentials: &[Cookie],
        username: &str,
        password: &str,
    ) -> BackendResult<Session>;

    /// Register a new account. `token` is the invitation token; empty when
    /// the backend allows open registration.
    async fn sign_up(
        &self,
        credentials: &[Cookie],
        username: &str,
        password: &str,
        token: &str,
    ) -> BackendResult<Session>;

    async fn sign_out(&self, credentials: &[Cookie]) -> BackendResult<()>;
}
