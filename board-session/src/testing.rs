//! A scripted in-memory backend for tests.

use crate::backend::{Backend, BackendResult, Failure, Reply};
use crate::cookies::TOKEN_COOKIE;
use crate::error::{SessionError, SessionResult};
use crate::types::{Identity, Session, UserEditParams};
use async_trait::async_trait;
use board_core::{Cookie, SameSite, cookie::max_expiry};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Default)]
struct MockState {
    users: Vec<(Identity, String)>,
    sessions: Vec<Session>,
    errors: HashMap<String, SessionError>,
    cookies: HashMap<String, Vec<Cookie>>,
    calls: Vec<String>,
}

/// Backend double that keeps users in memory and records every call.
///
/// A user is authenticated by the `token` cookie registered for them.
/// Clones share state, so a test can keep one handle for assertions while
/// the proxy owns another.
#[derive(Clone, Default)]
pub struct MockBackend {
    state: Arc<Mutex<MockState>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a plain user reachable with `token`.
    pub fn with_user(self, username: &str, token: &str) -> Self {
        self.with_identity(Identity::new(username), token)
    }

    pub fn with_identity(self, identity: Identity, token: &str) -> Self {
        self.state.lock().users.push((identity, token.to_string()));
        self
    }

    pub fn with_session(self, session: Session) -> Self {
        self.state.lock().sessions.push(session);
        self
    }

    /// Make every call to `method` fail with `error`.
    pub fn with_error(self, method: &str, error: SessionError) -> Self {
        self.state.lock().errors.insert(method.to_string(), error);
        self
    }

    /// Attach `cookie` to every reply of `method`, including the scripted
    /// error set with [`MockBackend::with_error`].
    pub fn with_cookie(self, method: &str, cookie: Cookie) -> Self {
        self.state
            .lock()
            .cookies
            .entry(method.to_string())
            .or_default()
            .push(cookie);
        self
    }

    /// Recorded calls, by method name, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.state.lock().calls.clone()
    }

    pub fn call_count(&self, method: &str) -> usize {
        self.state.lock().calls.iter().filter(|c| *c == method).count()
    }

    pub fn was_called(&self, method: &str) -> bool {
        self.call_count(method) > 0
    }

    pub fn clear_calls(&self) {
        self.state.lock().calls.clear();
    }

    /// Record the call and return the scripted error, if any.
    fn enter(&self, method: &str) -> Result<(), Failure> {
        let mut state = self.state.lock();
        state.calls.push(method.to_string());
        match state.errors.get(method) {
            Some(err) => {
                let cookies = state.cookies.get(method).cloned().unwrap_or_default();
                Err(Failure::with_cookies(err.clone(), cookies))
            }
            None => Ok(()),
        }
    }

    fn reply<T>(&self, method: &str, value: T) -> BackendResult<T> {
        let cookies = self
            .state
            .lock()
            .cookies
            .get(method)
            .cloned()
            .unwrap_or_default();
        Ok(Reply { value, cookies })
    }

    fn authenticate(&self, credentials: &[Cookie]) -> SessionResult<Identity> {
        let token = credentials
            .iter()
            .find(|c| c.name == TOKEN_COOKIE)
            .map(|c| c.value.as_str())
            .ok_or_else(|| SessionError::Unauthenticated("missing token".to_string()))?;

        self.state
            .lock()
            .users
            .iter()
            .find(|(_, t)| t == token)
            .map(|(identity, _)| identity.clone())
            .ok_or_else(|| SessionError::Unauthenticated("invalid token".to_string()))
    }

    fn open_session(&self, username: &str, token: &str) -> Reply<Session> {
        let mut state = self.state.lock();
        let id = state.sessions.iter().map(|s| s.id).max().unwrap_or(0) + 1;
        let session = Session::new(id, username);
        state.sessions.push(session.clone());

        Reply::new(session).with_cookie(token_cookie(token))
    }
}

fn token_cookie(value: &str) -> Cookie {
    Cookie::new(TOKEN_COOKIE, value)
        .with_path("/")
        .with_expires(max_expiry())
        .with_http_only(true)
        .with_same_site(SameSite::Strict)
}

#[async_trait]
impl Backend for MockBackend {
    async fn me(&self, credentials: &[Cookie]) -> BackendResult<Identity> {
        self.enter("me")?;
        let identity = self.authenticate(credentials)?;
        self.reply("me", identity)
    }

    async fn sessions(&self, credentials: &[Cookie]) -> BackendResult<Vec<Session>> {
        self.enter("sessions")?;
        let identity = self.authenticate(credentials)?;
        let sessions = self
            .state
            .lock()
            .sessions
            .iter()
            .filter(|s| s.username == identity.username)
            .cloned()
            .collect();
        self.reply("sessions", sessions)
    }

    async fn edit_me(
        &self,
        credentials: &[Cookie],
        params: &UserEditParams,
    ) -> BackendResult<Identity> {
        self.enter("edit_me")?;
        let identity = self.authenticate(credentials)?;
        if params.password.as_deref() == Some("") {
            return Err(SessionError::Response {
                status: 400,
                message: "password cannot be empty".to_string(),
            }
            .into());
        }
        self.reply("edit_me", identity)
    }

    async fn delete_me(&self, credentials: &[Cookie]) -> BackendResult<()> {
        self.enter("delete_me")?;
        let identity = self.authenticate(credentials)?;
        {
            let mut state = self.state.lock();
            state.users.retain(|(u, _)| u.username != identity.username);
            state.sessions.retain(|s| s.username != identity.username);
        }
        Ok(Reply::new(()).with_cookie(Cookie::removal(TOKEN_COOKIE)))
    }

    async fn delete_session(&self, credentials: &[Cookie], id: i64) -> BackendResult<()> {
        self.enter("delete_session")?;
        let identity = self.authenticate(credentials)?;

        let removed = {
            let mut state = self.state.lock();
            let before = state.sessions.len();
            state
                .sessions
                .retain(|s| !(s.id == id && s.username == identity.username));
            before != state.sessions.len()
        };

        if !removed {
            return Err(SessionError::Response {
                status: 404,
                message: format!("session {} not found", id),
            }
            .into());
        }
        self.reply("delete_session", ())
    }

    async fn sign_in(
        &self,
        _credentials: &[Cookie],
        username: &str,
        password: &str,
    ) -> BackendResult<Session> {
        self.enter("sign_in")?;
        let token = self
            .state
            .lock()
            .users
            .iter()
            .find(|(u, _)| u.username == username)
            .map(|(_, t)| t.clone());

        match token {
            Some(token) if !password.is_empty() => Ok(self.open_session(username, &token)),
            _ => Err(
                SessionError::Unauthenticated("invalid username or password".to_string()).into(),
            ),
        }
    }

    async fn sign_up(
        &self,
        _credentials: &[Cookie],
        username: &str,
        password: &str,
        _token: &str,
    ) -> BackendResult<Session> {
        self.enter("sign_up")?;
        if username.is_empty() || password.is_empty() {
            return Err(SessionError::Response {
                status: 400,
                message: "missing username or password".to_string(),
            }
            .into());
        }

        let token = format!("{}-token", username);
        {
            let mut state = self.state.lock();
            if state.users.iter().any(|(u, _)| u.username == username) {
                return Err(SessionError::Response {
                    status: 409,
                    message: "username taken".to_string(),
                }
                .into());
            }
            state.users.push((Identity::new(username), token.clone()));
        }
        Ok(self.open_session(username, &token))
    }

    async fn sign_out(&self, _credentials: &[Cookie]) -> BackendResult<()> {
        self.enter("sign_out")?;
        Ok(Reply::new(()).with_cookie(Cookie::removal(TOKEN_COOKIE)))
    }
}
