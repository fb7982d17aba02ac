//! The per-request session proxy.

use crate::backend::{Backend, BackendResult};
use crate::cookies::{CookieJar, TOKEN_COOKIE};
use crate::error::SessionResult;
use crate::types::{Identity, Session, UserEditParams};
use board_core::Cookie;
use board_log::debug;
use std::sync::Arc;

/// Mediates every identity and session operation of one request.
///
/// Backend calls never touch the response. Whatever cookies the backend
/// hands back are queued in the proxy's jar and later drained by whoever
/// writes the response headers. A proxy belongs to exactly one request.
pub struct SessionProxy {
    backend: Arc<dyn Backend>,
    jar: CookieJar,
    identity: Option<Identity>,
    invalidated: bool,
}

impl SessionProxy {
    /// Create a proxy holding the strong cookies found in `inbound`.
    pub fn new(backend: Arc<dyn Backend>, inbound: &[Cookie]) -> Self {
        Self {
            backend,
            jar: CookieJar::from_request(inbound),
            identity: None,
            invalidated: false,
        }
    }

    /// The current user. The first successful lookup is cached for the rest
    /// of the request, so repeated calls reach the backend once.
    pub async fn me(&mut self) -> SessionResult<Identity> {
        if let Some(ref identity) = self.identity {
            return Ok(identity.clone());
        }

        let reply = self.backend.me(self.jar.credentials()).await;
        let identity = self.absorb(reply)?;
        self.identity = Some(identity.clone());
        Ok(identity)
    }

    /// The identity cached by an earlier successful [`SessionProxy::me`].
    pub fn cached_identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    pub async fn sessions(&mut self) -> SessionResult<Vec<Session>> {
        let reply = self.backend.sessions(self.jar.credentials()).await;
        self.absorb(reply)
    }

    pub async fn edit_me(&mut self, params: &UserEditParams) -> SessionResult<Identity> {
        let reply = self.backend.edit_me(self.jar.credentials(), params).await;
        let identity = self.absorb(reply)?;
        self.identity = Some(identity.clone());
        Ok(identity)
    }

    pub async fn delete_me(&mut self) -> SessionResult<()> {
        let reply = self.backend.delete_me(self.jar.credentials()).await;
        self.absorb(reply)?;
        self.identity = None;
        Ok(())
    }

    pub async fn delete_session(&mut self, id: i64) -> SessionResult<()> {
        let reply = self.backend.delete_session(self.jar.credentials(), id).await;
        self.absorb(reply)
    }

    pub async fn sign_in(&mut self, username: &str, password: &str) -> SessionResult<Session> {
        let reply = self
            .backend
            .sign_in(self.jar.credentials(), username, password)
            .await;
        let session = self.absorb(reply)?;
        self.signed_in();
        Ok(session)
    }

    pub async fn sign_up(
        &mut self,
        username: &str,
        password: &str,
        token: &str,
    ) -> SessionResult<Session> {
        let reply = self
            .backend
            .sign_up(self.jar.credentials(), username, password, token)
            .await;
        let session = self.absorb(reply)?;
        self.signed_in();
        Ok(session)
    }

    pub async fn sign_out(&mut self) -> SessionResult<()> {
        let reply = self.backend.sign_out(self.jar.credentials()).await;
        self.absorb(reply)?;
        self.identity = None;
        Ok(())
    }

    /// The live token cookie: a token the backend issued during this
    /// request wins over the one the request came with.
    pub fn token(&self) -> Option<&Cookie> {
        self.jar.get(TOKEN_COOKIE)
    }

    /// Whether the backend rejected the credentials during this request.
    pub fn is_invalidated(&self) -> bool {
        self.invalidated
    }

    /// Cookies queued for the client and not yet drained.
    pub fn pending_cookies(&self) -> &[Cookie] {
        self.jar.pending()
    }

    /// Hand over the queued cookies. Each queued cookie is returned by
    /// exactly one call.
    pub fn drain_cookies(&mut self) -> Vec<Cookie> {
        self.jar.drain()
    }

    fn signed_in(&mut self) {
        self.identity = None;
        self.invalidated = false;
    }

    /// Queue the cookies of a reply, failed or not, and unwrap its value.
    fn absorb<T>(&mut self, reply: BackendResult<T>) -> SessionResult<T> {
        match reply {
            Ok(reply) => {
                self.jar.queue_all(reply.cookies);
                Ok(reply.value)
            }
            Err(failure) => {
                debug!("Backend call failed: {}", failure);
                self.jar.queue_all(failure.cookies);
                if failure.error.is_unauthenticated() {
                    self.invalidated = true;
                    self.identity = None;
                }
                Err(failure.error)
            }
        }
    }
}

impl std::fmt::Debug for SessionProxy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionProxy")
            .field("jar", &self.jar)
            .field("identity", &self.identity)
            .field("invalidated", &self.invalidated)
            .finish_non_exhaustive()
    }
}
