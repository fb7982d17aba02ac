//! Request-scoped access to the board backend.
//!
//! Every inbound request gets its own [`SessionProxy`]. The proxy calls the
//! [`Backend`] on the request's behalf and collects the cookies the backend
//! issues, so that the code writing the response decides when they reach
//! the client.
//!
//! # Features
//!
//! - `testing` - exposes [`testing::MockBackend`], an in-memory backend
//!   that records its calls
//!
//! # Examples
//!
//! ```no_run
//! use board_core::Cookie;
//! use board_session::*;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), SessionError> {
//!     let backend: Arc<dyn Backend> = Arc::new(HttpBackend::new("http://localhost:8080")?);
//!
//!     let inbound = vec![Cookie::new(TOKEN_COOKIE, "token-from-browser")];
//!     let mut session = SessionProxy::new(backend, &inbound);
//!
//!     let me = session.me().await?;
//!     println!("Signed in as {}", me.username);
//!
//!     for cookie in session.drain_cookies() {
//!         println!("Set-Cookie: {}", cookie);
//!     }
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod cookies;
pub mod error;
pub mod http_backend;
pub mod proxy;
pub mod types;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use backend::{Backend, BackendResult, Failure, Reply};
pub use cookies::{CookieClass, CookieJar, THEME_COOKIE, TOKEN_COOKIE, USERNAME_COOKIE};
pub use error::{SessionError, SessionResult};
pub use http_backend::HttpBackend;
pub use proxy::SessionProxy;
pub use types::{Identity, Permission, Session, UserEditParams};
