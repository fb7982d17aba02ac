// HTTP core for the smolboard frontend
// Requests, responses, cookies, routing and the hyper server loop

pub mod cookie;
pub mod error;
pub mod form;
pub mod http;
pub mod routing;
pub mod server;
pub mod static_assets;
pub mod status;

// Re-export commonly used types
pub use cookie::{Cookie, SameSite};
pub use error::*;
pub use form::*;
pub use http::*;
pub use routing::{HandlerFn, Route, Router, handler};
pub use server::Server;
pub use static_assets::*;
pub use status::*;
