// HTTP server: accepts connections and hands each request to the router

use crate::{Error, HttpRequest, HttpResponse, Router};
use board_log::{debug, error, info};
use http_body_util::{BodyExt, Full};
use hyper::header::{HeaderName, HeaderValue, SET_COOKIE};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, body::Incoming as IncomingBody};
use hyper_util::rt::TokioIo;
use std::sync::Arc;
use tokio::net::TcpListener;

/// The HTTP server. Every connection is served on its own task, so a slow
/// request only ever holds up its own connection.
pub struct Server {
    router: Arc<Router>,
}

impl Server {
    pub fn new(router: Router) -> Self {
        Self {
            router: Arc::new(router),
        }
    }

    /// Bind `address` and serve until the listener fails.
    pub async fn listen(self, address: &str) -> Result<(), Error> {
        let listener = TcpListener::bind(address).await?;
        info!("Listening on http://{}", listener.local_addr()?);
        self.serve(listener).await
    }

    /// Serve connections from an already-bound listener.
    pub async fn serve(self, listener: TcpListener) -> Result<(), Error> {
        loop {
            let (stream, peer) = listener.accept().await?;
            let io = TokioIo::new(stream);
            let router = self.router.clone();

            tokio::spawn(async move {
                let service = service_fn(move |req: Request<IncomingBody>| {
                    let router = router.clone();
                    async move { handle_request(req, router).await }
                });

                if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                    debug!("Error serving connection from {}: {:?}", peer, err);
                }
            });
        }
    }
}

/// Handle an incoming HTTP request
async fn handle_request(
    req: Request<IncomingBody>,
    router: Arc<Router>,
) -> Result<Response<Full<bytes::Bytes>>, hyper::Error> {
    let method = req.method().to_string();
    let path = req
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| req.uri().path().to_string());

    let mut board_req = HttpRequest::new(method, path);

    for (name, value) in req.headers() {
        if let Ok(value_str) = value.to_str() {
            board_req
                .headers
                .entry(name.as_str().to_string())
                .and_modify(|existing| {
                    // Repeated Cookie headers join with "; ", the rest with ", ".
                    let sep = if name == hyper::header::COOKIE { "; " } else { ", " };
                    existing.push_str(sep);
                    existing.push_str(value_str);
                })
                .or_insert_with(|| value_str.to_string());
        }
    }

    let body_bytes = req.collect().await?.to_bytes();
    board_req.body = body_bytes.to_vec();

    let response = match router.route(board_req).await {
        Ok(resp) => resp,
        Err(err) => {
            let status = err.status_code();
            if err.is_server_error() {
                error!("Request failed: {}", err);
            }
            HttpResponse::text(format!("Error: {}", err)).with_status(status)
        }
    };

    Ok(into_hyper_response(response))
}

/// Convert our HttpResponse to a hyper Response
fn into_hyper_response(response: HttpResponse) -> Response<Full<bytes::Bytes>> {
    let mut hyper_response = Response::new(Full::new(bytes::Bytes::from(response.body)));

    *hyper_response.status_mut() = hyper::StatusCode::from_u16(response.status)
        .unwrap_or(hyper::StatusCode::INTERNAL_SERVER_ERROR);

    let headers = hyper_response.headers_mut();

    for (key, value) in response.headers {
        match (
            HeaderName::from_bytes(key.as_bytes()),
            HeaderValue::from_str(&value),
        ) {
            (Ok(name), Ok(value)) => {
                headers.insert(name, value);
            }
            _ => debug!("Dropping invalid header {}", key),
        }
    }

    for cookie in response.cookies {
        match HeaderValue::from_str(&cookie.to_header_value()) {
            Ok(value) => {
                headers.append(SET_COOKIE, value);
            }
            Err(_) => debug!("Dropping invalid cookie {}", cookie.name),
        }
    }

    hyper_response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cookie::Cookie;

    #[test]
    fn test_into_hyper_response_appends_every_cookie() {
        let mut response = HttpResponse::html("<p>x</p>");
        response.set_cookie(Cookie::new("token", ""));
        response.set_cookie(Cookie::removal("username"));

        let hyper_response = into_hyper_response(response);
        assert_eq!(hyper_response.status(), 200);
        assert_eq!(hyper_response.headers().get_all(SET_COOKIE).iter().count(), 2);
        assert_eq!(
            hyper_response.headers().get("content-type").unwrap(),
            "text/html; charset=utf-8"
        );
    }

    #[test]
    fn test_into_hyper_response_invalid_status() {
        let response = HttpResponse::new(1000);
        let hyper_response = into_hyper_response(response);
        assert_eq!(hyper_response.status(), 500);
    }
}
