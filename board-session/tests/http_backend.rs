//! HttpBackend against a fake backend server.

use board_core::Cookie;
use board_session::*;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn token() -> Vec<Cookie> {
    vec![Cookie::new(TOKEN_COOKIE, "abc")]
}

#[tokio::test]
async fn test_me_sends_credentials() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/@me"))
        .and(header("cookie", "token=abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "username": "alice",
            "joined_at": 0,
            "permission": 1
        })))
        .expect(1)
        .mount(&server)
        .await;

    let backend = HttpBackend::new(&server.uri()).unwrap();
    let reply = backend.me(&token()).await.unwrap();

    assert_eq!(reply.value.username, "alice");
    assert_eq!(reply.value.permission, Permission::User);
    assert!(reply.cookies.is_empty());
}

#[tokio::test]
async fn test_unauthorized_maps_to_unauthenticated() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/@me"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"error": "session expired"})))
        .mount(&server)
        .await;

    let backend = HttpBackend::new(&server.uri()).unwrap();
    let err = backend.me(&token()).await.unwrap_err();

    assert!(err.error.is_unauthenticated());
    assert_eq!(err.to_string(), "Unauthenticated: session expired");
    assert!(err.cookies.is_empty());
}

#[tokio::test]
async fn test_error_status_is_kept() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/users/@me/sessions/7"))
        .respond_with(ResponseTemplate::new(404).set_body_string("session not found"))
        .mount(&server)
        .await;

    let backend = HttpBackend::new(&server.uri()).unwrap();
    let err = backend.delete_session(&token(), 7).await.unwrap_err();

    assert_eq!(err.error.status_code(), 404);
    assert!(err.to_string().contains("session not found"));
}

#[tokio::test]
async fn test_sign_in_returns_set_cookies() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/signin"))
        .and(body_string_contains("username=alice"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"id": 1, "username": "alice"}))
                .append_header("Set-Cookie", "token=fresh; Path=/; HttpOnly"),
        )
        .mount(&server)
        .await;

    let backend = HttpBackend::new(&server.uri()).unwrap();
    let reply = backend.sign_in(&[], "alice", "hunter2").await.unwrap();

    assert_eq!(reply.value.id, 1);
    assert_eq!(reply.cookies.len(), 1);
    assert_eq!(reply.cookies[0].value, "fresh");
    assert!(reply.cookies[0].http_only);
}

#[tokio::test]
async fn test_edit_me_sends_form() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/users/@me"))
        .and(body_string_contains("password=hunter2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"username": "alice"})))
        .expect(1)
        .mount(&server)
        .await;

    let backend = HttpBackend::new(&server.uri()).unwrap();
    let reply = backend
        .edit_me(&token(), &UserEditParams::password("hunter2"))
        .await
        .unwrap();
    assert_eq!(reply.value.username, "alice");
}

#[tokio::test]
async fn test_invalid_json_is_invalid_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/@me/sessions"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let backend = HttpBackend::new(&server.uri()).unwrap();
    let err = backend.sessions(&token()).await.unwrap_err();
    assert!(matches!(err.error, SessionError::InvalidResponse(_)));
}

#[tokio::test]
async fn test_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/@me"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
        .mount(&server)
        .await;

    let backend = HttpBackend::with_timeout(&server.uri(), Duration::from_millis(50)).unwrap();
    let err = backend.me(&token()).await.unwrap_err();
    assert_eq!(err.error.status_code(), 504);
}

#[tokio::test]
async fn test_sign_out_through_proxy() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/signout"))
        .and(header("cookie", "token=abc"))
        .respond_with(
            ResponseTemplate::new(204)
                .append_header("Set-Cookie", "token=; Path=/; Expires=Thu, 01 Jan 1970 00:00:00 GMT"),
        )
        .mount(&server)
        .await;

    let backend: Arc<dyn Backend> = Arc::new(HttpBackend::new(&server.uri()).unwrap());
    let mut session = SessionProxy::new(backend, &token());

    session.sign_out().await.unwrap();
    assert!(session.token().is_none());

    let cookies = session.drain_cookies();
    assert_eq!(cookies.len(), 1);
    assert!(cookies[0].is_removal());
}

#[tokio::test]
async fn test_rejected_session_keeps_token_removal() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/@me"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(json!({"error": "session revoked"}))
                .append_header("Set-Cookie", "token=; Path=/; Expires=Thu, 01 Jan 1970 00:00:00 GMT"),
        )
        .mount(&server)
        .await;

    let backend: Arc<dyn Backend> = Arc::new(HttpBackend::new(&server.uri()).unwrap());
    let mut session = SessionProxy::new(backend, &[Cookie::new(TOKEN_COOKIE, "dead")]);

    let err = session.me().await.unwrap_err();
    assert!(err.is_unauthenticated());
    assert!(session.is_invalidated());
    assert!(session.token().is_none());

    let cookies = session.drain_cookies();
    assert_eq!(cookies.len(), 1);
    assert_eq!(cookies[0].name, TOKEN_COOKIE);
    assert!(cookies[0].is_removal());
}
