//! Request lifecycle through the dispatcher, from inbound cookies to the
//! laid-out document.

use async_trait::async_trait;
use board_core::{Cookie, HttpRequest, HttpResponse, HttpStatus, Router};
use board_render::{
    Component, Composer, Mux, Page, PageError, Render, RenderConfig, Renderer, Request, Style,
    Templates,
};
use board_session::testing::MockBackend;
use board_session::{SessionError, TOKEN_COOKIE, USERNAME_COOKIE};
use serde_json::json;
use std::sync::Arc;

fn templates() -> Arc<Templates> {
    let nav = Component::new("<nav>{{#if username}}{{username}}{{else}}Sign in{{/if}}</nav>")
        .with_style(Style::embedded("nav.css", ".nav { display: flex; }"));
    let footer = Component::new("<footer>{{site_name}}</footer>")
        .with_style(Style::embedded("footer.css", "footer { margin: 0; }"));

    let mut composer = Composer::new();
    composer
        .build_page(
            "profile",
            Page::new("{{> nav}}<main>{{greeting}}</main>{{> footer}}")
                .with_component("nav", nav)
                .with_component("footer", footer),
        )
        .unwrap();
    Arc::new(composer.finish().unwrap())
}

struct Profile {
    templates: Arc<Templates>,
    title: &'static str,
}

#[async_trait]
impl Renderer for Profile {
    async fn render(&self, r: &mut Request) -> Result<Render, PageError> {
        let common = r.common();
        let page = self.templates.page("profile")?;
        let body = page.render(&json!({
            "username": common.username,
            "site_name": common.site_name,
            "greeting": "Welcome",
        }))?;
        Ok(Render::new(body).with_title(self.title))
    }
}

struct ShowName;

#[async_trait]
impl Renderer for ShowName {
    async fn render(&self, r: &mut Request) -> Result<Render, PageError> {
        let first = r.resolve_username().await.to_string();
        let second = r.resolve_username().await.to_string();
        Ok(Render::new(format!("<p>{}|{}</p>", first, second)))
    }
}

struct SignOut;

#[async_trait]
impl Renderer for SignOut {
    async fn render(&self, r: &mut Request) -> Result<Render, PageError> {
        r.session_mut().sign_out().await?;
        r.redirect("/", HttpStatus::SeeOther);
        Ok(Render::empty())
    }
}

struct Nothing;

#[async_trait]
impl Renderer for Nothing {
    async fn render(&self, _: &mut Request) -> Result<Render, PageError> {
        Ok(Render::empty())
    }
}

fn router(backend: &MockBackend, title: &'static str) -> Router {
    let templates = templates();
    let mut mux = Mux::new(
        RenderConfig::new("smolboard"),
        Arc::new(backend.clone()),
        templates.clone(),
    );
    mux.get("/", Profile { templates, title })
        .get("/name", ShowName)
        .get("/nothing", Nothing)
        .post("/signout", SignOut);
    mux.into_router()
}

async fn send(router: &Router, req: HttpRequest) -> HttpResponse {
    router.route(req).await.unwrap()
}

fn title_of(res: &HttpResponse) -> String {
    let body = res.body_string();
    let start = body.find("<title>").unwrap() + "<title>".len();
    let end = body.find("</title>").unwrap();
    body[start..end].to_string()
}

#[tokio::test]
async fn test_anonymous_request() {
    let backend = MockBackend::new();
    let router = router(&backend, "");

    let res = send(&router, HttpRequest::new("GET", "/")).await;

    assert_eq!(res.status, 200);
    assert_eq!(res.header("Content-Type"), Some("text/html; charset=utf-8"));
    assert_eq!(title_of(&res), "smolboard");
    assert!(res.body_string().contains("<nav>Sign in</nav>"));
    assert!(res.body_string().contains("/static/themes/auto.css"));
    assert!(res.cookie(USERNAME_COOKIE).is_none());
    assert!(backend.calls().is_empty());
}

#[tokio::test]
async fn test_title_with_page_title() {
    let backend = MockBackend::new();
    let router = router(&backend, "Settings");

    let res = send(&router, HttpRequest::new("GET", "/")).await;
    assert_eq!(title_of(&res), "Settings - smolboard");
}

#[tokio::test]
async fn test_token_without_username_cookie() {
    let backend = MockBackend::new().with_user("alice", "t1");
    let router = router(&backend, "");

    let req = HttpRequest::new("GET", "/").with_cookie(TOKEN_COOKIE, "t1");
    let res = send(&router, req).await;

    let cookie = res.cookie(USERNAME_COOKIE).unwrap();
    assert_eq!(cookie.value, "alice");
    assert!(cookie.expires.is_none());
    assert!(res.body_string().contains("<nav>alice</nav>"));
}

#[tokio::test]
async fn test_username_cookie_is_encoded() {
    let backend = MockBackend::new().with_user("Zoë; Domain=evil.example", "t1");
    let router = router(&backend, "");

    let req = HttpRequest::new("GET", "/").with_cookie(TOKEN_COOKIE, "t1");
    let res = send(&router, req).await;

    let cookie = res.cookie(USERNAME_COOKIE).unwrap();
    assert_eq!(
        cookie.to_header_value(),
        "username=Zo%C3%AB%3B%20Domain=evil.example; Path=/"
    );
}

#[tokio::test]
async fn test_username_resolved_once_per_request() {
    let backend = MockBackend::new().with_user("alice", "t1");
    let router = router(&backend, "");

    let req = HttpRequest::new("GET", "/name").with_cookie(TOKEN_COOKIE, "t1");
    let res = send(&router, req).await;

    assert!(res.body_string().contains("<p>alice|alice</p>"));
    assert_eq!(backend.call_count("me"), 1);
}

#[tokio::test]
async fn test_sign_out_clears_username_cookie() {
    for carried_username in [true, false] {
        let backend = MockBackend::new().with_user("alice", "t1");
        let router = router(&backend, "");

        let mut req = HttpRequest::new("POST", "/signout").with_cookie(TOKEN_COOKIE, "t1");
        if carried_username {
            req = req.with_cookie(USERNAME_COOKIE, "alice");
        }
        let res = send(&router, req).await;

        assert_eq!(res.status, 303);
        assert_eq!(res.header("Location"), Some("/"));
        assert!(res.body.is_empty());
        assert!(res.cookie(TOKEN_COOKIE).is_some_and(Cookie::is_removal));
        assert!(res.cookie(USERNAME_COOKIE).is_some_and(Cookie::is_removal));
    }
}

#[tokio::test]
async fn test_empty_render_has_no_body() {
    let backend = MockBackend::new().with_user("alice", "t1");
    let router = router(&backend, "");

    let req = HttpRequest::new("GET", "/nothing").with_cookie(TOKEN_COOKIE, "t1");
    let res = send(&router, req).await;

    assert_eq!(res.status, 200);
    assert!(res.body.is_empty());
    assert_eq!(res.cookie(USERNAME_COOKIE).map(|c| c.value.as_str()), Some("alice"));
}

#[tokio::test]
async fn test_stale_username_cleared_on_rejected_token() {
    let backend = MockBackend::new();

    struct NeedsSignIn;

    #[async_trait]
    impl Renderer for NeedsSignIn {
        async fn render(&self, r: &mut Request) -> Result<Render, PageError> {
            let me = r.me().await?;
            Ok(Render::new(me.username))
        }
    }

    let mut mux = Mux::new(RenderConfig::default(), Arc::new(backend.clone()), templates());
    mux.get("/settings", NeedsSignIn);
    let req = HttpRequest::new("GET", "/settings")
        .with_cookie(TOKEN_COOKIE, "revoked")
        .with_cookie(USERNAME_COOKIE, "alice");
    let res = send(&mux.into_router(), req).await;

    assert_eq!(res.status, 401);
    assert!(res.cookie(USERNAME_COOKIE).is_some_and(Cookie::is_removal));
}

struct Account;

#[async_trait]
impl Renderer for Account {
    async fn render(&self, r: &mut Request) -> Result<Render, PageError> {
        let me = r.me().await?;
        Ok(Render::new(me.username))
    }
}

#[tokio::test]
async fn test_revoked_token_removal_reaches_client() {
    let backend = MockBackend::new()
        .with_error("me", SessionError::Unauthenticated("session revoked".into()))
        .with_cookie("me", Cookie::removal(TOKEN_COOKIE));

    let mut mux = Mux::new(RenderConfig::default(), Arc::new(backend.clone()), templates());
    mux.get("/account", Account);
    let req = HttpRequest::new("GET", "/account")
        .with_cookie(TOKEN_COOKIE, "dead")
        .with_cookie(USERNAME_COOKIE, "alice");
    let res = send(&mux.into_router(), req).await;

    assert_eq!(res.status, 401);
    assert!(res.cookie(TOKEN_COOKIE).is_some_and(Cookie::is_removal));
    assert!(res.cookie(USERNAME_COOKIE).is_some_and(Cookie::is_removal));
}

#[tokio::test]
async fn test_components_css_order() {
    let backend = MockBackend::new();
    let router = router(&backend, "");

    let res = send(&router, HttpRequest::new("GET", "/static/components.css")).await;
    let css = res.body_string();

    let nav = css.find(".nav").unwrap();
    let footer = css.find("footer {").unwrap();
    assert!(nav < footer);
}
