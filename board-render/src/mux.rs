//! The dispatcher: turns page renderers into routes and drives each request
//! from context construction to the laid-out document.

use crate::composer::Templates;
use crate::config::RenderConfig;
use crate::error::PageError;
use crate::render::Render;
use crate::request::Request;
use crate::theme::Theme;
use async_trait::async_trait;
use board_core::{
    HttpRequest, HttpResponse, HttpStatus, Router, StaticAssetServer, StaticAssetsConfig, handler,
};
use board_log::{debug, error};
use board_session::{Backend, THEME_COOKIE};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

/// Produces the page for a request.
#[async_trait]
pub trait Renderer: Send + Sync {
    async fn render(&self, r: &mut Request) -> Result<Render, PageError>;
}

/// Produces the page shown when a [`Renderer`] fails.
#[async_trait]
pub trait ErrorRenderer: Send + Sync {
    async fn render_error(&self, r: &mut Request, err: &PageError) -> Result<Render, PageError>;
}

struct PageRoute {
    method: &'static str,
    path: String,
    renderer: Arc<dyn Renderer>,
}

/// Read-only state shared by every request.
struct Shared {
    config: Arc<RenderConfig>,
    backend: Arc<dyn Backend>,
    templates: Arc<Templates>,
    error_renderer: Option<Arc<dyn ErrorRenderer>>,
}

/// Page routes plus the built-in theme and static routes.
pub struct Mux {
    config: RenderConfig,
    backend: Arc<dyn Backend>,
    templates: Arc<Templates>,
    error_renderer: Option<Arc<dyn ErrorRenderer>>,
    static_dir: Option<StaticAssetServer>,
    routes: Vec<PageRoute>,
}

impl Mux {
    pub fn new(config: RenderConfig, backend: Arc<dyn Backend>, templates: Arc<Templates>) -> Self {
        Self {
            config,
            backend,
            templates,
            error_renderer: None,
            static_dir: None,
            routes: Vec::new(),
        }
    }

    pub fn set_error_renderer(&mut self, renderer: impl ErrorRenderer + 'static) -> &mut Self {
        self.error_renderer = Some(Arc::new(renderer));
        self
    }

    /// Serve files under `/static/` from `dir`.
    pub fn set_static_dir(&mut self, dir: impl Into<PathBuf>) -> Result<&mut Self, board_core::Error> {
        self.static_dir = Some(StaticAssetServer::new(StaticAssetsConfig::new(dir))?);
        Ok(self)
    }

    pub fn get(&mut self, path: &str, renderer: impl Renderer + 'static) -> &mut Self {
        self.route("GET", path, Arc::new(renderer))
    }

    pub fn post(&mut self, path: &str, renderer: impl Renderer + 'static) -> &mut Self {
        self.route("POST", path, Arc::new(renderer))
    }

    pub fn delete(&mut self, path: &str, renderer: impl Renderer + 'static) -> &mut Self {
        self.route("DELETE", path, Arc::new(renderer))
    }

    pub fn route(&mut self, method: &'static str, path: &str, renderer: Arc<dyn Renderer>) -> &mut Self {
        self.routes.push(PageRoute {
            method,
            path: path.to_string(),
            renderer,
        });
        self
    }

    /// Register a group of routes under `prefix`.
    pub fn scope(&mut self, prefix: &str, build: impl FnOnce(&mut Scope<'_>)) -> &mut Self {
        let mut scope = Scope {
            prefix: prefix.trim_end_matches('/').to_string(),
            routes: &mut self.routes,
        };
        build(&mut scope);
        self
    }

    /// Freeze the routes into a [`Router`].
    pub fn into_router(self) -> Router {
        let shared = Arc::new(Shared {
            config: Arc::new(self.config),
            backend: self.backend,
            templates: self.templates,
            error_renderer: self.error_renderer,
        });

        let mut router = Router::new();
        add_page(&mut router, &shared, "POST", "/theme", Arc::new(SetTheme));

        let templates = shared.templates.clone();
        router.add_route(
            "GET",
            "/static/components.css",
            handler(move |_req: HttpRequest| {
                let css = templates.components_css().to_string();
                async move {
                    Ok(HttpResponse::ok()
                        .content_type("text/css; charset=utf-8")
                        .cache_control("no-cache")
                        .with_body(css.into_bytes()))
                }
            }),
        );

        if let Some(assets) = self.static_dir {
            let assets = Arc::new(assets);
            router.add_route(
                "GET",
                "/static/*file",
                handler(move |req: HttpRequest| {
                    let assets = assets.clone();
                    async move {
                        let file = req.param("file").cloned().unwrap_or_default();
                        assets.serve(&file, &req).await
                    }
                }),
            );
        }

        for route in self.routes {
            add_page(&mut router, &shared, route.method, &route.path, route.renderer);
        }

        router
    }
}

/// Routes registered under a common path prefix.
pub struct Scope<'a> {
    prefix: String,
    routes: &'a mut Vec<PageRoute>,
}

impl Scope<'_> {
    pub fn get(&mut self, path: &str, renderer: impl Renderer + 'static) -> &mut Self {
        self.route("GET", path, Arc::new(renderer))
    }

    pub fn post(&mut self, path: &str, renderer: impl Renderer + 'static) -> &mut Self {
        self.route("POST", path, Arc::new(renderer))
    }

    pub fn delete(&mut self, path: &str, renderer: impl Renderer + 'static) -> &mut Self {
        self.route("DELETE", path, Arc::new(renderer))
    }

    pub fn route(&mut self, method: &'static str, path: &str, renderer: Arc<dyn Renderer>) -> &mut Self {
        self.routes.push(PageRoute {
            method,
            path: join_path(&self.prefix, path),
            renderer,
        });
        self
    }

    pub fn scope(&mut self, prefix: &str, build: impl FnOnce(&mut Scope<'_>)) -> &mut Self {
        let mut scope = Scope {
            prefix: join_path(&self.prefix, prefix.trim_end_matches('/')),
            routes: &mut *self.routes,
        };
        build(&mut scope);
        self
    }
}

fn join_path(prefix: &str, path: &str) -> String {
    match path {
        "" | "/" if prefix.is_empty() => "/".to_string(),
        "" | "/" => prefix.to_string(),
        _ => format!("{}{}", prefix, path),
    }
}

fn add_page(
    router: &mut Router,
    shared: &Arc<Shared>,
    method: &str,
    path: &str,
    renderer: Arc<dyn Renderer>,
) {
    let shared = shared.clone();
    router.add_route(
        method,
        path,
        handler(move |req: HttpRequest| {
            let shared = shared.clone();
            let renderer = renderer.clone();
            async move { Ok(dispatch(&shared, renderer.as_ref(), req).await) }
        }),
    );
}

/// Values the outer layout is rendered with.
#[derive(Serialize)]
struct LayoutContext<'a> {
    title: String,
    site_name: &'a str,
    theme: Theme,
    theme_url: String,
    username: &'a str,
    render: &'a Render,
}

async fn dispatch(shared: &Shared, renderer: &dyn Renderer, http: HttpRequest) -> HttpResponse {
    let mut request = Request::new(http, shared.config.clone(), shared.backend.clone());
    request.resolve_username().await;

    let page = match renderer.render(&mut request).await {
        Ok(page) => {
            request.flush_cookies();
            page
        }
        Err(err) => render_error(shared, &mut request, err).await,
    };

    if page.is_empty() {
        return request.into_response();
    }

    let layout = LayoutContext {
        title: shared.config.format_title(&page.title),
        site_name: &shared.config.site_name,
        theme: request.theme,
        theme_url: request.theme.url(),
        username: &request.username,
        render: &page,
    };

    let body = match shared.templates.layout().render(&layout) {
        Ok(html) => html.into_bytes(),
        Err(err) => {
            error!("Error rendering layout for {}: {}", request.http.path, err);
            Vec::new()
        }
    };

    let mut response = request.into_response();
    response.body = body;
    response
}

async fn render_error(shared: &Shared, request: &mut Request, err: PageError) -> Render {
    let status = err.status_code();
    if status >= 500 {
        error!("{} {} failed: {}", request.http.method, request.http.path, err);
    } else {
        debug!("{} {} failed: {}", request.http.method, request.http.path, err);
    }
    request.set_status(status);

    let Some(ref fallback) = shared.error_renderer else {
        request.flush_cookies();
        let message = handlebars::html_escape(&err.to_string());
        request.head.body = format!("Error: {}", message).into_bytes();
        return Render::empty();
    };

    let page = match fallback.render_error(request, &err).await {
        Ok(page) => page,
        Err(render_err) => {
            error!("Error rendering error page: {}", render_err);
            Render::empty()
        }
    };

    request.flush_cookies();
    page
}

/// `POST /theme`: store the picked theme and go back where the form was.
struct SetTheme;

#[async_trait]
impl Renderer for SetTheme {
    async fn render(&self, r: &mut Request) -> Result<Render, PageError> {
        let value = match r.form_value("theme") {
            Ok(value) => value,
            Err(PageError::MissingField(_)) => String::new(),
            Err(err) => return Err(err),
        };
        let theme: Theme = value
            .parse()
            .map_err(|message| PageError::InvalidParam {
                name: "theme".to_string(),
                message,
            })?;

        r.set_weak_cookie(THEME_COOKIE, theme.cookie_value());

        let location = r.referer().unwrap_or("/").to_string();
        r.redirect(&location, HttpStatus::SeeOther);
        Ok(Render::empty())
    }
}
