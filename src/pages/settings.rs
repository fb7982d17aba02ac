//! The user panel under `/settings`: account details, password change,
//! account deletion and the list of signed-in sessions.

use super::components;
use async_trait::async_trait;
use board_core::HttpStatus;
use board_render::{
    CommonContext, Composer, Page, PageError, PageTemplate, Render, Renderer, Request, Scope,
    Style, Templates,
};
use board_session::{Identity, Session, UserEditParams};
use handlebars::{Context, Handlebars, Helper, HelperResult, Output, RenderContext};
use serde::Serialize;
use std::sync::Arc;

pub const PAGE: &str = "cpanel";

pub fn register(composer: &mut Composer) -> board_render::Result<()> {
    composer.build_page(
        PAGE,
        Page::new(include_str!("templates/settings.hbs"))
            .with_component("nav", components::nav())
            .with_component("footer", components::footer())
            .with_style(Style::embedded(
                "pages/settings.css",
                include_str!("templates/settings.css"),
            ))
            .with_helper("device", device_helper),
    )?;
    Ok(())
}

/// Mount the panel and its form actions into `scope`.
pub fn mount(scope: &mut Scope<'_>, templates: &Templates) -> board_render::Result<()> {
    let panel = Panel {
        page: templates.page(PAGE)?,
    };

    scope
        .get("/", panel)
        .post("/sessions/:sessionID/delete", DeleteSession)
        .post("/users/@me/delete", DeleteMe)
        .post("/users/@me/change-password", ChangePassword);
    Ok(())
}

#[derive(Serialize)]
struct PanelContext<'a> {
    #[serde(flatten)]
    common: CommonContext<'a>,
    current: &'a Identity,
    permission: &'static str,
    is_admin: bool,
    sessions: &'a [Session],
}

struct Panel {
    page: Arc<PageTemplate>,
}

#[async_trait]
impl Renderer for Panel {
    async fn render(&self, r: &mut Request) -> Result<Render, PageError> {
        let current = r
            .me()
            .await
            .map_err(|err| err.context("Failed to get current user"))?;

        let sessions = r
            .session_mut()
            .sessions()
            .await
            .map_err(|err| PageError::from(err).context("Failed to get sessions"))?;

        let body = self.page.render(&PanelContext {
            common: r.common(),
            current: &current,
            permission: current.permission.as_str(),
            is_admin: current.is_admin(),
            sessions: &sessions,
        })?;

        Ok(Render::new(body).with_title("Settings"))
    }
}

struct DeleteSession;

#[async_trait]
impl Renderer for DeleteSession {
    async fn render(&self, r: &mut Request) -> Result<Render, PageError> {
        let id = r
            .id_param("sessionID")
            .map_err(|err| err.context("Failed to parse session ID"))?;

        r.session_mut().delete_session(id).await?;

        let back = back_to_settings(r);
        r.redirect(&back, HttpStatus::SeeOther);
        Ok(Render::empty())
    }
}

struct DeleteMe;

#[async_trait]
impl Renderer for DeleteMe {
    async fn render(&self, r: &mut Request) -> Result<Render, PageError> {
        r.session_mut()
            .delete_me()
            .await
            .map_err(|err| PageError::from(err).context("Failed to delete account"))?;

        r.redirect("/", HttpStatus::SeeOther);
        Ok(Render::empty())
    }
}

struct ChangePassword;

#[async_trait]
impl Renderer for ChangePassword {
    async fn render(&self, r: &mut Request) -> Result<Render, PageError> {
        let password = r.form_value("password")?;
        r.session_mut()
            .edit_me(&UserEditParams::password(password))
            .await?;

        let back = back_to_settings(r);
        r.redirect(&back, HttpStatus::SeeOther);
        Ok(Render::empty())
    }
}

fn back_to_settings(r: &Request) -> String {
    r.referer().unwrap_or("/settings").to_string()
}

/// Icon for the kind of device a session was opened from:
/// {{device user_agent}}
fn device_helper(
    h: &Helper,
    _: &Handlebars,
    _: &Context,
    _: &mut RenderContext,
    out: &mut dyn Output,
) -> HelperResult {
    let user_agent = h.param(0).and_then(|p| p.value().as_str()).unwrap_or("");
    out.write(device_icon(user_agent))?;
    Ok(())
}

fn device_icon(user_agent: &str) -> &'static str {
    let ua = user_agent.to_ascii_lowercase();

    if contains_any(&ua, &["bot", "crawler", "spider", "curl"]) {
        "🤖"
    } else if contains_any(&ua, &["mobile", "tablet", "ipad", "iphone", "android"]) {
        "📱"
    } else if contains_any(&ua, &["windows", "macintosh", "x11", "linux", "cros"]) {
        "🖥️"
    } else {
        "❓"
    }
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| haystack.contains(needle))
}
