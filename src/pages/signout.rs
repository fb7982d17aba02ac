//! `POST /signout`

use async_trait::async_trait;
use board_core::HttpStatus;
use board_render::{PageError, Render, Renderer, Request};

pub struct SignOut;

#[async_trait]
impl Renderer for SignOut {
    async fn render(&self, r: &mut Request) -> Result<Render, PageError> {
        r.session_mut()
            .sign_out()
            .await
            .map_err(|err| PageError::from(err).context("Failed to sign out"))?;

        r.redirect("/", HttpStatus::SeeOther);
        Ok(Render::empty())
    }
}
