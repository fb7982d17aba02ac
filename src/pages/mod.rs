//! The pages bundled with the frontend

mod components;
pub mod error;
pub mod home;
pub mod settings;
pub mod signout;

use board_render::{Composer, Mux, Templates};

/// Build every bundled page. Run once, before serving.
pub fn register(composer: &mut Composer) -> board_render::Result<()> {
    home::register(composer)?;
    settings::register(composer)?;
    error::register(composer)?;
    Ok(())
}

/// Route every bundled page and install the error page.
pub fn mount(mux: &mut Mux, templates: &Templates) -> board_render::Result<()> {
    mux.get("/", home::Home::new(templates)?)
        .post("/signout", signout::SignOut)
        .set_error_renderer(error::ErrorPage::new(templates)?);

    let mut mounted = Ok(());
    mux.scope("/settings", |scope| {
        mounted = settings::mount(scope, templates);
    });
    mounted
}
