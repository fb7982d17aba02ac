//! Fragments shared between pages

use board_render::{Component, Style};

pub fn nav() -> Component {
    Component::new(include_str!("components/nav.hbs"))
        .with_style(Style::embedded("components/nav.css", include_str!("components/nav.css")))
}

/// Site name and the theme picker.
pub fn footer() -> Component {
    Component::new(include_str!("components/footer.hbs")).with_style(Style::embedded(
        "components/footer.css",
        include_str!("components/footer.css"),
    ))
}

pub fn search() -> Component {
    Component::new(include_str!("components/search.hbs")).with_style(Style::embedded(
        "components/search.css",
        include_str!("components/search.css"),
    ))
}
