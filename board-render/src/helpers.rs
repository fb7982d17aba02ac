//! Helpers available to every page template

use chrono::{DateTime, Utc};
use handlebars::{
    Context, Handlebars, Helper, HelperResult, Output, RenderContext, RenderError,
};

/// Register all built-in helpers
pub fn register_builtin_helpers(handlebars: &mut Handlebars) {
    handlebars.register_helper("datetime", Box::new(datetime_helper));
    handlebars.register_helper("default", Box::new(default_helper));
}

/// Unix nanoseconds as a UTC date: {{datetime session.created_at}}
fn datetime_helper(
    h: &Helper,
    _: &Handlebars,
    _: &Context,
    _: &mut RenderContext,
    out: &mut dyn Output,
) -> HelperResult {
    let nanos = h
        .param(0)
        .and_then(|p| p.value().as_i64())
        .ok_or_else(|| RenderError::new("datetime requires a Unix nanosecond timestamp"))?;

    let time = DateTime::<Utc>::from_timestamp_nanos(nanos);
    out.write(&time.format("%Y-%m-%d %H:%M UTC").to_string())?;
    Ok(())
}

/// First non-empty parameter: {{default description "No description"}}
fn default_helper(
    h: &Helper,
    _: &Handlebars,
    _: &Context,
    _: &mut RenderContext,
    out: &mut dyn Output,
) -> HelperResult {
    let value = h.params().iter().find_map(|p| match p.value() {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) if s.is_empty() => None,
        serde_json::Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    });

    if let Some(value) = value {
        out.write(&handlebars::html_escape(&value))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn registry() -> Handlebars<'static> {
        let mut hb = Handlebars::new();
        register_builtin_helpers(&mut hb);
        hb
    }

    #[test]
    fn test_datetime_helper() {
        let out = registry()
            .render_template("{{datetime t}}", &json!({"t": 1_600_000_000_000_000_000i64}))
            .unwrap();
        assert_eq!(out, "2020-09-13 12:26 UTC");
    }

    #[test]
    fn test_datetime_requires_number() {
        assert!(registry().render_template("{{datetime t}}", &json!({"t": "x"})).is_err());
    }

    #[test]
    fn test_default_helper() {
        let hb = registry();
        assert_eq!(
            hb.render_template("{{default a \"none\"}}", &json!({"a": ""})).unwrap(),
            "none"
        );
        assert_eq!(
            hb.render_template("{{default a \"none\"}}", &json!({"a": "<b>"})).unwrap(),
            "&lt;b&gt;"
        );
    }
}
