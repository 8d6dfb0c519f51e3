//! Template rendering for prompt messages.
//!
//! One entry point, [`render`], dispatches on the message's
//! [`TemplateEngine`]:
//!
//! - `none`: content verbatim.
//! - `eex`: `<%= @name %>` output tags, `<%# ... %>` comments and `<%%`
//!   escapes. Assigns may be dotted (`@user.name`). Code blocks are not
//!   evaluated and are rejected.
//! - `liquid`: full Liquid with the standard filter library.
//! - `handlebars`: Handlebars with HTML escaping disabled.

use std::sync::LazyLock;

use handlebars::Handlebars;
use serde_json::{Map, Value};
use tracing::warn;

use crate::message::TemplateEngine;

/// Template parameters, keyed by name.
pub type Params = Map<String, Value>;

static HANDLEBARS: LazyLock<Handlebars<'static>> = LazyLock::new(|| {
    let mut handlebars = Handlebars::new();
    handlebars.set_strict_mode(false);
    handlebars.register_escape_fn(handlebars::no_escape);
    handlebars
});

static LIQUID: LazyLock<Result<liquid::Parser, String>> = LazyLock::new(|| {
    liquid::ParserBuilder::with_stdlib()
        .build()
        .map_err(|e| e.to_string())
});

/// Render `source` with `engine` against `params`.
///
/// Errors carry the engine's message and are wrapped by the caller with the
/// failing message's position.
pub fn render(engine: TemplateEngine, source: &str, params: &Params) -> Result<String, String> {
    match engine {
        TemplateEngine::None => Ok(source.to_string()),
        TemplateEngine::Eex => render_eex(source, params),
        TemplateEngine::Liquid => render_liquid(source, params),
        TemplateEngine::Handlebars => HANDLEBARS
            .render_template(source, params)
            .map_err(|e| e.to_string()),
    }
}

fn render_liquid(source: &str, params: &Params) -> Result<String, String> {
    let parser = LIQUID.as_ref().map_err(Clone::clone)?;
    let template = parser.parse(source).map_err(|e| e.to_string())?;
    let globals = liquid::model::to_object(params).map_err(|e| e.to_string())?;
    template.render(&globals).map_err(|e| e.to_string())
}

// ---------------------------------------------------------------------------
// EEx-style embedded expressions
// ---------------------------------------------------------------------------

fn render_eex(source: &str, params: &Params) -> Result<String, String> {
    let mut out = String::with_capacity(source.len());
    let mut rest = source;

    while let Some(start) = rest.find("<%") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];

        if let Some(escaped) = after.strip_prefix('%') {
            out.push_str("<%");
            rest = escaped;
            continue;
        }

        let end = after
            .find("%>")
            .ok_or_else(|| format!("missing closing '%>' for tag at byte {start}"))?;
        let tag = &after[..end];
        rest = &after[end + 2..];

        if let Some(expr) = tag.strip_prefix('=') {
            out.push_str(&eval_assign(expr.trim(), params)?);
        } else if tag.starts_with('#') {
            // comment
        } else {
            return Err(format!("unsupported code block '<%{tag}%>'"));
        }
    }

    out.push_str(rest);
    Ok(out)
}

fn eval_assign(expr: &str, params: &Params) -> Result<String, String> {
    let path = expr
        .strip_prefix('@')
        .ok_or_else(|| format!("unsupported expression '{expr}', expected @assign"))?;

    let mut segments = path.split('.');
    let head = segments.next().unwrap_or_default();
    if head.is_empty() || !segments.clone().all(|s| !s.is_empty()) {
        return Err(format!("malformed assign '{expr}'"));
    }

    let Some(mut value) = params.get(head) else {
        warn!(assign = head, "assign not available in eex template");
        return Ok(String::new());
    };
    for segment in segments {
        match value.get(segment) {
            Some(next) => value = next,
            None => return Ok(String::new()),
        }
    }

    Ok(display(value))
}

fn display(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(value: Value) -> Params {
        match value {
            Value::Object(map) => map,
            _ => panic!("params must be an object"),
        }
    }

    #[test]
    fn none_is_verbatim() {
        let p = params(json!({"name": "Alice"}));
        assert_eq!(
            render(TemplateEngine::None, "Hello <%= @name %> {{name}}", &p),
            Ok("Hello <%= @name %> {{name}}".to_string())
        );
    }

    #[test]
    fn eex_substitutes_assigns() {
        let p = params(json!({"name": "Alice", "n": 3, "user": {"city": "Oslo"}}));
        assert_eq!(
            render(TemplateEngine::Eex, "Hello <%= @name %>, <%=@n%> in <%= @user.city %>", &p),
            Ok("Hello Alice, 3 in Oslo".to_string())
        );
    }

    #[test]
    fn eex_comments_escapes_and_missing_assigns() {
        let p = params(json!({}));
        assert_eq!(
            render(TemplateEngine::Eex, "a<%# note %>b <%% literal <%= @missing %>!", &p),
            Ok("ab <% literal !".to_string())
        );
    }

    #[test]
    fn eex_rejects_malformed_tags() {
        let p = params(json!({"name": "x"}));
        assert!(render(TemplateEngine::Eex, "Hello <%= @name", &p).is_err());
        assert!(render(TemplateEngine::Eex, "<% if true do %>x<% end %>", &p).is_err());
        assert!(render(TemplateEngine::Eex, "<%= name %>", &p).is_err());
        assert!(render(TemplateEngine::Eex, "<%= @name. %>", &p).is_err());
    }

    #[test]
    fn liquid_renders_with_filters() {
        let p = params(json!({"name": "alice", "items": ["a", "b"]}));
        assert_eq!(
            render(
                TemplateEngine::Liquid,
                "Hi {{ name | upcase }}{% for i in items %} {{ i }}{% endfor %}",
                &p
            ),
            Ok("Hi ALICE a b".to_string())
        );
    }

    #[test]
    fn shared_liquid_parser_renders_repeatedly() {
        assert!(LIQUID.is_ok());
        let p = params(json!({"n": 1}));
        for _ in 0..3 {
            assert_eq!(
                render(TemplateEngine::Liquid, "{{ n | plus: 1 }}", &p),
                Ok("2".to_string())
            );
        }
    }

    #[test]
    fn liquid_reports_syntax_errors() {
        let p = params(json!({}));
        assert!(render(TemplateEngine::Liquid, "{% if %}", &p).is_err());
    }

    #[test]
    fn handlebars_does_not_escape_html() {
        let p = params(json!({"code": "<b>&</b>"}));
        assert_eq!(
            render(TemplateEngine::Handlebars, "Code: {{code}}", &p),
            Ok("Code: <b>&</b>".to_string())
        );
        assert!(render(TemplateEngine::Handlebars, "{{#if x}}", &p).is_err());
    }
}
