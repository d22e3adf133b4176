//! # Render Module
//!
//! Turns an action [`Payload`] into body bytes and a content type.
//!
//! [`PlainRenderer`] serializes payloads directly. [`TemplateRenderer`] looks
//! for `{template_root}/{template}.html` and renders it with `minijinja`,
//! deferring to a fallback renderer when the controller has no template.

use crate::controller::Payload;
use crate::dispatcher::{Body, Request};
use crate::error::RenderError;
use minijinja::Environment;
use serde_json::{json, Map, Value};
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

/// Everything a renderer knows about the action being rendered.
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    pub request: &'a Request,
    pub controller: &'a str,
    pub action: &'a str,
    pub args: &'a [String],
    pub path: &'a str,
    /// Template name: the action name unless an alias applies.
    pub template: &'a str,
    /// Root to look the template up in, if the (aliased) controller has one.
    pub template_root: Option<&'a Path>,
    /// Content type for text payloads.
    pub default_content_type: &'a str,
}

impl RenderContext<'_> {
    fn error(&self, message: impl Into<String>) -> RenderError {
        RenderError {
            controller: self.controller.to_string(),
            action: self.action.to_string(),
            message: message.into(),
        }
    }
}

/// Output of a renderer.
#[derive(Debug)]
pub struct Rendered {
    pub content_type: String,
    pub body: Body,
}

pub trait Renderer: Send + Sync {
    /// Render `payload`.
    ///
    /// # Errors
    ///
    /// A [`RenderError`] is turned into a 500 by the dispatcher.
    fn render(&self, ctx: &RenderContext<'_>, payload: Payload) -> Result<Rendered, RenderError>;
}

/// Serializes payloads without templates.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainRenderer;

impl Renderer for PlainRenderer {
    fn render(&self, ctx: &RenderContext<'_>, payload: Payload) -> Result<Rendered, RenderError> {
        let (content_type, body) = match payload {
            Payload::Text(text) => (ctx.default_content_type, Body::Buffered(text.into_bytes())),
            Payload::Bytes(bytes) => ("application/octet-stream", Body::Buffered(bytes)),
            Payload::Json(value) => (
                "application/json",
                Body::Buffered(
                    serde_json::to_vec(&value).map_err(|e| ctx.error(e.to_string()))?,
                ),
            ),
            Payload::Stream(chunks) => (ctx.default_content_type, Body::Stream(chunks)),
            other => return Err(ctx.error(format!("{other:?} is not renderable"))),
        };
        Ok(Rendered {
            content_type: content_type.to_string(),
            body,
        })
    }
}

/// Renders `{template_root}/{template}.html` when it exists.
pub struct TemplateRenderer {
    fallback: Box<dyn Renderer>,
}

impl Default for TemplateRenderer {
    fn default() -> Self {
        Self::new(PlainRenderer)
    }
}

impl TemplateRenderer {
    pub fn new(fallback: impl Renderer + 'static) -> Self {
        Self {
            fallback: Box::new(fallback),
        }
    }

    fn template_path(root: &Path, template: &str) -> Option<PathBuf> {
        let file = format!("{}.html", template.trim_start_matches('/'));
        let mut pb = root.to_path_buf();
        for comp in Path::new(&file).components() {
            match comp {
                Component::Normal(s) => pb.push(s),
                Component::CurDir => {}
                _ => return None,
            }
        }
        pb.is_file().then_some(pb)
    }

    fn context_value(ctx: &RenderContext<'_>, payload: &Payload) -> Value {
        let content = match payload {
            Payload::Text(s) => Value::String(s.clone()),
            Payload::Json(v) => v.clone(),
            Payload::Bytes(b) => Value::String(String::from_utf8_lossy(b).into_owned()),
            _ => Value::Null,
        };
        let mut map = Map::new();
        if let Value::Object(fields) = &content {
            map.extend(fields.clone());
        }
        map.insert("content".into(), content);
        map.insert("args".into(), json!(ctx.args));
        map.insert("action".into(), json!(ctx.action));
        map.insert("controller".into(), json!(ctx.controller));
        map.insert("path".into(), json!(ctx.path));
        Value::Object(map)
    }
}

impl Renderer for TemplateRenderer {
    fn render(&self, ctx: &RenderContext<'_>, payload: Payload) -> Result<Rendered, RenderError> {
        let path = match ctx.template_root {
            Some(root) if matches!(payload, Payload::Text(_) | Payload::Json(_) | Payload::Bytes(_)) => {
                Self::template_path(root, ctx.template)
            }
            _ => None,
        };
        let Some(path) = path else {
            return self.fallback.render(ctx, payload);
        };

        debug!(
            controller = %ctx.controller,
            action = %ctx.action,
            template = %path.display(),
            "Rendering template"
        );
        let source = fs::read_to_string(&path).map_err(|e| ctx.error(e.to_string()))?;
        // The `.html` name turns on minijinja's HTML auto-escaping.
        let mut env = Environment::new();
        env.add_template("page.html", &source)
            .map_err(|e| ctx.error(e.to_string()))?;
        let tmpl = env
            .get_template("page.html")
            .map_err(|e| ctx.error(e.to_string()))?;
        let rendered = tmpl
            .render(Self::context_value(ctx, &payload))
            .map_err(|e| ctx.error(e.to_string()))?;
        Ok(Rendered {
            content_type: "text/html".to_string(),
            body: Body::Buffered(rendered.into_bytes()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn ctx<'a>(req: &'a Request, root: Option<&'a Path>, args: &'a [String]) -> RenderContext<'a> {
        RenderContext {
            request: req,
            controller: "MainController",
            action: "index",
            args,
            path: "/",
            template: "index",
            template_root: root,
            default_content_type: "text/html",
        }
    }

    #[test]
    fn test_plain_content_types() {
        let req = Request::get("/");
        let c = ctx(&req, None, &[]);
        let r = PlainRenderer.render(&c, Payload::from("hi")).unwrap();
        assert_eq!(r.content_type, "text/html");
        assert_eq!(r.body.into_bytes(), b"hi");
        let r = PlainRenderer.render(&c, Payload::from(json!({"a": 1}))).unwrap();
        assert_eq!(r.content_type, "application/json");
        assert_eq!(r.body.into_bytes(), br#"{"a":1}"#);
        let r = PlainRenderer.render(&c, Payload::from(vec![0u8, 1])).unwrap();
        assert_eq!(r.content_type, "application/octet-stream");
    }

    #[test]
    fn test_plain_rejects_reroute() {
        let req = Request::get("/");
        let c = ctx(&req, None, &[]);
        assert!(PlainRenderer
            .render(&c, Payload::Reroute("/x".into()))
            .is_err());
    }

    #[test]
    fn test_template_renders_context() {
        let dir = tempfile::tempdir().unwrap();
        let mut f = fs::File::create(dir.path().join("index.html")).unwrap();
        write!(f, "<p>{{{{ content }}}} from {{{{ controller }}}} {{{{ args[0] }}}}</p>").unwrap();

        let req = Request::get("/");
        let args = vec!["7".to_string()];
        let c = ctx(&req, Some(dir.path()), &args);
        let r = TemplateRenderer::default()
            .render(&c, Payload::from("Hi"))
            .unwrap();
        assert_eq!(r.content_type, "text/html");
        assert_eq!(r.body.into_bytes(), b"<p>Hi from MainController 7</p>");
    }

    #[test]
    fn test_template_merges_json_fields() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("index.html"), "{{ name }}!").unwrap();
        let req = Request::get("/");
        let c = ctx(&req, Some(dir.path()), &[]);
        let r = TemplateRenderer::default()
            .render(&c, Payload::from(json!({"name": "ada"})))
            .unwrap();
        assert_eq!(r.body.into_bytes(), b"ada!");
    }

    #[test]
    fn test_template_escapes_content() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("index.html"), "<p>{{ content }}</p>").unwrap();
        let req = Request::get("/");
        let c = ctx(&req, Some(dir.path()), &[]);
        let r = TemplateRenderer::default()
            .render(&c, Payload::from("<i>x</i>"))
            .unwrap();
        let body = String::from_utf8(r.body.into_bytes()).unwrap();
        assert!(body.starts_with("<p>&lt;i&gt;x&lt;"), "{body}");
        assert!(!body.contains("<i>"), "{body}");
    }

    #[test]
    fn test_missing_template_uses_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let req = Request::get("/");
        let c = ctx(&req, Some(dir.path()), &[]);
        let r = TemplateRenderer::default()
            .render(&c, Payload::from("plain"))
            .unwrap();
        assert_eq!(r.body.into_bytes(), b"plain");
    }

    #[test]
    fn test_template_path_prevents_traversal() {
        let dir = tempfile::tempdir().unwrap();
        assert!(TemplateRenderer::template_path(dir.path(), "../etc/passwd").is_none());
    }
}
