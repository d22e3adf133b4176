//! End-to-end dispatch tests: rewrite, resolution, invocation, rendering and
//! error recovery, driven through [`Dispatcher::dispatch`] without a socket.

use serde_json::json;
use std::sync::Arc;
use switchyard::controller::{Controller, Payload};
use switchyard::dispatcher::{DispatchConfig, Dispatcher, Request, Response};
use switchyard::error::{ActionError, RenderError};
use switchyard::registry::ControllerRegistry;
use switchyard::render::{PlainRenderer, RenderContext, Rendered, Renderer, TemplateRenderer};
use switchyard::route::RouteTable;

fn app(routes: RouteTable, controllers: Vec<Controller>) -> Dispatcher {
    let registry = ControllerRegistry::new();
    for c in controllers {
        registry.register(c);
    }
    registry.resolve_mount_table();
    Dispatcher::new(routes, Arc::new(registry))
}

fn main_controller() -> Controller {
    Controller::builder("MainController")
        .action("index", |_| Ok(Payload::from("Hello, World!")))
        .build()
}

#[test]
fn test_hello_world() {
    let d = app(RouteTable::new(), vec![main_controller()]);
    let resp = d.dispatch(Request::get("/"));
    assert_eq!(resp.status, 200);
    assert_eq!(resp.content_type, "text/html");
    assert_eq!(resp.body_text(), "Hello, World!");
}

#[test]
fn test_unknown_path_is_404_fallback() {
    let d = app(
        RouteTable::new(),
        vec![Controller::builder("UsersController")
            .action("list", |_| Ok(Payload::from("users")))
            .build()],
    );
    let resp = d.dispatch(Request::get("/nowhere"));
    assert_eq!(resp.status, 404);
    assert_eq!(resp.body_text(), "404 Not Found");
}

#[test]
fn test_action_args_and_params() {
    let d = app(
        RouteTable::new(),
        vec![Controller::builder("BlogController")
            .action_with_arity("view", 1, Some(1), |ctx| {
                let who = ctx.param("by").unwrap_or("anon");
                Ok(format!("post {} by {who}", ctx.arg(0).unwrap_or_default()).into())
            })
            .build()],
    );
    let resp = d.dispatch(Request::get("/blog/view/7").with_query("by", "kim"));
    assert_eq!(resp.body_text(), "post 7 by kim");
    assert_eq!(d.dispatch(Request::get("/blog/view")).status, 404);
    assert_eq!(d.dispatch(Request::get("/blog/view/1/2")).status, 404);
}

#[test]
fn test_pattern_rewrite_feeds_resolution() {
    let mut routes = RouteTable::new();
    routes.pattern(r"^/(\w+)\.te?xt$", "/text/%s").unwrap();
    let d = app(
        routes,
        vec![Controller::builder("TextController")
            .action("index", |ctx| Ok(ctx.args.join("/").into()))
            .build()],
    );
    let resp = d.dispatch(Request::get("/notes.txt"));
    assert_eq!(resp.status, 200);
    assert_eq!(resp.body_text(), "notes");
}

#[test]
fn test_integer_directive_on_word_is_500() {
    let mut routes = RouteTable::new();
    routes.pattern(r"^/(\w+)\.txt$", "/text/%d").unwrap();
    let d = app(routes, vec![main_controller()]);
    let resp = d.dispatch(Request::get("/abc.txt"));
    assert_eq!(resp.status, 500);
}

#[test]
fn test_panic_and_error_become_500() {
    let d = app(
        RouteTable::new(),
        vec![Controller::builder("MainController")
            .action("boom", |_| panic!("kaboom"))
            .action("bad", |_| Err(ActionError::new("bad input")))
            .build()],
    );
    assert_eq!(d.dispatch(Request::get("/boom")).status, 500);
    assert_eq!(d.dispatch(Request::get("/bad")).status, 500);
    // Still serving after a panic
    assert_eq!(d.dispatch(Request::get("/boom")).body_text(), "500 Internal Server Error");
}

#[test]
fn test_error_path_renders_failure_with_status() {
    let d = app(
        RouteTable::new(),
        vec![Controller::builder("ErrorController")
            .map("/error")
            .action("index", |ctx| {
                let f = ctx.failure.expect("failure is set for the error path");
                Ok(format!("oops {}", f.status).into())
            })
            .build()],
    )
    .with_config(DispatchConfig {
        error_path: Some("/error".into()),
        ..DispatchConfig::default()
    });
    let resp = d.dispatch(Request::get("/missing/thing"));
    assert_eq!(resp.status, 404);
    assert_eq!(resp.body_text(), "oops 404");
}

#[test]
fn test_failing_error_path_falls_back() {
    let d = app(
        RouteTable::new(),
        vec![Controller::builder("ErrorController")
            .map("/error")
            .action("index", |_| panic!("error page broke"))
            .build()],
    )
    .with_config(DispatchConfig {
        error_path: Some("/error".into()),
        ..DispatchConfig::default()
    });
    let resp = d.dispatch(Request::get("/error/nothing/here"));
    assert_eq!(resp.status, 500);
}

#[test]
fn test_response_payload_passes_through() {
    let d = app(
        RouteTable::new(),
        vec![Controller::builder("MainController")
            .action("old", |_| {
                Ok(Response::text(302, "moved").with_header("Location", "/new").into())
            })
            .build()],
    );
    let resp = d.dispatch(Request::get("/old"));
    assert_eq!(resp.status, 302);
    assert_eq!(resp.get_header("location"), Some("/new"));
}

#[test]
fn test_json_payload() {
    let d = app(
        RouteTable::new(),
        vec![Controller::builder("ApiController")
            .action("status", |_| Ok(json!({"ok": true}).into()))
            .build()],
    );
    let resp = d.dispatch(Request::get("/api/status"));
    assert_eq!(resp.content_type, "application/json");
    assert_eq!(resp.body_text(), r#"{"ok":true}"#);
}

#[test]
fn test_template_alias_renders_other_controllers_template() {
    let dir = tempfile::tempdir().unwrap();
    let shared = dir.path().join("shared");
    std::fs::create_dir(&shared).unwrap();
    std::fs::write(shared.join("page.html"), "<p>{{ controller }}: {{ content }}</p>").unwrap();

    let d = app(
        RouteTable::new(),
        vec![
            Controller::builder("SharedController")
                .template_root(&shared)
                .action("page", |_| Ok("shared".into()))
                .build(),
            Controller::builder("ShopController")
                .template_from("index", "SharedController", "page")
                .action("index", |_| Ok("welcome".into()))
                .build(),
        ],
    )
    .with_renderer(Arc::new(TemplateRenderer::default()));

    let resp = d.dispatch(Request::get("/shop"));
    assert_eq!(resp.status, 200);
    assert_eq!(resp.body_text(), "<p>ShopController: welcome</p>");
}

/// Fails for the `broken` action only.
struct RefusingRenderer;

impl Renderer for RefusingRenderer {
    fn render(&self, ctx: &RenderContext<'_>, payload: Payload) -> Result<Rendered, RenderError> {
        if ctx.action == "broken" {
            return Err(RenderError {
                controller: ctx.controller.to_string(),
                action: ctx.action.to_string(),
                message: "refused".into(),
            });
        }
        PlainRenderer.render(ctx, payload)
    }
}

fn error_controller() -> Controller {
    Controller::builder("ErrorController")
        .map("/error")
        .action("index", |ctx| {
            let f = ctx.failure.expect("failure is set for the error path");
            Ok(format!("{} {}", f.status, f.message).into())
        })
        .build()
}

#[test]
fn test_render_error_is_500() {
    let d = app(
        RouteTable::new(),
        vec![Controller::builder("PagesController")
            .action("broken", |_| Ok("never shown".into()))
            .build()],
    )
    .with_renderer(Arc::new(RefusingRenderer));

    let resp = d.dispatch(Request::get("/pages/broken"));
    assert_eq!(resp.status, 500);
    assert!(!resp.body_text().contains("never shown"));
}

#[test]
fn test_render_error_reaches_error_path() {
    let d = app(
        RouteTable::new(),
        vec![
            Controller::builder("PagesController")
                .action("broken", |_| Ok("never shown".into()))
                .build(),
            error_controller(),
        ],
    )
    .with_renderer(Arc::new(RefusingRenderer))
    .with_config(DispatchConfig {
        error_path: Some("/error".into()),
        ..DispatchConfig::default()
    });

    let resp = d.dispatch(Request::get("/pages/broken"));
    assert_eq!(resp.status, 500);
    assert_eq!(
        resp.body_text(),
        "500 render of PagesController#broken failed: refused"
    );
}

#[test]
fn test_template_syntax_error_reaches_error_path() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("index.html"), "<p>{{ content </p>").unwrap();

    let d = app(
        RouteTable::new(),
        vec![
            Controller::builder("ShopController")
                .template_root(dir.path())
                .action("index", |_| Ok("welcome".into()))
                .build(),
            error_controller(),
        ],
    )
    .with_renderer(Arc::new(TemplateRenderer::default()))
    .with_config(DispatchConfig {
        error_path: Some("/error".into()),
        ..DispatchConfig::default()
    });

    let resp = d.dispatch(Request::get("/shop"));
    assert_eq!(resp.status, 500);
    assert!(
        resp.body_text().starts_with("500 render of ShopController#index failed"),
        "{}",
        resp.body_text()
    );
}

#[test]
fn test_template_alias_to_unknown_controller_uses_own_root() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("page.html"), "<b>{{ content }}</b>").unwrap();

    let d = app(
        RouteTable::new(),
        vec![Controller::builder("ShopController")
            .template_root(dir.path())
            .template_from("index", "GhostController", "page")
            .action("index", |_| Ok("own".into()))
            .build()],
    )
    .with_renderer(Arc::new(TemplateRenderer::default()));

    let resp = d.dispatch(Request::get("/shop"));
    assert_eq!(resp.status, 200);
    assert_eq!(resp.body_text(), "<b>own</b>");
}

#[test]
fn test_request_id_survives_reroute_and_error_path() {
    let d = app(
        RouteTable::new(),
        vec![
            Controller::builder("HopController")
                .action("start", |_| Ok(Payload::Reroute("/hop/land".into())))
                .action("land", |ctx| Ok(ctx.request_id().to_string().into()))
                .action("fail", |_| Err(ActionError::new("nope")))
                .build(),
            Controller::builder("ErrorController")
                .map("/error")
                .action("index", |ctx| Ok(ctx.request_id().to_string().into()))
                .build(),
        ],
    )
    .with_config(DispatchConfig {
        error_path: Some("/error".into()),
        ..DispatchConfig::default()
    });

    let req = Request::get("/hop/start");
    let id = req.request_id.to_string();
    assert_eq!(d.dispatch(req).body_text(), id);

    let req = Request::get("/hop/fail");
    let id = req.request_id.to_string();
    let resp = d.dispatch(req);
    assert_eq!(resp.status, 500);
    assert_eq!(resp.body_text(), id);
}
