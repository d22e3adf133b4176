use super::request::{HeaderVec, Request};
use super::response::Response;
use crate::controller::{ActionContext, Failure, Payload};
use crate::error::{ActionError, DispatchError, ResolveError};
use crate::registry::ControllerRegistry;
use crate::render::{PlainRenderer, RenderContext, Renderer};
use crate::resolver::{Resolved, Resolver};
use crate::route::RouteTable;
use arc_swap::ArcSwap;
use std::any::Any;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Default bound on nested [`Payload::Reroute`] hops.
pub const DEFAULT_MAX_REROUTE_DEPTH: usize = 8;

/// Lifecycle stage of one dispatch, as reported in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Received,
    Routed,
    Resolved,
    Invoked,
    Rendered,
    Responded,
    Error,
}

impl Stage {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Received => "RECEIVED",
            Stage::Routed => "ROUTED",
            Stage::Resolved => "RESOLVED",
            Stage::Invoked => "INVOKED",
            Stage::Rendered => "RENDERED",
            Stage::Responded => "RESPONDED",
            Stage::Error => "ERROR",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Dispatch tuning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchConfig {
    /// Content type for text payloads.
    pub default_content_type: String,
    /// Path dispatched to render failures; `None` uses the built-in fallback.
    pub error_path: Option<String>,
    pub max_reroute_depth: usize,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            default_content_type: "text/html".to_string(),
            error_path: None,
            max_reroute_depth: DEFAULT_MAX_REROUTE_DEPTH,
        }
    }
}

/// Runs a request through rewrite, resolution, invocation and rendering.
///
/// `dispatch` never fails and never panics outward: every error ends up as a
/// response, rendered by the configured error path when there is one.
pub struct Dispatcher {
    routes: ArcSwap<RouteTable>,
    resolver: Resolver,
    renderer: Arc<dyn Renderer>,
    config: DispatchConfig,
}

impl Dispatcher {
    #[must_use]
    pub fn new(routes: RouteTable, registry: Arc<ControllerRegistry>) -> Self {
        Self {
            routes: ArcSwap::from_pointee(routes),
            resolver: Resolver::new(registry),
            renderer: Arc::new(PlainRenderer),
            config: DispatchConfig::default(),
        }
    }

    #[must_use]
    pub fn with_renderer(mut self, renderer: Arc<dyn Renderer>) -> Self {
        self.renderer = renderer;
        self
    }

    #[must_use]
    pub fn with_config(mut self, config: DispatchConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    #[must_use]
    pub fn registry(&self) -> &Arc<ControllerRegistry> {
        self.resolver.registry()
    }

    /// Route table currently in effect.
    #[must_use]
    pub fn routes(&self) -> Arc<RouteTable> {
        self.routes.load_full()
    }

    /// Swap in a new route table. Requests already past rewriting keep the old one.
    pub fn replace_routes(&self, routes: RouteTable) {
        let count = routes.len();
        self.routes.store(Arc::new(routes));
        info!(routes = count, "Route table replaced");
    }

    /// Handle one request end to end.
    #[must_use]
    pub fn dispatch(&self, request: Request) -> Response {
        let start = Instant::now();

        // D1: Request received
        debug!(
            request_id = %request.request_id,
            method = %request.method,
            path = %request.path,
            stage = %Stage::Received,
            "Request received"
        );

        let outcome = catch_unwind(AssertUnwindSafe(|| self.run(&request)))
            .unwrap_or_else(|panic| {
                Err(DispatchError::Action {
                    controller: String::new(),
                    action: String::new(),
                    source: ActionError::new(panic_message(panic.as_ref())),
                })
            });

        let response = match outcome {
            Ok(response) => response,
            Err(err) => self.recover(&request, err),
        };

        // D6: Response complete
        info!(
            request_id = %request.request_id,
            path = %request.path,
            status = response.status,
            stage = %Stage::Responded,
            duration_us = start.elapsed().as_micros() as u64,
            "Request dispatched"
        );
        response
    }

    fn run(&self, request: &Request) -> Result<Response, DispatchError> {
        let path = self.routes.load().apply(&request.path, request)?;

        // D2: Route rewrite complete
        debug!(
            request_id = %request.request_id,
            from = %request.path,
            path = %path,
            stage = %Stage::Routed,
            "Request routed"
        );

        self.handle(request, &path, None, 0)
    }

    /// Resolve, invoke and render `path`. Reroutes recurse with `depth + 1`.
    fn handle(
        &self,
        request: &Request,
        path: &str,
        failure: Option<&Failure>,
        depth: usize,
    ) -> Result<Response, DispatchError> {
        let resolved = self.resolver.resolve(path)?;
        let Resolved {
            controller,
            action,
            args,
            ..
        } = &resolved;

        // D3: Controller/action resolved
        debug!(
            request_id = %request.request_id,
            path = %path,
            controller = %controller.name(),
            action = %action,
            args = ?args,
            stage = %Stage::Resolved,
            "Action resolved"
        );

        let Some(handler) = controller.action(action) else {
            return Err(DispatchError::NotFound(ResolveError::NotFound {
                path: path.to_string(),
            }));
        };

        let ctx = ActionContext {
            request,
            controller: controller.name(),
            action,
            args,
            path,
            failure,
        };
        let start = Instant::now();
        let payload = catch_unwind(AssertUnwindSafe(|| handler.call(&ctx)))
            .unwrap_or_else(|panic| {
                // D7: Action panicked
                error!(
                    request_id = %request.request_id,
                    controller = %controller.name(),
                    action = %action,
                    panic_message = %panic_message(panic.as_ref()),
                    "Action panicked"
                );
                Err(ActionError::new(panic_message(panic.as_ref())))
            })
            .map_err(|source| DispatchError::Action {
                controller: controller.name().to_string(),
                action: action.clone(),
                source,
            })?;

        // D4: Action returned
        debug!(
            request_id = %request.request_id,
            controller = %controller.name(),
            action = %action,
            payload = ?payload,
            stage = %Stage::Invoked,
            duration_us = start.elapsed().as_micros() as u64,
            "Action invoked"
        );

        let status = failure.map_or(200, |f| f.status);
        match payload {
            Payload::Response(response) => Ok(response),
            Payload::Reroute(next) => {
                if depth >= self.config.max_reroute_depth {
                    return Err(DispatchError::RerouteLimit {
                        path: next,
                        limit: self.config.max_reroute_depth,
                    });
                }
                debug!(
                    request_id = %request.request_id,
                    from = %path,
                    to = %next,
                    depth = depth + 1,
                    "Rerouting"
                );
                self.handle(request, &next, failure, depth + 1)
            }
            payload => {
                let (template_owner, template) = match controller.template_for(action) {
                    Some(alias) => {
                        let owner = alias.controller.as_deref().and_then(|name| {
                            let found = self.registry().controller(name);
                            if found.is_none() {
                                // D9: Template alias owner missing
                                warn!(
                                    request_id = %request.request_id,
                                    controller = %controller.name(),
                                    action = %action,
                                    alias_controller = %name,
                                    "Template alias names an unregistered controller - using own template root"
                                );
                            }
                            found
                        });
                        (owner, alias.template.as_str())
                    }
                    None => (None, action.as_str()),
                };
                let template_root = template_owner
                    .as_deref()
                    .unwrap_or(&**controller)
                    .template_root();

                let render_ctx = RenderContext {
                    request,
                    controller: controller.name(),
                    action,
                    args,
                    path,
                    template,
                    template_root,
                    default_content_type: &self.config.default_content_type,
                };
                let rendered = self.renderer.render(&render_ctx, payload)?;

                // D5: Payload rendered
                debug!(
                    request_id = %request.request_id,
                    controller = %controller.name(),
                    action = %action,
                    content_type = %rendered.content_type,
                    stage = %Stage::Rendered,
                    "Payload rendered"
                );

                Ok(Response {
                    status,
                    headers: HeaderVec::new(),
                    content_type: rendered.content_type,
                    body: rendered.body,
                })
            }
        }
    }

    /// ERROR stage: run the error path if configured, else the fallback.
    fn recover(&self, request: &Request, err: DispatchError) -> Response {
        let status = err.status();
        if status >= 500 {
            error!(
                request_id = %request.request_id,
                path = %request.path,
                status,
                error = %err,
                stage = %Stage::Error,
                "Dispatch failed"
            );
        } else {
            warn!(
                request_id = %request.request_id,
                path = %request.path,
                status,
                error = %err,
                stage = %Stage::Error,
                "Dispatch failed"
            );
        }

        let Some(error_path) = &self.config.error_path else {
            return Response::fallback(status);
        };

        let failure = Failure {
            status,
            message: err.to_string(),
        };
        let handled = catch_unwind(AssertUnwindSafe(|| {
            self.handle(request, error_path, Some(&failure), 0)
        }));
        match handled {
            Ok(Ok(response)) => response,
            Ok(Err(handler_err)) => {
                // D8: Error handler failed
                error!(
                    request_id = %request.request_id,
                    error_path = %error_path,
                    error = %handler_err,
                    "Error handler failed - using fallback response"
                );
                Response::fallback(status)
            }
            Err(panic) => {
                error!(
                    request_id = %request.request_id,
                    error_path = %error_path,
                    panic_message = %panic_message(panic.as_ref()),
                    "Error handler panicked - using fallback response"
                );
                Response::fallback(status)
            }
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "action panicked".to_string()
    }
}
