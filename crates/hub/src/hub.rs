//! The hub: an ordered route table plus configuration, and the dispatcher
//! that resolves one request against it.

use crate::collab::Renderer;
use crate::config::HubConfig;
use crate::context::DispatchContext;
use crate::environ::Environ;
use crate::error::{BoxError, HubError, Result};
use crate::handler::{NotFound, Redirect, RequestHandler, TemplatePage};
use crate::request::ensure_trailing_slash;
use crate::responder::Reply;
use crate::response::{Checkpoint, Response, WireResponse};
use crate::route::{any, Route, RouteItem};
use crate::{PathParams, Request};
use http::{Method, StatusCode};
use mime::Mime;
use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, error, info};

/// Where the body of a dispatch outcome lives.
#[derive(Debug)]
pub(crate) enum BodyOrigin {
    /// The handler wrote through the context; the in-flight response is the result.
    Context,
    /// The pipeline produced a separate response.
    Returned(Response),
    /// A handler failure was contained; the in-flight response holds the server error.
    Failed,
}

/// Owner of a route table and its configuration.
///
/// A hub is immutable once built and can be shared across threads; all
/// per-request state lives in the [`DispatchContext`] each dispatch creates.
pub struct Hub {
    routes: Vec<Route>,
    config: HubConfig,
    mime: Mime,
    default_handler: Arc<dyn RequestHandler>,
    renderer: Option<Arc<dyn Renderer>>,
}

impl Hub {
    pub fn builder() -> HubBuilder {
        HubBuilder::new()
    }

    /// Routes in registration order.
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn config(&self) -> &HubConfig {
        &self.config
    }

    pub fn renderer(&self) -> Option<&dyn Renderer> {
        self.renderer.as_deref()
    }

    /// A fresh `200 OK` response with the configured content type.
    pub fn new_response(&self) -> Response {
        Response::with_content_type(&self.mime)
    }

    /// Resolves one request and renders the response.
    ///
    /// The first route, in registration order, whose pattern and method filter
    /// match gets to handle the request. Handler failures become a
    /// `500 Internal Server Error` unless `raise_errors` is configured, in
    /// which case they are returned as [`HubError::Handler`]. When no route
    /// matches, the default handler answers with `404 Not Found`.
    pub fn dispatch(self: &Arc<Self>, path: &str, method: &Method, environ: Environ) -> Result<WireResponse> {
        let path = ensure_trailing_slash(path);
        if self.config.log {
            info!(%method, path = %path, "request received");
        }

        let request = Request::new(&path, method.clone(), environ);
        let mut ctx = DispatchContext::new(Arc::clone(self));

        let response = match self.run(&mut ctx, &request)? {
            BodyOrigin::Context | BodyOrigin::Failed => ctx.into_response(),
            BodyOrigin::Returned(response) => response,
        };
        response.render()
    }

    /// Runs the routing pipeline for `req` against this hub's table.
    ///
    /// `ctx` must have this hub active.
    pub(crate) fn run(&self, ctx: &mut DispatchContext, req: &Request) -> Result<BodyOrigin> {
        let checkpoint = ctx.response().checkpoint();

        for route in &self.routes {
            let Some(params) = route.matches(req.path(), req.method()) else {
                continue;
            };
            if self.config.log {
                info!(route = %route, "route matched");
            }
            return self.invoke(route.handler(), ctx, req, &params, checkpoint);
        }

        if self.config.log {
            info!(path = req.path(), "no matching route");
        }
        let mut origin = self.invoke(self.default_handler.as_ref(), ctx, req, &PathParams::empty(), checkpoint)?;
        match &mut origin {
            BodyOrigin::Context => {
                ctx.response_mut().set_status(StatusCode::NOT_FOUND);
            }
            BodyOrigin::Returned(response) => {
                response.set_status(StatusCode::NOT_FOUND);
            }
            BodyOrigin::Failed => {}
        }
        Ok(origin)
    }

    fn invoke(
        &self,
        handler: &dyn RequestHandler,
        ctx: &mut DispatchContext,
        req: &Request,
        params: &PathParams,
        checkpoint: Checkpoint,
    ) -> Result<BodyOrigin> {
        let reply = if self.config.raise_errors {
            handler.invoke(ctx, req, params).map_err(HubError::handler)?
        } else {
            match panic::catch_unwind(AssertUnwindSafe(|| handler.invoke(&mut *ctx, req, params))) {
                Ok(Ok(reply)) => reply,
                Ok(Err(e)) => return Ok(self.fail(ctx, req, checkpoint, &e)),
                Err(payload) => return Ok(self.fail(ctx, req, checkpoint, &panic_message(payload.as_ref()))),
            }
        };

        Ok(match reply {
            Reply::Context => BodyOrigin::Context,
            Reply::Body(body) => {
                let mut response = self.new_response();
                response.append(body);
                BodyOrigin::Returned(response)
            }
            Reply::Response(response) => BodyOrigin::Returned(response),
        })
    }

    /// Discards the headers and body the failed handler wrote and turns the
    /// in-flight response into a server error.
    fn fail(&self, ctx: &mut DispatchContext, req: &Request, checkpoint: Checkpoint, cause: &dyn fmt::Display) -> BodyOrigin {
        error!(request = %req, %cause, "handler failed");

        let response = ctx.response_mut();
        response.rollback(checkpoint);
        response.set_status(StatusCode::INTERNAL_SERVER_ERROR);
        response.append("500 Internal Server Error");
        if self.config.error_detail {
            response.append(format!("\n\n{cause}"));
        }
        BodyOrigin::Failed
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> BoxError {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("handler panicked: {message}").into()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("handler panicked: {message}").into()
    } else {
        "handler panicked".into()
    }
}

impl fmt::Debug for Hub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hub")
            .field("routes", &self.routes)
            .field("config", &self.config)
            .field("renderer", &self.renderer.is_some())
            .finish_non_exhaustive()
    }
}

/// Collects routes and configuration during startup.
///
/// Registration order is kept: it decides which route wins when several match.
/// Templates are compiled by [`HubBuilder::build`], which fails on the first
/// malformed one.
pub struct HubBuilder {
    config: HubConfig,
    routes: Vec<(String, RouteItem)>,
    static_handler: Option<Arc<dyn RequestHandler>>,
    default_handler: Option<Arc<dyn RequestHandler>>,
    renderer: Option<Arc<dyn Renderer>>,
}

impl HubBuilder {
    fn new() -> Self {
        Self { config: HubConfig::default(), routes: vec![], static_handler: None, default_handler: None, renderer: None }
    }

    pub fn config(mut self, config: HubConfig) -> Self {
        self.config = config;
        self
    }

    pub fn route(mut self, template: impl Into<String>, item: RouteItem) -> Self {
        self.routes.push((template.into(), item));
        self
    }

    /// Registers the same handler under several templates.
    pub fn route_many<I, S>(mut self, templates: I, item: RouteItem) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for template in templates {
            self.routes.push((template.into(), item.clone()));
        }
        self
    }

    /// Redirects every method on each of `templates` to `location`.
    pub fn assign<I, S>(self, templates: I, location: &str) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.route_many(templates, any(Redirect::to(location)))
    }

    /// Serves `template_name` on each of `templates`, for every method.
    pub fn autotemplate<I, S>(self, templates: I, template_name: &str) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.route_many(templates, any(TemplatePage::new(template_name)))
    }

    /// Registers `handler` under the configured `static_url`, ahead of every other route.
    pub fn static_files(mut self, handler: impl RequestHandler + 'static) -> Self {
        self.static_handler = Some(Arc::new(handler));
        self
    }

    /// Replaces the handler answering requests no route matches.
    pub fn default_handler(mut self, handler: impl RequestHandler + 'static) -> Self {
        self.default_handler = Some(Arc::new(handler));
        self
    }

    pub fn renderer(mut self, renderer: impl Renderer + 'static) -> Self {
        self.renderer = Some(Arc::new(renderer));
        self
    }

    pub fn build(self) -> Result<Hub> {
        let mime = self.config.mime()?;

        let mut routes = Vec::with_capacity(self.routes.len() + 1);
        if let Some(handler) = self.static_handler {
            routes.push(any(handler).into_route(&self.config.static_url)?);
        }
        for (template, item) in self.routes {
            routes.push(item.into_route(&template)?);
        }
        debug!(routes = routes.len(), "hub built");

        Ok(Hub {
            routes,
            config: self.config,
            mime,
            default_handler: self.default_handler.unwrap_or_else(|| Arc::new(NotFound)),
            renderer: self.renderer,
        })
    }
}

impl fmt::Debug for HubBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HubBuilder").field("config", &self.config).field("routes", &self.routes).finish_non_exhaustive()
    }
}
