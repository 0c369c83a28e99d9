use crate::context::DispatchContext;
use crate::error::BoxError;
use crate::responder::{Reply, Responder};
use crate::{PathParams, Request};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

/// Request handlers are synchronous and run to completion.
///
/// A handler may write through `ctx` (the in-flight response) and/or return
/// a [`Reply`]. Errors are contained by the dispatcher unless the hub is
/// configured to raise them.
pub trait RequestHandler: Send + Sync {
    fn invoke(&self, ctx: &mut DispatchContext, req: &Request, params: &PathParams) -> Result<Reply, BoxError>;
}

impl<H: RequestHandler + ?Sized> RequestHandler for Arc<H> {
    fn invoke(&self, ctx: &mut DispatchContext, req: &Request, params: &PathParams) -> Result<Reply, BoxError> {
        (**self).invoke(ctx, req, params)
    }
}

/// a `Fn` holder whose return value is anything implementing [`Responder`]
pub struct FnHandler<F> {
    f: F,
}

impl<F> fmt::Debug for FnHandler<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnHandler").finish_non_exhaustive()
    }
}

pub fn handler_fn<F, R>(f: F) -> FnHandler<F>
where
    F: Fn(&mut DispatchContext, &Request, &PathParams) -> R + Send + Sync,
    R: Responder,
{
    FnHandler { f }
}

impl<F, R> RequestHandler for FnHandler<F>
where
    F: Fn(&mut DispatchContext, &Request, &PathParams) -> R + Send + Sync,
    R: Responder,
{
    fn invoke(&self, ctx: &mut DispatchContext, req: &Request, params: &PathParams) -> Result<Reply, BoxError> {
        (self.f)(ctx, req, params).respond()
    }
}

/// Redirects every request to a fixed location.
#[derive(Debug, Clone)]
pub struct Redirect {
    location: String,
}

impl Redirect {
    pub fn to(location: impl Into<String>) -> Self {
        Self { location: location.into() }
    }
}

impl RequestHandler for Redirect {
    fn invoke(&self, ctx: &mut DispatchContext, _req: &Request, _params: &PathParams) -> Result<Reply, BoxError> {
        ctx.redirect(&self.location)?;
        Ok(Reply::Context)
    }
}

/// Renders a fixed template into the response, path captures as bindings.
#[derive(Debug, Clone)]
pub struct TemplatePage {
    template: String,
}

impl TemplatePage {
    pub fn new(template: impl Into<String>) -> Self {
        Self { template: template.into() }
    }
}

impl RequestHandler for TemplatePage {
    fn invoke(&self, ctx: &mut DispatchContext, _req: &Request, params: &PathParams) -> Result<Reply, BoxError> {
        let bindings = params.iter().map(|(name, value)| (name.to_owned(), Value::from(value))).collect::<Map<_, _>>();
        ctx.template(&self.template, &bindings)?;
        Ok(Reply::Context)
    }
}

/// The fallback used when no route matches.
///
/// Renders the configured not-found template when the hub has a renderer,
/// otherwise writes a plain message.
#[derive(Debug, Clone, Copy, Default)]
pub struct NotFound;

impl RequestHandler for NotFound {
    fn invoke(&self, ctx: &mut DispatchContext, _req: &Request, _params: &PathParams) -> Result<Reply, BoxError> {
        ctx.not_found("No matching routes registered")?;
        Ok(Reply::Context)
    }
}

#[cfg(test)]
mod test {
    use crate::handler::{handler_fn, FnHandler, NotFound, Redirect, RequestHandler, TemplatePage};
    use crate::{DispatchContext, PathParams, Request};
    use std::sync::Arc;

    fn assert_is_handler<T: RequestHandler>(_handler: &T) {
        // no op
    }

    #[test]
    fn assert_fn_is_handler() {
        fn show(_ctx: &mut DispatchContext, _req: &Request, params: &PathParams) -> String {
            params.get("id").unwrap_or_default().to_owned()
        }

        let handler: FnHandler<_> = handler_fn(show);
        assert_is_handler(&handler);
        assert_is_handler(&Arc::new(handler));
    }

    #[test]
    fn assert_closure_is_handler() {
        let handler = handler_fn(|ctx: &mut DispatchContext, _req: &Request, _params: &PathParams| {
            ctx.append("written");
        });
        assert_is_handler(&handler);
    }

    #[test]
    fn assert_builtins_are_handlers() {
        assert_is_handler(&Redirect::to("/"));
        assert_is_handler(&TemplatePage::new("index.html"));
        assert_is_handler(&NotFound);
    }
}
