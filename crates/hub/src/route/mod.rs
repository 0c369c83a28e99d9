//! Route table entries.
//!
//! A [`Route`] binds a compiled [`Pattern`], a [`MethodFilter`] and a handler.
//! Routes are built through [`crate::HubBuilder::route`] from a template and a
//! [`RouteItem`] produced by the method shortcuts:
//!
//! ```
//! use micro_hub::route::{get, post};
//! use micro_hub::{handler_fn, Hub};
//!
//! let hub = Hub::builder()
//!     .route("/users/*:id/", get(handler_fn(|_ctx, _req, params| format!("user {}", params.get("id").unwrap_or("?")))))
//!     .route("/users/", post(handler_fn(|_ctx, _req, _params| "created")))
//!     .build()
//!     .unwrap();
//! assert_eq!(hub.routes().len(), 2);
//! ```

mod pattern;

pub use pattern::Pattern;

use crate::error::{HubError, PatternError};
use crate::handler::RequestHandler;
use crate::PathParams;
use http::Method;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::debug;

/// The methods a route can be restricted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MethodFilter {
    Get,
    Post,
    Put,
    Delete,
    Head,
    Any,
}

impl MethodFilter {
    /// `Any` matches every method, the others exactly their own.
    pub fn matches(self, method: &Method) -> bool {
        match self {
            MethodFilter::Any => true,
            MethodFilter::Get => method == Method::GET,
            MethodFilter::Post => method == Method::POST,
            MethodFilter::Put => method == Method::PUT,
            MethodFilter::Delete => method == Method::DELETE,
            MethodFilter::Head => method == Method::HEAD,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MethodFilter::Get => "GET",
            MethodFilter::Post => "POST",
            MethodFilter::Put => "PUT",
            MethodFilter::Delete => "DELETE",
            MethodFilter::Head => "HEAD",
            MethodFilter::Any => "*",
        }
    }
}

impl FromStr for MethodFilter {
    type Err = HubError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(MethodFilter::Get),
            "POST" => Ok(MethodFilter::Post),
            "PUT" => Ok(MethodFilter::Put),
            "DELETE" => Ok(MethodFilter::Delete),
            "HEAD" => Ok(MethodFilter::Head),
            "*" | "ANY" => Ok(MethodFilter::Any),
            _ => Err(HubError::unknown_method(s)),
        }
    }
}

impl fmt::Display for MethodFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A registered association between a pattern, a method filter and a handler.
///
/// Routes hold no per-request state: every successful match hands back a
/// fresh [`PathParams`].
pub struct Route {
    pattern: Pattern,
    method: MethodFilter,
    handler: Arc<dyn RequestHandler>,
}

impl Route {
    pub fn new(template: &str, method: MethodFilter, handler: Arc<dyn RequestHandler>) -> Result<Self, PatternError> {
        let pattern = Pattern::compile(template)?;
        Ok(Self { pattern, method, handler })
    }

    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    pub fn method(&self) -> MethodFilter {
        self.method
    }

    pub fn handler(&self) -> &dyn RequestHandler {
        self.handler.as_ref()
    }

    /// Checks the path only, ignoring the method filter.
    #[inline]
    pub fn matches_path(&self, path: &str) -> bool {
        self.pattern.is_match(path)
    }

    /// Matches the path first, then the method.
    ///
    /// A path match with the wrong method is reported at debug level and
    /// otherwise treated as no match.
    pub fn matches(&self, path: &str, method: &Method) -> Option<PathParams> {
        let params = self.pattern.captures(path)?;
        if !self.method.matches(method) {
            debug!(route = %self, %method, "path matched but method did not");
            return None;
        }
        Some(params)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.pattern)
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route").field("pattern", &self.pattern).field("method", &self.method).finish_non_exhaustive()
    }
}

/// A handler paired with its method filter, waiting for a template.
#[derive(Clone)]
pub struct RouteItem {
    method: MethodFilter,
    handler: Arc<dyn RequestHandler>,
}

impl RouteItem {
    pub fn method(&self) -> MethodFilter {
        self.method
    }

    pub(crate) fn into_route(self, template: &str) -> Result<Route, PatternError> {
        Route::new(template, self.method, self.handler)
    }
}

impl fmt::Debug for RouteItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteItem").field("method", &self.method).finish_non_exhaustive()
    }
}

/// Pairs `handler` with an explicit method filter.
pub fn on<H: RequestHandler + 'static>(method: MethodFilter, handler: H) -> RouteItem {
    RouteItem { method, handler: Arc::new(handler) }
}

macro_rules! method_route {
    ($method:ident, $filter:ident) => {
        #[doc = concat!("Pairs `handler` with the `", stringify!($filter), "` method filter.")]
        pub fn $method<H: RequestHandler + 'static>(handler: H) -> RouteItem {
            on(MethodFilter::$filter, handler)
        }
    };
}

method_route!(get, Get);
method_route!(post, Post);
method_route!(put, Put);
method_route!(delete, Delete);
method_route!(head, Head);
method_route!(any, Any);
