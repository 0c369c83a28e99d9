//! The request-handling core of a micro web framework.
//!
//! A [`Hub`] owns an ordered table of routes. Each route pairs a compiled
//! path pattern with a method filter and a synchronous handler. Dispatching a
//! request picks the first route that matches, runs its handler against a
//! per-request [`DispatchContext`] and renders the resulting [`Response`]
//! into a [`WireResponse`].
//!
//! ```
//! use micro_hub::route::get;
//! use micro_hub::{handler_fn, Environ, Hub};
//! use std::sync::Arc;
//!
//! let hub = Arc::new(
//!     Hub::builder()
//!         .route("/hello/w:name/", get(handler_fn(|_ctx, _req, params| format!("hello {}", params.get("name").unwrap_or_default()))))
//!         .build()
//!         .unwrap(),
//! );
//!
//! let wire = hub.dispatch("/hello/world", &http::Method::GET, Environ::new()).unwrap();
//! assert_eq!(wire.status_line(), "200 OK");
//! assert_eq!(wire.header("content-length"), Some("11"));
//! ```

mod adapter;
mod config;
mod context;
mod error;
mod handler;
mod hub;
mod request;
mod responder;
mod response;

pub mod collab;
pub mod environ;
pub mod logging;
pub mod route;

pub use collab::{Bindings, Renderer};
pub use config::HubConfig;
pub use context::DispatchContext;
pub use environ::Environ;
pub use error::{BoxError, HubError, PatternError, Result};
pub use handler::{handler_fn, FnHandler, NotFound, Redirect, RequestHandler, TemplatePage};
pub use hub::{Hub, HubBuilder};
pub use request::{InputValue, PathParams, Request};
pub use responder::{Reply, Responder};
pub use response::{reason_phrase, Response, WireResponse};
