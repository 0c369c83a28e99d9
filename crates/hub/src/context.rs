//! Per-request dispatch state.
//!
//! A [`DispatchContext`] is created for every request by [`Hub::dispatch`] and
//! handed to the handler by mutable reference. It owns the in-flight
//! [`Response`] and the reference to the hub that is currently active, so
//! concurrent requests never share mutable state.
//!
//! ## Nutshells
//!
//! The active hub can be swapped out for an independent one while a request
//! is being served. Only one substitution may be in progress at a time:
//! overlapping attempts are refused with [`HubError::NutshellViolation`] and
//! leave the context untouched.
//!
//! ```
//! use micro_hub::route::get;
//! use micro_hub::{handler_fn, Environ, Hub};
//! use std::sync::Arc;
//!
//! let blog = Arc::new(
//!     Hub::builder().route("/blog/*:slug/", get(handler_fn(|_ctx, _req, params| format!("post {}", params.get("slug").unwrap_or_default())))).build().unwrap(),
//! );
//!
//! let site = Arc::new(
//!     Hub::builder()
//!         .route("/blog/*:slug/", get(handler_fn(move |ctx, req, _params| ctx.delegate(&blog, req))))
//!         .build()
//!         .unwrap(),
//! );
//!
//! let wire = site.dispatch("/blog/hello", &http::Method::GET, Environ::new()).unwrap();
//! assert_eq!(&wire.body()[..], b"post hello");
//! ```

use crate::collab::Bindings;
use crate::config::HubConfig;
use crate::error::{HubError, Result};
use crate::hub::{BodyOrigin, Hub};
use crate::response::Response;
use crate::Request;
use http::{HeaderName, HeaderValue};
use mime::Mime;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

pub struct DispatchContext {
    active: Option<Arc<Hub>>,
    saved: Option<Arc<Hub>>,
    response: Response,
}

impl DispatchContext {
    /// Creates a context with `hub` active and a fresh response.
    pub fn new(hub: Arc<Hub>) -> Self {
        let response = hub.new_response();
        Self { active: Some(hub), saved: None, response }
    }

    /// The hub currently handling the request, `None` inside an empty nutshell.
    pub fn hub(&self) -> Option<&Arc<Hub>> {
        self.active.as_ref()
    }

    pub fn config(&self) -> Option<&HubConfig> {
        self.active.as_deref().map(Hub::config)
    }

    /// Reads a configuration option of the active hub by name.
    pub fn config_value(&self, key: &str) -> Option<Value> {
        self.config().and_then(|config| config.get(key))
    }

    pub fn response(&self) -> &Response {
        &self.response
    }

    pub fn response_mut(&mut self) -> &mut Response {
        &mut self.response
    }

    pub fn into_response(self) -> Response {
        self.response
    }

    /// Appends to the in-flight response body.
    pub fn append(&mut self, chunk: impl AsRef<[u8]>) -> &mut Response {
        self.response.append(chunk)
    }

    pub fn header(&mut self, name: HeaderName, value: HeaderValue) -> &mut Response {
        self.response.header(name, value)
    }

    pub fn content_type(&mut self, content_type: &Mime) -> &mut Response {
        self.response.content_type(content_type)
    }

    pub fn redirect(&mut self, location: &str) -> Result<&mut Response> {
        self.response.redirect(location)
    }

    /// Renders `template` with the active hub's renderer and appends the output.
    pub fn template(&mut self, template: &str, bindings: &Bindings) -> Result<&mut Response> {
        let hub = self.active.as_ref().ok_or_else(|| HubError::render("no active hub"))?;
        let renderer = hub.renderer().ok_or_else(|| HubError::render("no renderer configured"))?;
        let output = renderer.render(template, bindings).map_err(|e| HubError::render(format!("{template}: {e}")))?;
        Ok(self.response.append(output))
    }

    /// Appends the not-found page carrying `error`.
    ///
    /// The configured not-found template is used when the active hub has a
    /// renderer, a plain message otherwise.
    pub fn not_found(&mut self, error: &str) -> Result<&mut Response> {
        let template = self
            .active
            .as_ref()
            .filter(|hub| hub.renderer().is_some())
            .map(|hub| hub.config().not_found_template.clone());

        match template {
            Some(template) => {
                let mut bindings = Bindings::new();
                bindings.insert("error".to_owned(), Value::from(error));
                self.template(&template, &bindings)
            }
            None => Ok(self.response.append(format!("Not Found: {error}"))),
        }
    }

    /// Whether a hub substitution is in progress.
    pub fn in_nutshell(&self) -> bool {
        self.saved.is_some()
    }

    /// Moves the active hub aside, leaving the active slot empty for
    /// [`DispatchContext::install_hub`].
    pub fn enter_nutshell(&mut self) -> Result<()> {
        if self.saved.is_some() {
            warn!("already in a nutshell, refusing to enter another one");
            return Err(HubError::nutshell("a hub substitution is already active"));
        }
        self.saved = self.active.take();
        debug!("entered nutshell");
        Ok(())
    }

    /// Installs `hub` into the empty active slot of a nutshell.
    pub fn install_hub(&mut self, hub: Arc<Hub>) -> Result<()> {
        if self.active.is_some() {
            warn!("active hub slot is occupied, refusing to install another hub");
            return Err(HubError::nutshell("the active hub slot is occupied"));
        }
        self.active = Some(hub);
        Ok(())
    }

    /// Restores the hub saved by [`DispatchContext::enter_nutshell`], discarding the substitute.
    pub fn exit_nutshell(&mut self) {
        match self.saved.take() {
            Some(saved) => {
                self.active = Some(saved);
                debug!("left nutshell");
            }
            None => warn!("not in a nutshell, nothing to exit"),
        }
    }

    /// Runs `req` through `child`'s route table and splices the result into
    /// the in-flight response.
    ///
    /// The child is active only while its pipeline runs; the previous hub is
    /// restored before any failure is returned. Whatever the child's handler
    /// wrote through the context is already part of the in-flight response,
    /// a returned response contributes its status, headers and body.
    pub fn delegate(&mut self, child: &Arc<Hub>, req: &Request) -> Result<()> {
        if self.saved.is_some() {
            warn!(request = %req, "already in a nutshell, refusing to delegate");
            return Err(HubError::nutshell("a hub substitution is already active"));
        }

        self.saved = self.active.replace(Arc::clone(child));
        let outcome = child.run(self, req);
        self.active = self.saved.take();

        match outcome? {
            BodyOrigin::Context | BodyOrigin::Failed => {}
            BodyOrigin::Returned(response) => self.response.splice(response),
        }
        Ok(())
    }
}

impl fmt::Debug for DispatchContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatchContext")
            .field("active", &self.active.is_some())
            .field("in_nutshell", &self.saved.is_some())
            .field("response", &self.response)
            .finish()
    }
}
