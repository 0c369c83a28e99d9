//! Glue between the hub and the `http` crate types a server speaks.

use crate::environ::{Environ, DOCUMENT_URI, REQUEST_METHOD, REQUEST_URI};
use crate::error::{HubError, Result};
use crate::hub::Hub;
use crate::response::WireResponse;
use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::{HeaderName, HeaderValue, StatusCode};
use std::sync::Arc;
use tracing::warn;

impl Environ {
    /// Builds the environment of an `http` request.
    ///
    /// Every header becomes an `HTTP_*` variable (`User-Agent` turns into
    /// `HTTP_USER_AGENT`). `form_data` is parsed as the url-encoded form.
    pub fn from_http<B>(req: &http::Request<B>, form_data: Option<&str>) -> Result<Self> {
        let uri = req.uri();
        let mut environ = Environ::new()
            .with_var(DOCUMENT_URI, uri.path())
            .with_var(REQUEST_URI, uri.path_and_query().map_or_else(|| uri.path(), |pq| pq.as_str()))
            .with_var(REQUEST_METHOD, req.method().as_str());

        for (name, value) in req.headers() {
            let Ok(value) = value.to_str() else {
                warn!(header = %name, "skipping header that isn't visible ASCII");
                continue;
            };
            environ.set_var(header_var(name), value);
        }

        if let Some(query) = uri.query() {
            environ = environ.with_query_string(query)?;
        }
        if let Some(form) = form_data {
            environ = environ.with_form_data(form)?;
        }
        Ok(environ)
    }
}

fn header_var(name: &HeaderName) -> String {
    let mut var = String::with_capacity(name.as_str().len() + 5);
    var.push_str("HTTP_");
    var.extend(name.as_str().chars().map(|c| if c == '-' { '_' } else { c.to_ascii_uppercase() }));
    var
}

impl WireResponse {
    pub fn into_http(self) -> Result<http::Response<Bytes>> {
        let (status_line, headers, body) = self.into_parts();
        let code = status_line.split(' ').next().and_then(|code| code.parse::<u16>().ok()).unwrap_or_default();
        let status = StatusCode::from_u16(code).ok().ok_or_else(|| HubError::unknown_status(code))?;

        let mut builder = http::Response::builder().status(status);
        for (name, value) in headers {
            let name = HeaderName::try_from(name).map_err(HubError::invalid_header)?;
            let value = HeaderValue::try_from(value).map_err(HubError::invalid_header)?;
            builder = builder.header(name, value);
        }
        Ok(builder.body(body)?)
    }
}

impl Hub {
    /// Dispatches an `http` request and converts the outcome back.
    ///
    /// A url-encoded body is parsed as form data, any other body is ignored.
    pub fn handle(self: &Arc<Self>, req: http::Request<Bytes>) -> Result<http::Response<Bytes>> {
        let is_form = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.parse::<mime::Mime>().ok())
            .is_some_and(|content_type| content_type.essence_str() == mime::APPLICATION_WWW_FORM_URLENCODED.essence_str());

        let form = if is_form {
            Some(std::str::from_utf8(req.body()).map_err(|e| HubError::environ(format!("form body is not UTF-8: {e}")))?)
        } else {
            None
        };

        let environ = Environ::from_http(&req, form)?;
        self.dispatch(req.uri().path(), req.method(), environ)?.into_http()
    }
}

#[cfg(test)]
mod tests {
    use crate::environ::{Environ, DOCUMENT_URI, HTTP_USER_AGENT, QUERY_STRING, REQUEST_URI};
    use crate::route::{get, post};
    use crate::{handler_fn, Hub};
    use bytes::Bytes;
    use http::{Method, StatusCode};
    use std::sync::Arc;

    #[test]
    fn test_environ_from_http() {
        let req = http::Request::builder()
            .uri("/search?q=rust&q=hub")
            .header("User-Agent", "curl/8")
            .header("X-Forwarded-For", "10.0.0.1")
            .body(())
            .unwrap();
        let environ = Environ::from_http(&req, None).unwrap();

        assert_eq!(environ.var(DOCUMENT_URI), Some("/search"));
        assert_eq!(environ.var(REQUEST_URI), Some("/search?q=rust&q=hub"));
        assert_eq!(environ.var(QUERY_STRING), Some("q=rust&q=hub"));
        assert_eq!(environ.var(HTTP_USER_AGENT), Some("curl/8"));
        assert_eq!(environ.var("HTTP_X_FORWARDED_FOR"), Some("10.0.0.1"));
        assert_eq!(environ.query()["q"], ["rust", "hub"]);
    }

    #[test]
    fn test_handle_round_trip() {
        let hub = Arc::new(
            Hub::builder()
                .route(
                    "/greet/",
                    post(handler_fn(|_ctx, req, _params| {
                        format!("hello {}", req.input("name").and_then(|name| name.as_str()).unwrap_or("nobody"))
                    })),
                )
                .route("/agent/", get(handler_fn(|_ctx, req, _params| req.user_agent().to_owned())))
                .build()
                .unwrap(),
        );

        let req = http::Request::builder()
            .method(Method::POST)
            .uri("/greet")
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(Bytes::from_static(b"name=world"))
            .unwrap();
        let resp = hub.handle(req).unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()["content-length"], "11");
        assert_eq!(&resp.body()[..], b"hello world");

        let req = http::Request::builder().uri("/agent/").header("User-Agent", "tester").body(Bytes::new()).unwrap();
        assert_eq!(&hub.handle(req).unwrap().body()[..], b"tester");

        let req = http::Request::builder().uri("/missing/").body(Bytes::new()).unwrap();
        assert_eq!(hub.handle(req).unwrap().status(), StatusCode::NOT_FOUND);
    }
}
