//! Response accumulator and its wire rendering.
//!
//! A [`Response`] is mutated incrementally by handlers and keeps its
//! `Content-Length` header equal to the byte length of the body after every
//! mutation. [`Response::render`] turns it into a [`WireResponse`], the
//! `(status line, headers, body)` triple a server adapter writes out.

use crate::error::{HubError, Result};
use bytes::{Bytes, BytesMut};
use http::header::{CONTENT_LENGTH, CONTENT_TYPE, LOCATION};
use http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use mime::Mime;
use std::fmt;

/// Status codes a response may be rendered with.
const STATUS_REASONS: [(u16, &str); 11] = [
    (200, "OK"),
    (301, "Moved Permanently"),
    (302, "Found"),
    (303, "See Other"),
    (304, "Not Modified"),
    (400, "Bad Request"),
    (403, "Forbidden"),
    (404, "Not Found"),
    (405, "Method Not Allowed"),
    (410, "Gone"),
    (500, "Internal Server Error"),
];

/// Returns the reason phrase for `status`, `None` for codes outside the table.
pub fn reason_phrase(status: StatusCode) -> Option<&'static str> {
    STATUS_REASONS.iter().find(|(code, _)| *code == status.as_u16()).map(|(_, reason)| *reason)
}

pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    body: BytesMut,
}

impl Response {
    /// Creates an empty `200 OK` response with a `text/html` content type.
    pub fn new() -> Self {
        Self::with_content_type(&mime::TEXT_HTML)
    }

    pub fn with_content_type(content_type: &Mime) -> Self {
        let mut response = Self { status: StatusCode::OK, headers: HeaderMap::with_capacity(4), body: BytesMut::new() };
        response.content_type(content_type);
        response
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn set_status(&mut self, status: StatusCode) -> &mut Self {
        self.status = status;
        self
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Sets a header, replacing any previous value.
    ///
    /// `Content-Length` is owned by the response and can't be overridden.
    pub fn header(&mut self, name: HeaderName, value: HeaderValue) -> &mut Self {
        if name != CONTENT_LENGTH {
            self.headers.insert(name, value);
        }
        self
    }

    /// Like [`Response::header`] for names and values that still need validating.
    pub fn try_header(&mut self, name: &str, value: &str) -> Result<&mut Self> {
        let name = HeaderName::try_from(name).map_err(HubError::invalid_header)?;
        let value = HeaderValue::try_from(value).map_err(HubError::invalid_header)?;
        Ok(self.header(name, value))
    }

    pub fn content_type(&mut self, content_type: &Mime) -> &mut Self {
        // a parsed mime is always a valid header value
        if let Ok(value) = HeaderValue::from_str(content_type.as_ref()) {
            self.headers.insert(CONTENT_TYPE, value);
        }
        self.sync_content_length();
        self
    }

    /// Appends to the body. Text is stored UTF-8 encoded, bytes as they are.
    pub fn append(&mut self, chunk: impl AsRef<[u8]>) -> &mut Self {
        self.body.extend_from_slice(chunk.as_ref());
        self.sync_content_length();
        self
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn clear_body(&mut self) -> &mut Self {
        self.truncate_body(0);
        self
    }

    fn truncate_body(&mut self, len: usize) {
        self.body.truncate(len);
        self.sync_content_length();
    }

    /// Records the headers and body length so a later [`Response::rollback`] can return here.
    pub(crate) fn checkpoint(&self) -> Checkpoint {
        Checkpoint { headers: self.headers.clone(), body_len: self.body.len() }
    }

    /// Drops every header and body change made since `checkpoint`.
    pub(crate) fn rollback(&mut self, checkpoint: Checkpoint) {
        self.headers = checkpoint.headers;
        self.truncate_body(checkpoint.body_len);
    }

    /// Turns this response into a `302 Found` pointing at `location`.
    ///
    /// Every other header is dropped.
    pub fn redirect(&mut self, location: &str) -> Result<&mut Self> {
        let location = HeaderValue::try_from(location).map_err(HubError::invalid_header)?;
        self.status = StatusCode::FOUND;
        self.headers.clear();
        self.headers.insert(LOCATION, location);
        self.sync_content_length();
        Ok(self)
    }

    /// Copies status and headers of `other` into this response and appends its body.
    pub(crate) fn splice(&mut self, other: Response) {
        self.status = other.status;
        for (name, value) in &other.headers {
            self.header(name.clone(), value.clone());
        }
        self.append(other.body);
    }

    fn sync_content_length(&mut self) {
        self.headers.insert(CONTENT_LENGTH, HeaderValue::from(self.body.len()));
    }

    /// Renders the wire triple.
    ///
    /// Fails with [`HubError::UnknownStatus`] when the status has no entry in the
    /// reason phrase table.
    pub fn render(self) -> Result<WireResponse> {
        let reason = reason_phrase(self.status).ok_or_else(|| HubError::unknown_status(self.status.as_u16()))?;
        let status_line = format!("{} {}", self.status.as_u16(), reason);

        let headers = self
            .headers
            .iter()
            .map(|(name, value)| (name.as_str().to_owned(), String::from_utf8_lossy(value.as_bytes()).into_owned()))
            .collect();

        Ok(WireResponse { status_line, headers, body: self.body.freeze() })
    }
}

impl Default for Response {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Write for Response {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.append(s);
        Ok(())
    }
}

impl fmt::Debug for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Response")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .field("body_len", &self.body.len())
            .finish()
    }
}

/// Header and body state of a [`Response`] at some earlier point.
#[derive(Debug, Clone)]
pub(crate) struct Checkpoint {
    headers: HeaderMap,
    body_len: usize,
}

/// The rendered form of a response: status line, ordered header list and body bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireResponse {
    status_line: String,
    headers: Vec<(String, String)>,
    body: Bytes,
}

impl WireResponse {
    /// `"<code> <reason phrase>"`, e.g. `"404 Not Found"`.
    pub fn status_line(&self) -> &str {
        &self.status_line
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Looks up a header value, case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter().find(|(key, _)| key.eq_ignore_ascii_case(name)).map(|(_, value)| value.as_str())
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn into_parts(self) -> (String, Vec<(String, String)>, Bytes) {
        (self.status_line, self.headers, self.body)
    }
}
