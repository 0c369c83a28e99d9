//! Conversion of handler return values into dispatch replies.
//!
//! This module provides the [`Responder`] trait which defines how the value a
//! handler returns is fed back into the dispatcher. Returning nothing means
//! the handler wrote through the context's in-flight response, a plain value
//! becomes the body of a fresh response, and a [`Response`] is used as it is.

use crate::error::BoxError;
use crate::response::Response;
use bytes::Bytes;
use std::convert::Infallible;

/// What a handler produced.
#[derive(Debug)]
pub enum Reply {
    /// Nothing returned; the in-flight response held by the context is the result.
    Context,
    /// A plain value, to be used as the body of a new default response.
    Body(Bytes),
    /// A complete response.
    Response(Response),
}

/// A trait for types that can be returned directly from request handlers.
pub trait Responder {
    fn respond(self) -> Result<Reply, BoxError>;
}

impl Responder for Reply {
    fn respond(self) -> Result<Reply, BoxError> {
        Ok(self)
    }
}

/// Err variants are handler failures.
impl<T: Responder, E: Into<BoxError>> Responder for Result<T, E> {
    fn respond(self) -> Result<Reply, BoxError> {
        match self {
            Ok(t) => t.respond(),
            Err(e) => Err(e.into()),
        }
    }
}

/// `None` behaves like returning nothing.
impl<T: Responder> Responder for Option<T> {
    fn respond(self) -> Result<Reply, BoxError> {
        match self {
            Some(t) => t.respond(),
            None => Ok(Reply::Context),
        }
    }
}

impl Responder for () {
    fn respond(self) -> Result<Reply, BoxError> {
        Ok(Reply::Context)
    }
}

impl Responder for Response {
    fn respond(self) -> Result<Reply, BoxError> {
        Ok(Reply::Response(self))
    }
}

impl Responder for &'static str {
    fn respond(self) -> Result<Reply, BoxError> {
        Ok(Reply::Body(Bytes::from_static(self.as_bytes())))
    }
}

impl Responder for String {
    fn respond(self) -> Result<Reply, BoxError> {
        Ok(Reply::Body(Bytes::from(self)))
    }
}

impl Responder for Bytes {
    fn respond(self) -> Result<Reply, BoxError> {
        Ok(Reply::Body(self))
    }
}

impl Responder for Vec<u8> {
    fn respond(self) -> Result<Reply, BoxError> {
        Ok(Reply::Body(Bytes::from(self)))
    }
}

impl<T: Responder> Responder for Box<T> {
    fn respond(self) -> Result<Reply, BoxError> {
        (*self).respond()
    }
}

impl Responder for Infallible {
    fn respond(self) -> Result<Reply, BoxError> {
        match self {}
    }
}
