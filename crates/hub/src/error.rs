use std::error::Error;
use thiserror::Error;

/// Failure type returned by request handlers.
pub type BoxError = Box<dyn Error + Send + Sync>;

pub type Result<T, E = HubError> = std::result::Result<T, E>;

#[derive(Error, Debug)]
pub enum HubError {
    #[error("invalid route pattern: {source}")]
    Pattern {
        #[from]
        source: PatternError,
    },

    #[error("handler failed: {source}")]
    Handler { source: BoxError },

    #[error("unknown status code: {code}")]
    UnknownStatus { code: u16 },

    #[error("unknown request method: {method}")]
    UnknownMethod { method: String },

    #[error("nutshell violation: {reason}")]
    NutshellViolation { reason: &'static str },

    #[error("invalid header: {reason}")]
    InvalidHeader { reason: String },

    #[error("http error: {source}")]
    Http {
        #[from]
        source: http::Error,
    },

    #[error("malformed request environment: {reason}")]
    Environ { reason: String },

    #[error("template error: {reason}")]
    Render { reason: String },

    #[error("invalid configuration: {reason}")]
    Config { reason: String },

    #[error("model error: {reason}")]
    Model { reason: String },

    #[error("logging setup failed: {reason}")]
    Logging { reason: String },
}

impl HubError {
    pub fn handler<E: Into<BoxError>>(e: E) -> Self {
        Self::Handler { source: e.into() }
    }

    pub fn unknown_status(code: u16) -> Self {
        Self::UnknownStatus { code }
    }

    pub fn unknown_method<S: ToString>(method: S) -> Self {
        Self::UnknownMethod { method: method.to_string() }
    }

    pub fn nutshell(reason: &'static str) -> Self {
        Self::NutshellViolation { reason }
    }

    pub fn invalid_header<S: ToString>(str: S) -> Self {
        Self::InvalidHeader { reason: str.to_string() }
    }

    pub fn environ<S: ToString>(str: S) -> Self {
        Self::Environ { reason: str.to_string() }
    }

    pub fn render<S: ToString>(str: S) -> Self {
        Self::Render { reason: str.to_string() }
    }

    pub fn config<S: ToString>(str: S) -> Self {
        Self::Config { reason: str.to_string() }
    }

    pub fn model<S: ToString>(str: S) -> Self {
        Self::Model { reason: str.to_string() }
    }

    pub fn logging<S: ToString>(str: S) -> Self {
        Self::Logging { reason: str.to_string() }
    }

    #[inline]
    pub fn is_nutshell_violation(&self) -> bool {
        matches!(self, Self::NutshellViolation { .. })
    }
}

/// Raised when a route template can't be compiled.
#[derive(Error, Debug)]
pub enum PatternError {
    #[error("unknown placeholder tag '{tag}' in segment '{segment}'")]
    UnknownTag { tag: char, segment: String },

    #[error("template '{template}' compiles to an invalid matcher: {source}")]
    Invalid {
        template: String,
        #[source]
        source: regex::Error,
    },
}
