//! # Error Types
//!
//! Every fallible library operation returns [`ServiceError`]. Remote faults are
//! passed through as-is; nothing in this crate retries.

use thiserror::Error;

/// Errors raised while talking to the ordering service or shaping its responses.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The connection could not be established when the client was created.
    #[error("not connected to the ordering service")]
    NotConnected,

    /// HTTP-level failure (DNS, TLS, connection refused, body read).
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-success HTTP status without a SOAP fault in the body.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// SOAP fault returned by the service.
    #[error("service fault [{code}]: {reason}")]
    Fault { code: String, reason: String },

    /// Markup that could not be parsed.
    #[error("malformed XML: {0}")]
    Xml(String),

    /// An expected result field, key or `@attributes` bag is absent.
    #[error("missing field `{0}`")]
    MissingField(String),

    /// A field is present but its value cannot be read as the expected type.
    #[error("unexpected value for `{field}`: {value:?}")]
    UnexpectedValue { field: String, value: String },

    /// Unknown restaurant/order state token.
    #[error("invalid token: {0}")]
    InvalidToken(String),
}

impl From<quick_xml::Error> for ServiceError {
    fn from(e: quick_xml::Error) -> Self {
        ServiceError::Xml(e.to_string())
    }
}

impl From<quick_xml::events::attributes::AttrError> for ServiceError {
    fn from(e: quick_xml::events::attributes::AttrError) -> Self {
        ServiceError::Xml(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ServiceError>;
