//! Domain Errors

use thiserror::Error;

use crate::domain::content::ContentType;

/// Hard failures. These always reach whoever built or merged into the request.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RequestError {
    #[error("Invalid method '{0}'")]
    InvalidMethod(String),

    #[error("Invalid '{field}': expected {expected}")]
    InvalidField {
        field: &'static str,
        expected: &'static str,
    },
}

/// Soft failures. Absorbed into an empty or null payload by every getter except `try_payload`.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PayloadError {
    #[error("content tagged as {content_type} could not be decoded into a payload")]
    Malformed { content_type: ContentType },
}
