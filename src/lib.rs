#![deny(
    missing_copy_implementations,
    missing_debug_implementations,
    trivial_casts,
    trivial_numeric_casts
)]

//! An in-process request object: method, parameters, headers, raw content and the payload
//! decoded from it, for calls between services that never touch a network transport.

pub mod domain;

pub mod application;
pub mod infrastructure;

pub use application::config::ApiKeySource;
pub use application::service_request::{
    HasApiVersion, InternalServiceRequest, ServiceRequest, ValueMap,
};
pub use domain::content::{Content, ContentType};
pub use domain::errors::{PayloadError, RequestError};
pub use domain::method::Method;

pub type AnyResult<T> = eyre::Result<T>;
