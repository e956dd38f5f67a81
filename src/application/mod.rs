pub mod config;
pub mod service_request;
pub mod snapshot;
