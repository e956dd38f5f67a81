//! Transport adapters. They only translate; the request object owns every rule.

pub mod server_impl;
