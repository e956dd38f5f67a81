use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::domain::errors::RequestError;

/// Verbs an internal request may carry. Parsing is exact: `get` is not `GET`.
#[allow(clippy::upper_case_acronyms)]
#[derive(
    Copy,
    Clone,
    Debug,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    IntoStaticStr,
    EnumIter,
    Serialize,
    Deserialize,
)]
pub enum Method {
    GET,
    HEAD,
    POST,
    PUT,
    PATCH,
    MERGE,
    DELETE,
    OPTIONS,
    COPY,
    TRACE,
    CONNECT,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        self.into()
    }

    /// Parses a verb, failing with [RequestError::InvalidMethod] for anything outside the set.
    pub fn parse(verb: &str) -> Result<Self, RequestError> {
        Method::from_str(verb).map_err(|_| RequestError::InvalidMethod(verb.to_string()))
    }
}

impl AsRef<str> for Method {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl TryFrom<&[u8]> for Method {
    type Error = RequestError;

    fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
        let verb = std::str::from_utf8(value)
            .map_err(|_| RequestError::InvalidMethod(String::from_utf8_lossy(value).into_owned()))?;
        Method::parse(verb)
    }
}

impl TryFrom<&http::Method> for Method {
    type Error = RequestError;

    fn try_from(value: &http::Method) -> Result<Self, Self::Error> {
        Method::parse(value.as_str())
    }
}
