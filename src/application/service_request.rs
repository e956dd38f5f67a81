use std::any::Any;
use std::sync::OnceLock;

use compact_str::CompactString;
use serde_json::{Map, Value};

use crate::application::config::ApiKeySource;
use crate::domain::content::{Content, ContentType};
use crate::domain::errors::{PayloadError, RequestError};
use crate::domain::method::Method;
use crate::domain::value;

pub type ValueMap = Map<String, Value>;

static EMPTY: OnceLock<ValueMap> = OnceLock::new();

fn empty_map<'a>() -> &'a ValueMap {
    EMPTY.get_or_init(ValueMap::new)
}

fn lookup(map: Option<&ValueMap>, key: Option<&str>, default: Option<Value>) -> Option<Value> {
    let Some(map) = map else {
        return default;
    };

    match key {
        None => Some(Value::Object(map.clone())),
        Some(key) => map.get(key).cloned().or(default),
    }
}

fn lookup_bool(map: Option<&ValueMap>, key: &str, default: bool) -> bool {
    let Some(map) = map else {
        return default;
    };

    map.get(key).map(value::as_bool).unwrap_or(default)
}

pub trait HasApiVersion {
    fn api_version(&self) -> Option<&str>;

    fn set_api_version(&mut self, version: Option<&str>);
}

/// Read side of a request as a service handler sees it.
///
/// Implementors provide the raw collections; every lookup rule is a provided method.
pub trait ServiceRequest {
    fn method(&self) -> Option<Method>;

    /// Parameters, `None` if they were never set.
    fn raw_parameters(&self) -> Option<&ValueMap>;

    /// Headers, `None` if they were never set.
    fn raw_headers(&self) -> Option<&ValueMap>;

    /// Decoded payload. Empty when nothing usable was decoded.
    fn payload(&self) -> &ValueMap;

    fn content(&self) -> Option<&Content>;

    fn content_type(&self) -> Option<&ContentType>;

    fn api_key_source(&self) -> &ApiKeySource;

    fn parameters(&self) -> &ValueMap {
        self.raw_parameters().unwrap_or_else(empty_map)
    }

    /// `default` when parameters were never set, the whole mapping when `key` is `None`.
    fn parameter(&self, key: Option<&str>, default: Option<Value>) -> Option<Value> {
        lookup(self.raw_parameters(), key, default)
    }

    fn parameter_as_bool(&self, key: &str, default: bool) -> bool {
        lookup_bool(self.raw_parameters(), key, default)
    }

    fn headers(&self) -> &ValueMap {
        self.raw_headers().unwrap_or_else(empty_map)
    }

    fn header(&self, key: Option<&str>, default: Option<Value>) -> Option<Value> {
        lookup(self.raw_headers(), key, default)
    }

    fn header_as_bool(&self, key: &str, default: bool) -> bool {
        lookup_bool(self.raw_headers(), key, default)
    }

    fn payload_data(&self, key: Option<&str>, default: Option<Value>) -> Option<Value> {
        lookup(Some(self.payload()), key, default)
    }

    /// Parameters win over the payload, `default` is the last resort.
    fn input(&self, key: Option<&str>, default: Option<Value>) -> Option<Value> {
        self.parameter(key, self.payload_data(key, default))
    }

    /// The API key from the configured parameter, else from the configured header.
    ///
    /// Header names match case-insensitively with `-` and `_` treated alike.
    fn api_key(&self) -> Option<String> {
        let source = self.api_key_source();
        let non_empty = |v: &Value| {
            (!value::is_empty(v))
                .then(|| value::scalar_string(v))
                .flatten()
        };

        if let Some(key) = self
            .raw_parameters()
            .and_then(|p| p.get(source.parameter.as_str()))
            .and_then(non_empty)
        {
            return Some(key);
        }

        let headers = self.raw_headers()?;
        headers
            .get(source.header.as_str())
            .or_else(|| {
                headers
                    .iter()
                    .find(|(name, _)| same_header_name(name, &source.header))
                    .map(|(_, v)| v)
            })
            .and_then(non_empty)
    }

    /// Uploaded files never travel with an internal request.
    fn file(&self, _key: Option<&str>, _default: Option<Value>) -> Option<Value> {
        None
    }

    /// No transport connection backs an internal request.
    fn driver(&self) -> Option<&dyn Any> {
        None
    }
}

fn same_header_name(a: &str, b: &str) -> bool {
    let normalize = |s: &str| s.replace('_', "-");
    unicase::eq(normalize(a).as_str(), normalize(b).as_str())
}

#[derive(Clone, Debug, Default, PartialEq)]
struct Payload {
    data: ValueMap,
    /// Set when the last content could not be decoded.
    malformed: Option<ContentType>,
}

impl Payload {
    fn malformed(content_type: ContentType) -> Self {
        Self {
            data: ValueMap::new(),
            malformed: Some(content_type),
        }
    }
}

impl From<ValueMap> for Payload {
    fn from(data: ValueMap) -> Self {
        Self {
            data,
            malformed: None,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct InternalServiceRequest {
    api_version: Option<CompactString>,
    method: Option<Method>,
    parameters: Option<ValueMap>,
    headers: Option<ValueMap>,
    content: Option<Content>,
    content_type: Option<ContentType>,
    payload: Payload,
    api_key_source: ApiKeySource,
}

impl InternalServiceRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_api_key_source(mut self, source: ApiKeySource) -> Self {
        self.api_key_source = source;
        self
    }

    pub fn set_api_key_source(&mut self, source: ApiKeySource) -> &mut Self {
        self.api_key_source = source;
        self
    }

    /// Fails with [RequestError::InvalidMethod] and keeps the current method if `verb` is unknown.
    pub fn set_method(&mut self, verb: impl AsRef<str>) -> Result<&mut Self, RequestError> {
        self.method = Some(Method::parse(verb.as_ref())?);
        Ok(self)
    }

    pub fn set_parameters(&mut self, parameters: ValueMap) -> &mut Self {
        self.parameters = Some(parameters);
        self
    }

    pub fn set_parameter(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.parameters
            .get_or_insert_with(ValueMap::new)
            .insert(key.into(), value.into());
        self
    }

    pub fn set_headers(&mut self, headers: ValueMap) -> &mut Self {
        self.headers = Some(headers);
        self
    }

    pub fn set_header(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.headers
            .get_or_insert_with(ValueMap::new)
            .insert(key.into(), value.into());
        self
    }

    /// Stores the raw content and re-derives the payload for `RawArray` and `Json`.
    /// Other tags leave the payload as it was.
    pub fn set_content(
        &mut self,
        data: impl Into<Content>,
        content_type: ContentType,
    ) -> &mut Self {
        let content = data.into();

        match &content_type {
            ContentType::RawArray => {
                self.payload = match content.as_map() {
                    Some(map) => Payload::from(map.clone()),
                    None => {
                        tracing::warn!(
                            content_type = %content_type,
                            "content is not a mapping, payload left empty"
                        );
                        Payload::malformed(content_type.clone())
                    }
                };
            }
            ContentType::Json => {
                self.payload = match content.json_text().and_then(decode_json) {
                    Some(map) => Payload::from(map),
                    None => {
                        tracing::warn!(
                            content_type = %content_type,
                            "content is not a JSON object, payload left empty"
                        );
                        Payload::malformed(content_type.clone())
                    }
                };
            }
            _ => {}
        }

        self.content = Some(content);
        self.content_type = Some(content_type);
        self
    }

    /// `set_content` with the default `RawArray` tag.
    pub fn set_raw_content(&mut self, data: impl Into<Content>) -> &mut Self {
        self.set_content(data, ContentType::default())
    }

    pub fn set_payload_data(&mut self, data: ValueMap) -> &mut Self {
        self.payload = Payload::from(data);
        self
    }

    pub fn set_payload_key_value(
        &mut self,
        key: impl Into<String>,
        value: impl Into<Value>,
    ) -> &mut Self {
        self.payload.malformed = None;
        self.payload.data.insert(key.into(), value.into());
        self
    }

    /// Payload read that reports a failed decode instead of hiding it behind an empty map.
    pub fn try_payload(&self) -> Result<&ValueMap, PayloadError> {
        match &self.payload.malformed {
            Some(content_type) => Err(PayloadError::Malformed {
                content_type: content_type.clone(),
            }),
            None => Ok(&self.payload.data),
        }
    }
}

fn decode_json(mut raw: Vec<u8>) -> Option<ValueMap> {
    simd_json::serde::from_slice::<ValueMap>(&mut raw).ok()
}

impl HasApiVersion for InternalServiceRequest {
    fn api_version(&self) -> Option<&str> {
        self.api_version.as_deref()
    }

    fn set_api_version(&mut self, version: Option<&str>) {
        self.api_version = version.map(CompactString::from);
    }
}

impl ServiceRequest for InternalServiceRequest {
    fn method(&self) -> Option<Method> {
        self.method
    }

    fn raw_parameters(&self) -> Option<&ValueMap> {
        self.parameters.as_ref()
    }

    fn raw_headers(&self) -> Option<&ValueMap> {
        self.headers.as_ref()
    }

    fn payload(&self) -> &ValueMap {
        &self.payload.data
    }

    fn content(&self) -> Option<&Content> {
        self.content.as_ref()
    }

    fn content_type(&self) -> Option<&ContentType> {
        self.content_type.as_ref()
    }

    fn api_key_source(&self) -> &ApiKeySource {
        &self.api_key_source
    }
}
