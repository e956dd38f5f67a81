use std::fmt;

use bytes::Bytes;
use compact_str::CompactString;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// How `content` should be interpreted when deriving the payload.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum ContentType {
    /// Content already is a structured mapping.
    #[default]
    RawArray,
    Json,
    Xml,
    Csv,
    Text,
    /// Any tag without a derivation rule. A tag spelled like a built-in one
    /// (`"json"`, `"raw_array"`, ...) parses back as that built-in.
    Other(CompactString),
}

impl ContentType {
    pub fn as_str(&self) -> &str {
        match self {
            ContentType::RawArray => "raw_array",
            ContentType::Json => "json",
            ContentType::Xml => "xml",
            ContentType::Csv => "csv",
            ContentType::Text => "text",
            ContentType::Other(tag) => tag.as_str(),
        }
    }

    /// Maps a `Content-Type` header value onto a tag. Parameters such as `charset` are ignored.
    pub fn from_mime(mime: &str) -> Self {
        let essence = mime.split(';').next().unwrap_or_default().trim();
        let lower = essence.to_ascii_lowercase();

        match lower.as_str() {
            "application/json" => ContentType::Json,
            "application/xml" | "text/xml" => ContentType::Xml,
            "text/csv" => ContentType::Csv,
            s if s.ends_with("+json") => ContentType::Json,
            s if s.ends_with("+xml") => ContentType::Xml,
            s if s.starts_with("text/") => ContentType::Text,
            _ => ContentType::Other(essence.into()),
        }
    }
}

impl From<&str> for ContentType {
    fn from(value: &str) -> Self {
        match value {
            "raw_array" => ContentType::RawArray,
            "json" => ContentType::Json,
            "xml" => ContentType::Xml,
            "csv" => ContentType::Csv,
            "text" => ContentType::Text,
            other => ContentType::Other(other.into()),
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ContentType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ContentType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = CompactString::deserialize(deserializer)?;
        Ok(ContentType::from(tag.as_str()))
    }
}

/// The body exactly as the caller handed it over.
#[derive(Clone, Debug, PartialEq)]
pub enum Content {
    Text(String),
    Bytes(Bytes),
    Structured(Value),
}

impl Content {
    /// A transport body: text when it is valid UTF-8, bytes otherwise.
    pub fn from_body(body: Bytes) -> Self {
        match String::from_utf8(body.to_vec()) {
            Ok(text) => Content::Text(text),
            Err(_) => Content::Bytes(body),
        }
    }

    /// Raw JSON text, if this content can carry any.
    pub(crate) fn json_text(&self) -> Option<Vec<u8>> {
        match self {
            Content::Text(text) => Some(text.as_bytes().to_vec()),
            Content::Bytes(bytes) => Some(bytes.to_vec()),
            Content::Structured(Value::String(text)) => Some(text.as_bytes().to_vec()),
            Content::Structured(_) => None,
        }
    }

    /// The content as a string-keyed mapping, when it already is one.
    pub(crate) fn as_map(&self) -> Option<&Map<String, Value>> {
        match self {
            Content::Structured(Value::Object(map)) => Some(map),
            _ => None,
        }
    }

    /// Plain value form used by snapshots. Bytes that are not UTF-8 become a list of byte numbers.
    pub fn to_value(&self) -> Value {
        match self {
            Content::Text(text) => Value::String(text.clone()),
            Content::Bytes(bytes) => match std::str::from_utf8(bytes) {
                Ok(text) => Value::String(text.to_string()),
                Err(_) => Value::Array(bytes.iter().map(|b| Value::from(*b)).collect()),
            },
            Content::Structured(value) => value.clone(),
        }
    }
}

impl From<Value> for Content {
    fn from(value: Value) -> Self {
        match value {
            Value::String(text) => Content::Text(text),
            other => Content::Structured(other),
        }
    }
}

impl From<Map<String, Value>> for Content {
    fn from(value: Map<String, Value>) -> Self {
        Content::Structured(Value::Object(value))
    }
}

impl From<String> for Content {
    fn from(value: String) -> Self {
        Content::Text(value)
    }
}

impl From<&str> for Content {
    fn from(value: &str) -> Self {
        Content::Text(value.to_string())
    }
}

impl From<Bytes> for Content {
    fn from(value: Bytes) -> Self {
        Content::Bytes(value)
    }
}

impl From<Vec<u8>> for Content {
    fn from(value: Vec<u8>) -> Self {
        Content::Bytes(value.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn success_mime_mapping() {
        assert_eq!(ContentType::from_mime("application/json; charset=utf-8"), ContentType::Json);
        assert_eq!(ContentType::from_mime("Application/JSON"), ContentType::Json);
        assert_eq!(ContentType::from_mime("application/problem+json"), ContentType::Json);
        assert_eq!(ContentType::from_mime("text/xml"), ContentType::Xml);
        assert_eq!(ContentType::from_mime("text/csv"), ContentType::Csv);
        assert_eq!(
            ContentType::from_mime("text/html; charset=ISO-8859-4"),
            ContentType::Text
        );
        assert_eq!(
            ContentType::from_mime("application/octet-stream"),
            ContentType::Other("application/octet-stream".into())
        );
    }

    #[test]
    fn success_tag_serde() {
        assert_eq!(serde_json::to_value(ContentType::RawArray).unwrap(), json!("raw_array"));
        let custom: ContentType = serde_json::from_value(json!("yaml")).unwrap();
        assert_eq!(custom, ContentType::Other("yaml".into()));
        let json: ContentType = serde_json::from_value(json!("json")).unwrap();
        assert_eq!(json, ContentType::Json);
    }

    #[test]
    fn success_reserved_custom_tag_parses_as_builtin() {
        let tag = ContentType::Other("json".into());
        assert_eq!(ContentType::from(tag.as_str()), ContentType::Json);
        assert_eq!(ContentType::from("yaml"), ContentType::Other("yaml".into()));
    }

    #[test]
    fn success_content_to_value() {
        assert_eq!(Content::from("abc").to_value(), json!("abc"));
        assert_eq!(Content::from(b"hi".to_vec()).to_value(), json!("hi"));
        assert_eq!(Content::from(vec![0xff, 0x00]).to_value(), json!([255, 0]));
        assert_eq!(Content::from(json!({"a": [1]})).to_value(), json!({"a": [1]}));
    }

    #[test]
    fn success_body_text_or_bytes() {
        assert_eq!(
            Content::from_body(Bytes::from_static(b"{}")),
            Content::Text("{}".into())
        );
        assert_eq!(
            Content::from_body(Bytes::from_static(&[0xff])),
            Content::Bytes(Bytes::from_static(&[0xff]))
        );
    }

    #[test]
    fn success_string_value_becomes_text() {
        assert_eq!(Content::from(json!("x")), Content::Text("x".into()));
        assert!(Content::from(json!({"a": 1})).as_map().is_some());
        assert!(Content::from(json!([1])).json_text().is_none());
    }
}
