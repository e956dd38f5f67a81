//! Plain-mapping form of a request, for boundaries that only carry maps.

use serde_json::Value;

use crate::application::service_request::{
    HasApiVersion, InternalServiceRequest, ServiceRequest, ValueMap,
};
use crate::domain::content::ContentType;
use crate::domain::errors::RequestError;

pub const API_VERSION: &str = "api_version";
pub const METHOD: &str = "method";
pub const PARAMETERS: &str = "parameters";
pub const HEADERS: &str = "headers";
pub const PAYLOAD: &str = "payload";
pub const CONTENT: &str = "content";
pub const CONTENT_TYPE: &str = "content_type";

fn map_field(data: &ValueMap, field: &'static str) -> Result<Option<ValueMap>, RequestError> {
    match data.get(field) {
        None => Ok(None),
        Some(Value::Null) => Ok(Some(ValueMap::new())),
        Some(Value::Object(map)) => Ok(Some(map.clone())),
        Some(_) => Err(RequestError::InvalidField {
            field,
            expected: "a mapping",
        }),
    }
}

impl InternalServiceRequest {
    /// Snapshot of every field. A payload that failed to decode is written as `null`.
    pub fn to_array(&self) -> ValueMap {
        let payload = match self.try_payload() {
            Ok(payload) => Value::Object(payload.clone()),
            Err(e) => {
                tracing::warn!(error = %e, "payload unavailable, snapshot carries null");
                Value::Null
            }
        };

        let mut out = ValueMap::new();
        out.insert(API_VERSION.into(), self.api_version().map(Value::from).unwrap_or_default());
        out.insert(
            METHOD.into(),
            self.method().map(|m| Value::from(m.as_str())).unwrap_or_default(),
        );
        out.insert(PARAMETERS.into(), Value::Object(self.parameters().clone()));
        out.insert(HEADERS.into(), Value::Object(self.headers().clone()));
        out.insert(PAYLOAD.into(), payload);
        out.insert(CONTENT.into(), self.content().map(|c| c.to_value()).unwrap_or_default());
        out.insert(
            CONTENT_TYPE.into(),
            self.content_type()
                .map(|t| Value::from(t.as_str()))
                .unwrap_or_default(),
        );
        out
    }

    /// Applies the keys present in `data`, in order: method, parameters, headers, payload,
    /// then content with its content type.
    ///
    /// A `null` method or content, as snapshots write for unset ones, leaves that field alone.
    /// Keys already applied stay applied when a later key fails.
    pub fn merge_from_array(&mut self, data: &ValueMap) -> Result<(), RequestError> {
        if let Some(method) = data.get(METHOD) {
            match method {
                Value::Null => {}
                Value::String(verb) => {
                    self.set_method(verb)?;
                }
                other => return Err(RequestError::InvalidMethod(other.to_string())),
            }
        }

        if let Some(parameters) = map_field(data, PARAMETERS)? {
            self.set_parameters(parameters);
        }
        if let Some(headers) = map_field(data, HEADERS)? {
            self.set_headers(headers);
        }
        if let Some(payload) = map_field(data, PAYLOAD)? {
            self.set_payload_data(payload);
        }

        if let Some(content) = data.get(CONTENT).filter(|c| !c.is_null()) {
            let content_type = match data.get(CONTENT_TYPE) {
                None | Some(Value::Null) => ContentType::default(),
                Some(Value::String(tag)) => ContentType::from(tag.as_str()),
                Some(_) => {
                    return Err(RequestError::InvalidField {
                        field: CONTENT_TYPE,
                        expected: "a content type tag",
                    })
                }
            };
            self.set_content(content.clone(), content_type);
        }

        tracing::debug!(keys = ?data.keys().collect::<Vec<_>>(), "merged request fields");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::content::Content;
    use crate::domain::method::Method;
    use serde_json::json;

    fn map(value: Value) -> ValueMap {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn success_empty_snapshot() {
        let snapshot = InternalServiceRequest::new().to_array();
        assert_eq!(
            Value::Object(snapshot),
            json!({
                "api_version": null,
                "method": null,
                "parameters": {},
                "headers": {},
                "payload": {},
                "content": null,
                "content_type": null,
            })
        );
    }

    #[test]
    fn success_round_trip() {
        let mut req = InternalServiceRequest::new();
        req.set_method("PATCH").unwrap();
        req.set_parameters(map(json!({"limit": 10})));
        req.set_headers(map(json!({"Accept": "application/json"})));
        req.set_content(r#"{"name":"x"}"#, ContentType::Json);

        let mut copy = InternalServiceRequest::new();
        copy.merge_from_array(&req.to_array()).unwrap();

        assert_eq!(copy.method(), Some(Method::PATCH));
        assert_eq!(copy.parameters(), req.parameters());
        assert_eq!(copy.headers(), req.headers());
        assert_eq!(copy.content(), req.content());
        assert_eq!(copy.content_type(), req.content_type());
        assert_eq!(copy.payload(), req.payload());
    }

    #[test]
    fn success_round_trip_rederives_independent_payload() {
        let mut req = InternalServiceRequest::new();
        req.set_content(json!({"a": 1}), ContentType::RawArray);
        req.set_payload_key_value("b", 2);

        let mut copy = InternalServiceRequest::new();
        copy.merge_from_array(&req.to_array()).unwrap();

        assert_eq!(copy.content(), Some(&Content::Structured(json!({"a": 1}))));
        assert_eq!(copy.payload(), &map(json!({"a": 1})));
    }

    #[test]
    fn success_malformed_payload_snapshots_as_null() {
        let mut req = InternalServiceRequest::new();
        req.set_content("not json", ContentType::Json);

        let snapshot = req.to_array();
        assert_eq!(snapshot[PAYLOAD], Value::Null);
        assert_eq!(snapshot[CONTENT], json!("not json"));
        assert_eq!(snapshot[CONTENT_TYPE], json!("json"));

        let mut copy = InternalServiceRequest::new();
        copy.merge_from_array(&snapshot).unwrap();
        assert!(copy.try_payload().is_err());
    }

    #[test]
    fn success_partial_merge_leaves_other_fields() {
        let mut req = InternalServiceRequest::new();
        req.set_method("GET").unwrap();
        req.set_parameter("a", 1);

        req.merge_from_array(&map(json!({"headers": {"h": "v"}}))).unwrap();

        assert_eq!(req.method(), Some(Method::GET));
        assert_eq!(req.parameters(), &map(json!({"a": 1})));
        assert_eq!(req.headers(), &map(json!({"h": "v"})));
    }

    #[test]
    fn success_content_without_type_is_raw_array() {
        let mut req = InternalServiceRequest::new();
        req.merge_from_array(&map(json!({"content": {"k": "v"}}))).unwrap();

        assert_eq!(req.content_type(), Some(&ContentType::RawArray));
        assert_eq!(req.payload(), &map(json!({"k": "v"})));
    }

    #[test]
    fn success_content_is_applied_after_payload() {
        let mut req = InternalServiceRequest::new();
        req.merge_from_array(&map(json!({
            "payload": {"from": "payload"},
            "content": "{\"from\":\"content\"}",
            "content_type": "json",
        })))
        .unwrap();

        assert_eq!(req.payload_data(Some("from"), None), Some(json!("content")));
    }

    #[test]
    fn failure_bogus_method_leaves_fields_untouched() {
        let mut req = InternalServiceRequest::new();
        req.set_method("POST").unwrap();
        req.set_parameter("a", 1);

        let err = req
            .merge_from_array(&map(json!({"method": "BOGUS", "parameters": {"b": 2}})))
            .unwrap_err();

        assert_eq!(err, RequestError::InvalidMethod("BOGUS".into()));
        assert_eq!(req.method(), Some(Method::POST));
        assert_eq!(req.parameters(), &map(json!({"a": 1})));
    }

    #[test]
    fn failure_later_key_does_not_roll_back_earlier_ones() {
        let mut req = InternalServiceRequest::new();

        let err = req
            .merge_from_array(&map(json!({
                "method": "DELETE",
                "parameters": {"a": 1},
                "headers": 5,
            })))
            .unwrap_err();

        assert_eq!(
            err,
            RequestError::InvalidField {
                field: HEADERS,
                expected: "a mapping"
            }
        );
        assert_eq!(req.method(), Some(Method::DELETE));
        assert_eq!(req.parameters(), &map(json!({"a": 1})));
        assert_eq!(req.raw_headers(), None);
    }

    #[test]
    fn success_null_method_leaves_method() {
        let mut req = InternalServiceRequest::new();
        req.merge_from_array(&map(json!({"method": null}))).unwrap();
        assert_eq!(req.method(), None);

        req.set_method("HEAD").unwrap();
        req.merge_from_array(&map(json!({"method": null}))).unwrap();
        assert_eq!(req.method(), Some(Method::HEAD));
    }

    #[test]
    fn success_round_trip_without_method() {
        let mut req = InternalServiceRequest::new();
        req.set_parameter("a", 1);

        let mut copy = InternalServiceRequest::new();
        copy.merge_from_array(&req.to_array()).unwrap();

        assert_eq!(copy.method(), None);
        assert_eq!(copy.parameters(), req.parameters());
        assert_eq!(copy.content(), None);
        assert_eq!(copy.content_type(), None);
        assert!(copy.try_payload().is_ok());
    }

    #[test]
    fn failure_non_string_method() {
        let mut req = InternalServiceRequest::new();
        let err = req.merge_from_array(&map(json!({"method": 5}))).unwrap_err();
        assert_eq!(err, RequestError::InvalidMethod("5".into()));
    }
}
