use bytes::Bytes;
use eyre::{bail, OptionExt};
use httparse::{ParserConfig, Status};
use memchr::memchr;
use serde_json::Value;

use crate::application::service_request::{InternalServiceRequest, ValueMap};
use crate::domain::content::{Content, ContentType};
use crate::domain::errors::RequestError;
use crate::AnyResult;

const MAX_HEADERS: usize = 32;
const CONTENT_TYPE: &str = "content-type";
const FALLBACK_MIME: &str = "application/octet-stream";

fn parse_body(body: &[u8]) -> Option<&[u8]> {
    if body.is_empty() || body.first() == Some(&b'\0') {
        return None;
    }

    let body_content = memchr(b'\0', body).map(|idx| &body[..idx]).unwrap_or(body);
    Some(body_content)
}

fn parse_query(query: &str) -> ValueMap {
    url::form_urlencoded::parse(query.as_bytes())
        .map(|(k, v)| (k.into_owned(), Value::String(v.into_owned())))
        .collect()
}

/// Repeated header names are folded into one comma separated value.
fn insert_header(headers: &mut ValueMap, name: &str, value: &[u8]) {
    let value = String::from_utf8_lossy(value);
    match headers.get_mut(name) {
        Some(Value::String(existing)) => {
            existing.push_str(", ");
            existing.push_str(&value);
        }
        _ => {
            headers.insert(name.to_string(), Value::String(value.into_owned()));
        }
    }
}

fn content_type_of(headers: &ValueMap) -> ContentType {
    headers
        .iter()
        .find(|(name, _)| unicase::eq(name.as_str(), CONTENT_TYPE))
        .and_then(|(_, v)| v.as_str())
        .map(ContentType::from_mime)
        .unwrap_or_else(|| ContentType::from_mime(FALLBACK_MIME))
}

fn fill_from_parts(
    req: &mut InternalServiceRequest,
    path: &str,
    headers: ValueMap,
    body: Option<Bytes>,
) {
    if let Some((_, query)) = path.split_once('?') {
        req.set_parameters(parse_query(query));
    }

    let content_type = content_type_of(&headers);
    req.set_headers(headers);

    if let Some(body) = body {
        req.set_content(Content::from_body(body), content_type);
    }
}

/// Builds a request from a raw HTTP/1.x message.
/// Partial messages are rejected rather than buffered.
pub fn parse_http(request: &[u8]) -> AnyResult<InternalServiceRequest> {
    let mut headers = [httparse::EMPTY_HEADER; MAX_HEADERS];
    let mut req = httparse::Request::new(&mut headers);
    let body_start = match ParserConfig::default().parse_request(&mut req, request)? {
        Status::Complete(idx) => idx,
        Status::Partial => bail!("incomplete http request"),
    };

    let verb = req.method.ok_or_eyre("request line without method")?;
    let path = req.path.ok_or_eyre("request line without path")?;

    let mut header_map = ValueMap::new();
    for header in req.headers.iter() {
        insert_header(&mut header_map, header.name, header.value);
    }

    let body = parse_body(&request[body_start..]).map(Bytes::copy_from_slice);

    let mut service_request = InternalServiceRequest::new();
    service_request.set_method(verb)?;
    fill_from_parts(&mut service_request, path, header_map, body);

    tracing::debug!(method = verb, path, "built internal request from raw http");
    Ok(service_request)
}

/// Builds a request from an `http` crate request. Only the verb can fail.
pub fn from_http(request: http::Request<Bytes>) -> Result<InternalServiceRequest, RequestError> {
    let (parts, body) = request.into_parts();

    let mut header_map = ValueMap::new();
    for (name, value) in parts.headers.iter() {
        insert_header(&mut header_map, name.as_str(), value.as_bytes());
    }

    let body = (!body.is_empty()).then_some(body);
    let path = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or_else(|| parts.uri.path());

    let mut service_request = InternalServiceRequest::new();
    service_request.set_method(parts.method.as_str())?;
    fill_from_parts(&mut service_request, path, header_map, body);

    tracing::debug!(method = %parts.method, path, "built internal request from http::Request");
    Ok(service_request)
}
