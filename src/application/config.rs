use compact_str::CompactString;
use serde::{Deserialize, Serialize};

pub const API_KEY_PARAMETER: &str = "api_key";
pub const API_KEY_HEADER: &str = "X-DreamFactory-Api-Key";

/// Where [`api_key`](crate::application::service_request::ServiceRequest::api_key) looks,
/// parameter first. Hosts usually deserialize this from their own config file.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ApiKeySource {
    pub parameter: CompactString,
    pub header: CompactString,
}

impl Default for ApiKeySource {
    fn default() -> Self {
        Self {
            parameter: API_KEY_PARAMETER.into(),
            header: API_KEY_HEADER.into(),
        }
    }
}
