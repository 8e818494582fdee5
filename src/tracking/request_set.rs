use super::Request;
use crate::error::DecodeError;
use serde::Deserialize;
use serde_json::{Map, Value};

/// Stored shape of a queued request set. `tokenAuth` and `time` are
/// carried by the writer but play no part in sharding.
#[derive(Deserialize)]
struct StoredRequestSet {
    requests: Vec<Map<String, Value>>,
    #[serde(default)]
    env: StoredEnvironment,
}

#[derive(Deserialize, Default)]
struct StoredEnvironment {
    #[serde(default)]
    server: Map<String, Value>,
}

/// One decoded queue item.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestSet {
    requests: Vec<Request>,
}

impl RequestSet {
    /// Decode a raw queue payload.
    pub fn decode(raw: &[u8]) -> Result<Self, DecodeError> {
        let text = std::str::from_utf8(raw)?;
        let stored: StoredRequestSet = serde_json::from_str(text)?;

        let remote_addr = stored
            .env
            .server
            .get("REMOTE_ADDR")
            .and_then(Value::as_str)
            .map(str::to_string);

        let requests = stored
            .requests
            .into_iter()
            .map(|params| Request::new(params, remote_addr.clone()))
            .collect();

        Ok(RequestSet { requests })
    }

    pub fn requests(&self) -> &[Request] {
        &self.requests
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }
}
