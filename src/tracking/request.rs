use crate::error::InvalidVisitorId;
use serde_json::{Map, Value};
use sha1::{Digest, Sha1};

/// Visitor ids are 8 bytes, written as 16 hex characters.
pub const VISITOR_ID_HEX_LEN: usize = 16;

const PARAM_USER_ID: &str = "uid";
const PARAM_FORCED_VISITOR_ID: &str = "cid";
const PARAM_VISITOR_ID: &str = "_id";
const PARAM_CLIENT_IP: &str = "cip";

const DEFAULT_IP: &str = "0.0.0.0";

/// One tracking request inside a request set.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    params: Map<String, Value>,
    remote_addr: Option<String>,
}

impl Request {
    pub fn new(params: Map<String, Value>, remote_addr: Option<String>) -> Self {
        Request {
            params,
            remote_addr,
        }
    }

    /// String value of a tracking parameter. Non-string values are absent.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).and_then(Value::as_str)
    }

    fn non_empty_param(&self, name: &str) -> Option<&str> {
        self.param(name).filter(|v| !v.is_empty())
    }

    pub fn forced_user_id(&self) -> Option<&str> {
        self.non_empty_param(PARAM_USER_ID)
    }

    pub fn forced_visitor_id(&self) -> Option<&str> {
        self.non_empty_param(PARAM_FORCED_VISITOR_ID)
    }

    /// The `_id` parameter as sent by the tracker, if any.
    pub fn explicit_visitor_id(&self) -> Option<&str> {
        self.non_empty_param(PARAM_VISITOR_ID)
    }

    /// Client address: the `cip` override, else the server-side remote address.
    pub fn ip_string(&self) -> &str {
        self.non_empty_param(PARAM_CLIENT_IP)
            .or(self.remote_addr.as_deref())
            .unwrap_or(DEFAULT_IP)
    }

    /// Derive the 8-byte visitor id, if the request carries one.
    ///
    /// A user id takes precedence (hashed), then a forced visitor id, then
    /// the `_id` parameter. `Ok(None)` means the request is anonymous and
    /// should be sharded by IP.
    pub fn visitor_id(&self) -> Result<Option<Vec<u8>>, InvalidVisitorId> {
        if let Some(user_id) = self.forced_user_id() {
            let digest = hex::encode(Sha1::digest(user_id.as_bytes()));
            return decode_hex_id(&digest[..VISITOR_ID_HEX_LEN]).map(Some);
        }

        if let Some(forced) = self.forced_visitor_id() {
            if forced.len() != VISITOR_ID_HEX_LEN {
                return Err(InvalidVisitorId {
                    value: forced.to_string(),
                    reason: "forced visitor id must be 16 hex characters",
                });
            }
            return decode_hex_id(forced).map(Some);
        }

        match self.explicit_visitor_id() {
            Some(id) if id.len() >= VISITOR_ID_HEX_LEN => {
                let truncated = id.get(..VISITOR_ID_HEX_LEN).ok_or_else(|| InvalidVisitorId {
                    value: id.to_string(),
                    reason: "visitor id is not hexadecimal",
                })?;
                decode_hex_id(truncated).map(Some)
            }
            _ => Ok(None),
        }
    }
}

fn decode_hex_id(value: &str) -> Result<Vec<u8>, InvalidVisitorId> {
    hex::decode(value).map_err(|_| InvalidVisitorId {
        value: value.to_string(),
        reason: "visitor id is not hexadecimal",
    })
}
