//! HTTP transport seam
//!
//! The gateway only needs "GET a URL with query parameters and parse the
//! JSON body". Anything that can do that implements [`Transport`].

use log::debug;
use serde_json::Value;

use crate::error::TransportError;

/// Fetch JSON over HTTP with query parameters
pub trait Transport: Send + Sync {
    /// Issue a GET to `url` with `query` appended and return the parsed body
    fn get(&self, url: &str, query: &[(String, String)]) -> Result<Value, TransportError>;
}

/// Blocking HTTP transport backed by ureq
///
/// Uses ureq's default timeouts; no extra deadline is imposed.
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new() -> Self {
        Self {
            agent: ureq::Agent::new_with_defaults(),
        }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for UreqTransport {
    fn get(&self, url: &str, query: &[(String, String)]) -> Result<Value, TransportError> {
        debug!("GET {} ({} query params)", url, query.len());

        let response = self
            .agent
            .get(url)
            .query_pairs(query.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .call();

        match response {
            Ok(mut resp) => resp
                .body_mut()
                .read_json::<Value>()
                .map_err(|e| TransportError::Body(e.to_string())),
            Err(ureq::Error::StatusCode(code)) => Err(TransportError::Status(code)),
            Err(e) => Err(TransportError::Network(e.to_string())),
        }
    }
}
