//! In-memory transport with scripted responses
//!
//! Used for testing and for running the client without network access.

use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

use super::Transport;
use crate::error::TransportError;

/// A request observed by [`ScriptedTransport`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub url: String,
    pub query: Vec<(String, String)>,
}

impl RecordedRequest {
    /// First value of a query parameter
    pub fn param(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Wire name of the API method (`f` parameter)
    pub fn method(&self) -> Option<&str> {
        self.param("f")
    }
}

/// Transport that replays queued responses in order and records requests
///
/// When the queue runs dry every call fails with a network error.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    responses: Mutex<VecDeque<Result<Value, TransportError>>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful response body
    pub fn push_response(&self, body: Value) -> &Self {
        self.lock_responses().push_back(Ok(body));
        self
    }

    /// Queue a failure
    pub fn push_error(&self, error: TransportError) -> &Self {
        self.lock_responses().push_back(Err(error));
        self
    }

    /// Every request received so far
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Wire names of the methods called so far, in order
    pub fn methods(&self) -> Vec<String> {
        self.requests()
            .iter()
            .filter_map(|r| r.method().map(str::to_string))
            .collect()
    }

    pub fn request_count(&self) -> usize {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Number of queued responses not yet consumed
    pub fn pending(&self) -> usize {
        self.lock_responses().len()
    }

    fn lock_responses(&self) -> std::sync::MutexGuard<'_, VecDeque<Result<Value, TransportError>>> {
        self.responses.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Transport for ScriptedTransport {
    fn get(&self, url: &str, query: &[(String, String)]) -> Result<Value, TransportError> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(RecordedRequest {
                url: url.to_string(),
                query: query.to_vec(),
            });

        self.lock_responses()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::Network("no scripted response left".into())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_replays_in_order_then_fails() {
        let transport = ScriptedTransport::new();
        transport
            .push_response(json!(1))
            .push_error(TransportError::Status(500));

        let q = vec![("f".to_string(), "check_email".to_string())];
        assert_eq!(transport.get("u", &q).unwrap(), json!(1));
        assert_eq!(transport.get("u", &q), Err(TransportError::Status(500)));
        assert!(matches!(
            transport.get("u", &q),
            Err(TransportError::Network(_))
        ));
        assert_eq!(transport.request_count(), 3);
        assert_eq!(transport.methods(), vec!["check_email"; 3]);
    }
}
