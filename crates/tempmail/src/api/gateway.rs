//! Single entry point for API calls
//!
//! The gateway attaches the session token, keeps it current from
//! responses, applies the method-specific side effects to the shared
//! mailbox state and publishes the result on the event bus.

use log::{debug, info, warn};
use serde_json::Value;
use std::sync::Arc;

use super::{ApiMethod, ApiRequest, Transport};
use crate::error::{ApiError, Result};
use crate::events::{Event, EventBus, Topic};
use crate::models::{EmailId, SharedMailbox};
use crate::sync::remove_by_ids;

/// Issues API calls on behalf of one mailbox
pub struct RequestGateway {
    transport: Arc<dyn Transport>,
    base_url: String,
    mailbox: SharedMailbox,
    bus: Arc<EventBus>,
}

impl RequestGateway {
    /// Create a new gateway
    ///
    /// # Arguments
    /// * `transport` - HTTP transport used for every call
    /// * `base_url` - API endpoint (`.../ajax.php`)
    /// * `mailbox` - State updated by token, address and delete side effects
    /// * `bus` - Receives success and failure notifications
    pub fn new(
        transport: Arc<dyn Transport>,
        base_url: impl Into<String>,
        mailbox: SharedMailbox,
        bus: Arc<EventBus>,
    ) -> Self {
        Self {
            transport,
            base_url: base_url.into(),
            mailbox,
            bus,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Perform one API call
    ///
    /// On failure the `{method}Error` topic is published and the same
    /// error is returned.
    pub fn call(&self, request: ApiRequest) -> Result<Value> {
        let ApiRequest { method, mut params } = request;

        if let Some(token) = self.mailbox.session_token() {
            params.set("sid_token", token);
        }

        debug!("Calling {} with {} params", method, params.len());

        match self.transport.get(&self.base_url, params.as_slice()) {
            Ok(body) => {
                self.apply_side_effects(method, &body);

                if let Some(topic) = method.topic() {
                    self.bus.emit(
                        topic,
                        &Event::Response {
                            method,
                            body: body.clone(),
                        },
                    );
                }

                Ok(body)
            }
            Err(source) => {
                let error = ApiError::Transport { method, source };
                warn!("{}", error);
                self.bus.emit(
                    Topic::MethodError(method),
                    &Event::CallFailed {
                        method,
                        error: error.clone(),
                    },
                );
                Err(error)
            }
        }
    }

    /// Update mailbox state from a successful response
    fn apply_side_effects(&self, method: ApiMethod, body: &Value) {
        let mut state = self.mailbox.write();

        if let Some(token) = body
            .get("sid_token")
            .and_then(Value::as_str)
            .filter(|t| !t.is_empty())
        {
            state.session_token = Some(token.to_string());
        }

        match method {
            m if m.assigns_address() => {
                if let Some(address) = body.get("email_addr").and_then(Value::as_str) {
                    info!("Mailbox address assigned: {}", address);
                    state.address = Some(address.to_string());
                }
            }
            ApiMethod::ForgetMe => {
                if *body == Value::Bool(true) {
                    debug!("Mailbox forgotten, dropping session token");
                    state.session_token = None;
                }
            }
            ApiMethod::DelEmail => {
                if let Some(ids) = body.get("deleted_ids").and_then(Value::as_array) {
                    let ids: Vec<EmailId> = ids.iter().filter_map(parse_id).collect();
                    debug!("Server deleted {} email(s), syncing local list", ids.len());
                    state.received = remove_by_ids(&state.received, ids);
                }
            }
            _ => {}
        }
    }
}

/// Read an id sent either as a number or a numeric string
fn parse_id(value: &Value) -> Option<EmailId> {
    match value {
        Value::Number(n) => n.as_u64().map(EmailId),
        Value::String(s) => s.trim().parse().ok().map(EmailId),
        _ => None,
    }
}
