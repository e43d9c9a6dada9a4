//! Publish/subscribe notifications for mailbox activity
//!
//! Events are purely informational: every state change they describe has
//! already been applied by the time a handler runs.

use log::debug;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use crate::api::ApiMethod;
use crate::error::ApiError;
use crate::models::Email;

/// Named topic that handlers subscribe to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    /// A mailbox address was assigned (`set_email_user`, `get_email_address`)
    EmailAddress,
    /// A poll cycle found emails not seen before
    NewEmail,
    PollRequestStart,
    PollRequestComplete,
    PollRequestError,
    /// A call to the given API method failed
    MethodError(ApiMethod),
}

impl Topic {
    pub fn name(&self) -> String {
        match self {
            Topic::EmailAddress => "emailAddress".to_string(),
            Topic::NewEmail => "newEmail".to_string(),
            Topic::PollRequestStart => "pollRequestStart".to_string(),
            Topic::PollRequestComplete => "pollRequestComplete".to_string(),
            Topic::PollRequestError => "pollRequestError".to_string(),
            Topic::MethodError(method) => format!("{}Error", method.as_str()),
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

/// Payload delivered to handlers
#[derive(Debug, Clone)]
pub enum Event {
    /// Successful API call; `body` is the raw response
    Response { method: ApiMethod, body: Value },
    /// Failed API call
    CallFailed { method: ApiMethod, error: ApiError },
    /// Emails appended to the received list, in arrival order
    NewEmail(Vec<Email>),
    PollStarted,
    PollCompleted,
    PollFailed(ApiError),
}

/// Identifies a subscription so it can be removed with [`EventBus::off`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Handler = Arc<dyn Fn(&Event) + Send + Sync>;

/// Topic-keyed event bus
///
/// Handlers run synchronously on the thread that emits, in subscription
/// order. The handler list is snapshotted before dispatch, so handlers
/// may subscribe or unsubscribe without deadlocking.
#[derive(Default)]
pub struct EventBus {
    handlers: RwLock<HashMap<Topic, Vec<(SubscriptionId, Handler)>>>,
    next_id: AtomicU64,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `topic`
    pub fn on<F>(&self, topic: Topic, handler: F) -> SubscriptionId
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(topic)
            .or_default()
            .push((id, Arc::new(handler)));
        id
    }

    /// Remove a subscription. Returns false if it was already gone.
    pub fn off(&self, subscription: SubscriptionId) -> bool {
        let mut handlers = self.handlers.write().unwrap_or_else(PoisonError::into_inner);
        for list in handlers.values_mut() {
            if let Some(pos) = list.iter().position(|(id, _)| *id == subscription) {
                list.remove(pos);
                return true;
            }
        }
        false
    }

    /// Deliver `event` to every handler of `topic`
    pub fn emit(&self, topic: Topic, event: &Event) {
        let targets: Vec<Handler> = self
            .handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&topic)
            .map(|list| list.iter().map(|(_, h)| Arc::clone(h)).collect())
            .unwrap_or_default();

        debug!("Emitting {} to {} handler(s)", topic, targets.len());
        for handler in targets {
            handler(event);
        }
    }

    /// Number of handlers subscribed to `topic`
    pub fn handler_count(&self, topic: Topic) -> usize {
        self.handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&topic)
            .map_or(0, Vec::len)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let handlers = self.handlers.read().unwrap_or_else(PoisonError::into_inner);
        f.debug_struct("EventBus")
            .field("topics", &handlers.len())
            .finish()
    }
}
