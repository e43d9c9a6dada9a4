//! Tempmail crate - Client for the Guerrilla Mail disposable-email API
//!
//! This crate provides:
//! - Domain models (Email, EmailId, shared mailbox state)
//! - API request shaping and a session-aware request gateway
//! - A polling state machine with pause/resume and overlap protection
//! - Set arithmetic used to deduplicate incoming mail by id
//! - A topic-keyed event bus for lifecycle and new-mail notifications
//!
//! The network and the timer sit behind the [`Transport`] and
//! [`ScheduleFactory`] traits; in-memory versions ship alongside the real
//! ones for tests.

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod events;
pub mod models;
pub mod sync;

pub use api::responses::{AddressResponse, DeleteResponse, EmailListResponse};
pub use api::{
    ApiMethod, ApiRequest, DEFAULT_BASE_URL, Params, RecordedRequest, RequestGateway,
    ScriptedTransport, Transport, UreqTransport,
};
pub use client::MailboxClient;
pub use config::ClientConfig;
pub use error::{ApiError, Result, TransportError};
pub use events::{Event, EventBus, SubscriptionId, Topic};
pub use models::{Email, EmailDetail, EmailId, MailboxState, SharedMailbox};
pub use sync::{
    // Email set arithmetic
    filter_new, most_recent, remove_by_ids,
    // Poll state machine
    PollController, PollOutcome, PollStatus,
    // Schedules
    IntervalScheduler, IntervalTimer, ManualScheduler, Schedule, ScheduleFactory, Tick,
};
