//! Mailbox client facade
//!
//! Wires the gateway, poller and event bus together around one shared
//! mailbox state and exposes the full operation surface.

use log::{info, warn};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;

use crate::api::responses::{AddressResponse, DeleteResponse, EmailListResponse};
use crate::api::{ApiMethod, ApiRequest, RequestGateway, Transport, UreqTransport};
use crate::config::ClientConfig;
use crate::error::{ApiError, Result};
use crate::events::{Event, EventBus, SubscriptionId, Topic};
use crate::models::{Email, EmailDetail, EmailId, SharedMailbox};
use crate::sync::{IntervalScheduler, PollController, PollOutcome, PollStatus, ScheduleFactory};

/// Client for one disposable mailbox
///
/// All calls block the calling thread until the server answers. Polling
/// runs on the schedule's own thread once [`start`](Self::start) is called.
pub struct MailboxClient {
    config: ClientConfig,
    mailbox: SharedMailbox,
    bus: Arc<EventBus>,
    gateway: Arc<RequestGateway>,
    poller: PollController,
}

impl MailboxClient {
    /// Create a client that talks HTTP and polls on a timer thread
    ///
    /// No request is made; call [`register`](Self::register) or use
    /// [`connect`](Self::connect).
    pub fn new(config: ClientConfig) -> Self {
        Self::with_collaborators(
            config,
            Arc::new(UreqTransport::new()),
            Arc::new(IntervalScheduler),
        )
    }

    /// Create a client with custom transport and schedule factory
    pub fn with_collaborators(
        config: ClientConfig,
        transport: Arc<dyn Transport>,
        schedules: Arc<dyn ScheduleFactory>,
    ) -> Self {
        let mailbox = SharedMailbox::new();
        let bus = Arc::new(EventBus::new());
        let gateway = Arc::new(RequestGateway::new(
            transport,
            config.base_url.clone(),
            mailbox.clone(),
            Arc::clone(&bus),
        ));
        let poller = PollController::new(
            Arc::clone(&gateway),
            mailbox.clone(),
            Arc::clone(&bus),
            schedules,
            config.poll_interval(),
        );

        Self {
            config,
            mailbox,
            bus,
            gateway,
            poller,
        }
    }

    /// Create an HTTP client and register its mailbox
    pub fn connect(config: ClientConfig) -> Result<Self> {
        let client = Self::new(config);
        client.register()?;
        Ok(client)
    }

    /// Obtain a mailbox address
    ///
    /// Claims the configured username if there is one, otherwise accepts
    /// the address the server assigns.
    pub fn register(&self) -> Result<AddressResponse> {
        let lang = self.config.lang.as_deref();
        let site = self.config.site.as_deref();
        let response = match self.config.username.as_deref() {
            Some(user) => self.set_email_user(user, lang, site)?,
            None => self.get_email_address(lang, site)?,
        };
        info!("Registered mailbox {}", response.email_addr);
        Ok(response)
    }

    // === Event subscription ===

    /// Subscribe to a topic
    pub fn on<F>(&self, topic: Topic, handler: F) -> SubscriptionId
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        self.bus.on(topic, handler)
    }

    /// Remove a subscription
    pub fn off(&self, subscription: SubscriptionId) -> bool {
        self.bus.off(subscription)
    }

    pub fn events(&self) -> &Arc<EventBus> {
        &self.bus
    }

    // === State ===

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn address(&self) -> Option<String> {
        self.mailbox.address()
    }

    pub fn session_token(&self) -> Option<String> {
        self.mailbox.session_token()
    }

    /// Emails received so far, in arrival order
    pub fn received_emails(&self) -> Vec<Email> {
        self.mailbox.received()
    }

    // === Polling ===

    /// Start polling, or resume if paused. See [`PollController::start`].
    pub fn start(&self) -> bool {
        self.poller.start()
    }

    pub fn pause(&self) {
        self.poller.pause()
    }

    pub fn resume(&self) {
        self.poller.resume()
    }

    /// Hard stop: discards the schedule and the received emails
    pub fn stop(&self) {
        self.poller.stop()
    }

    pub fn poll_once(&self) -> PollOutcome {
        self.poller.poll_once()
    }

    pub fn poll_status(&self) -> PollStatus {
        self.poller.status()
    }

    // === API operations ===

    /// Claim `user` as the mailbox name
    pub fn set_email_user(
        &self,
        user: &str,
        lang: Option<&str>,
        site: Option<&str>,
    ) -> Result<AddressResponse> {
        self.typed(ApiRequest::set_email_user(user, lang, site))
    }

    /// Get the address assigned to the current session
    pub fn get_email_address(
        &self,
        lang: Option<&str>,
        site: Option<&str>,
    ) -> Result<AddressResponse> {
        self.typed(ApiRequest::get_email_address(lang, site))
    }

    /// List emails starting at `offset`, optionally only those newer than `seq`
    pub fn get_email_list(&self, offset: u64, seq: Option<EmailId>) -> Result<EmailListResponse> {
        self.typed(ApiRequest::get_email_list(offset, seq))
    }

    /// List emails older than `seq`
    pub fn get_older_list(
        &self,
        seq: Option<EmailId>,
        limit: Option<u32>,
    ) -> Result<EmailListResponse> {
        self.typed(ApiRequest::get_older_list(seq, limit))
    }

    /// List emails newer than `seq`
    pub fn check_email(&self, seq: Option<EmailId>) -> Result<EmailListResponse> {
        self.typed(ApiRequest::check_email(seq))
    }

    /// Fetch one full message
    pub fn fetch_email(&self, id: EmailId) -> Result<EmailDetail> {
        self.typed(ApiRequest::fetch_email(id))
    }

    /// Delete emails on the server; deleted ids are dropped locally too
    pub fn del_email(&self, ids: &[EmailId]) -> Result<DeleteResponse> {
        self.typed(ApiRequest::del_email(ids))
    }

    /// Release the mailbox. Returns the server's verdict.
    pub fn forget_me(&self) -> Result<bool> {
        let address = self.mailbox.address();
        let body = self.gateway.call(ApiRequest::forget_me(address.as_deref()))?;
        Ok(body == Value::Bool(true))
    }

    /// Tear everything down
    ///
    /// Stops the poller, asks the server to forget the mailbox and clears
    /// the received emails. A failed forget is logged, not returned.
    pub fn destroy(&self) {
        self.poller.stop();
        if let Err(e) = self.forget_me() {
            warn!("Failed to release mailbox: {}", e);
        }
        self.mailbox.clear_received();
    }

    fn typed<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T> {
        let method = request.method;
        let body = self.gateway.call(request)?;
        decode(method, body)
    }
}

fn decode<T: DeserializeOwned>(method: ApiMethod, body: Value) -> Result<T> {
    serde_json::from_value(body).map_err(|e| ApiError::Decode {
        method,
        message: e.to_string(),
    })
}
