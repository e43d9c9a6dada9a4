//! Poll loop state machine
//!
//! Owns the repeating schedule and decides, on each tick, whether and how
//! to ask the server for new mail. At most one poll request per mailbox is
//! outstanding at any time.

use log::{debug, info, warn};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::time::Duration;

use super::emailset::{filter_new, most_recent};
use super::schedule::{Schedule, ScheduleFactory, Tick};
use crate::api::responses::EmailListResponse;
use crate::api::{ApiRequest, RequestGateway};
use crate::error::ApiError;
use crate::events::{Event, EventBus, Topic};
use crate::models::{Email, SharedMailbox};

/// Result of a single [`PollController::poll_once`] call
#[derive(Debug, Clone)]
pub enum PollOutcome {
    /// Paused, or a previous poll is still in flight; nothing was sent
    Skipped,
    /// The request completed; holds the emails not seen before
    Completed(Vec<Email>),
    /// The request failed; the loop keeps running
    Failed(ApiError),
}

/// Snapshot of the poll state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PollStatus {
    /// A schedule exists (running or paused)
    pub started: bool,
    /// A poll request is in flight
    pub polling: bool,
    pub paused: bool,
}

struct PollInner {
    gateway: Arc<RequestGateway>,
    mailbox: SharedMailbox,
    bus: Arc<EventBus>,
    schedules: Arc<dyn ScheduleFactory>,
    interval: Duration,
    /// Token of the cycle whose request is outstanding, 0 when idle
    in_flight: AtomicU64,
    next_cycle: AtomicU64,
    paused: AtomicBool,
    schedule: Mutex<Option<Box<dyn Schedule>>>,
}

/// Drives periodic polling for new mail
///
/// Cloning yields another handle to the same poller.
#[derive(Clone)]
pub struct PollController {
    inner: Arc<PollInner>,
}

impl PollController {
    /// Create an idle poller
    ///
    /// # Arguments
    /// * `gateway` - Used for `get_email_list` / `check_email`
    /// * `mailbox` - Source of the anchor id and target of new emails
    /// * `bus` - Receives poll lifecycle and new-mail events
    /// * `schedules` - Creates the repeating schedule on first start
    /// * `interval` - Time between ticks
    pub fn new(
        gateway: Arc<RequestGateway>,
        mailbox: SharedMailbox,
        bus: Arc<EventBus>,
        schedules: Arc<dyn ScheduleFactory>,
        interval: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(PollInner {
                gateway,
                mailbox,
                bus,
                schedules,
                interval,
                in_flight: AtomicU64::new(0),
                next_cycle: AtomicU64::new(1),
                paused: AtomicBool::new(false),
                schedule: Mutex::new(None),
            }),
        }
    }

    /// Start polling, or resume if paused
    ///
    /// The first start needs an assigned mailbox address; without one a
    /// warning is logged and the poller stays idle. On the first start one
    /// poll runs immediately on the calling thread.
    ///
    /// Returns whether the poller is running afterwards.
    pub fn start(&self) -> bool {
        {
            let mut schedule = self.inner.lock_schedule();
            if let Some(existing) = schedule.as_mut() {
                if self.inner.paused.swap(false, Ordering::SeqCst) {
                    debug!("Resuming paused poller");
                    existing.resume();
                }
                return true;
            }

            if self.inner.mailbox.address().is_none() {
                warn!(
                    "Cannot start polling yet - no mailbox address has been assigned. \
                     Register the mailbox and try again."
                );
                return false;
            }

            info!("Starting poller, interval {:?}", self.inner.interval);
            let weak: Weak<PollInner> = Arc::downgrade(&self.inner);
            let tick: Tick = Arc::new(move || {
                if let Some(inner) = weak.upgrade() {
                    inner.poll_once();
                }
            });
            *schedule = Some(self.inner.schedules.create(tick, self.inner.interval));
        }

        self.inner.poll_once();
        true
    }

    /// Suspend polling without discarding the schedule
    pub fn pause(&self) {
        let mut schedule = self.inner.lock_schedule();
        match schedule.as_mut() {
            Some(existing) if !self.inner.paused.swap(true, Ordering::SeqCst) => {
                debug!("Pausing poller");
                existing.pause();
            }
            Some(_) => debug!("Poller already paused"),
            None => debug!("Poller not started; nothing to pause"),
        }
    }

    /// Resume a paused poller; no-op otherwise
    pub fn resume(&self) {
        let mut schedule = self.inner.lock_schedule();
        match schedule.as_mut() {
            Some(existing) if self.inner.paused.swap(false, Ordering::SeqCst) => {
                debug!("Resuming poller");
                existing.resume();
            }
            _ => debug!("Poller not paused; nothing to resume"),
        }
    }

    /// Hard stop: discard the schedule, reset flags and forget received emails
    ///
    /// A request already in flight still completes and its result is
    /// applied to whatever state exists at that point.
    pub fn stop(&self) {
        if let Some(mut existing) = self.inner.lock_schedule().take() {
            info!("Stopping poller");
            existing.stop();
        }
        self.inner.paused.store(false, Ordering::SeqCst);
        self.inner.in_flight.store(0, Ordering::SeqCst);
        self.inner.mailbox.clear_received();
    }

    /// Run one poll cycle now
    pub fn poll_once(&self) -> PollOutcome {
        self.inner.poll_once()
    }

    pub fn status(&self) -> PollStatus {
        PollStatus {
            started: self.inner.lock_schedule().is_some(),
            polling: self.inner.in_flight.load(Ordering::SeqCst) != 0,
            paused: self.inner.paused.load(Ordering::SeqCst),
        }
    }

    pub fn interval(&self) -> Duration {
        self.inner.interval
    }
}

impl PollInner {
    fn lock_schedule(&self) -> std::sync::MutexGuard<'_, Option<Box<dyn Schedule>>> {
        self.schedule.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn poll_once(&self) -> PollOutcome {
        if self.paused.load(Ordering::SeqCst) {
            debug!("Poll skipped: paused");
            return PollOutcome::Skipped;
        }
        let cycle = self.next_cycle.fetch_add(1, Ordering::SeqCst);
        if self
            .in_flight
            .compare_exchange(0, cycle, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("Poll skipped: previous request still in flight");
            return PollOutcome::Skipped;
        }

        // Newest known email anchors an incremental fetch; with none known
        // the full list is requested from the start.
        let anchor = most_recent(&self.mailbox.read().received).map(|email| email.id);
        let request = match anchor {
            Some(seq) => ApiRequest::check_email(Some(seq)),
            None => ApiRequest::get_email_list(0, None),
        };

        self.bus.emit(Topic::PollRequestStart, &Event::PollStarted);
        let result = self.gateway.call(request);
        // Only release our own claim; a stop may have handed the slot to a
        // newer cycle meanwhile.
        let _ = self
            .in_flight
            .compare_exchange(cycle, 0, Ordering::SeqCst, Ordering::SeqCst);

        match result {
            Ok(body) => {
                self.bus.emit(Topic::PollRequestComplete, &Event::PollCompleted);

                let response: EmailListResponse = match serde_json::from_value(body) {
                    Ok(response) => response,
                    Err(e) => {
                        warn!("Ignoring unreadable poll response: {}", e);
                        EmailListResponse::default()
                    }
                };
                if response.count() == 0 {
                    return PollOutcome::Completed(Vec::new());
                }

                let fresh = {
                    let mut state = self.mailbox.write();
                    let fresh = filter_new(&state.received, response.into_list());
                    state.received.extend(fresh.iter().cloned());
                    fresh
                };

                if !fresh.is_empty() {
                    info!("{} new email(s)", fresh.len());
                    self.bus.emit(Topic::NewEmail, &Event::NewEmail(fresh.clone()));
                }
                PollOutcome::Completed(fresh)
            }
            Err(error) => {
                warn!("Poll failed: {}", error);
                self.bus
                    .emit(Topic::PollRequestError, &Event::PollFailed(error.clone()));
                PollOutcome::Failed(error)
            }
        }
    }
}
