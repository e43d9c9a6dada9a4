//! Polling engine for fetching new mail
//!
//! Combines the email set arithmetic, the repeating schedule and the poll
//! state machine.

mod emailset;
mod poller;
mod schedule;

pub use emailset::{filter_new, most_recent, remove_by_ids};
pub use poller::{PollController, PollOutcome, PollStatus};
pub use schedule::{
    IntervalScheduler, IntervalTimer, ManualScheduler, Schedule, ScheduleFactory, Tick,
};
