//! Domain models for disposable-mailbox entities

mod email;
mod mailbox;

pub use email::{Email, EmailDetail, EmailId};
pub use mailbox::{MailboxState, SharedMailbox};

pub(crate) use email::de;
