//! Mailbox state shared between the gateway, the poller and the client

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::Email;

/// Everything the client knows about the mailbox it is attached to
///
/// `received` holds emails in arrival order and never contains two
/// emails with the same id.
#[derive(Debug, Clone, Default)]
pub struct MailboxState {
    /// Opaque `sid_token` issued by the server
    pub session_token: Option<String>,
    /// Address currently assigned to this session
    pub address: Option<String>,
    /// Emails seen so far, oldest first
    pub received: Vec<Email>,
}

/// Handle to a [`MailboxState`] shared across components
///
/// Lock poisoning is ignored: every mutation leaves the state valid, so a
/// panicking reader or writer elsewhere does not invalidate it.
#[derive(Debug, Clone, Default)]
pub struct SharedMailbox(Arc<RwLock<MailboxState>>);

impl SharedMailbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn read(&self) -> RwLockReadGuard<'_, MailboxState> {
        self.0.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, MailboxState> {
        self.0.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn address(&self) -> Option<String> {
        self.read().address.clone()
    }

    pub fn session_token(&self) -> Option<String> {
        self.read().session_token.clone()
    }

    /// Snapshot of the received emails
    pub fn received(&self) -> Vec<Email> {
        self.read().received.clone()
    }

    pub fn clear_received(&self) {
        self.write().received.clear();
    }
}
