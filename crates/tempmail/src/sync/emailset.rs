//! Set arithmetic over email lists, keyed by email id
//!
//! Pure functions that can be tested without any network or timer.

use std::collections::HashSet;

use crate::models::{Email, EmailId};

/// The most recently received email, i.e. the last one in arrival order.
///
/// Only the tail is inspected: the result anchors incremental fetches and
/// is not the email with the largest id.
pub fn most_recent(emails: &[Email]) -> Option<&Email> {
    emails.last()
}

/// Emails from `candidates` whose id is not already in `known`.
///
/// With nothing known every candidate is new and `candidates` is handed
/// back as is. Candidate order is preserved, and candidates are only
/// compared against `known`, not against each other.
pub fn filter_new(known: &[Email], candidates: Vec<Email>) -> Vec<Email> {
    if known.is_empty() {
        return candidates;
    }

    let known_ids: HashSet<EmailId> = known.iter().map(|email| email.id).collect();
    candidates
        .into_iter()
        .filter(|email| !known_ids.contains(&email.id))
        .collect()
}

/// Emails whose id is not listed in `ids`
pub fn remove_by_ids<I>(emails: &[Email], ids: I) -> Vec<Email>
where
    I: IntoIterator<Item = EmailId>,
{
    let doomed: HashSet<EmailId> = ids.into_iter().collect();
    emails
        .iter()
        .filter(|email| !doomed.contains(&email.id))
        .cloned()
        .collect()
}
