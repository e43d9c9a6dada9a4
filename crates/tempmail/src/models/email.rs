//! Email model representing a message in a disposable inbox

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Server-assigned identifier of an email, unique within a mailbox
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct EmailId(pub u64);

impl EmailId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for EmailId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl<'de> Deserialize<'de> for EmailId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        de::number(deserializer).map(Self)
    }
}

impl fmt::Display for EmailId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A message summary as returned by the list endpoints
///
/// Identity is the `id` alone: two emails with the same id are the same
/// email regardless of content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Email {
    #[serde(rename = "mail_id")]
    pub id: EmailId,
    #[serde(rename = "mail_subject", default, deserialize_with = "de::string")]
    pub subject: String,
    #[serde(rename = "mail_from", default, deserialize_with = "de::string")]
    pub sender: String,
    #[serde(
        rename = "mail_timestamp",
        default,
        deserialize_with = "de::timestamp",
        serialize_with = "ser::timestamp"
    )]
    pub received_at: Option<DateTime<Utc>>,
    /// Short excerpt of the body
    #[serde(rename = "mail_excerpt", default, deserialize_with = "de::string")]
    pub summary: String,
    #[serde(rename = "mail_read", default, deserialize_with = "de::flag")]
    pub read: bool,
}

impl Email {
    /// Create an email with only an id; used for tests and synthetic entries
    pub fn new(id: impl Into<EmailId>) -> Self {
        Self {
            id: id.into(),
            subject: String::new(),
            sender: String::new(),
            received_at: None,
            summary: String::new(),
            read: false,
        }
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = subject.into();
        self
    }

    pub fn with_sender(mut self, sender: impl Into<String>) -> Self {
        self.sender = sender.into();
        self
    }
}

/// Full message as returned by `fetch_email`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailDetail {
    #[serde(flatten)]
    pub email: Email,
    #[serde(rename = "mail_body", default, deserialize_with = "de::string")]
    pub body: String,
    #[serde(rename = "mail_size", default, deserialize_with = "de::optional_number")]
    pub size: Option<u64>,
}

/// Lenient deserializers for the API's loosely typed fields.
///
/// The service sends numbers either as JSON numbers or as numeric
/// strings, booleans as `0`/`1`, and sometimes `null` for text.
pub(crate) mod de {
    use super::*;
    use log::warn;
    use serde::de::Error;
    use serde_json::Value;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Loose {
        Int(u64),
        Signed(i64),
        Float(f64),
        Bool(bool),
        Text(String),
    }

    impl Loose {
        fn as_u64(&self) -> Option<u64> {
            match self {
                Loose::Int(n) => Some(*n),
                Loose::Signed(n) => u64::try_from(*n).ok(),
                Loose::Float(f) if *f >= 0.0 && f.fract() == 0.0 => Some(*f as u64),
                Loose::Float(_) => None,
                Loose::Bool(b) => Some(u64::from(*b)),
                Loose::Text(s) => s.trim().parse().ok(),
            }
        }
    }

    pub fn number<'de, D: Deserializer<'de>>(d: D) -> Result<u64, D::Error> {
        let raw = Loose::deserialize(d)?;
        raw.as_u64()
            .ok_or_else(|| D::Error::custom("expected a non-negative integer"))
    }

    pub fn optional_number<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u64>, D::Error> {
        Ok(Option::<Loose>::deserialize(d)?.and_then(|raw| raw.as_u64()))
    }

    pub fn flag<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
        Ok(optional_number(d)?.is_some_and(|n| n != 0))
    }

    /// Text field where `null` reads as empty
    pub fn string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
        Ok(Option::<String>::deserialize(d)?.unwrap_or_default())
    }

    /// List of emails where unreadable entries are skipped, not fatal
    pub fn email_list<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Vec<Email>>, D::Error> {
        let Some(items) = Option::<Vec<Value>>::deserialize(d)? else {
            return Ok(None);
        };
        let emails = items
            .into_iter()
            .filter_map(|item| match serde_json::from_value::<Email>(item) {
                Ok(email) => Some(email),
                Err(e) => {
                    warn!("Skipping unreadable email in list: {}", e);
                    None
                }
            })
            .collect();
        Ok(Some(emails))
    }

    pub fn timestamp<'de, D: Deserializer<'de>>(
        d: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        Ok(optional_number(d)?
            .and_then(|secs| i64::try_from(secs).ok())
            .and_then(|secs| DateTime::from_timestamp(secs, 0)))
    }
}

mod ser {
    use super::*;
    use serde::Serializer;

    pub fn timestamp<S: Serializer>(
        value: &Option<DateTime<Utc>>,
        s: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(ts) => s.serialize_some(&ts.timestamp()),
            None => s.serialize_none(),
        }
    }
}
