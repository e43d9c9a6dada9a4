//! Guerrilla Mail API integration
//!
//! This module provides:
//! - The method table and request builders
//! - The transport seam and its HTTP implementation
//! - The request gateway that tracks the session token
//!
//! Uses synchronous HTTP (ureq) to be executor-agnostic.

mod gateway;
mod request;
mod scripted;
mod transport;

pub use gateway::RequestGateway;
pub use request::{ApiRequest, Params};
pub use scripted::{RecordedRequest, ScriptedTransport};
pub use transport::{Transport, UreqTransport};

use std::fmt;

use crate::events::Topic;

/// Default endpoint of the public service
pub const DEFAULT_BASE_URL: &str = "https://api.guerrillamail.com/ajax.php";

/// Remote API method, sent as the `f` query parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiMethod {
    SetEmailUser,
    GetEmailAddress,
    GetEmailList,
    GetOlderList,
    CheckEmail,
    FetchEmail,
    ForgetMe,
    DelEmail,
}

impl ApiMethod {
    pub const ALL: [ApiMethod; 8] = [
        ApiMethod::SetEmailUser,
        ApiMethod::GetEmailAddress,
        ApiMethod::GetEmailList,
        ApiMethod::GetOlderList,
        ApiMethod::CheckEmail,
        ApiMethod::FetchEmail,
        ApiMethod::ForgetMe,
        ApiMethod::DelEmail,
    ];

    /// Wire name of the method
    pub fn as_str(&self) -> &'static str {
        match self {
            ApiMethod::SetEmailUser => "set_email_user",
            ApiMethod::GetEmailAddress => "get_email_address",
            ApiMethod::GetEmailList => "get_email_list",
            ApiMethod::GetOlderList => "get_older_list",
            ApiMethod::CheckEmail => "check_email",
            ApiMethod::FetchEmail => "fetch_email",
            ApiMethod::ForgetMe => "forget_me",
            ApiMethod::DelEmail => "del_email",
        }
    }

    /// Topic published after a successful call, if any
    pub fn topic(&self) -> Option<Topic> {
        match self {
            ApiMethod::SetEmailUser | ApiMethod::GetEmailAddress => Some(Topic::EmailAddress),
            _ => None,
        }
    }

    /// Whether a successful response assigns the mailbox address
    pub fn assigns_address(&self) -> bool {
        matches!(self, ApiMethod::SetEmailUser | ApiMethod::GetEmailAddress)
    }
}

impl fmt::Display for ApiMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// API response types
pub mod responses {
    use serde::{Deserialize, Serialize};

    use crate::models::{Email, EmailId, de};

    /// Response from `set_email_user` and `get_email_address`
    #[derive(Debug, Clone, Default, Deserialize, Serialize)]
    pub struct AddressResponse {
        #[serde(default)]
        pub email_addr: String,
        #[serde(default, deserialize_with = "de::timestamp")]
        pub email_timestamp: Option<chrono::DateTime<chrono::Utc>>,
        #[serde(default)]
        pub alias: Option<String>,
        #[serde(default)]
        pub sid_token: Option<String>,
    }

    /// Response from `get_email_list`, `check_email` and `get_older_list`
    ///
    /// Missing or null `count`/`list` read as zero and empty. Entries of
    /// `list` that cannot be read are dropped with a warning.
    #[derive(Debug, Clone, Default, Deserialize, Serialize)]
    pub struct EmailListResponse {
        #[serde(default, deserialize_with = "de::optional_number")]
        pub count: Option<u64>,
        #[serde(default, deserialize_with = "de::email_list")]
        pub list: Option<Vec<Email>>,
        #[serde(default)]
        pub email: Option<String>,
        #[serde(default)]
        pub sid_token: Option<String>,
    }

    impl EmailListResponse {
        /// Reported count of matching emails, zero if absent
        pub fn count(&self) -> u64 {
            self.count.unwrap_or(0)
        }

        /// Take the listed emails, empty if absent
        pub fn into_list(self) -> Vec<Email> {
            self.list.unwrap_or_default()
        }
    }

    /// Response from `del_email`
    #[derive(Debug, Clone, Default, Deserialize, Serialize)]
    pub struct DeleteResponse {
        #[serde(default)]
        pub deleted_ids: Vec<EmailId>,
    }
}
