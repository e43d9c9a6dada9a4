//! Request shaping for each API method

use super::ApiMethod;
use crate::models::EmailId;

/// Ordered query parameters
///
/// Keys may repeat (`email_ids[]`), so this is a list rather than a map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params(Vec<(String, String)>);

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `key` to `value`, replacing every existing value for `key`
    pub fn set(&mut self, key: &str, value: impl Into<String>) -> &mut Self {
        self.0.retain(|(k, _)| k != key);
        self.0.push((key.to_string(), value.into()));
        self
    }

    /// Append a value without touching existing ones
    pub fn append(&mut self, key: &str, value: impl Into<String>) -> &mut Self {
        self.0.push((key.to_string(), value.into()));
        self
    }

    /// First value for `key`
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Every value for `key`, in order
    pub fn get_all<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.0
            .iter()
            .filter(move |(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn as_slice(&self) -> &[(String, String)] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A single call: method plus its query parameters
///
/// The constructors only shape parameters; they carry no other logic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRequest {
    pub method: ApiMethod,
    pub params: Params,
}

impl ApiRequest {
    /// Create a request for `method` with only `f` set
    pub fn new(method: ApiMethod) -> Self {
        let mut params = Params::new();
        params.set("f", method.as_str());
        Self { method, params }
    }

    fn with(mut self, key: &str, value: Option<impl Into<String>>) -> Self {
        if let Some(value) = value {
            self.params.set(key, value);
        }
        self
    }

    /// Assign a specific mailbox name
    pub fn set_email_user(user: &str, lang: Option<&str>, site: Option<&str>) -> Self {
        Self::new(ApiMethod::SetEmailUser)
            .with("email_user", Some(user))
            .with("lang", lang)
            .with("site", site)
    }

    /// Fetch whatever address the server assigns to this session
    pub fn get_email_address(lang: Option<&str>, site: Option<&str>) -> Self {
        Self::new(ApiMethod::GetEmailAddress)
            .with("lang", lang)
            .with("site", site)
    }

    /// Full list starting at `offset`
    pub fn get_email_list(offset: u64, seq: Option<EmailId>) -> Self {
        Self::new(ApiMethod::GetEmailList)
            .with("offset", Some(offset.to_string()))
            .with("seq", seq.map(|id| id.to_string()))
    }

    /// Page of emails older than `seq`
    pub fn get_older_list(seq: Option<EmailId>, limit: Option<u32>) -> Self {
        Self::new(ApiMethod::GetOlderList)
            .with("seq", seq.map(|id| id.to_string()))
            .with("limit", limit.map(|n| n.to_string()))
    }

    /// Emails newer than `seq`
    pub fn check_email(seq: Option<EmailId>) -> Self {
        Self::new(ApiMethod::CheckEmail).with("seq", seq.map(|id| id.to_string()))
    }

    /// A single full message
    pub fn fetch_email(id: EmailId) -> Self {
        Self::new(ApiMethod::FetchEmail).with("email_id", Some(id.to_string()))
    }

    /// Release the mailbox
    pub fn forget_me(address: Option<&str>) -> Self {
        Self::new(ApiMethod::ForgetMe).with("email_addr", address)
    }

    /// Delete emails; ids are sent as a repeated `email_ids[]` key
    pub fn del_email(ids: &[EmailId]) -> Self {
        let mut request = Self::new(ApiMethod::DelEmail);
        for id in ids {
            request.params.append("email_ids[]", id.to_string());
        }
        request
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_is_sent_as_f() {
        let request = ApiRequest::check_email(None);
        assert_eq!(request.params.get("f"), Some("check_email"));
        assert_eq!(request.params.get("seq"), None);
    }

    #[test]
    fn test_set_replaces_existing_values() {
        let mut params = Params::new();
        params.append("k", "1").append("k", "2");
        params.set("k", "3");
        assert_eq!(params.get_all("k").collect::<Vec<_>>(), vec!["3"]);
    }

    #[test]
    fn test_email_list_defaults_offset_zero() {
        let request = ApiRequest::get_email_list(0, None);
        assert_eq!(request.params.get("offset"), Some("0"));
        assert_eq!(request.params.get("seq"), None);

        let request = ApiRequest::get_email_list(20, Some(EmailId(5)));
        assert_eq!(request.params.get("offset"), Some("20"));
        assert_eq!(request.params.get("seq"), Some("5"));
    }

    #[test]
    fn test_optional_params_are_omitted() {
        let request = ApiRequest::set_email_user("bob", None, Some("guerrillamail.com"));
        assert_eq!(request.params.get("email_user"), Some("bob"));
        assert_eq!(request.params.get("lang"), None);
        assert_eq!(request.params.get("site"), Some("guerrillamail.com"));

        let request = ApiRequest::get_older_list(Some(EmailId(100)), Some(10));
        assert_eq!(request.params.get("seq"), Some("100"));
        assert_eq!(request.params.get("limit"), Some("10"));
    }

    #[test]
    fn test_del_email_repeats_key() {
        let request = ApiRequest::del_email(&[EmailId(425), EmailId(426), EmailId(427)]);
        let ids: Vec<&str> = request.params.get_all("email_ids[]").collect();
        assert_eq!(ids, vec!["425", "426", "427"]);
    }

    #[test]
    fn test_fetch_and_forget() {
        assert_eq!(
            ApiRequest::fetch_email(EmailId(3)).params.get("email_id"),
            Some("3")
        );
        assert_eq!(
            ApiRequest::forget_me(Some("x@sharklasers.com"))
                .params
                .get("email_addr"),
            Some("x@sharklasers.com")
        );
        assert_eq!(ApiRequest::forget_me(None).params.get("email_addr"), None);
    }
}
