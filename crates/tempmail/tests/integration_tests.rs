//! Integration tests for the tempmail crate
//!
//! These tests drive the client end to end against a scripted transport
//! and a manually ticked schedule.

use serde_json::{Value, json};
use std::sync::{Arc, Mutex};
use tempmail::{
    ApiMethod, ClientConfig, EmailId, Event, MailboxClient, ManualScheduler, PollOutcome,
    ScriptedTransport, Topic, TransportError,
};

struct Harness {
    transport: Arc<ScriptedTransport>,
    scheduler: ManualScheduler,
    client: MailboxClient,
}

fn harness(config: ClientConfig) -> Harness {
    let transport = Arc::new(ScriptedTransport::new());
    let scheduler = ManualScheduler::new();
    let client = MailboxClient::with_collaborators(
        config,
        transport.clone(),
        Arc::new(scheduler.clone()),
    );
    Harness {
        transport,
        scheduler,
        client,
    }
}

/// Helper to build a list response
fn list(ids: &[u64]) -> Value {
    let list: Vec<Value> = ids
        .iter()
        .map(|id| {
            json!({
                "mail_id": id.to_string(),
                "mail_from": "sender@example.com",
                "mail_subject": format!("Subject {}", id),
                "mail_excerpt": "excerpt",
                "mail_timestamp": "1700000000",
                "mail_read": 0
            })
        })
        .collect();
    json!({ "count": ids.len().to_string(), "list": list, "sid_token": "tok" })
}

fn address(addr: &str) -> Value {
    json!({
        "email_addr": addr,
        "email_timestamp": 1700000000,
        "alias": "x",
        "sid_token": "tok"
    })
}

fn ids(client: &MailboxClient) -> Vec<u64> {
    client.received_emails().iter().map(|e| e.id.get()).collect()
}

#[test]
fn test_register_without_username_asks_for_address() {
    let h = harness(ClientConfig::default());
    h.transport.push_response(address("random@sharklasers.com"));

    let response = h.client.register().unwrap();

    assert_eq!(response.email_addr, "random@sharklasers.com");
    assert_eq!(h.client.address().as_deref(), Some("random@sharklasers.com"));
    assert_eq!(h.client.session_token().as_deref(), Some("tok"));
    assert_eq!(h.transport.methods(), vec!["get_email_address"]);
}

#[test]
fn test_register_with_username_claims_it() {
    let config = ClientConfig {
        username: Some("alice".to_string()),
        lang: Some("en".to_string()),
        site: Some("guerrillamail.com".to_string()),
        ..Default::default()
    };
    let h = harness(config);
    h.transport.push_response(address("alice@guerrillamail.com"));

    h.client.register().unwrap();

    let request = &h.transport.requests()[0];
    assert_eq!(request.method(), Some("set_email_user"));
    assert_eq!(request.param("email_user"), Some("alice"));
    assert_eq!(request.param("lang"), Some("en"));
    assert_eq!(request.param("site"), Some("guerrillamail.com"));
    assert_eq!(h.client.address().as_deref(), Some("alice@guerrillamail.com"));
}

#[test]
fn test_email_address_event_is_published() {
    let h = harness(ClientConfig::default());
    let seen = Arc::new(Mutex::new(Vec::new()));
    let s = Arc::clone(&seen);
    h.client.on(Topic::EmailAddress, move |event| {
        if let Event::Response { body, .. } = event {
            s.lock().unwrap().push(body["email_addr"].as_str().unwrap().to_string());
        }
    });
    h.transport.push_response(address("a@sharklasers.com"));

    h.client.register().unwrap();
    assert_eq!(*seen.lock().unwrap(), vec!["a@sharklasers.com"]);
}

#[test]
fn test_register_failure_publishes_error_topic() {
    let h = harness(ClientConfig::default());
    let count = Arc::new(Mutex::new(0));
    let c = Arc::clone(&count);
    h.client
        .on(Topic::MethodError(ApiMethod::GetEmailAddress), move |_| {
            *c.lock().unwrap() += 1
        });
    h.transport.push_error(TransportError::Status(500));

    assert!(h.client.register().is_err());
    assert_eq!(*count.lock().unwrap(), 1);
    assert!(h.client.address().is_none());
    assert!(!h.client.start());
}

#[test]
fn test_full_watch_session() {
    let h = harness(ClientConfig::default());
    h.transport.push_response(address("w@sharklasers.com"));
    h.client.register().unwrap();

    let delivered = Arc::new(Mutex::new(Vec::new()));
    let d = Arc::clone(&delivered);
    h.client.on(Topic::NewEmail, move |event| {
        if let Event::NewEmail(emails) = event {
            d.lock().unwrap().extend(emails.iter().map(|e| e.id.get()));
        }
    });

    // Welcome email on the first poll
    h.transport.push_response(list(&[1]));
    assert!(h.client.start());

    // Nothing new, then two new ones with an overlap
    h.transport.push_response(json!({ "count": 0, "list": [] }));
    h.transport.push_response(list(&[1, 2, 3]));
    h.scheduler.tick();
    h.scheduler.tick();

    assert_eq!(ids(&h.client), vec![1, 2, 3]);
    assert_eq!(*delivered.lock().unwrap(), vec![1, 2, 3]);

    let requests = h.transport.requests();
    assert_eq!(requests[1].method(), Some("get_email_list"));
    assert_eq!(requests[2].method(), Some("check_email"));
    assert_eq!(requests[2].param("seq"), Some("1"));
    assert_eq!(requests[3].param("seq"), Some("1"));
    // Session token from registration rides along on every poll
    assert!(requests[1..].iter().all(|r| r.param("sid_token") == Some("tok")));
}

#[test]
fn test_transient_failures_do_not_stop_polling() {
    let h = harness(ClientConfig::default());
    h.transport.push_response(address("f@sharklasers.com"));
    h.client.register().unwrap();

    let errors = Arc::new(Mutex::new(0));
    let e = Arc::clone(&errors);
    h.client.on(Topic::PollRequestError, move |_| *e.lock().unwrap() += 1);

    h.transport.push_error(TransportError::Network("timeout".into()));
    h.client.start();
    h.transport.push_error(TransportError::Status(502));
    h.scheduler.tick();
    h.transport.push_response(list(&[4]));
    h.scheduler.tick();

    assert_eq!(*errors.lock().unwrap(), 2);
    assert_eq!(ids(&h.client), vec![4]);
    assert!(!h.client.poll_status().polling);
}

#[test]
fn test_delete_keeps_local_list_in_sync() {
    let h = harness(ClientConfig::default());
    h.transport.push_response(address("d@sharklasers.com"));
    h.client.register().unwrap();
    h.transport.push_response(list(&[10, 16]));
    h.client.start();

    h.transport.push_response(json!({ "deleted_ids": [10] }));
    let response = h.client.del_email(&[EmailId(10)]).unwrap();

    assert_eq!(response.deleted_ids, vec![EmailId(10)]);
    assert_eq!(ids(&h.client), vec![16]);
    let request = h.transport.requests().pop().unwrap();
    assert_eq!(request.method(), Some("del_email"));
    assert_eq!(request.param("email_ids[]"), Some("10"));
}

#[test]
fn test_manual_operations_shape_params() {
    let h = harness(ClientConfig::default());
    h.transport.push_response(list(&[3]));
    h.transport.push_response(list(&[2, 1]));
    h.transport.push_response(json!({
        "mail_id": "3",
        "mail_from": "sender@example.com",
        "mail_subject": "Hi",
        "mail_body": "<p>Hello</p>",
        "mail_size": 12
    }));

    let newer = h.client.check_email(Some(EmailId(2))).unwrap();
    let older = h.client.get_older_list(Some(EmailId(3)), Some(2)).unwrap();
    let detail = h.client.fetch_email(EmailId(3)).unwrap();

    assert_eq!(newer.count(), 1);
    assert_eq!(older.into_list().len(), 2);
    assert_eq!(detail.email.subject, "Hi");
    assert_eq!(detail.body, "<p>Hello</p>");

    let requests = h.transport.requests();
    assert_eq!(requests[0].param("seq"), Some("2"));
    assert_eq!(requests[1].param("limit"), Some("2"));
    assert_eq!(requests[2].param("email_id"), Some("3"));

    // Manual fetches never touch the received list
    assert!(h.client.received_emails().is_empty());
}

#[test]
fn test_pause_resume_round_trip() {
    let h = harness(ClientConfig::default());
    h.transport.push_response(address("p@sharklasers.com"));
    h.client.register().unwrap();
    h.transport.push_response(list(&[1]));
    h.client.start();

    h.client.pause();
    assert!(matches!(h.client.poll_once(), PollOutcome::Skipped));
    assert!(!h.scheduler.tick());

    h.client.resume();
    h.transport.push_response(list(&[2]));
    assert!(h.scheduler.tick());
    assert_eq!(ids(&h.client), vec![1, 2]);
}

#[test]
fn test_destroy_stops_forgets_and_clears() {
    let h = harness(ClientConfig::default());
    h.transport.push_response(address("gone@sharklasers.com"));
    h.client.register().unwrap();
    h.transport.push_response(list(&[1, 2]));
    h.client.start();

    h.transport.push_response(json!(true));
    h.client.destroy();

    assert!(h.client.received_emails().is_empty());
    assert!(h.client.session_token().is_none());
    assert!(!h.client.poll_status().started);
    assert!(h.scheduler.is_stopped());

    let forget = h.transport.requests().pop().unwrap();
    assert_eq!(forget.method(), Some("forget_me"));
    assert_eq!(forget.param("email_addr"), Some("gone@sharklasers.com"));
    assert_eq!(forget.param("sid_token"), Some("tok"));
}

#[test]
fn test_destroy_tolerates_forget_failure() {
    let h = harness(ClientConfig::default());
    h.transport.push_response(address("x@sharklasers.com"));
    h.client.register().unwrap();
    h.transport.push_response(list(&[1]));
    h.client.start();

    h.transport.push_error(TransportError::Status(500));
    h.client.destroy();

    assert!(h.client.received_emails().is_empty());
    assert!(!h.client.poll_status().started);
}

#[test]
fn test_config_interval_reaches_schedule() {
    let config = ClientConfig {
        poll_interval_ms: 1_500,
        ..Default::default()
    };
    let h = harness(config);
    h.transport.push_response(address("i@sharklasers.com"));
    h.client.register().unwrap();
    h.transport.push_response(list(&[]));
    h.client.start();

    assert_eq!(
        h.scheduler.interval(),
        Some(std::time::Duration::from_millis(1_500))
    );
}
