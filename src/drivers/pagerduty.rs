//! PagerDuty driver using the Events API v2.
//!
//! Config keys: `routing_key` (required), `severity` (overrides the
//! per-event default) and `endpoint`.

use super::check_status;
use crate::core::{EventKind, EventRecord, NotifierDescriptor};
use crate::error::DeliveryError;
use chrono::Utc;
use serde::Serialize;
use tracing::info;

pub const DEFAULT_ENDPOINT: &str = "https://events.pagerduty.com";

#[derive(Debug, Serialize)]
struct EnqueueRequest<'a> {
    routing_key: &'a str,
    event_action: &'static str,
    dedup_key: &'a str,
    payload: Payload<'a>,
}

#[derive(Debug, Serialize)]
struct Payload<'a> {
    summary: &'a str,
    source: &'a str,
    severity: &'a str,
    timestamp: String,
    component: &'static str,
}

fn default_severity(kind: EventKind) -> &'static str {
    match kind {
        EventKind::Connected => "info",
        EventKind::Timeout => "error",
    }
}

/// Triggers one PagerDuty alert for the event.
pub async fn send(
    client: &reqwest::Client,
    notifier: &NotifierDescriptor,
    event: &EventRecord,
) -> Result<(), DeliveryError> {
    let routing_key = notifier.require("routing_key")?;
    let endpoint = notifier.setting("endpoint").unwrap_or(DEFAULT_ENDPOINT);

    let request = EnqueueRequest {
        routing_key,
        event_action: "trigger",
        dedup_key: &event.url,
        payload: Payload {
            summary: &event.msg,
            source: &event.url,
            severity: notifier
                .setting("severity")
                .unwrap_or_else(|| default_severity(event.event)),
            timestamp: Utc::now().to_rfc3339(),
            component: "upwatch",
        },
    };

    let response = client
        .post(format!("{}/v2/enqueue", endpoint.trim_end_matches('/')))
        .json(&request)
        .send()
        .await?;
    check_status(&response)?;
    info!("PagerDuty accepted event");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::NotifierConfig;
    use crate::drivers::DriverKind;
    use serde_json::Value;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn notifier(endpoint: &str, extra: &[(&str, &str)]) -> NotifierDescriptor {
        let mut config = NotifierConfig::from([
            ("routing_key".to_string(), "R0UT1NG".to_string()),
            ("endpoint".to_string(), endpoint.to_string()),
        ]);
        for (k, v) in extra {
            config.insert(k.to_string(), v.to_string());
        }
        NotifierDescriptor {
            name: "oncall".to_string(),
            driver: DriverKind::PagerDuty,
            disabled: false,
            config,
        }
    }

    async fn sent_body(server: &MockServer) -> Value {
        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
        serde_json::from_slice(&requests[0].body).unwrap()
    }

    #[tokio::test]
    async fn test_pagerduty_triggers_with_default_severity() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v2/enqueue"))
            .respond_with(ResponseTemplate::new(202))
            .mount(&server)
            .await;

        let event = EventRecord::timed_out("http://example.test/down");
        let result = send(&reqwest::Client::new(), &notifier(&server.uri(), &[]), &event).await;
        assert!(result.is_ok());

        let body = sent_body(&server).await;
        assert_eq!(body["routing_key"], "R0UT1NG");
        assert_eq!(body["event_action"], "trigger");
        assert_eq!(body["dedup_key"], "http://example.test/down");
        assert_eq!(body["payload"]["severity"], "error");
        assert_eq!(body["payload"]["summary"], "Giving up on http://example.test/down");
    }

    #[tokio::test]
    async fn test_pagerduty_severity_override() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(202))
            .mount(&server)
            .await;

        let event = EventRecord::timed_out("http://example.test/down");
        let notifier = notifier(&server.uri(), &[("severity", "warning")]);
        send(&reqwest::Client::new(), &notifier, &event).await.unwrap();

        assert_eq!(sent_body(&server).await["payload"]["severity"], "warning");
    }

    #[tokio::test]
    async fn test_pagerduty_bad_request_is_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400))
            .mount(&server)
            .await;

        let event = EventRecord::timed_out("http://example.test/down");
        let result = send(&reqwest::Client::new(), &notifier(&server.uri(), &[]), &event).await;

        assert!(matches!(result, Err(DeliveryError::Status(_))));
    }
}
