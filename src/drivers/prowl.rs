//! Prowl push-notification driver.
//!
//! Config keys: `apikey` (required), `application`, `priority` and
//! `endpoint` (defaults to the public Prowl API).

use super::check_status;
use crate::core::{EventRecord, NotifierDescriptor};
use crate::error::DeliveryError;
use tracing::info;

pub const DEFAULT_ENDPOINT: &str = "https://api.prowlapp.com";

/// Sends one push notification through the Prowl `add` API.
pub async fn send(
    client: &reqwest::Client,
    notifier: &NotifierDescriptor,
    event: &EventRecord,
) -> Result<(), DeliveryError> {
    let apikey = notifier.require("apikey")?;
    let endpoint = notifier.setting("endpoint").unwrap_or(DEFAULT_ENDPOINT);
    let event_name = event.event.to_string();

    let form = [
        ("apikey", apikey),
        ("application", notifier.setting("application").unwrap_or("upwatch")),
        ("event", event_name.as_str()),
        ("description", event.msg.as_str()),
        ("priority", notifier.setting("priority").unwrap_or("0")),
        ("url", event.url.as_str()),
    ];

    let response = client
        .post(format!("{}/publicapi/add", endpoint.trim_end_matches('/')))
        .form(&form)
        .send()
        .await?;
    check_status(&response)?;
    info!("Prowl accepted notification");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::NotifierConfig;
    use crate::drivers::DriverKind;
    use reqwest::StatusCode;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn notifier(endpoint: &str) -> NotifierDescriptor {
        NotifierDescriptor {
            name: "phone".to_string(),
            driver: DriverKind::Prowl,
            disabled: false,
            config: NotifierConfig::from([
                ("apikey".to_string(), "secret".to_string()),
                ("application".to_string(), "deploys".to_string()),
                ("endpoint".to_string(), endpoint.to_string()),
            ]),
        }
    }

    #[tokio::test]
    async fn test_prowl_sends_form_fields() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/publicapi/add"))
            .and(body_string_contains("apikey=secret"))
            .and(body_string_contains("application=deploys"))
            .and(body_string_contains("event=connected"))
            .and(body_string_contains("priority=0"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let event = EventRecord::connected("http://example.test/ok", StatusCode::OK);
        let result = send(&reqwest::Client::new(), &notifier(&server.uri()), &event).await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_prowl_rejected_key_is_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let event = EventRecord::connected("http://example.test/ok", StatusCode::OK);
        let result = send(&reqwest::Client::new(), &notifier(&server.uri()), &event).await;

        assert!(matches!(result, Err(DeliveryError::Status(s)) if s == StatusCode::UNAUTHORIZED));
    }
}
