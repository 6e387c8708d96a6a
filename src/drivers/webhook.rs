//! Generic webhook driver: POSTs the event as JSON to `config["url"]`.

use super::check_status;
use crate::core::{EventRecord, NotifierDescriptor};
use crate::error::DeliveryError;
use tracing::{error, info};

/// Sends one webhook request. The body is `{"url", "event", "msg"}`.
pub async fn send(
    client: &reqwest::Client,
    notifier: &NotifierDescriptor,
    event: &EventRecord,
) -> Result<(), DeliveryError> {
    let url = notifier.require("url")?;

    let response = client.post(url).json(event).send().await?;
    match check_status(&response) {
        Ok(()) => {
            info!(status = %response.status(), "Webhook accepted event");
            Ok(())
        }
        Err(e) => {
            error!(status = %response.status(), "Webhook rejected event");
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::NotifierConfig;
    use crate::drivers::DriverKind;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn notifier(url: &str) -> NotifierDescriptor {
        NotifierDescriptor {
            name: "hook".to_string(),
            driver: DriverKind::Webhook,
            disabled: false,
            config: NotifierConfig::from([("url".to_string(), url.to_string())]),
        }
    }

    #[tokio::test]
    async fn test_webhook_posts_event_json() {
        // Arrange
        let server = MockServer::start().await;
        let event = EventRecord::timed_out("http://example.test/down");

        Mock::given(method("POST"))
            .and(path("/hook"))
            .and(header("content-type", "application/json"))
            .and(body_json(json!({
                "url": "http://example.test/down",
                "event": "timeout",
                "msg": "Giving up on http://example.test/down",
            })))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        // Act
        let result = send(
            &reqwest::Client::new(),
            &notifier(&format!("{}/hook", server.uri())),
            &event,
        )
        .await;

        // Assert
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_webhook_non_2xx_is_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let result = send(
            &reqwest::Client::new(),
            &notifier(&server.uri()),
            &EventRecord::timed_out("http://example.test/down"),
        )
        .await;

        assert!(matches!(result, Err(DeliveryError::Status(s)) if s.as_u16() == 500));
    }

    #[tokio::test]
    async fn test_webhook_transport_error_is_failure() {
        // Nothing listens on port 1.
        let result = send(
            &reqwest::Client::new(),
            &notifier("http://127.0.0.1:1/hook"),
            &EventRecord::timed_out("http://example.test/down"),
        )
        .await;

        assert!(matches!(result, Err(DeliveryError::Transport(_))));
    }

    #[tokio::test]
    async fn test_webhook_without_url_is_failure() {
        let mut notifier = notifier("");
        notifier.config.clear();

        let result = send(
            &reqwest::Client::new(),
            &notifier,
            &EventRecord::timed_out("http://example.test/down"),
        )
        .await;

        assert!(matches!(result, Err(DeliveryError::MissingConfig { key: "url" })));
    }
}
