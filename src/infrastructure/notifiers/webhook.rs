use crate::domain::error::DomainError;
use crate::domain::ports::notifier::Notifier;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

/// Posts messages to a chat webhook (`{"content": "..."}`, as Discord expects).
pub struct WebhookNotifier {
    client: Client,
    url: String,
}

#[derive(Serialize)]
struct WebhookPayload<'a> {
    content: &'a str,
}

impl WebhookNotifier {
    pub fn new(url: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(10))
                .build()
                .unwrap_or_default(),
            url,
        }
    }
}

#[async_trait::async_trait]
impl Notifier for WebhookNotifier {
    async fn send(&self, text: &str) -> Result<(), DomainError> {
        let resp = self
            .client
            .post(&self.url)
            .json(&WebhookPayload { content: text })
            .send()
            .await
            .map_err(|e| DomainError::Notifier(format!("webhook request failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(DomainError::Notifier(format!("webhook {status}: {body}")));
        }
        Ok(())
    }
}
