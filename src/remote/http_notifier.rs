use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use super::errors::NotifyError;
use super::notifier::{Notification, Notifier};

const LOG_TARGET: &str = "remote::http_notifier";

/// Delivers notifications as JSON via HTTP POST to a single endpoint.
#[derive(Debug)]
pub struct HttpNotifier {
    client: reqwest::Client,
    url: String,
}

impl HttpNotifier {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| NotifyError::Delivery(e.to_string()))?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl Notifier for HttpNotifier {
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        let response = self
            .client
            .post(&self.url)
            .json(notification)
            .send()
            .await
            .map_err(|e| NotifyError::Delivery(e.to_string()))?;

        if !response.status().is_success() {
            return Err(NotifyError::Delivery(format!(
                "endpoint returned {}",
                response.status()
            )));
        }
        debug!(target: LOG_TARGET, requester = %notification.requester, "Notification delivered");
        Ok(())
    }
}
