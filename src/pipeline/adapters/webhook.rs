use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Map, Value, json};

use crate::pipeline::{
    error::{PipelineError, collaborator_error},
    ports::NotifierPort,
};

/// Notifier posting role-addressed messages to a chat webhook.
pub struct WebhookNotifier {
    client: Client,
    webhook_url: String,
}

impl WebhookNotifier {
    pub fn new(webhook_url: impl Into<String>) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(5))
                .build()
                .expect("reqwest client must build"),
            webhook_url: webhook_url.into(),
        }
    }
}

#[async_trait]
impl NotifierPort for WebhookNotifier {
    async fn notify(
        &self,
        role_ids: &[String],
        message: &str,
        metadata: Map<String, Value>,
    ) -> Result<(), PipelineError> {
        let body = json!({
            "text": message,
            "metadata": metadata,
            "roles": role_ids,
        });

        let response = self
            .client
            .post(&self.webhook_url)
            .json(&body)
            .send()
            .await
            .map_err(|err| collaborator_error(format!("notification webhook failed: {err}")))?;
        response.error_for_status().map_err(|err| {
            collaborator_error(format!("notification webhook rejected message: {err}"))
        })?;
        Ok(())
    }
}
