use std::time::Duration;

use anyhow::{Error, Result, anyhow};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, info};

use crate::{activities::ContentRenderer, config::Config, models::notification::NotificationDefinition};

/// Content fields shipped to the card service. Recipient batches stay
/// behind: rendering depends only on the notification's content inputs.
#[derive(Debug, Serialize)]
struct CardRenderRequest<'a> {
    notification_id: &'a str,
    title: &'a str,
    summary: Option<&'a str>,
    author: Option<&'a str>,
    image_link: Option<&'a str>,
    button_title: Option<&'a str>,
    button_link: Option<&'a str>,
}

/// HTTP client for the external card templating collaborator.
///
/// Deliberately single-attempt: rendering errors must propagate to the
/// coordinator's step retry policy rather than being retried twice over.
pub struct CardServiceClient {
    http_client: Client,
    base_url: String,
}

impl CardServiceClient {
    pub fn new(config: &Config) -> Result<Self, Error> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|_| anyhow!("Failed to create HTTP client"))?;

        info!(base_url = %config.card_service_url, "Card service client initialized");

        Ok(Self {
            http_client,
            base_url: config.card_service_url.clone(),
        })
    }
}

#[async_trait]
impl ContentRenderer for CardServiceClient {
    async fn render(&self, notification: &NotificationDefinition) -> Result<String, Error> {
        let url = format!("{}/api/v1/cards/render", self.base_url);

        debug!(
            notification_id = %notification.id,
            "Requesting card render"
        );

        let request = CardRenderRequest {
            notification_id: &notification.id,
            title: &notification.title,
            summary: notification.summary.as_deref(),
            author: notification.author.as_deref(),
            image_link: notification.image_link.as_deref(),
            button_title: notification.button_title.as_deref(),
            button_link: notification.button_link.as_deref(),
        };

        let response = self
            .http_client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| anyhow!("Card service request failed: {}", e))?;

        let status = response.status();

        if !status.is_success() {
            return Err(anyhow!("Card service returned status {}", status));
        }

        let card: serde_json::Value = response
            .json()
            .await
            .map_err(|e| anyhow!("Failed to parse card JSON: {}", e))?;

        Ok(card.to_string())
    }
}
