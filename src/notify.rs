//! Download notifications.
//!
//! Notifiers receive one event per successful download. Delivery is
//! best-effort: implementations log their own failures and never abort the
//! run, so a dead notification service cannot stop downloads.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde_json::json;

use crate::config::NotifierSettings;

const PUSHBULLET_API: &str = "https://api.pushbullet.com/v2/pushes";

/// Receives one (feed, title) event per successful download.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, feed: &str, title: &str);
}

/// Pushes a note to a Pushbullet account, optionally targeted at a single
/// device.
pub struct Pushbullet {
    client: reqwest::Client,
    token: SecretString,
    device: Option<String>,
    api_url: String,
}

impl Pushbullet {
    pub fn new(client: reqwest::Client, token: SecretString, device: Option<String>) -> Self {
        Self {
            client,
            token,
            device,
            api_url: PUSHBULLET_API.to_string(),
        }
    }

    /// Point at a different API endpoint. Testing hook, mirrors the real
    /// endpoint's contract.
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }
}

#[async_trait]
impl Notifier for Pushbullet {
    async fn notify(&self, feed: &str, title: &str) {
        let mut payload = json!({
            "type": "note",
            "title": format!("New item from {}", feed),
            "body": title,
        });
        if let Some(device) = &self.device {
            payload["device_iden"] = json!(device);
        }

        let result = self
            .client
            .post(&self.api_url)
            .header("Access-Token", self.token.expose_secret())
            .json(&payload)
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => {
                tracing::debug!(feed = %feed, "Pushbullet notification sent");
            }
            Ok(response) => {
                tracing::warn!(feed = %feed, status = %response.status(), "Pushbullet notification failed");
            }
            Err(e) => {
                tracing::warn!(feed = %feed, error = %e, "Pushbullet notification failed");
            }
        }
    }
}

/// Build the notifier list from the config's `[notifiers]` tables.
///
/// Unknown notifier names are a configuration error of the skip-and-warn
/// kind: logged, then ignored for the rest of the run.
pub fn build_notifiers(
    client: &reqwest::Client,
    settings: &NotifierSettings,
) -> Vec<Box<dyn Notifier>> {
    let mut notifiers: Vec<Box<dyn Notifier>> = Vec::new();

    if let Some(pushbullet) = &settings.pushbullet {
        tracing::debug!("Adding pushbullet notifier");
        notifiers.push(Box::new(Pushbullet::new(
            client.clone(),
            SecretString::from(pushbullet.token.clone()),
            pushbullet.device.clone(),
        )));
    }

    for name in settings.unknown.keys() {
        tracing::warn!(notifier = %name, "Unknown notifier in config, ignoring");
    }

    notifiers
}
