use async_trait::async_trait;
use tokio::sync::watch;

use crate::error::ClientError;
use crate::poller::PollTask;

use super::client::{ApiClient, Call};
use super::types::Notification;

const NOTIFICATIONS: &str = "/api/auth/notifications";

impl ApiClient {
    pub async fn notifications(&self) -> Result<Vec<Notification>, ClientError> {
        self.auth_fetch(Call::get(format!("{}/", NOTIFICATIONS))).await
    }

    pub async fn mark_read(&self, id: i64) -> Result<(), ClientError> {
        let _: serde_json::Value = self
            .auth_fetch(Call::post(format!("{}/{}/mark-read/", NOTIFICATIONS, id)))
            .await?;
        Ok(())
    }
}

/// Poll task that publishes the latest notification list on a watch channel
pub struct NotificationFeed {
    client: ApiClient,
    tx: watch::Sender<Vec<Notification>>,
}

impl NotificationFeed {
    pub fn new(client: ApiClient) -> (Self, watch::Receiver<Vec<Notification>>) {
        let (tx, rx) = watch::channel(Vec::new());
        (Self { client, tx }, rx)
    }
}

#[async_trait]
impl PollTask for NotificationFeed {
    fn name(&self) -> &str {
        "notifications"
    }

    async fn tick(&mut self) -> Result<(), ClientError> {
        let items = self.client.notifications().await?;
        let unread = items.iter().filter(|n| n.unread).count();
        tracing::debug!("Fetched {} notifications ({} unread)", items.len(), unread);
        // Receivers may all be gone; polling still continues until cancelled
        let _ = self.tx.send(items);
        Ok(())
    }
}
