use tracing::{debug, instrument};

use super::ApiClient;
use crate::domain::{Notification, NotificationCreate, NotificationPatch, RecipientKind, UnreadCount};
use crate::error::ApiError;
use crate::ingest::decode_one;

impl ApiClient {
    #[instrument(skip(self))]
    pub async fn notifications_for(&self, kind: RecipientKind, id: u64) -> Result<Vec<Notification>, ApiError> {
        debug!("Sending request");
        self.get_list(&format!("notify/{kind}-notifications/{id}/")).await
    }

    #[instrument(skip(self))]
    pub async fn unread_count(&self, kind: RecipientKind, id: u64) -> Result<u64, ApiError> {
        debug!("Sending request");
        let value = self.get_json(&format!("notify/unread-notifications/{kind}/{id}/")).await?;
        let count: UnreadCount =
            serde_json::from_value(value).map_err(|e| ApiError::Decode(format!("unread count: {e}")))?;
        Ok(count.unread_count)
    }

    #[instrument(skip(self, message))]
    pub async fn send_notification(&self, kind: RecipientKind, id: u64, message: &str) -> Result<Notification, ApiError> {
        debug!("Sending request");
        let body = NotificationCreate {
            message: message.to_string(),
            is_read: false,
            recipient_type: kind,
            recipient_id: id,
        };
        decode_one(self.post_json("notify/notifications/create/", &body).await?)
    }

    #[instrument(skip(self))]
    pub async fn update_notification(&self, id: u64, patch: &NotificationPatch) -> Result<Notification, ApiError> {
        debug!("Sending request");
        decode_one(
            self.patch_json(&format!("notify/notifications/{id}/update-delete/"), patch)
                .await?,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock_framework::MockBackend;
    use reqwest::Url;
    use serde_json::json;
    use std::time::Duration;

    fn api(backend: &MockBackend) -> ApiClient {
        ApiClient::new(Url::parse(backend.url()).unwrap(), Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn unread_count_for_maalem() {
        let backend = MockBackend::start().await;
        backend.route("GET", "notify/unread-notifications/maalem/4/", 200, json!({ "unread_count": 3 }));
        assert_eq!(api(&backend).unread_count(RecipientKind::Maalem, 4).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn create_sends_recipient_type_and_id() {
        let backend = MockBackend::start().await;
        backend.route(
            "POST",
            "notify/notifications/create/",
            201,
            json!({ "notification_id": 8, "message": "Your offer was accepted", "is_read": false, "created_at": "2024-05-01T10:00:00Z" }),
        );

        let created = api(&backend)
            .send_notification(RecipientKind::Client, 2, "Your offer was accepted")
            .await
            .unwrap();
        assert_eq!(created.id, 8);
        assert_eq!(
            backend.requests_to("POST", "notify/notifications/create/")[0].body,
            Some(json!({ "message": "Your offer was accepted", "is_read": false, "recipient_type": "client", "recipient_id": 2 }))
        );
    }

    #[tokio::test]
    async fn mark_read_patches_flag_only() {
        let backend = MockBackend::start().await;
        backend.route(
            "PATCH",
            "notify/notifications/8/update-delete/",
            200,
            json!({ "notification_id": 8, "message": "hi", "is_read": true }),
        );
        let updated = api(&backend).update_notification(8, &NotificationPatch::read()).await.unwrap();
        assert!(updated.is_read);
        assert_eq!(
            backend.requests_to("PATCH", "notify/notifications/8/update-delete/")[0].body,
            Some(json!({ "is_read": true }))
        );
    }
}
