use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, instrument};

use super::ApiClient;
use crate::domain::{Comment, CommentCreate, CommentList, Item, ItemCreate, ItemRef, LikeCount, LikeStatus};
use crate::error::ApiError;
use crate::ingest::decode_one;

crate::impl_resource_reads!(Item, item, list: "inventory/item/", get: "inventory/item/{}/");

fn decode_plain<T: DeserializeOwned>(what: &str, value: Value) -> Result<T, ApiError> {
    serde_json::from_value(value).map_err(|e| ApiError::Decode(format!("{what}: {e}")))
}

impl ApiClient {
    #[instrument(skip(self))]
    pub async fn items_of_maalem(&self, maalem_id: u64) -> Result<Vec<Item>, ApiError> {
        debug!("Sending request");
        self.get_list(&format!("inventory/maalem/items/{maalem_id}/")).await
    }

    #[instrument(skip(self, item), fields(title = %item.title))]
    pub async fn create_item(&self, maalem_id: u64, item: &ItemCreate) -> Result<Item, ApiError> {
        debug!("Sending request");
        decode_one(self.post_json(&format!("inventory/maalem/items/post/{maalem_id}/"), item).await?)
    }

    /// Returns the item's like count after the change.
    #[instrument(skip(self))]
    pub async fn like_item(&self, client_id: u64, item_id: u64) -> Result<u64, ApiError> {
        debug!("Sending request");
        let value = self
            .post_json(&format!("inventory/item/like/{client_id}/"), &ItemRef { item_id })
            .await?;
        Ok(decode_plain::<LikeCount>("like", value)?.like_count)
    }

    #[instrument(skip(self))]
    pub async fn unlike_item(&self, client_id: u64, item_id: u64) -> Result<u64, ApiError> {
        debug!("Sending request");
        let value = self
            .post_json(&format!("inventory/item/dislike/{client_id}/"), &ItemRef { item_id })
            .await?;
        Ok(decode_plain::<LikeCount>("dislike", value)?.like_count)
    }

    #[instrument(skip(self))]
    pub async fn like_status(&self, client_id: u64, item_id: u64) -> Result<bool, ApiError> {
        debug!("Sending request");
        let value = self
            .get_json(&format!("inventory/item/like-status/{client_id}/{item_id}/"))
            .await?;
        Ok(decode_plain::<LikeStatus>("like status", value)?.has_liked)
    }

    #[instrument(skip(self))]
    pub async fn like_count(&self, item_id: u64) -> Result<u64, ApiError> {
        debug!("Sending request");
        let value = self.get_json(&format!("inventory/item/likes/{item_id}/")).await?;
        Ok(decode_plain::<LikeCount>("likes", value)?.like_count)
    }

    #[instrument(skip(self, text))]
    pub async fn post_comment(&self, client_id: u64, item_id: u64, text: &str) -> Result<(), ApiError> {
        debug!("Sending request");
        let body = CommentCreate { item_id, text: text.trim().to_string() };
        self.post_json(&format!("inventory/item/comment/{client_id}/"), &body).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn comments(&self, item_id: u64) -> Result<Vec<Comment>, ApiError> {
        debug!("Sending request");
        match self.get_json(&format!("inventory/item/comments/{item_id}/")).await {
            Ok(value) => Ok(decode_plain::<CommentList>("comments", value)?.into_vec()),
            Err(e) if e.is_not_found() => Ok(Vec::new()),
            Err(e) => Err(e),
        }
    }
}
