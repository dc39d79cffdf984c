use tracing::{debug, instrument};

use super::ApiClient;
use crate::domain::{Offer, OfferCreate, OfferPatch, Order, OrderCreate, OrderPatch};
use crate::error::ApiError;
use crate::ingest::decode_one;

crate::impl_resource_reads!(Offer, offer, list: "sales/offers/");
crate::impl_resource_reads!(Order, order, list: "sales/orders/");

impl ApiClient {
    #[instrument(skip(self))]
    pub async fn offers_of_client(&self, client_id: u64) -> Result<Vec<Offer>, ApiError> {
        debug!("Sending request");
        self.get_list(&format!("sales/offers/client/{client_id}/")).await
    }

    #[instrument(skip(self, offer), fields(item = offer.item, client = offer.client))]
    pub async fn make_offer(&self, offer: &OfferCreate) -> Result<Offer, ApiError> {
        debug!("Sending request");
        decode_one(self.post_json("sales/offers/make-offer/", offer).await?)
    }

    /// Partial update; only the fields set in `patch` are sent.
    #[instrument(skip(self))]
    pub async fn update_offer(&self, id: u64, patch: &OfferPatch) -> Result<Offer, ApiError> {
        debug!("Sending request");
        decode_one(self.patch_json(&format!("sales/offers/{id}/"), patch).await?)
    }

    #[instrument(skip(self, order), fields(offer = order.offer))]
    pub async fn create_order(&self, order: &OrderCreate) -> Result<Order, ApiError> {
        debug!("Sending request");
        decode_one(self.post_json("sales/orders/create/", order).await?)
    }

    #[instrument(skip(self))]
    pub async fn update_order(&self, id: u64, patch: &OrderPatch) -> Result<Order, ApiError> {
        debug!("Sending request");
        decode_one(self.patch_json(&format!("sales/orders/{id}/"), patch).await?)
    }
}
