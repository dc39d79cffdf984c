use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::wire;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OfferStatus {
    Pending,
    Accepted,
    Rejected,
}

impl fmt::Display for OfferStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OfferStatus::Pending => "pending",
            OfferStatus::Accepted => "accepted",
            OfferStatus::Rejected => "rejected",
        })
    }
}

/// A client's proposed purchase price for an item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Offer {
    pub id: u64,
    pub offer_quantity: u32,
    /// What the artisan receives.
    #[serde(with = "wire::amount")]
    pub maalem_net_offer: f64,
    /// What the client pays.
    #[serde(with = "wire::amount")]
    pub client_offer_total: f64,
    #[serde(with = "wire::amount")]
    pub platform_margin: f64,
    pub status: OfferStatus,
    #[serde(default, with = "wire::timestamp")]
    pub date: Option<DateTime<Utc>>,
    pub client: u64,
    pub item: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OfferPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<OfferStatus>,
}

impl OfferPatch {
    pub fn status(status: OfferStatus) -> Self {
        Self { status: Some(status) }
    }
}

/// Body of `make-offer`. Amounts travel as two-decimal strings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OfferCreate {
    pub offer_quantity: u32,
    #[serde(serialize_with = "wire::cents")]
    pub maalem_net_offer: f64,
    #[serde(serialize_with = "wire::cents")]
    pub client_offer_total: f64,
    #[serde(serialize_with = "wire::cents")]
    pub platform_margin: f64,
    pub client: u64,
    pub item: u64,
}
