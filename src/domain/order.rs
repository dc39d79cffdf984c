use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::wire;

/// Fulfilment stage of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    #[serde(rename = "pickedUp")]
    PickedUp,
    #[serde(rename = "delivered")]
    Delivered,
    #[serde(rename = "cash_collected")]
    CashCollected,
    #[serde(rename = "maalem_paid")]
    MaalemPaid,
    #[serde(rename = "returned")]
    Returned,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 5] = [
        OrderStatus::PickedUp,
        OrderStatus::Delivered,
        OrderStatus::CashCollected,
        OrderStatus::MaalemPaid,
        OrderStatus::Returned,
    ];

    /// Wire value, as the backend stores it.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::PickedUp => "pickedUp",
            OrderStatus::Delivered => "delivered",
            OrderStatus::CashCollected => "cash_collected",
            OrderStatus::MaalemPaid => "maalem_paid",
            OrderStatus::Returned => "returned",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            OrderStatus::PickedUp => "Picked Up",
            OrderStatus::Delivered => "Delivered",
            OrderStatus::CashCollected => "Cash Collected",
            OrderStatus::MaalemPaid => "Maalem Paid",
            OrderStatus::Returned => "Returned",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace([' ', '-'], "_");
        OrderStatus::ALL
            .into_iter()
            .find(|status| {
                status.as_str().to_ascii_lowercase() == wanted
                    || status.label().to_ascii_lowercase().replace(' ', "_") == wanted
            })
            .ok_or_else(|| {
                let valid: Vec<&str> = OrderStatus::ALL.iter().map(|s| s.as_str()).collect();
                format!("unknown order status {s:?} (expected one of {})", valid.join(", "))
            })
    }
}

/// Fulfilment record created once an offer is accepted.
///
/// The backend is inconsistent about the key it uses for orders; `id` is the
/// canonical field after ingestion and stays `None` when no alias was present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub order_quantity: u32,
    #[serde(with = "wire::amount")]
    pub platform_margin: f64,
    #[serde(with = "wire::amount")]
    pub maalem_net: f64,
    #[serde(with = "wire::amount")]
    pub delivery_fee: f64,
    #[serde(with = "wire::amount")]
    pub final_price: f64,
    #[serde(default, with = "wire::amount")]
    pub final_paid: f64,
    #[serde(default, with = "wire::timestamp")]
    pub order_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub pickup_address: String,
    #[serde(default)]
    pub delivery_address: String,
    #[serde(default, with = "wire::timestamp")]
    pub pickup_time: Option<DateTime<Utc>>,
    #[serde(default, with = "wire::timestamp")]
    pub delivery_time: Option<DateTime<Utc>>,
    pub status: OrderStatus,
    pub offer: u64,
}

/// Partial update for an order. Only set fields go over the wire.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OrderPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<OrderStatus>,
    #[serde(skip_serializing_if = "Option::is_none", with = "wire::timestamp")]
    pub pickup_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none", with = "wire::timestamp")]
    pub delivery_time: Option<DateTime<Utc>>,
}

impl OrderPatch {
    pub fn status(status: OrderStatus) -> Self {
        Self { status: Some(status), ..Self::default() }
    }
}

/// Payload for creating an order from an accepted offer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderCreate {
    pub order_quantity: u32,
    #[serde(serialize_with = "wire::cents")]
    pub platform_margin: f64,
    #[serde(serialize_with = "wire::cents")]
    pub maalem_net: f64,
    #[serde(serialize_with = "wire::cents")]
    pub delivery_fee: f64,
    #[serde(serialize_with = "wire::cents")]
    pub final_price: f64,
    #[serde(serialize_with = "wire::cents")]
    pub final_paid: f64,
    pub order_date: DateTime<Utc>,
    pub pickup_address: String,
    pub delivery_address: String,
    pub pickup_time: Option<DateTime<Utc>>,
    pub delivery_time: Option<DateTime<Utc>>,
    pub status: OrderStatus,
    pub offer: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parses_wire_values_and_labels() {
        assert_eq!("cash_collected".parse::<OrderStatus>(), Ok(OrderStatus::CashCollected));
        assert_eq!("Maalem Paid".parse::<OrderStatus>(), Ok(OrderStatus::MaalemPaid));
        assert_eq!("pickedup".parse::<OrderStatus>(), Ok(OrderStatus::PickedUp));
        assert!("shipped".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn patch_carries_only_changed_fields() {
        let body = serde_json::to_value(OrderPatch::status(OrderStatus::Delivered)).unwrap();
        assert_eq!(body, serde_json::json!({ "status": "delivered" }));
    }
}
