//! Data-ingestion boundary.
//!
//! Every record coming off the wire passes through here before it is
//! deserialized. The backend names its primary keys differently per table and,
//! for orders, differently per endpoint (`id`, `order_id`, `pk`). Past this
//! module only the canonical `id` field exists.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::domain::{Admin, Client, Item, Maalem, Notification, Offer, Order};
use crate::error::ApiError;

/// Canonical identifier field.
pub const CANONICAL_ID: &str = "id";

/// A backend record that can be normalized and decoded.
pub trait Record: DeserializeOwned {
    /// Name used in log lines and error messages.
    const KIND: &'static str;
    /// Key names the backend may use for the identifier, in priority order.
    const ID_FIELDS: &'static [&'static str];
}

impl Record for Order {
    const KIND: &'static str = "order";
    const ID_FIELDS: &'static [&'static str] = &["id", "order_id", "pk"];
}

impl Record for Offer {
    const KIND: &'static str = "offer";
    const ID_FIELDS: &'static [&'static str] = &["offer_id", "id", "pk"];
}

impl Record for Item {
    const KIND: &'static str = "item";
    const ID_FIELDS: &'static [&'static str] = &["item_id", "id", "pk"];
}

impl Record for Client {
    const KIND: &'static str = "client";
    const ID_FIELDS: &'static [&'static str] = &["client_id", "id_client", "id", "pk"];
}

impl Record for Maalem {
    const KIND: &'static str = "maalem";
    const ID_FIELDS: &'static [&'static str] = &["id_maalem", "maalem_id", "id", "pk"];
}

impl Record for Admin {
    const KIND: &'static str = "admin";
    const ID_FIELDS: &'static [&'static str] = &["admin_id", "id", "pk"];
}

impl Record for Notification {
    const KIND: &'static str = "notification";
    const ID_FIELDS: &'static [&'static str] = &["notification_id", "id", "pk"];
}

fn as_id(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Rewrites `object` so the first usable alias becomes the canonical `id`
/// and every other alias is removed. Returns the id that was kept.
pub fn normalize_id(object: &mut Map<String, Value>, aliases: &[&str]) -> Option<u64> {
    let id = aliases
        .iter()
        .find_map(|alias| object.get(*alias).and_then(as_id));

    for alias in aliases {
        object.remove(*alias);
    }
    object.remove(CANONICAL_ID);

    if let Some(id) = id {
        object.insert(CANONICAL_ID.to_string(), Value::from(id));
    }
    id
}

/// Normalizes and decodes a single record.
pub fn decode_one<T: Record>(value: Value) -> Result<T, ApiError> {
    let mut value = value;
    if !value.is_object() {
        return Err(ApiError::Decode(format!("expected {} object, got {}", T::KIND, value)));
    }
    if let Some(object) = value.as_object_mut() {
        if normalize_id(object, T::ID_FIELDS).is_none() {
            warn!(kind = T::KIND, "Record arrived without any identifier field");
        }
    }
    serde_json::from_value(value).map_err(|e| ApiError::Decode(format!("{}: {}", T::KIND, e)))
}

/// Normalizes and decodes a list of records.
pub fn decode_many<T: Record>(value: Value) -> Result<Vec<T>, ApiError> {
    match value {
        Value::Array(values) => {
            debug!(kind = T::KIND, count = values.len(), "Decoding records");
            values.into_iter().map(decode_one::<T>).collect()
        }
        other => Err(ApiError::Decode(format!("expected list of {}, got {}", T::KIND, other))),
    }
}
