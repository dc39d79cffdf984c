//! Display rows for table output.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tabled::Tabled;

use crate::domain::{Comment, Item, Maalem, Notification};
use crate::join::{EnrichedOffer, EnrichedOrder};
use crate::output::money;
use crate::pricing::display_price;

fn date(at: Option<DateTime<Utc>>) -> String {
    at.map(|d| d.format("%Y-%m-%d %H:%M").to_string()).unwrap_or_else(|| "-".to_string())
}

/// Item display row
#[derive(Debug, Serialize, Tabled)]
pub struct ItemRow {
    pub id: u64,
    pub title: String,
    pub category: String,
    pub price: String,
    pub stock: u32,
    pub maalem: u64,
}

impl From<&Item> for ItemRow {
    fn from(item: &Item) -> Self {
        Self {
            id: item.id,
            title: item.title.clone(),
            category: item.category.clone(),
            price: money(display_price(item.ask_price, item.fee_percentage)),
            stock: item.stock_quantity,
            maalem: item.maalem,
        }
    }
}

/// Artisan display row
#[derive(Debug, Serialize, Tabled)]
pub struct MaalemRow {
    pub id: u64,
    pub name: String,
    pub address: String,
    pub rating: String,
}

impl From<&Maalem> for MaalemRow {
    fn from(maalem: &Maalem) -> Self {
        Self {
            id: maalem.id,
            name: maalem.full_name(),
            address: maalem.address.clone(),
            rating: format!("{:.1}", maalem.rating),
        }
    }
}

/// Offer display row
#[derive(Debug, Serialize, Tabled)]
pub struct OfferRow {
    pub id: u64,
    pub item: String,
    pub client: String,
    pub maalem: String,
    pub quantity: u32,
    pub total: String,
    pub net: String,
    pub margin: String,
    pub status: String,
    pub date: String,
}

impl From<&EnrichedOffer> for OfferRow {
    fn from(e: &EnrichedOffer) -> Self {
        Self {
            id: e.offer.id,
            item: e.item_title(),
            client: e.client_name(),
            maalem: e.maalem_name(),
            quantity: e.offer.offer_quantity,
            total: money(e.offer.client_offer_total),
            net: money(e.offer.maalem_net_offer),
            margin: money(e.offer.platform_margin),
            status: e.offer.status.to_string(),
            date: date(e.offer.date),
        }
    }
}

/// Order display row
#[derive(Debug, Serialize, Tabled)]
pub struct OrderRow {
    pub id: String,
    pub item: String,
    pub category: String,
    pub client: String,
    pub maalem: String,
    pub status: String,
    pub paid: String,
    pub delivery: String,
    pub date: String,
}

impl From<&EnrichedOrder> for OrderRow {
    fn from(e: &EnrichedOrder) -> Self {
        Self {
            id: e.order.id.map(|id| id.to_string()).unwrap_or_else(|| "-".to_string()),
            item: e.item_title(),
            category: e.category().unwrap_or("-").to_string(),
            client: e.client_name(),
            maalem: e.maalem_name(),
            status: e.order.status.to_string(),
            paid: money(e.order.final_paid),
            delivery: e.order.delivery_address.clone(),
            date: date(e.order.order_date),
        }
    }
}

/// Notification display row
#[derive(Debug, Serialize, Tabled)]
pub struct NotificationRow {
    pub id: u64,
    pub new: String,
    pub message: String,
    pub date: String,
}

impl From<&Notification> for NotificationRow {
    fn from(n: &Notification) -> Self {
        Self {
            id: n.id,
            new: if n.is_read { String::new() } else { "●".to_string() },
            message: n.message.clone(),
            date: date(n.created_at),
        }
    }
}

/// Comment display row
#[derive(Debug, Serialize, Tabled)]
pub struct CommentRow {
    pub client: String,
    pub text: String,
    pub date: String,
}

impl From<&Comment> for CommentRow {
    fn from(c: &Comment) -> Self {
        Self {
            client: c.client_name.clone().unwrap_or_else(|| format!("Client {}", c.client_id)),
            text: c.text.clone(),
            date: date(c.created_at),
        }
    }
}

pub fn rows<'a, S: 'a, R: From<&'a S>>(items: &'a [S]) -> Vec<R> {
    items.iter().map(R::from).collect()
}
