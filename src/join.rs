//! Joins independently fetched collections into the records views display.
//!
//! Lookups are linear by foreign key. A reference that does not resolve is
//! [`Resolved::Missing`], never an error. Inputs are borrowed and left as is.

use crate::domain::{Client, Item, Maalem, Offer, Order};

#[derive(Debug, Clone, PartialEq)]
pub enum Resolved<T> {
    Found(T),
    Missing,
}

impl<T> Resolved<T> {
    pub fn found(&self) -> Option<&T> {
        match self {
            Resolved::Found(value) => Some(value),
            Resolved::Missing => None,
        }
    }

    /// Label for display, or `fallback` when the reference is missing.
    pub fn label_or(&self, fallback: &str, label: impl FnOnce(&T) -> String) -> String {
        self.found().map(label).unwrap_or_else(|| fallback.to_string())
    }
}

impl<T> From<Option<T>> for Resolved<T> {
    fn from(value: Option<T>) -> Self {
        value.map(Resolved::Found).unwrap_or(Resolved::Missing)
    }
}

fn lookup<T: Clone>(items: &[T], id: u64, key: impl Fn(&T) -> u64) -> Resolved<T> {
    items.iter().find(|item| key(item) == id).cloned().into()
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedOrder {
    pub order: Order,
    pub offer: Resolved<Offer>,
    pub item: Resolved<Item>,
    pub client: Resolved<Client>,
    pub maalem: Resolved<Maalem>,
}

impl EnrichedOrder {
    pub fn item_title(&self) -> String {
        self.item.label_or("Unknown item", |item| item.title.clone())
    }

    pub fn client_name(&self) -> String {
        self.client.label_or("Unknown client", Client::full_name)
    }

    pub fn maalem_name(&self) -> String {
        self.maalem.label_or("Unknown maalem", Maalem::full_name)
    }

    pub fn category(&self) -> Option<&str> {
        self.item.found().map(|item| item.category.as_str())
    }
}

/// Resolves each order's offer, and through the offer its item, client and
/// artisan. Newest orders first; orders without a date go last.
pub fn enrich_orders(
    orders: &[Order],
    offers: &[Offer],
    items: &[Item],
    clients: &[Client],
    maalems: &[Maalem],
) -> Vec<EnrichedOrder> {
    let mut enriched: Vec<EnrichedOrder> = orders
        .iter()
        .map(|order| {
            let offer = lookup(offers, order.offer, |o| o.id);
            let (item, client) = match offer.found() {
                Some(offer) => (lookup(items, offer.item, |i| i.id), lookup(clients, offer.client, |c| c.id)),
                None => (Resolved::Missing, Resolved::Missing),
            };
            let maalem = match item.found() {
                Some(item) => lookup(maalems, item.maalem, |m| m.id),
                None => Resolved::Missing,
            };
            EnrichedOrder { order: order.clone(), offer, item, client, maalem }
        })
        .collect();

    // `None < Some`, so descending order leaves undated orders at the end.
    enriched.sort_by(|a, b| b.order.order_date.cmp(&a.order.order_date));
    enriched
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedOffer {
    pub offer: Offer,
    pub item: Resolved<Item>,
    pub client: Resolved<Client>,
    pub maalem: Resolved<Maalem>,
}

impl EnrichedOffer {
    pub fn item_title(&self) -> String {
        self.item.label_or("Unknown item", |item| item.title.clone())
    }

    pub fn client_name(&self) -> String {
        self.client.label_or("Unknown client", Client::full_name)
    }

    pub fn maalem_name(&self) -> String {
        self.maalem.label_or("Unknown maalem", Maalem::full_name)
    }
}

/// Offers with their item, buyer and artisan, newest first. A client's own
/// offers are joined the same way with an empty `clients` slice.
pub fn enrich_offers(offers: &[Offer], items: &[Item], clients: &[Client], maalems: &[Maalem]) -> Vec<EnrichedOffer> {
    let mut enriched: Vec<EnrichedOffer> = offers
        .iter()
        .map(|offer| {
            let item = lookup(items, offer.item, |i| i.id);
            let maalem = match item.found() {
                Some(item) => lookup(maalems, item.maalem, |m| m.id),
                None => Resolved::Missing,
            };
            EnrichedOffer {
                offer: offer.clone(),
                client: lookup(clients, offer.client, |c| c.id),
                item,
                maalem,
            }
        })
        .collect();

    enriched.sort_by(|a, b| b.offer.date.cmp(&a.offer.date));
    enriched
}
