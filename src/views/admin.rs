//! Administrator views: the offer queue and the order board.

use std::time::Duration;

use chrono::Utc;
use tokio::sync::mpsc;
use tracing::{debug, info, instrument};

use super::invalid;
use crate::analytics::{summarize, Dashboard, TimeRange};
use crate::api::ApiClient;
use crate::app_system::MarketSystem;
use crate::domain::{
    Notification, Offer, OfferPatch, OfferStatus, Order, OrderCreate, OrderPatch, OrderStatus, RecipientKind,
};
use crate::error::{AppError, AppResult};
use crate::feedback::Toast;
use crate::join::{enrich_offers, enrich_orders, EnrichedOffer, EnrichedOrder};
use crate::poller::{PollingFeed, Subscribe, Subscription};
use crate::pricing::final_paid;
use crate::reconciler::Reconciler;
use crate::session::UserKind;

/// Offers with item, buyer and artisan resolved; all statuses when `status`
/// is `None`.
pub async fn offers(system: &MarketSystem, status: Option<OfferStatus>) -> AppResult<Vec<EnrichedOffer>> {
    system.session.require(UserKind::Admin)?;
    let api = &system.api;
    let (offers, items, clients, maalems) =
        tokio::try_join!(api.list_offers(), api.list_items(), api.list_clients(), api.list_maalems())?;
    let offers: Vec<Offer> = offers
        .into_iter()
        .filter(|offer| status.map_or(true, |s| offer.status == s))
        .collect();
    Ok(enrich_offers(&offers, &items, &clients, &maalems))
}

#[derive(Debug, Clone)]
pub struct Acceptance {
    pub offer_id: u64,
    pub delivery_fee: f64,
    /// Defaults to the buyer's address.
    pub delivery_address: Option<String>,
}

/// Turns a pending offer into an order picked up at the artisan's address,
/// then marks the offer accepted.
#[instrument(skip(system, acceptance), fields(offer = acceptance.offer_id))]
pub async fn accept_offer(system: &mut MarketSystem, acceptance: Acceptance) -> AppResult<Order> {
    system.session.require(UserKind::Admin)?;
    if !acceptance.delivery_fee.is_finite() || acceptance.delivery_fee < 0.0 {
        return Err(invalid(format!("invalid delivery fee {}", acceptance.delivery_fee)));
    }

    let reconciler = system.spawn_reconciler::<Offer>("offer");
    let api = system.api.clone();
    let (offers, items, clients, maalems) =
        tokio::try_join!(api.list_offers(), api.list_items(), api.list_clients(), api.list_maalems())?;
    reconciler.store().refresh(offers.clone()).await?;

    let enriched = enrich_offers(&offers, &items, &clients, &maalems)
        .into_iter()
        .find(|e| e.offer.id == acceptance.offer_id)
        .ok_or_else(|| invalid(format!("offer {} not found", acceptance.offer_id)))?;
    let offer = &enriched.offer;
    if offer.status != OfferStatus::Pending {
        return Err(invalid(format!("offer {} is already {}", offer.id, offer.status)));
    }

    let delivery_address = acceptance
        .delivery_address
        .filter(|a| !a.trim().is_empty())
        .or_else(|| enriched.client.found().map(|c| c.address.clone()))
        .filter(|a| !a.trim().is_empty())
        .ok_or_else(|| invalid("the buyer has no address on file; pass one explicitly"))?;

    let create = OrderCreate {
        order_quantity: offer.offer_quantity,
        platform_margin: offer.platform_margin,
        maalem_net: offer.maalem_net_offer,
        delivery_fee: acceptance.delivery_fee,
        final_price: offer.client_offer_total,
        final_paid: final_paid(offer.client_offer_total, acceptance.delivery_fee),
        order_date: Utc::now(),
        pickup_address: enriched.maalem.found().map(|m| m.address.clone()).unwrap_or_default(),
        delivery_address,
        pickup_time: None,
        delivery_time: None,
        status: OrderStatus::PickedUp,
        offer: offer.id,
    };
    let order = api.create_order(&create).await?;
    info!(order = ?order.id, "Order created");

    reconciler
        .update(Some(offer.id), OfferPatch::status(OfferStatus::Accepted), move |id, patch| async move {
            api.update_offer(id, &patch).await
        })
        .await?;
    Ok(order)
}

#[instrument(skip(system))]
pub async fn reject_offer(system: &mut MarketSystem, offer_id: u64) -> AppResult<Offer> {
    system.session.require(UserKind::Admin)?;
    let reconciler = system.spawn_reconciler::<Offer>("offer");
    reconciler.store().refresh(system.api.list_offers().await?).await?;
    if reconciler.store().get(offer_id).await?.is_none() {
        return Err(invalid(format!("offer {offer_id} not found")));
    }

    let api = system.api.clone();
    let offer = reconciler
        .update(Some(offer_id), OfferPatch::status(OfferStatus::Rejected), move |id, patch| async move {
            api.update_offer(id, &patch).await
        })
        .await?;
    Ok(offer)
}

pub async fn notify(system: &MarketSystem, kind: RecipientKind, id: u64, message: &str) -> AppResult<Notification> {
    system.session.require(UserKind::Admin)?;
    let message = message.trim();
    if message.is_empty() {
        return Err(invalid("notification message is required"));
    }
    let sent = system.api.send_notification(kind, id, message).await?;
    system.notifier.notify(Toast::success(format!("Notification sent to {kind} {id}.")));
    Ok(sent)
}

/// One rendering of the order board.
#[derive(Debug, Clone)]
pub struct BoardView {
    pub orders: Vec<EnrichedOrder>,
    pub summary: Dashboard,
}

/// The admin order dashboard. Orders live in a store so a status change in
/// flight survives a refresh.
#[derive(Clone)]
pub struct OrderBoard {
    api: ApiClient,
    range: TimeRange,
    orders: Reconciler<Order>,
}

impl OrderBoard {
    pub fn open(system: &mut MarketSystem, range: TimeRange) -> AppResult<Self> {
        system.session.require(UserKind::Admin)?;
        Ok(Self {
            api: system.api.clone(),
            range,
            orders: system.spawn_reconciler::<Order>("order"),
        })
    }

    /// Fetches all five collections at once and joins them.
    pub async fn load(&self) -> AppResult<BoardView> {
        let api = &self.api;
        let (orders, offers, items, clients, maalems) = tokio::try_join!(
            api.list_orders(),
            api.list_offers(),
            api.list_items(),
            api.list_clients(),
            api.list_maalems()
        )?;
        self.orders.store().refresh(orders).await?;
        let orders = self.orders.store().snapshot().await?;

        Ok(BoardView {
            summary: summarize(self.range, Utc::now(), &orders, &offers, &items, &clients, &maalems),
            orders: enrich_orders(&orders, &offers, &items, &clients, &maalems),
        })
    }

    /// Reloads every `period`, starting now. Views arrive on the returned
    /// channel until the subscription is dropped.
    pub fn watch(&self, period: Duration) -> (Subscription, mpsc::Receiver<BoardView>) {
        let (tx, rx) = mpsc::channel(1);
        let board = self.clone();
        let feed = PollingFeed::new("admin_orders", period, move || {
            let board = board.clone();
            let tx = tx.clone();
            async move {
                let view = board.load().await?;
                // Nobody is watching any more; the subscription goes next.
                let _ = tx.send(view).await;
                Ok::<_, AppError>(())
            }
        });
        (feed.subscribe(), rx)
    }

    #[instrument(skip(self))]
    pub async fn set_status(&self, order_id: u64, status: OrderStatus) -> AppResult<Order> {
        if self.orders.store().get(order_id).await?.is_none() {
            self.orders.store().refresh(self.api.list_orders().await?).await?;
        }
        let Some(current) = self.orders.store().get(order_id).await? else {
            return Err(invalid(format!("order {order_id} not found")));
        };

        let api = self.api.clone();
        let order = self
            .orders
            .update(current.id, OrderPatch::status(status), move |id, patch| async move {
                api.update_order(id, &patch).await
            })
            .await?;
        Ok(order)
    }

    /// Stops the board's store once nothing else will read it.
    pub async fn close(self) {
        if self.orders.store().shutdown().await.is_err() {
            debug!("Order store already stopped");
        }
    }
}
