//! Figures for the admin dashboard.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Months, NaiveDate, Utc};
use serde::Serialize;

use crate::domain::{Client, Item, Maalem, Offer, OfferStatus, Order, OrderStatus};

/// How far back the dashboard looks, by order date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeRange {
    #[default]
    All,
    Today,
    Week,
    Month,
}

impl TimeRange {
    /// Orders without a date only count towards [`TimeRange::All`].
    pub fn contains(&self, date: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
        let Some(date) = date else {
            return *self == TimeRange::All;
        };
        match self {
            TimeRange::All => true,
            TimeRange::Today => date.date_naive() == now.date_naive(),
            TimeRange::Week => date >= now - Duration::days(7),
            TimeRange::Month => match now.checked_sub_months(Months::new(1)) {
                Some(start) => date >= start,
                None => true,
            },
        }
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TimeRange::All => "all",
            TimeRange::Today => "today",
            TimeRange::Week => "week",
            TimeRange::Month => "month",
        })
    }
}

impl FromStr for TimeRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(TimeRange::All),
            "today" => Ok(TimeRange::Today),
            "week" => Ok(TimeRange::Week),
            "month" => Ok(TimeRange::Month),
            other => Err(format!("unknown range {other:?} (expected all, today, week or month)")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct OfferCounts {
    pub pending: usize,
    pub accepted: usize,
    pub rejected: usize,
}

impl OfferCounts {
    pub fn total(&self) -> usize {
        self.pending + self.accepted + self.rejected
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusCount {
    pub status: OrderStatus,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryStat {
    pub category: String,
    pub accepted_offers: usize,
    pub revenue: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArtisanStat {
    pub name: String,
    pub rating: f64,
    pub sales: f64,
    pub orders: usize,
    /// Orders per listed item, as a percentage.
    pub efficiency: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyRevenue {
    pub date: NaiveDate,
    pub revenue: f64,
    pub orders: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClientStat {
    pub name: String,
    pub orders: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub range: TimeRange,
    pub order_count: usize,
    pub total_revenue: f64,
    pub platform_profit: f64,
    pub delivery_fees: f64,
    pub average_order_value: f64,
    pub average_platform_margin: f64,
    pub conversion_rate: f64,
    pub return_rate: f64,
    pub average_delivery_hours: f64,
    pub active_maalems: usize,
    pub clients: usize,
    pub statuses: Vec<StatusCount>,
    pub offers: OfferCounts,
    pub categories: Vec<CategoryStat>,
    pub artisans: Vec<ArtisanStat>,
    pub daily_revenue: Vec<DailyRevenue>,
    pub top_clients: Vec<ClientStat>,
}

const DAILY_REVENUE_DAYS: usize = 15;
const TOP_CLIENTS: usize = 8;

fn mean(total: f64, count: usize) -> f64 {
    if count == 0 {
        0.0
    } else {
        total / count as f64
    }
}

fn percent(part: usize, whole: usize) -> f64 {
    mean(part as f64 * 100.0, whole)
}

/// Aggregates over the orders in `range`. Offer, category and artisan
/// figures look at all offers, as the dashboard always has.
pub fn summarize(
    range: TimeRange,
    now: DateTime<Utc>,
    orders: &[Order],
    offers: &[Offer],
    items: &[Item],
    clients: &[Client],
    maalems: &[Maalem],
) -> Dashboard {
    let orders: Vec<&Order> = orders.iter().filter(|o| range.contains(o.order_date, now)).collect();
    let offer_of = |order: &Order| offers.iter().find(|offer| offer.id == order.offer);

    let total_revenue: f64 = orders.iter().map(|o| o.final_price).sum();
    let platform_profit: f64 = orders.iter().map(|o| o.platform_margin).sum();
    let delivery_fees: f64 = orders.iter().map(|o| o.delivery_fee).sum();

    let statuses: Vec<StatusCount> = OrderStatus::ALL
        .into_iter()
        .map(|status| StatusCount { status, count: orders.iter().filter(|o| o.status == status).count() })
        .filter(|s| s.count > 0)
        .collect();
    let returned = orders.iter().filter(|o| o.status == OrderStatus::Returned).count();

    let mut offer_counts = OfferCounts::default();
    for offer in offers {
        match offer.status {
            OfferStatus::Pending => offer_counts.pending += 1,
            OfferStatus::Accepted => offer_counts.accepted += 1,
            OfferStatus::Rejected => offer_counts.rejected += 1,
        }
    }

    let mut by_category: BTreeMap<&str, (usize, f64)> = BTreeMap::new();
    for offer in offers.iter().filter(|o| o.status == OfferStatus::Accepted) {
        if let Some(item) = items.iter().find(|i| i.id == offer.item) {
            let entry = by_category.entry(item.category.as_str()).or_default();
            entry.0 += 1;
            entry.1 += offer.client_offer_total;
        }
    }
    let mut categories: Vec<CategoryStat> = by_category
        .into_iter()
        .map(|(category, (accepted_offers, revenue))| CategoryStat {
            category: category.to_string(),
            accepted_offers,
            revenue,
        })
        .collect();
    categories.sort_by(|a, b| b.revenue.total_cmp(&a.revenue));

    let artisans = maalems
        .iter()
        .filter_map(|maalem| {
            let listed: Vec<u64> = items.iter().filter(|i| i.maalem == maalem.id).map(|i| i.id).collect();
            let sales: f64 = offers
                .iter()
                .filter(|o| o.status == OfferStatus::Accepted && listed.contains(&o.item))
                .map(|o| o.client_offer_total)
                .sum();
            if sales <= 0.0 {
                return None;
            }
            let completed = orders
                .iter()
                .filter(|order| offer_of(order).is_some_and(|offer| listed.contains(&offer.item)))
                .count();
            Some(ArtisanStat {
                name: maalem.full_name(),
                rating: maalem.rating,
                sales,
                orders: completed,
                efficiency: percent(completed, listed.len()),
            })
        })
        .collect();

    let mut by_day: BTreeMap<NaiveDate, (f64, usize)> = BTreeMap::new();
    for order in &orders {
        if let Some(date) = order.order_date {
            let entry = by_day.entry(date.date_naive()).or_default();
            entry.0 += order.final_price;
            entry.1 += 1;
        }
    }
    let skip = by_day.len().saturating_sub(DAILY_REVENUE_DAYS);
    let daily_revenue = by_day
        .into_iter()
        .skip(skip)
        .map(|(date, (revenue, orders))| DailyRevenue { date, revenue, orders })
        .collect();

    let mut per_client: BTreeMap<u64, usize> = BTreeMap::new();
    for order in &orders {
        if let Some(offer) = offer_of(order) {
            *per_client.entry(offer.client).or_default() += 1;
        }
    }
    let mut top_clients: Vec<ClientStat> = per_client
        .into_iter()
        .map(|(id, orders)| ClientStat {
            name: clients
                .iter()
                .find(|c| c.id == id)
                .map(Client::full_name)
                .unwrap_or_else(|| format!("Client {id}")),
            orders,
        })
        .collect();
    top_clients.sort_by(|a, b| b.orders.cmp(&a.orders));
    top_clients.truncate(TOP_CLIENTS);

    let delivery_hours: Vec<f64> = orders
        .iter()
        .filter_map(|o| match (o.pickup_time, o.delivery_time) {
            (Some(pickup), Some(delivery)) => Some((delivery - pickup).num_seconds() as f64 / 3600.0),
            _ => None,
        })
        .collect();

    Dashboard {
        range,
        order_count: orders.len(),
        total_revenue,
        platform_profit,
        delivery_fees,
        average_order_value: mean(total_revenue, orders.len()),
        average_platform_margin: mean(platform_profit, orders.len()),
        conversion_rate: percent(offer_counts.accepted, offers.len()),
        return_rate: percent(returned, orders.len()),
        average_delivery_hours: mean(delivery_hours.iter().sum(), delivery_hours.len()),
        active_maalems: maalems.len(),
        clients: clients.len(),
        statuses,
        offers: offer_counts,
        categories,
        artisans,
        daily_revenue,
        top_clients,
    }
}
