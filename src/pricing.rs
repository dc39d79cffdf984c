//! Client-side price arithmetic.
//!
//! All functions are pure. They return unrounded values; rounding to cents
//! happens only when a value is displayed or sent to the backend.

use crate::domain::wire::round_cents;
use crate::domain::Item;

fn markup(fee_percentage: f64) -> f64 {
    1.0 + fee_percentage / 100.0
}

/// Price shown to clients: the artisan's ask plus the platform fee.
pub fn display_price(ask_price: f64, fee_percentage: f64) -> f64 {
    ask_price * markup(fee_percentage)
}

/// Smallest offer a client may make.
pub fn min_offer(min_sell_price: f64, fee_percentage: f64) -> f64 {
    min_sell_price * markup(fee_percentage)
}

/// Largest offer a client may make (the display price).
pub fn max_offer(ask_price: f64, fee_percentage: f64) -> f64 {
    ask_price * markup(fee_percentage)
}

/// Part of an offer that goes to the artisan.
pub fn artisan_net(offer: f64, fee_percentage: f64) -> f64 {
    offer / markup(fee_percentage)
}

pub fn platform_margin(offer: f64, fee_percentage: f64) -> f64 {
    offer - artisan_net(offer, fee_percentage)
}

/// What the client ends up paying for an accepted offer.
pub fn final_paid(client_offer_total: f64, delivery_fee: f64) -> f64 {
    client_offer_total + delivery_fee
}

/// Price bounds for one item.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceSheet {
    pub fee_percentage: f64,
    pub display_price: f64,
    pub min_offer: f64,
    pub max_offer: f64,
}

impl PriceSheet {
    pub fn for_item(item: &Item) -> Self {
        Self {
            fee_percentage: item.fee_percentage,
            display_price: display_price(item.ask_price, item.fee_percentage),
            min_offer: min_offer(item.min_sell_price, item.fee_percentage),
            max_offer: max_offer(item.ask_price, item.fee_percentage),
        }
    }

    /// Offer proposed before the client picks one: the minimum, floored to a
    /// whole unit.
    pub fn default_offer(&self) -> f64 {
        self.min_offer.floor()
    }

    pub fn contains(&self, offer: f64) -> bool {
        // Bounds are compared in cents so 54.999999 does not reject 55.00.
        let cents = round_cents(offer);
        cents >= round_cents(self.min_offer) && cents <= round_cents(self.max_offer)
    }

    /// Splits an offer into its artisan and platform shares.
    pub fn quote(&self, offer: f64) -> Result<OfferQuote, String> {
        if !offer.is_finite() || offer <= 0.0 {
            return Err(format!("offer must be a positive amount, got {offer}"));
        }
        if !self.contains(offer) {
            return Err(format!(
                "offer {:.2} is outside the allowed range {:.2} - {:.2}",
                offer, self.min_offer, self.max_offer
            ));
        }
        let net = artisan_net(offer, self.fee_percentage);
        Ok(OfferQuote {
            client_total: round_cents(offer),
            artisan_net: round_cents(net),
            platform_margin: round_cents(offer - net),
        })
    }
}

/// An offer split into its parts, rounded to cents.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OfferQuote {
    pub client_total: f64,
    pub artisan_net: f64,
    pub platform_margin: f64,
}
