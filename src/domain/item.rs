use serde::{Deserialize, Serialize};

use super::wire;

fn default_fee() -> f64 {
    5.0
}

fn default_stock() -> u32 {
    1
}

/// A product listed by a maalem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: u64,
    pub maalem: u64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(rename = "photoUrl", default)]
    pub photo_url: String,
    #[serde(rename = "maalemAskPrice", with = "wire::amount")]
    pub ask_price: f64,
    #[serde(rename = "minSellPrice", with = "wire::amount")]
    pub min_sell_price: f64,
    #[serde(rename = "platformFeePercentage", default = "default_fee", with = "wire::amount")]
    pub fee_percentage: f64,
    #[serde(rename = "stockQuantity", default = "default_stock")]
    pub stock_quantity: u32,
}

/// Body for listing a new item; the owning maalem comes from the URL.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemCreate {
    pub title: String,
    pub description: String,
    pub category: String,
    #[serde(rename = "photoUrl")]
    pub photo_url: String,
    #[serde(rename = "maalemAskPrice", serialize_with = "wire::cents")]
    pub ask_price: f64,
    #[serde(rename = "minSellPrice", serialize_with = "wire::cents")]
    pub min_sell_price: f64,
    #[serde(rename = "stockQuantity")]
    pub stock_quantity: u32,
}

impl ItemCreate {
    pub fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("title is required".to_string());
        }
        if self.ask_price < 0.0 || self.min_sell_price < 0.0 {
            return Err("prices must not be negative".to_string());
        }
        if self.min_sell_price > self.ask_price {
            return Err(format!(
                "minimum sell price {:.2} is above the ask price {:.2}",
                self.min_sell_price, self.ask_price
            ));
        }
        if self.stock_quantity == 0 {
            return Err("stock quantity must be at least 1".to_string());
        }
        Ok(())
    }
}
