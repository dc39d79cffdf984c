use tracing::instrument;

use super::invalid;
use crate::app_system::MarketSystem;
use crate::domain::{Item, ItemCreate, Maalem};
use crate::error::AppResult;
use crate::session::UserKind;

#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    pub category: Option<String>,
    pub search: Option<String>,
}

impl ProductFilter {
    /// Category matches exactly (ignoring case); search looks in title and
    /// description.
    pub fn matches(&self, item: &Item) -> bool {
        if let Some(category) = &self.category {
            if !item.category.eq_ignore_ascii_case(category.trim()) {
                return false;
            }
        }
        if let Some(search) = &self.search {
            let needle = search.trim().to_lowercase();
            if !needle.is_empty()
                && !item.title.to_lowercase().contains(&needle)
                && !item.description.to_lowercase().contains(&needle)
            {
                return false;
            }
        }
        true
    }
}

pub async fn products(system: &MarketSystem, filter: &ProductFilter) -> AppResult<Vec<Item>> {
    let items = system.api.list_items().await?;
    Ok(items.into_iter().filter(|item| filter.matches(item)).collect())
}

pub async fn maalems(system: &MarketSystem) -> AppResult<Vec<Maalem>> {
    Ok(system.api.list_maalems().await?)
}

/// An artisan's profile and listings, fetched together.
pub async fn maalem_detail(system: &MarketSystem, id: u64) -> AppResult<(Maalem, Vec<Item>)> {
    let (maalem, items) = tokio::try_join!(system.api.get_maalem(id), system.api.items_of_maalem(id))?;
    Ok((maalem, items))
}

pub async fn my_products(system: &MarketSystem) -> AppResult<Vec<Item>> {
    let id = system.session.require(UserKind::Maalem)?;
    Ok(system.api.items_of_maalem(id).await?)
}

#[instrument(skip(system, item), fields(title = %item.title))]
pub async fn add_product(system: &MarketSystem, item: ItemCreate) -> AppResult<Item> {
    let id = system.session.require(UserKind::Maalem)?;
    item.validate().map_err(invalid)?;
    Ok(system.api.create_item(id, &item).await?)
}
