//! Browsing, reactions and offers.

use clap::Args;
use serde::Serialize;

use super::rows::{rows, CommentRow, ItemRow, MaalemRow, OfferRow};
use crate::app_system::MarketSystem;
use crate::domain::ItemCreate;
use crate::error::AppResult;
use crate::output::{self, money, OutputFormat};
use crate::views::catalog::{self as view, ProductFilter};
use crate::views::product::{self, OfferDraft};

/// Arguments for listing products
#[derive(Debug, Args)]
pub struct ProductsArgs {
    /// Only this category
    #[arg(short, long)]
    pub category: Option<String>,
    /// Text to look for in title and description
    #[arg(short, long)]
    pub search: Option<String>,
}

/// Arguments for making an offer
#[derive(Debug, Args)]
pub struct OfferArgs {
    /// Item id
    pub item: u64,
    /// Price per unit (defaults to the lowest accepted offer)
    #[arg(long)]
    pub amount: Option<f64>,
    #[arg(long, default_value_t = 1)]
    pub quantity: u32,
}

/// Arguments for listing a new item
#[derive(Debug, Args)]
pub struct AddProductArgs {
    #[arg(long)]
    pub title: String,
    #[arg(long, default_value = "")]
    pub description: String,
    #[arg(long)]
    pub category: String,
    #[arg(long, default_value = "")]
    pub photo_url: String,
    /// Your asking price, before the platform fee
    #[arg(long)]
    pub ask_price: f64,
    /// Lowest price you accept, before the platform fee
    #[arg(long)]
    pub min_price: f64,
    #[arg(long, default_value_t = 1)]
    pub stock: u32,
}

#[derive(Debug, Serialize)]
struct ProductPage<'a> {
    item: &'a crate::domain::Item,
    display_price: String,
    min_offer: String,
    max_offer: String,
    default_offer: String,
    artisan: Option<&'a crate::domain::Maalem>,
    liked: bool,
    like_count: u64,
    comments: &'a [crate::domain::Comment],
}

pub async fn products(args: &ProductsArgs, system: &MarketSystem, format: OutputFormat) -> AppResult<()> {
    let filter = ProductFilter { category: args.category.clone(), search: args.search.clone() };
    let items = view::products(system, &filter).await?;
    output::print_list(&rows::<_, ItemRow>(&items), format);
    Ok(())
}

pub async fn product(id: u64, system: &MarketSystem, format: OutputFormat) -> AppResult<()> {
    let detail = product::product_detail(system, id).await?;
    let page = ProductPage {
        item: &detail.item,
        display_price: money(detail.prices.display_price),
        min_offer: money(detail.prices.min_offer),
        max_offer: money(detail.prices.max_offer),
        default_offer: money(detail.prices.default_offer()),
        artisan: detail.artisan.found(),
        liked: detail.likes.liked,
        like_count: detail.likes.like_count,
        comments: &detail.comments,
    };
    if format == OutputFormat::Json {
        output::print_item(&page, format);
        return Ok(());
    }

    let item = &detail.item;
    output::print_heading(&item.title, format);
    output::print_kv("Category", &item.category);
    output::print_kv("Description", &item.description);
    output::print_kv("Price", &page.display_price);
    output::print_kv("Offer range", &format!("{} - {}", page.min_offer, page.max_offer));
    output::print_kv("In stock", &item.stock_quantity.to_string());
    output::print_kv(
        "Artisan",
        &detail.artisan.label_or("Unknown maalem", |m| format!("{} ({:.1}★)", m.full_name(), m.rating)),
    );
    let heart = if detail.likes.liked { "♥" } else { "♡" };
    output::print_kv("Likes", &format!("{heart} {}", detail.likes.like_count));

    output::print_heading("Comments", format);
    output::print_list(&rows::<_, CommentRow>(&detail.comments), format);
    Ok(())
}

pub async fn maalems(system: &MarketSystem, format: OutputFormat) -> AppResult<()> {
    let maalems = view::maalems(system).await?;
    output::print_list(&rows::<_, MaalemRow>(&maalems), format);
    Ok(())
}

pub async fn maalem(id: u64, system: &MarketSystem, format: OutputFormat) -> AppResult<()> {
    let (maalem, items) = view::maalem_detail(system, id).await?;
    output::print_item(&maalem, format);
    output::print_heading("Products", format);
    output::print_list(&rows::<_, ItemRow>(&items), format);
    Ok(())
}

pub async fn like(item: u64, system: &mut MarketSystem) -> AppResult<()> {
    let state = product::toggle_like(system, item).await?;
    let verb = if state.liked { "Liked" } else { "Unliked" };
    output::print_success(&format!("{verb} item {item} ({} likes)", state.like_count));
    Ok(())
}

pub async fn comment(item: u64, text: &str, system: &mut MarketSystem, format: OutputFormat) -> AppResult<()> {
    let comments = product::post_comment(system, item, text).await?;
    output::print_success("Comment posted");
    output::print_list(&rows::<_, CommentRow>(&comments), format);
    Ok(())
}

pub async fn offer(args: &OfferArgs, system: &MarketSystem, format: OutputFormat) -> AppResult<()> {
    let draft = OfferDraft { item_id: args.item, amount: args.amount, quantity: args.quantity };
    let offer = product::make_offer(system, draft).await?;
    output::print_success(&format!(
        "Offer #{} sent: {} for {} item(s)",
        offer.id,
        money(offer.client_offer_total),
        offer.offer_quantity
    ));
    if format == OutputFormat::Json {
        output::print_item(&offer, format);
    }
    Ok(())
}

pub async fn my_offers(system: &MarketSystem, format: OutputFormat) -> AppResult<()> {
    let offers = product::my_offers(system).await?;
    output::print_list(&rows::<_, OfferRow>(&offers), format);
    Ok(())
}

pub async fn my_products(system: &MarketSystem, format: OutputFormat) -> AppResult<()> {
    let items = view::my_products(system).await?;
    output::print_list(&rows::<_, ItemRow>(&items), format);
    Ok(())
}

pub async fn add_product(args: &AddProductArgs, system: &MarketSystem, format: OutputFormat) -> AppResult<()> {
    let item = ItemCreate {
        title: args.title.clone(),
        description: args.description.clone(),
        category: args.category.clone(),
        photo_url: args.photo_url.clone(),
        ask_price: args.ask_price,
        min_sell_price: args.min_price,
        stock_quantity: args.stock,
    };
    let created = view::add_product(system, item).await?;
    output::print_success(&format!("Listed {:?} as item {}", created.title, created.id));
    output::print_item(&created, format);
    Ok(())
}
