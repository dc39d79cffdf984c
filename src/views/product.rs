//! One product and what a client can do with it.

use chrono::Utc;
use tracing::{debug, instrument};

use super::invalid;
use crate::app_system::MarketSystem;
use crate::domain::wire::round_cents;
use crate::domain::{Comment, Item, LikeState, LikeToggle, Maalem, Offer, OfferCreate};
use crate::error::{ApiError, AppResult};
use crate::join::{enrich_offers, EnrichedOffer, Resolved};
use crate::pricing::PriceSheet;
use crate::session::{CurrentUser, UserKind};

#[derive(Debug, Clone, PartialEq)]
pub struct ProductDetail {
    pub item: Item,
    pub prices: PriceSheet,
    pub artisan: Resolved<Maalem>,
    /// `liked` is only ever true for a logged-in client.
    pub likes: LikeState,
    pub comments: Vec<Comment>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OfferDraft {
    pub item_id: u64,
    /// Per-unit amount; the item's default offer when absent.
    pub amount: Option<f64>,
    pub quantity: u32,
}

pub async fn product_detail(system: &MarketSystem, item_id: u64) -> AppResult<ProductDetail> {
    let api = &system.api;
    let (item, like_count, comments) =
        tokio::try_join!(api.get_item(item_id), api.like_count(item_id), api.comments(item_id))?;

    let liked = async {
        match system.session.current() {
            Some(CurrentUser { kind: UserKind::Client, id }) => api.like_status(id, item_id).await,
            _ => Ok(false),
        }
    };
    let artisan = async {
        match api.get_maalem(item.maalem).await {
            Ok(maalem) => Ok(Resolved::Found(maalem)),
            Err(e) if e.is_not_found() => Ok(Resolved::Missing),
            Err(e) => Err(e),
        }
    };
    let (liked, artisan) = tokio::try_join!(liked, artisan)?;

    Ok(ProductDetail {
        prices: PriceSheet::for_item(&item),
        likes: LikeState { item: item.id, liked, like_count },
        item,
        artisan,
        comments,
    })
}

/// Likes the item if the client has not, unlikes it otherwise. The count
/// changes locally first and is replaced by the backend's count.
#[instrument(skip(system))]
pub async fn toggle_like(system: &mut MarketSystem, item_id: u64) -> AppResult<LikeState> {
    let client_id = system.session.require(UserKind::Client)?;
    let (liked, like_count) = tokio::try_join!(
        system.api.like_status(client_id, item_id),
        system.api.like_count(item_id)
    )?;

    let reconciler = system.spawn_reconciler::<LikeState>("like");
    reconciler
        .store()
        .refresh(vec![LikeState { item: item_id, liked, like_count }])
        .await?;

    let api = system.api.clone();
    let state = reconciler
        .update(Some(item_id), LikeToggle, move |item, _| async move {
            let like_count = if liked {
                api.unlike_item(client_id, item).await?
            } else {
                api.like_item(client_id, item).await?
            };
            Ok::<_, ApiError>(LikeState { item, liked: !liked, like_count })
        })
        .await?;
    Ok(state)
}

/// Shows the comment right away, posts it, then takes the backend's list.
#[instrument(skip(system, text))]
pub async fn post_comment(system: &mut MarketSystem, item_id: u64, text: &str) -> AppResult<Vec<Comment>> {
    let client_id = system.session.require(UserKind::Client)?;
    let text = text.trim().to_string();
    if text.is_empty() {
        return Err(invalid("comment text is required"));
    }

    let reconciler = system.spawn_reconciler::<Comment>("comment");
    reconciler.store().refresh(system.api.comments(item_id).await?).await?;

    let provisional = Comment {
        client_id,
        text: text.clone(),
        created_at: Some(Utc::now()),
        client_name: None,
    };
    let api = system.api.clone();
    let comments = reconciler
        .insert(item_id, provisional, async move {
            api.post_comment(client_id, item_id, &text).await?;
            api.comments(item_id).await
        })
        .await?;
    Ok(comments)
}

/// Checks the amount against the item's price range before anything is sent.
#[instrument(skip(system))]
pub async fn make_offer(system: &MarketSystem, draft: OfferDraft) -> AppResult<Offer> {
    let client_id = system.session.require(UserKind::Client)?;
    if draft.quantity == 0 {
        return Err(invalid("quantity must be at least 1"));
    }
    let item = system.api.get_item(draft.item_id).await?;
    if draft.quantity > item.stock_quantity {
        return Err(invalid(format!(
            "only {} of {:?} in stock",
            item.stock_quantity, item.title
        )));
    }

    let prices = PriceSheet::for_item(&item);
    let amount = match draft.amount {
        Some(amount) => amount,
        None if prices.contains(prices.default_offer()) => prices.default_offer(),
        // Flooring pushed the default under the minimum.
        None => (prices.min_offer * 100.0).ceil() / 100.0,
    };
    let quote = prices.quote(amount).map_err(invalid)?;
    debug!(amount = quote.client_total, net = quote.artisan_net, "Offer quoted");

    let quantity = f64::from(draft.quantity);
    let offer = OfferCreate {
        offer_quantity: draft.quantity,
        maalem_net_offer: round_cents(quote.artisan_net * quantity),
        client_offer_total: round_cents(quote.client_total * quantity),
        platform_margin: round_cents(quote.platform_margin * quantity),
        client: client_id,
        item: item.id,
    };
    Ok(system.api.make_offer(&offer).await?)
}

/// The client's offers with their items and artisans.
pub async fn my_offers(system: &MarketSystem) -> AppResult<Vec<EnrichedOffer>> {
    let client_id = system.session.require(UserKind::Client)?;
    let api = &system.api;
    let (offers, items, maalems) =
        tokio::try_join!(api.offers_of_client(client_id), api.list_items(), api.list_maalems())?;
    Ok(enrich_offers(&offers, &items, &[], &maalems))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AppError, MutationError};
    use crate::mock_framework::MockBackend;
    use crate::views::testing::system_for;
    use serde_json::json;

    fn item_json() -> serde_json::Value {
        json!({
            "item_id": 1,
            "maalem": 3,
            "title": "Zellige table",
            "category": "ceramics",
            "maalemAskPrice": "100.00",
            "minSellPrice": "50.00",
            "platformFeePercentage": "10.00",
            "stockQuantity": 2
        })
    }

    #[tokio::test]
    async fn detail_without_artisan_still_renders() {
        let backend = MockBackend::start().await;
        backend.route("GET", "inventory/item/1/", 200, item_json());
        backend.route("GET", "inventory/item/likes/1/", 200, json!({ "like_count": 4 }));
        backend.route("GET", "inventory/item/comments/1/", 404, json!({ "error": "No comments" }));
        let (system, _, _dir) = system_for(&backend, None).await;

        let detail = product_detail(&system, 1).await.unwrap();
        assert!(matches!(detail.artisan, Resolved::Missing));
        assert_eq!(detail.likes, LikeState { item: 1, liked: false, like_count: 4 });
        assert_eq!(round_cents(detail.prices.display_price), 110.0);
        assert!(detail.comments.is_empty());
        assert!(backend.requests_to("GET", "inventory/item/like-status/5/1/").is_empty());
    }

    #[tokio::test]
    async fn like_takes_backend_count() {
        let backend = MockBackend::start().await;
        backend.route("GET", "inventory/item/like-status/5/1/", 200, json!({ "has_liked": false }));
        backend.route("GET", "inventory/item/likes/1/", 200, json!({ "like_count": 4 }));
        backend.route("POST", "inventory/item/like/5/", 201, json!({ "like_count": 9 }));
        let (mut system, _, _dir) = system_for(&backend, Some((UserKind::Client, 5))).await;

        let state = toggle_like(&mut system, 1).await.unwrap();
        assert_eq!(state, LikeState { item: 1, liked: true, like_count: 9 });
        system.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn failed_unlike_is_reported_and_reverted() {
        let backend = MockBackend::start().await;
        backend.route("GET", "inventory/item/like-status/5/1/", 200, json!({ "has_liked": true }));
        backend.route("GET", "inventory/item/likes/1/", 200, json!({ "like_count": 4 }));
        backend.route("POST", "inventory/item/dislike/5/", 400, json!({ "error": "You have not liked this item" }));
        let (mut system, notifier, _dir) = system_for(&backend, Some((UserKind::Client, 5))).await;

        let err = toggle_like(&mut system, 1).await.unwrap_err();
        assert!(matches!(err, AppError::Mutation(MutationError::Remote(_))));
        assert_eq!(
            notifier.errors(),
            vec!["Update failed: You have not liked this item Changes reverted.".to_string()]
        );
    }

    #[tokio::test]
    async fn blank_comment_is_refused_locally() {
        let backend = MockBackend::start().await;
        let (mut system, _, _dir) = system_for(&backend, Some((UserKind::Client, 5))).await;

        let err = post_comment(&mut system, 1, "   ").await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(backend.requests().is_empty());
    }

    #[tokio::test]
    async fn comment_returns_refetched_list() {
        let backend = MockBackend::start().await;
        backend.route(
            "GET",
            "inventory/item/comments/1/",
            200,
            json!({ "comments": [{ "client_id": 5, "text": "Lovely work", "created_at": "2024-05-01T10:00:00Z" }] }),
        );
        backend.route("POST", "inventory/item/comment/5/", 201, json!({ "message": "Comment added" }));
        let (mut system, _, _dir) = system_for(&backend, Some((UserKind::Client, 5))).await;

        let comments = post_comment(&mut system, 1, " Lovely work ").await.unwrap();
        assert_eq!(comments.len(), 1);
        assert_eq!(
            backend.requests_to("POST", "inventory/item/comment/5/")[0].body,
            Some(json!({ "item_id": 1, "text": "Lovely work" }))
        );
    }

    #[tokio::test]
    async fn default_offer_is_floored_minimum() {
        let backend = MockBackend::start().await;
        backend.route("GET", "inventory/item/1/", 200, item_json());
        backend.route(
            "POST",
            "sales/offers/make-offer/",
            201,
            json!({
                "offer_id": 11, "offer_quantity": 1, "maalem_net_offer": "50.00",
                "client_offer_total": "55.00", "platform_margin": "5.00",
                "status": "pending", "client": 5, "item": 1
            }),
        );
        let (system, _, _dir) = system_for(&backend, Some((UserKind::Client, 5))).await;

        let offer = make_offer(&system, OfferDraft { item_id: 1, amount: None, quantity: 1 })
            .await
            .unwrap();
        assert_eq!(offer.id, 11);
        assert_eq!(
            backend.requests_to("POST", "sales/offers/make-offer/")[0].body,
            Some(json!({
                "offer_quantity": 1,
                "maalem_net_offer": "50.00",
                "client_offer_total": "55.00",
                "platform_margin": "5.00",
                "client": 5,
                "item": 1
            }))
        );
    }

    #[tokio::test]
    async fn offer_above_display_price_is_rejected_before_sending() {
        let backend = MockBackend::start().await;
        backend.route("GET", "inventory/item/1/", 200, item_json());
        let (system, _, _dir) = system_for(&backend, Some((UserKind::Client, 5))).await;

        let err = make_offer(&system, OfferDraft { item_id: 1, amount: Some(120.0), quantity: 1 })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(ref m) if m.contains("outside the allowed range")));
        assert!(backend.requests_to("POST", "sales/offers/make-offer/").is_empty());
    }

    #[tokio::test]
    async fn my_offers_join_items_and_artisans() {
        let backend = MockBackend::start().await;
        backend.route(
            "GET",
            "sales/offers/client/5/",
            200,
            json!([{
                "offer_id": 11, "offer_quantity": 1, "maalem_net_offer": "50.00",
                "client_offer_total": "55.00", "platform_margin": "5.00",
                "status": "accepted", "date": "2024-05-01T10:00:00Z", "client": 5, "item": 1
            }]),
        );
        backend.route("GET", "inventory/item/", 200, json!([item_json()]));
        backend.route(
            "GET",
            "users/maalem/",
            200,
            json!([{ "id_maalem": 3, "firstname": "Omar", "lastname": "Fassi", "rating": 4.5 }]),
        );
        let (system, _, _dir) = system_for(&backend, Some((UserKind::Client, 5))).await;

        let offers = my_offers(&system).await.unwrap();
        assert_eq!(offers.len(), 1);
        assert_eq!(offers[0].item_title(), "Zellige table");
        assert_eq!(offers[0].maalem_name(), "Omar Fassi");
    }
}
