use super::Entity;
use crate::domain::{
    Client, Comment, Item, LikeState, LikeToggle, Maalem, Notification, NotificationPatch, Offer,
    OfferPatch, Order, OrderPatch,
};

impl Entity for Order {
    type Id = u64;
    type Patch = OrderPatch;

    fn id(&self) -> Option<u64> {
        self.id
    }

    fn apply(&mut self, patch: &OrderPatch) {
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(at) = patch.pickup_time {
            self.pickup_time = Some(at);
        }
        if let Some(at) = patch.delivery_time {
            self.delivery_time = Some(at);
        }
    }
}

impl Entity for Offer {
    type Id = u64;
    type Patch = OfferPatch;

    fn id(&self) -> Option<u64> {
        Some(self.id)
    }

    fn apply(&mut self, patch: &OfferPatch) {
        if let Some(status) = patch.status {
            self.status = status;
        }
    }
}

impl Entity for Notification {
    type Id = u64;
    type Patch = NotificationPatch;

    fn id(&self) -> Option<u64> {
        Some(self.id)
    }

    fn apply(&mut self, patch: &NotificationPatch) {
        if let Some(read) = patch.is_read {
            self.is_read = read;
        }
    }
}

/// Keyed by item id.
impl Entity for LikeState {
    type Id = u64;
    type Patch = LikeToggle;

    fn id(&self) -> Option<u64> {
        Some(self.item)
    }

    fn apply(&mut self, _patch: &LikeToggle) {
        if self.liked {
            self.like_count = self.like_count.saturating_sub(1);
        } else {
            self.like_count += 1;
        }
        self.liked = !self.liked;
    }
}

/// Comments have no identity of their own; mutations on a comment list are
/// keyed by the item id.
impl Entity for Comment {
    type Id = u64;
    type Patch = ();

    fn id(&self) -> Option<u64> {
        None
    }

    fn apply(&mut self, _patch: &()) {}
}

impl Entity for Item {
    type Id = u64;
    type Patch = ();

    fn id(&self) -> Option<u64> {
        Some(self.id)
    }

    fn apply(&mut self, _patch: &()) {}
}

impl Entity for Client {
    type Id = u64;
    type Patch = ();

    fn id(&self) -> Option<u64> {
        Some(self.id)
    }

    fn apply(&mut self, _patch: &()) {}
}

impl Entity for Maalem {
    type Id = u64;
    type Patch = ();

    fn id(&self) -> Option<u64> {
        Some(self.id)
    }

    fn apply(&mut self, _patch: &()) {}
}
