//! Optimistic mutations against a [`CollectionStore`](crate::store::CollectionStore).
//!
//! A mutation runs strictly as: validate id → snapshot + local change →
//! remote call → reconcile with the server's copy, or restore the snapshot.
//! Failures are never retried; they are rolled back and shown to the user.

use std::future::Future;
use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::error::{ApiError, MutationError};
use crate::feedback::{Notifier, Toast};
use crate::store::{Entity, Optimistic, SettleOutcome, Settlement, StoreHandle};

pub struct Reconciler<T: Entity> {
    kind: &'static str,
    store: StoreHandle<T>,
    notifier: Arc<dyn Notifier>,
}

impl<T: Entity> Clone for Reconciler<T> {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            store: self.store.clone(),
            notifier: Arc::clone(&self.notifier),
        }
    }
}

impl<T: Entity> Reconciler<T> {
    pub fn new(kind: &'static str, store: StoreHandle<T>, notifier: Arc<dyn Notifier>) -> Self {
        Self { kind, store, notifier }
    }

    pub fn store(&self) -> &StoreHandle<T> {
        &self.store
    }

    /// Applies `patch` to the entity `id` locally, then sends it with
    /// `remote`. Returns the server's copy, which replaces the local one.
    #[instrument(skip(self, patch, remote), fields(kind = self.kind))]
    pub async fn update<F, Fut>(&self, id: Option<T::Id>, patch: T::Patch, remote: F) -> Result<T, MutationError>
    where
        F: FnOnce(T::Id, T::Patch) -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        let Some(id) = id else {
            warn!("Refusing mutation without an identifier");
            self.notifier.notify(Toast::error(format!(
                "Cannot update: this {} is missing an ID.",
                self.kind
            )));
            return Err(MutationError::MissingId(self.kind.to_string()));
        };

        let snapshot = self.begin(id.clone(), Optimistic::Update(patch.clone())).await?;

        debug!(id = %id, "Sending request");
        match remote(id.clone(), patch).await {
            Ok(server) => {
                let outcome = self.settle(id.clone(), Settlement::Confirmed(server.clone())).await?;
                if outcome == SettleOutcome::Unreconciled {
                    warn!(id = %id, "Server copy not matched locally; next refresh will correct it");
                }
                info!(id = %id, "Mutation confirmed");
                Ok(server)
            }
            Err(e) => {
                self.roll_back(id, snapshot, &e).await;
                Err(MutationError::Remote(e))
            }
        }
    }

    /// Appends `provisional` locally, then runs `remote`, which must yield the
    /// server's copy of the whole collection.
    #[instrument(skip(self, provisional, remote), fields(kind = self.kind))]
    pub async fn insert<Fut>(&self, key: T::Id, provisional: T, remote: Fut) -> Result<Vec<T>, MutationError>
    where
        Fut: Future<Output = Result<Vec<T>, ApiError>>,
    {
        let snapshot = self.begin(key.clone(), Optimistic::Insert(provisional)).await?;

        debug!(key = %key, "Sending request");
        match remote.await {
            Ok(items) => {
                self.settle(key.clone(), Settlement::Replaced(items.clone())).await?;
                info!(key = %key, count = items.len(), "Insert confirmed");
                Ok(items)
            }
            Err(e) => {
                self.roll_back(key, snapshot, &e).await;
                Err(MutationError::Remote(e))
            }
        }
    }

    async fn begin(&self, key: T::Id, change: Optimistic<T>) -> Result<Vec<T>, MutationError> {
        self.store.begin(key, change).await.map_err(|e| {
            let err = MutationError::from(e);
            match &err {
                MutationError::Busy(id) => self
                    .notifier
                    .notify(Toast::info(format!("Still updating {} {id}, please wait.", self.kind))),
                other => self.notifier.notify(Toast::error(other.to_string())),
            }
            err
        })
    }

    /// Hands the server's answer to the store. The change is already saved
    /// remotely, so a store failure here still gets reported to the user.
    async fn settle(&self, key: T::Id, settlement: Settlement<T>) -> Result<SettleOutcome, MutationError> {
        self.store.settle(key.clone(), settlement).await.map_err(|e| {
            warn!(key = %key, error = %e, "Saved remotely but the view could not take the server copy");
            self.notifier.notify(Toast::error(format!(
                "Your {} {key} was saved, but this view could not be refreshed.",
                self.kind
            )));
            MutationError::from(e)
        })
    }

    async fn roll_back(&self, key: T::Id, snapshot: Vec<T>, error: &ApiError) {
        warn!(key = %key, error = %error, "Mutation failed, rolling back");
        if let Err(e) = self.store.settle(key, Settlement::RolledBack(snapshot)).await {
            warn!(error = %e, "Rollback could not reach the store");
        }
        self.notifier.notify(Toast::error(format!(
            "Update failed: {} Changes reverted.",
            error.user_message()
        )));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Comment, LikeState, LikeToggle, Order, OrderPatch, OrderStatus};
    use crate::feedback::testing::RecordingNotifier;
    use crate::mock_framework::{create_scripted_remote, expect_call};
    use crate::error::StoreError;
    use crate::store::CollectionStore;

    fn order(id: Option<u64>, status: OrderStatus) -> Order {
        Order {
            id,
            order_quantity: 1,
            platform_margin: 5.0,
            maalem_net: 50.0,
            delivery_fee: 10.0,
            final_price: 55.0,
            final_paid: 65.0,
            order_date: None,
            pickup_address: "Fes".into(),
            delivery_address: "Rabat".into(),
            pickup_time: None,
            delivery_time: None,
            status,
            offer: id.unwrap_or(0),
        }
    }

    fn setup<T: Entity>(name: &'static str) -> (Reconciler<T>, Arc<RecordingNotifier>) {
        let notifier = Arc::new(RecordingNotifier::default());
        let (store, _task) = CollectionStore::<T>::spawn(name, 16);
        (Reconciler::new(name, store, notifier.clone()), notifier)
    }

    #[tokio::test]
    async fn failure_restores_exact_snapshot() {
        let (reconciler, notifier) = setup::<Order>("order");
        let initial = vec![order(Some(1), OrderStatus::PickedUp), order(Some(2), OrderStatus::Delivered)];
        reconciler.store().refresh(initial.clone()).await.unwrap();

        let (remote, mut calls) = create_scripted_remote::<(u64, OrderPatch), Order>(4);
        let worker = reconciler.clone();
        let task = tokio::spawn(async move {
            worker
                .update(Some(1), OrderPatch::status(OrderStatus::Returned), move |id, patch| async move {
                    remote.call((id, patch)).await
                })
                .await
        });

        let call = expect_call(&mut calls).await.expect("expected remote call");
        assert_eq!(call.request, (1, OrderPatch::status(OrderStatus::Returned)));
        // Optimistic state is visible before the server answers.
        let during = reconciler.store().get(1).await.unwrap().unwrap();
        assert_eq!(during.status, OrderStatus::Returned);

        call.fail(ApiError::Server { status: 400, message: "invalid status".into() });
        let result = task.await.unwrap();
        assert!(matches!(result, Err(MutationError::Remote(_))));
        assert_eq!(reconciler.store().snapshot().await.unwrap(), initial);
        assert_eq!(notifier.errors(), vec!["Update failed: invalid status Changes reverted.".to_string()]);
        assert!(reconciler.store().in_flight().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn success_keeps_server_copy_not_the_guess() {
        let (reconciler, notifier) = setup::<Order>("order");
        reconciler.store().refresh(vec![order(Some(1), OrderStatus::PickedUp)]).await.unwrap();

        let mut server = order(Some(1), OrderStatus::Delivered);
        server.final_paid = 70.0;
        let echoed = server.clone();

        let confirmed = reconciler
            .update(Some(1), OrderPatch::status(OrderStatus::Delivered), |_, _| async move { Ok::<_, ApiError>(echoed) })
            .await
            .unwrap();

        assert_eq!(confirmed, server);
        assert_eq!(reconciler.store().snapshot().await.unwrap(), vec![server]);
        assert!(notifier.errors().is_empty());
    }

    #[tokio::test]
    async fn saved_change_is_reported_when_the_view_is_gone() {
        let notifier = Arc::new(RecordingNotifier::default());
        let (store, task) = CollectionStore::<Order>::spawn("order", 16);
        let reconciler = Reconciler::new("order", store.clone(), notifier.clone());
        store.refresh(vec![order(Some(1), OrderStatus::PickedUp)]).await.unwrap();

        let (remote, mut calls) = create_scripted_remote::<(u64, OrderPatch), Order>(4);
        let worker = reconciler.clone();
        let pending = tokio::spawn(async move {
            worker
                .update(Some(1), OrderPatch::status(OrderStatus::Delivered), move |id, patch| async move {
                    remote.call((id, patch)).await
                })
                .await
        });
        let call = expect_call(&mut calls).await.expect("expected remote call");

        store.shutdown().await.unwrap();
        task.await.unwrap();
        call.succeed(order(Some(1), OrderStatus::Delivered));

        let result = pending.await.unwrap();
        assert_eq!(result, Err(MutationError::Store(StoreError::Closed)));
        assert_eq!(
            notifier.errors(),
            vec!["Your order 1 was saved, but this view could not be refreshed.".to_string()]
        );
    }

    #[tokio::test]
    async fn missing_id_never_reaches_the_remote() {
        let (reconciler, notifier) = setup::<Order>("order");
        let initial = vec![order(None, OrderStatus::PickedUp)];
        reconciler.store().refresh(initial.clone()).await.unwrap();

        let result = reconciler
            .update(None, OrderPatch::status(OrderStatus::Delivered), |_, _| async move {
                Err::<Order, _>(ApiError::Transport("must not be sent".into()))
            })
            .await;

        assert_eq!(result, Err(MutationError::MissingId("order".into())));
        assert_eq!(reconciler.store().snapshot().await.unwrap(), initial);
        assert_eq!(notifier.errors(), vec!["Cannot update: this order is missing an ID.".to_string()]);
    }

    #[tokio::test]
    async fn duplicate_mutation_is_reported_busy() {
        let (reconciler, notifier) = setup::<Order>("order");
        reconciler.store().refresh(vec![order(Some(3), OrderStatus::PickedUp)]).await.unwrap();

        let (remote, mut calls) = create_scripted_remote::<(u64, OrderPatch), Order>(4);
        let worker = reconciler.clone();
        let first = tokio::spawn(async move {
            worker
                .update(Some(3), OrderPatch::status(OrderStatus::Delivered), move |id, patch| async move {
                    remote.call((id, patch)).await
                })
                .await
        });
        let call = expect_call(&mut calls).await.unwrap();

        let second = reconciler
            .update(Some(3), OrderPatch::status(OrderStatus::Returned), |_, _| async move {
                Err::<Order, _>(ApiError::Transport("must not be sent".into()))
            })
            .await;
        assert_eq!(second, Err(MutationError::Busy("3".into())));
        assert_eq!(notifier.toasts().len(), 1);

        call.succeed(order(Some(3), OrderStatus::Delivered));
        assert!(first.await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn like_then_unlike_returns_to_original_count() {
        let (reconciler, _notifier) = setup::<LikeState>("like");
        let original = LikeState { item: 8, liked: false, like_count: 4 };
        reconciler.store().refresh(vec![original.clone()]).await.unwrap();

        for _ in 0..2 {
            let current = reconciler.store().get(8).await.unwrap().unwrap();
            reconciler
                .update(Some(8), LikeToggle, move |item, _| async move {
                    let like_count = if current.liked { current.like_count - 1 } else { current.like_count + 1 };
                    Ok::<_, ApiError>(LikeState { item, liked: !current.liked, like_count })
                })
                .await
                .unwrap();
        }

        assert_eq!(reconciler.store().get(8).await.unwrap(), Some(original));
    }

    #[tokio::test]
    async fn failed_insert_removes_provisional_entry() {
        let (reconciler, notifier) = setup::<Comment>("comment");
        let existing = vec![Comment { client_id: 1, text: "Beautiful".into(), created_at: None, client_name: None }];
        reconciler.store().refresh(existing.clone()).await.unwrap();

        let provisional = Comment { client_id: 2, text: "Shipping?".into(), created_at: None, client_name: Some("You".into()) };
        let result = reconciler
            .insert(10, provisional, async { Err::<Vec<Comment>, _>(ApiError::Transport("connection reset".into())) })
            .await;

        assert!(matches!(result, Err(MutationError::Remote(ApiError::Transport(_)))));
        assert_eq!(reconciler.store().snapshot().await.unwrap(), existing);
        assert_eq!(notifier.errors(), vec!["Update failed: Connection failed. Changes reverted.".to_string()]);
    }
}
