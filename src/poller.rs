//! Fixed-interval refresh of view data.
//!
//! Views never talk to the timer directly: they hold a [`Subscription`] from
//! something that implements [`Subscribe`]. [`PollingFeed`] is the only
//! implementation; a push transport would be another.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn, Instrument};

type RefreshFn = Box<dyn FnMut() -> BoxFuture<'static, Result<(), String>> + Send>;

/// Source of refreshes for a view.
pub trait Subscribe {
    /// Starts delivering refreshes. The first one happens right away.
    fn subscribe(self) -> Subscription;
}

/// Re-runs a refresh closure every `period`, starting immediately.
///
/// A failed refresh is logged and the loop carries on at the same period.
pub struct PollingFeed {
    name: &'static str,
    period: Duration,
    refresh: RefreshFn,
}

impl PollingFeed {
    pub fn new<F, Fut, E>(name: &'static str, period: Duration, mut refresh: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), E>> + Send + 'static,
        E: Display + Send + 'static,
    {
        Self {
            name,
            period,
            refresh: Box::new(move || {
                let pending = refresh();
                async move { pending.await.map_err(|e| e.to_string()) }.boxed()
            }),
        }
    }
}

impl Subscribe for PollingFeed {
    fn subscribe(self) -> Subscription {
        let PollingFeed { name, period, mut refresh } = self;
        let mut fetches = 0u64;

        let span = tracing::info_span!("polling_feed", feed = name, period_ms = period.as_millis() as u64);
        let task = tokio::spawn(
            async move {
                let mut timer = tokio::time::interval(period);
                timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
                loop {
                    timer.tick().await;
                    fetches += 1;
                    debug!(fetch = fetches, "Refreshing");
                    if let Err(e) = refresh().await {
                        warn!(error = %e, "Refresh failed; retrying next period");
                    }
                }
            }
            .instrument(span),
        );

        info!(feed = name, "Subscribed");
        Subscription { name, task: Some(task) }
    }
}

/// Live refresh loop. Dropping it stops the loop.
pub struct Subscription {
    name: &'static str,
    task: Option<JoinHandle<()>>,
}

impl Subscription {
    /// Stops the loop and waits until its task is gone.
    pub async fn cancel(mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            let _ = task.await;
            info!(feed = self.name, "Unsubscribed");
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;

    use super::*;
    use crate::domain::{Notification, NotificationPatch};
    use crate::error::AppError;
    use crate::store::{CollectionStore, Optimistic};

    fn counting_feed(period: Duration, fail: bool) -> (PollingFeed, Arc<AtomicU64>) {
        let count = Arc::new(AtomicU64::new(0));
        let seen = Arc::clone(&count);
        let feed = PollingFeed::new("test", period, move || {
            let seen = Arc::clone(&seen);
            async move {
                seen.fetch_add(1, Ordering::SeqCst);
                if fail {
                    Err("backend down".to_string())
                } else {
                    Ok(())
                }
            }
        });
        (feed, count)
    }

    #[tokio::test(start_paused = true)]
    async fn fetches_at_least_once_per_period() {
        let period = Duration::from_secs(30);
        let (feed, count) = counting_feed(period, false);
        let subscription = feed.subscribe();

        tokio::time::sleep(Duration::from_secs(95)).await;
        assert!(count.load(Ordering::SeqCst) >= 95 / 30);

        subscription.cancel().await;
        let at_cancel = count.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_secs(600)).await;
        assert_eq!(count.load(Ordering::SeqCst), at_cancel);
    }

    #[tokio::test(start_paused = true)]
    async fn initial_fetch_happens_on_subscribe() {
        let (feed, count) = counting_feed(Duration::from_secs(3), false);
        let _subscription = feed.subscribe();
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn errors_do_not_stop_the_loop() {
        let (feed, count) = counting_feed(Duration::from_secs(3), true);
        let _subscription = feed.subscribe();
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(count.load(Ordering::SeqCst) >= 3);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_subscription_stops_fetching() {
        let (feed, count) = counting_feed(Duration::from_secs(3), false);
        let subscription = feed.subscribe();
        tokio::time::sleep(Duration::from_secs(4)).await;
        drop(subscription);
        tokio::task::yield_now().await;

        let at_drop = count.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(count.load(Ordering::SeqCst), at_drop);
    }

    #[tokio::test(start_paused = true)]
    async fn store_feed_leaves_in_flight_entities_alone() {
        let (store, _task) = CollectionStore::<Notification>::spawn("notifications", 8);
        let unread = |id| Notification {
            id,
            message: format!("n{id}"),
            is_read: false,
            created_at: None,
            recipient_id: Some(1),
        };
        store.refresh(vec![unread(1), unread(2)]).await.unwrap();
        store.begin(1, Optimistic::Update(NotificationPatch::read())).await.unwrap();

        let served = vec![unread(1), unread(2), unread(3)];
        let feed_store = store.clone();
        let subscription = PollingFeed::new("notifications", Duration::from_secs(3), move || {
            let served = served.clone();
            let store = feed_store.clone();
            async move {
                store.refresh(served).await?;
                Ok::<_, AppError>(())
            }
        })
        .subscribe();
        tokio::time::sleep(Duration::from_millis(10)).await;

        let items = store.snapshot().await.unwrap();
        assert_eq!(items.len(), 3);
        assert!(items[0].is_read, "optimistic read flag must survive the refresh");
        assert!(!items[1].is_read);
        subscription.cancel().await;
    }
}
