use std::sync::Arc;

use futures_util::future::join_all;
use tokio::sync::watch;
use tracing::{debug, instrument};

use crate::app_system::MarketSystem;
use crate::domain::{Notification, NotificationPatch, RecipientKind};
use crate::error::{ApiError, AppResult, SessionError};
use crate::poller::{PollingFeed, Subscribe, Subscription};
use crate::session::{Session, UserKind};

#[derive(Debug, Clone)]
pub struct Inbox {
    /// As fetched, so the caller can still tell which ones were new.
    pub notifications: Vec<Notification>,
    pub marked_read: usize,
    pub failed: usize,
}

/// Clients and maalems have inboxes; admins do not.
pub fn recipient(session: &Session) -> Result<(RecipientKind, u64), SessionError> {
    match session.current() {
        None => Err(SessionError::NotLoggedIn),
        Some(user) => match user.kind {
            UserKind::Client => Ok((RecipientKind::Client, user.id)),
            UserKind::Maalem => Ok((RecipientKind::Maalem, user.id)),
            UserKind::Admin => Err(SessionError::WrongRole {
                expected: "client or maalem".to_string(),
                actual: user.kind.to_string(),
            }),
        },
    }
}

/// Lists the inbox, then marks every unread notification read. The flags
/// flip locally first and are sent concurrently; a failed one is reverted
/// and reported without stopping the others.
#[instrument(skip(system))]
pub async fn open_inbox(system: &mut MarketSystem) -> AppResult<Inbox> {
    let (kind, id) = recipient(&system.session)?;
    let notifications = system.api.notifications_for(kind, id).await?;

    let reconciler = system.spawn_reconciler::<Notification>("notification");
    reconciler.store().refresh(notifications.clone()).await?;

    let updates = notifications.iter().filter(|n| !n.is_read).map(|n| {
        let api = system.api.clone();
        reconciler.update(Some(n.id), NotificationPatch::read(), move |id, patch| async move {
            api.update_notification(id, &patch).await
        })
    });
    let results = join_all(updates).await;

    let failed = results.iter().filter(|r| r.is_err()).count();
    debug!(marked = results.len() - failed, failed, "Inbox opened");
    Ok(Inbox {
        notifications,
        marked_read: results.len() - failed,
        failed,
    })
}

pub async fn unread_count(system: &MarketSystem) -> AppResult<u64> {
    let (kind, id) = recipient(&system.session)?;
    Ok(system.api.unread_count(kind, id).await?)
}

/// Polls the unread count at the configured badge period. The latest count
/// is published on the returned channel.
pub fn watch_unread(system: &MarketSystem) -> AppResult<(Subscription, watch::Receiver<Option<u64>>)> {
    let (kind, id) = recipient(&system.session)?;
    let (tx, rx) = watch::channel(None);
    let tx = Arc::new(tx);
    let api = system.api.clone();
    let feed = PollingFeed::new("unread_badge", system.config.unread_poll, move || {
        let api = api.clone();
        let tx = Arc::clone(&tx);
        async move {
            let count = api.unread_count(kind, id).await?;
            tx.send_replace(Some(count));
            Ok::<_, ApiError>(())
        }
    });
    Ok((feed.subscribe(), rx))
}
