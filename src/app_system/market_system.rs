use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::api::ApiClient;
use crate::config::AppConfig;
use crate::error::AppResult;
use crate::feedback::Notifier;
use crate::reconciler::Reconciler;
use crate::session::Session;
use crate::store::{CollectionStore, Entity, StoreHandle};

const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Everything a command needs: the backend client, the session, where
/// feedback goes, and the store tasks it has started.
///
/// Stores stop once every handle to them is dropped; [`MarketSystem::shutdown`]
/// waits for that.
pub struct MarketSystem {
    pub config: AppConfig,
    pub api: ApiClient,
    pub session: Session,
    pub notifier: Arc<dyn Notifier>,
    handles: Vec<(&'static str, JoinHandle<()>)>,
}

impl MarketSystem {
    pub async fn start(config: AppConfig, notifier: Arc<dyn Notifier>) -> AppResult<Self> {
        info!(api_url = %config.api_url, "Starting market system");
        let api = ApiClient::from_config(&config)?;
        let session = Session::restore(config.session_file.clone()).await;
        debug!(base_url = %api.base_url(), session = %session.path().display(), "Client ready");
        Ok(Self::with_parts(config, api, session, notifier))
    }

    pub fn with_parts(config: AppConfig, api: ApiClient, session: Session, notifier: Arc<dyn Notifier>) -> Self {
        Self { config, api, session, notifier, handles: Vec::new() }
    }

    /// Starts a collection store for one view.
    pub fn spawn_store<T: Entity>(&mut self, name: &'static str) -> StoreHandle<T> {
        let (handle, task) = CollectionStore::<T>::spawn(name, self.config.store_buffer);
        self.handles.push((name, task));
        handle
    }

    /// A store plus a reconciler that reports through this system's notifier.
    pub fn spawn_reconciler<T: Entity>(&mut self, kind: &'static str) -> Reconciler<T> {
        let store = self.spawn_store::<T>(kind);
        Reconciler::new(kind, store, Arc::clone(&self.notifier))
    }

    pub async fn shutdown(self) -> AppResult<()> {
        info!(stores = self.handles.len(), "Shutting down market system");
        for (name, handle) in self.handles {
            let abort = handle.abort_handle();
            match tokio::time::timeout(SHUTDOWN_GRACE, handle).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) if e.is_cancelled() => {}
                Ok(Err(e)) => error!(store = name, error = %e, "Store task failed"),
                Err(_) => {
                    warn!(store = name, "Store still referenced at shutdown; aborting");
                    abort.abort();
                }
            }
        }
        info!("Market system stopped");
        Ok(())
    }
}
