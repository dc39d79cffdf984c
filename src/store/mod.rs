//! Per-view collection store.
//!
//! A view's in-memory copy of a backend collection is owned by a single
//! [`CollectionStore`] task. Everything that touches the collection (the
//! optimistic reconciler, the polling loop, the view reading it for display)
//! does so by sending a [`StoreRequest`] over the store's channel, so changes
//! are applied one at a time in arrival order.

mod entities;

use std::collections::{HashMap, HashSet};
use std::fmt::{Debug, Display};
use std::hash::Hash;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, instrument, warn};

use crate::error::StoreError;

// =============================================================================
// 1. THE ABSTRACTION
// =============================================================================

/// A record a view keeps in a [`CollectionStore`].
pub trait Entity: Clone + PartialEq + Debug + Send + Sync + 'static {
    type Id: Eq + Hash + Clone + Send + Sync + Display + Debug;
    type Patch: Clone + Send + Sync + Debug;

    /// Canonical identifier, if the record carries one.
    fn id(&self) -> Option<Self::Id>;

    /// Applies a local (optimistic) change.
    fn apply(&mut self, patch: &Self::Patch);
}

/// Local change made before the backend confirms it.
#[derive(Debug, Clone)]
pub enum Optimistic<T: Entity> {
    /// Patch the entity whose id equals the mutation key.
    Update(T::Patch),
    /// Append a provisional entity.
    Insert(T),
}

/// How an in-flight mutation ends.
#[derive(Debug, Clone)]
pub enum Settlement<T: Entity> {
    /// The backend's copy of the mutated entity.
    Confirmed(T),
    /// The backend's copy of the whole collection.
    Replaced(Vec<T>),
    /// The snapshot taken when the mutation began.
    RolledBack(Vec<T>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettleOutcome {
    Reconciled,
    /// Neither the mutation key nor the echoed id matched a local entity.
    Unreconciled,
    Replaced,
    RolledBack,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RefreshOutcome {
    pub applied: usize,
    /// Entities whose fetched copy was ignored because a mutation is in flight.
    pub held: usize,
}

// =============================================================================
// 2. THE MESSAGES
// =============================================================================

pub type Response<T> = oneshot::Sender<T>;

#[derive(Debug)]
pub enum StoreRequest<T: Entity> {
    Snapshot {
        respond_to: Response<Vec<T>>,
    },
    Get {
        id: T::Id,
        respond_to: Response<Option<T>>,
    },
    Refresh {
        items: Vec<T>,
        respond_to: Response<RefreshOutcome>,
    },
    Begin {
        key: T::Id,
        change: Optimistic<T>,
        respond_to: Response<Result<Vec<T>, StoreError>>,
    },
    Settle {
        key: T::Id,
        settlement: Settlement<T>,
        respond_to: Response<SettleOutcome>,
    },
    InFlight {
        respond_to: Response<Vec<T::Id>>,
    },
    Shutdown,
}

// =============================================================================
// 3. THE STORE TASK
// =============================================================================

pub struct CollectionStore<T: Entity> {
    name: &'static str,
    receiver: mpsc::Receiver<StoreRequest<T>>,
    items: Vec<T>,
    in_flight: HashSet<T::Id>,
    /// Per in-flight mutation, the entities other mutations settled after it
    /// began. A rollback keeps their current copies.
    settled_since: HashMap<T::Id, HashSet<T::Id>>,
}

impl<T: Entity> CollectionStore<T> {
    pub fn new(name: &'static str, buffer_size: usize) -> (Self, StoreHandle<T>) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let store = Self {
            name,
            receiver,
            items: Vec::new(),
            in_flight: HashSet::new(),
            settled_since: HashMap::new(),
        };
        (store, StoreHandle { sender })
    }

    /// Starts the store on the runtime and returns its handle.
    pub fn spawn(name: &'static str, buffer_size: usize) -> (StoreHandle<T>, tokio::task::JoinHandle<()>) {
        let (store, handle) = Self::new(name, buffer_size);
        (handle, tokio::spawn(store.run()))
    }

    #[instrument(name = "collection_store", skip(self), fields(store = self.name))]
    pub async fn run(mut self) {
        debug!("Store starting");
        while let Some(msg) = self.receiver.recv().await {
            match msg {
                StoreRequest::Snapshot { respond_to } => {
                    let _ = respond_to.send(self.items.clone());
                }
                StoreRequest::Get { id, respond_to } => {
                    let _ = respond_to.send(self.find(&id).map(|i| self.items[i].clone()));
                }
                StoreRequest::Refresh { items, respond_to } => {
                    let outcome = self.handle_refresh(items);
                    let _ = respond_to.send(outcome);
                }
                StoreRequest::Begin { key, change, respond_to } => {
                    let result = self.handle_begin(key, change);
                    let _ = respond_to.send(result);
                }
                StoreRequest::Settle { key, settlement, respond_to } => {
                    let outcome = self.handle_settle(key, settlement);
                    let _ = respond_to.send(outcome);
                }
                StoreRequest::InFlight { respond_to } => {
                    let _ = respond_to.send(self.in_flight.iter().cloned().collect());
                }
                StoreRequest::Shutdown => {
                    info!("Store shutting down");
                    break;
                }
            }
        }
        debug!("Store stopped");
    }

    fn find(&self, id: &T::Id) -> Option<usize> {
        self.items.iter().position(|item| item.id().as_ref() == Some(id))
    }

    /// Takes the fetched collection, except for entities with a mutation in
    /// flight: those keep their local (optimistic) copy.
    fn handle_refresh(&mut self, fetched: Vec<T>) -> RefreshOutcome {
        if self.in_flight.is_empty() {
            let applied = fetched.len();
            self.items = fetched;
            return RefreshOutcome { applied, held: 0 };
        }

        let mut outcome = RefreshOutcome::default();
        let mut seen = HashSet::new();
        let mut next = Vec::with_capacity(fetched.len());
        for item in fetched {
            match item.id() {
                Some(id) if self.in_flight.contains(&id) => {
                    if let Some(i) = self.find(&id) {
                        next.push(self.items[i].clone());
                        outcome.held += 1;
                    } else {
                        next.push(item);
                        outcome.applied += 1;
                    }
                    seen.insert(id);
                }
                _ => {
                    next.push(item);
                    outcome.applied += 1;
                }
            }
        }
        // In-flight entities the fetch no longer lists stay until settled.
        for item in &self.items {
            if let Some(id) = item.id() {
                if self.in_flight.contains(&id) && !seen.contains(&id) {
                    next.push(item.clone());
                    outcome.held += 1;
                }
            }
        }
        self.items = next;
        outcome
    }

    fn handle_begin(&mut self, key: T::Id, change: Optimistic<T>) -> Result<Vec<T>, StoreError> {
        if self.in_flight.contains(&key) {
            debug!(key = %key, "Mutation already in flight");
            return Err(StoreError::Busy(key.to_string()));
        }
        let snapshot = self.items.clone();
        match change {
            Optimistic::Update(patch) => match self.find(&key) {
                Some(i) => self.items[i].apply(&patch),
                None => warn!(key = %key, "Optimistic update for an entity not in view"),
            },
            Optimistic::Insert(item) => self.items.push(item),
        }
        self.settled_since.insert(key.clone(), HashSet::new());
        self.in_flight.insert(key);
        Ok(snapshot)
    }

    fn handle_settle(&mut self, key: T::Id, settlement: Settlement<T>) -> SettleOutcome {
        self.in_flight.remove(&key);
        let settled_since = self.settled_since.remove(&key).unwrap_or_default();
        let mut touched = vec![key.clone()];
        let outcome = match settlement {
            Settlement::Confirmed(server) => {
                let slot = self
                    .find(&key)
                    .or_else(|| server.id().and_then(|echoed| self.find(&echoed)));
                match slot {
                    Some(i) => {
                        touched.extend(server.id());
                        self.items[i] = server;
                        SettleOutcome::Reconciled
                    }
                    None => {
                        warn!(key = %key, echoed = ?server.id(), "Confirmed entity matched nothing in view; waiting for next refresh");
                        SettleOutcome::Unreconciled
                    }
                }
            }
            Settlement::Replaced(items) => {
                touched.extend(items.iter().filter_map(|item| item.id()));
                self.items = items;
                SettleOutcome::Replaced
            }
            Settlement::RolledBack(snapshot) => {
                self.restore(&key, snapshot, settled_since);
                SettleOutcome::RolledBack
            }
        };
        for others in self.settled_since.values_mut() {
            others.extend(touched.iter().cloned());
        }
        outcome
    }

    /// Puts the snapshot back, except for entities owned by other mutations:
    /// those still in flight and those settled after `key` began keep their
    /// current copy.
    fn restore(&mut self, key: &T::Id, snapshot: Vec<T>, settled_since: HashSet<T::Id>) {
        let current = std::mem::replace(&mut self.items, snapshot);
        let keep = self
            .in_flight
            .iter()
            .filter(|id| *id != key)
            .cloned()
            .chain(settled_since)
            .collect::<HashSet<_>>();
        for id in keep {
            let latest = current.iter().find(|item| item.id().as_ref() == Some(&id)).cloned();
            match (self.find(&id), latest) {
                (Some(i), Some(item)) => self.items[i] = item,
                (Some(i), None) => {
                    self.items.remove(i);
                }
                (None, Some(item)) => self.items.push(item),
                (None, None) => {}
            }
        }
    }
}

// =============================================================================
// 4. THE HANDLE
// =============================================================================

#[derive(Clone)]
pub struct StoreHandle<T: Entity> {
    sender: mpsc::Sender<StoreRequest<T>>,
}

impl<T: Entity> StoreHandle<T> {
    async fn request<R>(&self, make: impl FnOnce(Response<R>) -> StoreRequest<T>) -> Result<R, StoreError> {
        let (respond_to, response) = oneshot::channel();
        self.sender.send(make(respond_to)).await.map_err(|_| StoreError::Closed)?;
        response.await.map_err(|_| StoreError::Dropped)
    }

    pub async fn snapshot(&self) -> Result<Vec<T>, StoreError> {
        self.request(|respond_to| StoreRequest::Snapshot { respond_to }).await
    }

    pub async fn get(&self, id: T::Id) -> Result<Option<T>, StoreError> {
        self.request(|respond_to| StoreRequest::Get { id, respond_to }).await
    }

    pub async fn refresh(&self, items: Vec<T>) -> Result<RefreshOutcome, StoreError> {
        self.request(|respond_to| StoreRequest::Refresh { items, respond_to }).await
    }

    /// Marks `key` in flight, applies `change` and returns the collection as
    /// it was just before.
    pub async fn begin(&self, key: T::Id, change: Optimistic<T>) -> Result<Vec<T>, StoreError> {
        self.request(|respond_to| StoreRequest::Begin { key, change, respond_to })
            .await?
    }

    pub async fn settle(&self, key: T::Id, settlement: Settlement<T>) -> Result<SettleOutcome, StoreError> {
        self.request(|respond_to| StoreRequest::Settle { key, settlement, respond_to })
            .await
    }

    pub async fn in_flight(&self) -> Result<Vec<T::Id>, StoreError> {
        self.request(|respond_to| StoreRequest::InFlight { respond_to }).await
    }

    pub async fn shutdown(&self) -> Result<(), StoreError> {
        self.sender.send(StoreRequest::Shutdown).await.map_err(|_| StoreError::Closed)
    }
}
