use std::marker::PhantomData;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use arcade_shared::{Query, Selection};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::fetch;
use crate::state::FeedCounters;
use crate::subscription::{self, SubscriptionHandle};
use crate::transport::IndexerTransport;

/// Entry point for one topic (`registry`, `social`): fetch, subscribe and unsubscribe over a
/// selection of model kinds. Holds at most one stored subscription at a time.
pub struct EntityFeed<S: Selection, T: IndexerTransport> {
    namespace: String,
    transport: RwLock<Option<Arc<T>>>,
    subscription: Mutex<Option<SubscriptionHandle>>,
    counters: Arc<FeedCounters>,
    _selection: PhantomData<fn() -> S>,
}

impl<S: Selection, T: IndexerTransport> EntityFeed<S, T> {
    pub fn new(namespace: impl Into<String>, counters: Arc<FeedCounters>) -> Self {
        Self {
            namespace: namespace.into(),
            transport: RwLock::new(None),
            subscription: Mutex::new(None),
            counters,
            _selection: PhantomData,
        }
    }

    pub fn init(&self, transport: Arc<T>) {
        *self
            .transport
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(transport);
    }

    pub fn is_initialized(&self) -> bool {
        self.transport
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    fn transport(&self) -> Result<Arc<T>> {
        self.transport
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(Error::NotInitialized(S::TOPIC))
    }

    pub fn is_queryable(&self, options: &S) -> bool {
        options.is_queryable()
    }

    pub fn query(&self, options: &S) -> Option<Query> {
        Query::compose(options, &self.namespace)
    }

    pub async fn fetch<F>(&self, callback: F, options: &S) -> Result<()>
    where
        F: FnOnce(Vec<S::Model>),
    {
        let transport = self.transport()?;
        let Some(query) = self.query(options) else {
            debug!(topic = S::TOPIC, "nothing selected, skipping fetch");
            return Ok(());
        };
        fetch::fetch::<S, T, F>(&transport, &query, &self.namespace, &self.counters, callback)
            .await;
        Ok(())
    }

    /// Explicit subscription: the caller owns the handle. `Ok(None)` when nothing is selected.
    pub async fn subscribe<F>(&self, callback: F, options: &S) -> Result<Option<SubscriptionHandle>>
    where
        F: FnMut(Vec<S::Model>) + Send + 'static,
    {
        let transport = self.transport()?;
        let Some(query) = self.query(options) else {
            debug!(topic = S::TOPIC, "nothing selected, skipping subscription");
            return Ok(None);
        };
        let handle = subscription::subscribe::<S, T, F>(
            transport,
            query,
            self.namespace.clone(),
            self.counters.clone(),
            callback,
        )
        .await?;
        Ok(Some(handle))
    }

    /// Subscribe and keep the handle in this feed, replacing any earlier one. Registration
    /// failures are logged, not returned.
    pub async fn sub<F>(&self, callback: F, options: &S) -> Result<()>
    where
        F: FnMut(Vec<S::Model>) + Send + 'static,
    {
        let handle = match self.subscribe(callback, options).await {
            Ok(Some(handle)) => handle,
            Ok(None) => return Ok(()),
            Err(e @ Error::NotInitialized(_)) => return Err(e),
            Err(e) => {
                self.counters.record_subscription_error();
                warn!(topic = S::TOPIC, error = %e, "entity subscription failed");
                return Ok(());
            }
        };
        let mut slot = self
            .subscription
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = slot.take() {
            previous.close();
        }
        *slot = Some(handle);
        Ok(())
    }

    pub fn unsub(&self) {
        let previous = self
            .subscription
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = previous {
            handle.close();
        }
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscription
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|handle| !handle.is_closed())
    }
}
