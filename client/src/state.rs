use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use arcade_shared::{
    ChainDescriptor, GameModel, RegistryModel, RegistryOptions, SocialModel, SocialOptions,
};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::chains::{ChainIdProbe, ChainProbe, resolve_chains};
use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::feed::EntityFeed;
use crate::games::GamesProjection;
use crate::pins::PinsProjection;
use crate::transport::{HttpTransport, IndexerTransport};

#[derive(Debug, Default)]
pub struct FeedCounters {
    fetches_total: AtomicU64,
    fetch_failures_total: AtomicU64,
    notifications_total: AtomicU64,
    subscription_errors_total: AtomicU64,
    resubscriptions_total: AtomicU64,
    parse_failures_total: AtomicU64,
    chain_recomputations_total: AtomicU64,
    chain_probe_failures_total: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedSnapshot {
    pub fetches_total: u64,
    pub fetch_failures_total: u64,
    pub notifications_total: u64,
    pub subscription_errors_total: u64,
    pub resubscriptions_total: u64,
    pub parse_failures_total: u64,
    pub chain_recomputations_total: u64,
    pub chain_probe_failures_total: u64,
}

impl FeedCounters {
    pub fn snapshot(&self) -> FeedSnapshot {
        FeedSnapshot {
            fetches_total: self.fetches_total.load(Ordering::Relaxed),
            fetch_failures_total: self.fetch_failures_total.load(Ordering::Relaxed),
            notifications_total: self.notifications_total.load(Ordering::Relaxed),
            subscription_errors_total: self.subscription_errors_total.load(Ordering::Relaxed),
            resubscriptions_total: self.resubscriptions_total.load(Ordering::Relaxed),
            parse_failures_total: self.parse_failures_total.load(Ordering::Relaxed),
            chain_recomputations_total: self
                .chain_recomputations_total
                .load(Ordering::Relaxed),
            chain_probe_failures_total: self
                .chain_probe_failures_total
                .load(Ordering::Relaxed),
        }
    }

    pub fn record_fetch(&self) {
        self.fetches_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_fetch_failure(&self) {
        self.fetch_failures_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_notification(&self) {
        self.notifications_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_subscription_error(&self) {
        self.subscription_errors_total
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_resubscription(&self) {
        self.resubscriptions_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_parse_failure(&self) {
        self.parse_failures_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_chain_recomputation(&self) {
        self.chain_recomputations_total
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_chain_probe_failure(&self) {
        self.chain_probe_failures_total
            .fetch_add(1, Ordering::Relaxed);
    }
}

/// Live view of the arcade: registered games, player pins and the chains the games run on.
///
/// Each projection is published through a watch channel, so readers always see the state
/// after a whole batch has been folded in.
pub struct ArcadeContext<T: IndexerTransport, P: ChainIdProbe> {
    transport: Arc<T>,
    probe: Arc<P>,
    registry: EntityFeed<RegistryOptions, T>,
    social: EntityFeed<SocialOptions, T>,
    games_tx: Arc<watch::Sender<GamesProjection>>,
    pins_tx: Arc<watch::Sender<PinsProjection>>,
    chains_tx: Arc<watch::Sender<Vec<ChainDescriptor>>>,
    chain_task: Mutex<Option<JoinHandle<()>>>,
    started: AtomicBool,
    stopped: Arc<AtomicBool>,
    counters: Arc<FeedCounters>,
}

impl ArcadeContext<HttpTransport, ChainProbe> {
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        let transport = HttpTransport::new(config)?;
        let probe = ChainProbe::from_config(config)?;
        Ok(Self::new(transport, probe, config.namespace.clone()))
    }
}

impl<T: IndexerTransport, P: ChainIdProbe> ArcadeContext<T, P> {
    pub fn new(transport: T, probe: P, namespace: impl Into<String>) -> Self {
        let namespace = namespace.into();
        let counters = Arc::new(FeedCounters::default());
        let (games_tx, _) = watch::channel(GamesProjection::default());
        let (pins_tx, _) = watch::channel(PinsProjection::default());
        let (chains_tx, _) = watch::channel(Vec::new());
        Self {
            transport: Arc::new(transport),
            probe: Arc::new(probe),
            registry: EntityFeed::new(namespace.clone(), counters.clone()),
            social: EntityFeed::new(namespace, counters.clone()),
            games_tx: Arc::new(games_tx),
            pins_tx: Arc::new(pins_tx),
            chains_tx: Arc::new(chains_tx),
            chain_task: Mutex::new(None),
            started: AtomicBool::new(false),
            stopped: Arc::new(AtomicBool::new(false)),
            counters,
        }
    }

    /// Load the current pins and games, then follow their live updates. May run only once.
    pub async fn start(&self) -> Result<()> {
        if self.started.swap(true, Ordering::SeqCst) {
            return Err(Error::AlreadyStarted);
        }
        self.registry.init(self.transport.clone());
        self.social.init(self.transport.clone());
        self.spawn_chain_task();

        let social = SocialOptions { pin: true };
        self.social.fetch(self.pins_fold(), &social).await?;
        self.social.sub(self.pins_fold(), &social).await?;

        let registry = RegistryOptions {
            game: true,
            achievement: false,
        };
        self.registry.fetch(self.games_fold(), &registry).await?;
        self.registry.sub(self.games_fold(), &registry).await?;

        info!(
            games = self.games_tx.borrow().len(),
            "arcade context started"
        );
        Ok(())
    }

    // The stop flag is read under the channel's write lock, so a fold that is still running
    // when `shutdown` clears the projection cannot write into it afterwards.
    fn pins_fold(&self) -> impl FnMut(Vec<SocialModel>) + Send + 'static {
        let pins_tx = self.pins_tx.clone();
        let stopped = self.stopped.clone();
        move |models| {
            pins_tx.send_if_modified(|pins| !stopped.load(Ordering::SeqCst) && pins.apply(&models));
        }
    }

    fn games_fold(&self) -> impl FnMut(Vec<RegistryModel>) + Send + 'static {
        let games_tx = self.games_tx.clone();
        let stopped = self.stopped.clone();
        move |models| {
            games_tx
                .send_if_modified(|games| !stopped.load(Ordering::SeqCst) && games.apply(&models));
        }
    }

    fn spawn_chain_task(&self) {
        let mut games_rx = self.games_tx.subscribe();
        let chains_tx = self.chains_tx.clone();
        let probe = self.probe.clone();
        let counters = self.counters.clone();
        let stopped = self.stopped.clone();
        let task = tokio::spawn(async move {
            while games_rx.changed().await.is_ok() {
                let games = games_rx.borrow_and_update().in_insertion_order();
                let chains = resolve_chains(probe.as_ref(), &games, &counters).await;
                chains_tx.send_if_modified(|current| {
                    if stopped.load(Ordering::SeqCst) || *current == chains {
                        return false;
                    }
                    *current = chains;
                    true
                });
            }
            debug!("chain resolver stopped");
        });
        let previous = self
            .chain_task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(task);
        if let Some(previous) = previous {
            previous.abort();
        }
    }

    /// Stop every subscription and the chain resolver, then clear the projections.
    pub fn shutdown(&self) {
        self.stopped.store(true, Ordering::SeqCst);
        self.registry.unsub();
        self.social.unsub();
        let task = self
            .chain_task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(task) = task {
            task.abort();
        }
        self.games_tx.send_replace(GamesProjection::default());
        self.pins_tx.send_replace(PinsProjection::default());
        self.chains_tx.send_replace(Vec::new());
        info!("arcade context shut down");
    }

    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }

    pub fn registry(&self) -> &EntityFeed<RegistryOptions, T> {
        &self.registry
    }

    pub fn social(&self) -> &EntityFeed<SocialOptions, T> {
        &self.social
    }

    /// Games sorted by name.
    pub fn games(&self) -> Vec<GameModel> {
        self.games_tx.borrow().sorted()
    }

    pub fn pins(&self) -> PinsProjection {
        self.pins_tx.borrow().clone()
    }

    pub fn pinned_by(&self, address: &str) -> Vec<String> {
        self.pins_tx.borrow().pinned_by(address).to_vec()
    }

    pub fn chains(&self) -> Vec<ChainDescriptor> {
        self.chains_tx.borrow().clone()
    }

    pub fn watch_games(&self) -> watch::Receiver<GamesProjection> {
        self.games_tx.subscribe()
    }

    pub fn watch_pins(&self) -> watch::Receiver<PinsProjection> {
        self.pins_tx.subscribe()
    }

    pub fn watch_chains(&self) -> watch::Receiver<Vec<ChainDescriptor>> {
        self.chains_tx.subscribe()
    }

    pub fn observability(&self) -> FeedSnapshot {
        self.counters.snapshot()
    }
}

impl<T: IndexerTransport, P: ChainIdProbe> Drop for ArcadeContext<T, P> {
    fn drop(&mut self) {
        if let Some(task) = self
            .chain_task
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            task.abort();
        }
    }
}
