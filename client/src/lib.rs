pub mod actions;
pub mod chains;
pub mod config;
pub mod error;
pub mod feed;
pub mod fetch;
pub mod games;
pub mod pins;
pub mod sse;
pub mod state;
pub mod subscription;
pub mod transport;

#[cfg(test)]
mod testing;

pub use chains::{CachedChainProbe, ChainIdProbe, ChainProbe, RpcChainIdProbe, resolve_chains};
pub use config::ClientConfig;
pub use error::{Error, Result};
pub use feed::EntityFeed;
pub use games::GamesProjection;
pub use pins::PinsProjection;
pub use state::{ArcadeContext, FeedCounters, FeedSnapshot};
pub use subscription::SubscriptionHandle;
pub use transport::{HttpTransport, IndexerTransport};
