use std::time::Duration;

use crate::error::{Error, Result};

pub const DEFAULT_INDEXER_URL: &str = "http://localhost:8080";
pub const DEFAULT_NAMESPACE: &str = "ARCADE";
pub const DEFAULT_SOCIAL_CONTRACT_ADDRESS: &str = "0x0";

pub const ENTITIES_PATH: &str = "entities";
pub const SUBSCRIBE_PATH: &str = "entities/subscribe";
pub const USER_AGENT: &str = "arcade-client/0.1";

pub const SUBSCRIPTION_RETRY_BASE_MS: u64 = 500;
pub const SUBSCRIPTION_RETRY_MAX_MS: u64 = 10_000;

fn env_string(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn env_secs(key: &str) -> Option<Duration> {
    std::env::var(key)
        .ok()
        .and_then(|value| value.trim().parse::<u64>().ok())
        .filter(|value| *value > 0)
        .map(Duration::from_secs)
}

pub fn indexer_url() -> String {
    env_string("INDEXER_URL").unwrap_or_else(|| DEFAULT_INDEXER_URL.to_string())
}

pub fn namespace() -> String {
    env_string("ARCADE_NAMESPACE").unwrap_or_else(|| DEFAULT_NAMESPACE.to_string())
}

pub fn social_contract_address() -> String {
    env_string("SOCIAL_CONTRACT_ADDRESS")
        .unwrap_or_else(|| DEFAULT_SOCIAL_CONTRACT_ADDRESS.to_string())
}

/// Request timeout for indexer fetches. Unset means no timeout.
pub fn indexer_http_timeout() -> Option<Duration> {
    env_secs("INDEXER_HTTP_TIMEOUT_SECS")
}

/// Request timeout for chain id probes. Unset means no timeout.
pub fn rpc_http_timeout() -> Option<Duration> {
    env_secs("RPC_HTTP_TIMEOUT_SECS")
}

pub fn chain_id_cache_enabled() -> bool {
    std::env::var("CHAIN_ID_CACHE")
        .map(|value| {
            let normalized = value.trim().to_ascii_lowercase();
            matches!(normalized.as_str(), "1" | "true" | "yes" | "on")
        })
        .unwrap_or(false)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub indexer_url: String,
    pub namespace: String,
    pub social_contract_address: String,
    pub indexer_http_timeout: Option<Duration>,
    pub rpc_http_timeout: Option<Duration>,
    pub chain_id_cache: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            indexer_url: DEFAULT_INDEXER_URL.to_string(),
            namespace: DEFAULT_NAMESPACE.to_string(),
            social_contract_address: DEFAULT_SOCIAL_CONTRACT_ADDRESS.to_string(),
            indexer_http_timeout: None,
            rpc_http_timeout: None,
            chain_id_cache: false,
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Self {
        Self {
            indexer_url: indexer_url(),
            namespace: namespace(),
            social_contract_address: social_contract_address(),
            indexer_http_timeout: indexer_http_timeout(),
            rpc_http_timeout: rpc_http_timeout(),
            chain_id_cache: chain_id_cache_enabled(),
        }
    }

    /// Base URL of the indexing service, with a trailing slash so relative paths join under it.
    pub fn indexer_base(&self) -> Result<reqwest::Url> {
        let raw = self.indexer_url.trim();
        let with_slash = if raw.ends_with('/') {
            raw.to_string()
        } else {
            format!("{raw}/")
        };
        let url = reqwest::Url::parse(&with_slash).map_err(|e| Error::InvalidConfig {
            key: "INDEXER_URL",
            reason: e.to_string(),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::InvalidConfig {
                key: "INDEXER_URL",
                reason: format!("unsupported scheme `{}`", url.scheme()),
            });
        }
        Ok(url)
    }
}
