use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use arcade_shared::{ChainDescriptor, GameModel, dedup_chains};
use dashmap::DashMap;
use futures::future::join_all;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

use crate::config::{ClientConfig, USER_AGENT};
use crate::error::{Error, Result};
use crate::state::FeedCounters;

/// Asks an RPC endpoint which chain it serves.
pub trait ChainIdProbe: Send + Sync + 'static {
    fn chain_id(&self, rpc: &str) -> impl Future<Output = Result<String>> + Send;
}

#[derive(Debug, Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse {
    #[serde(default)]
    result: Option<String>,
    #[serde(default)]
    error: Option<JsonRpcError>,
}

/// `starknet_chainId` over JSON-RPC.
#[derive(Debug)]
pub struct RpcChainIdProbe {
    client: reqwest::Client,
    timeout: Option<Duration>,
    next_id: AtomicU64,
}

impl RpcChainIdProbe {
    pub fn new(timeout: Option<Duration>) -> Result<Self> {
        let client = reqwest::Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self {
            client,
            timeout,
            next_id: AtomicU64::new(1),
        })
    }
}

impl ChainIdProbe for RpcChainIdProbe {
    async fn chain_id(&self, rpc: &str) -> Result<String> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let mut request = self.client.post(rpc).json(&json!({
            "jsonrpc": "2.0",
            "method": "starknet_chainId",
            "params": [],
            "id": id,
        }));
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Http {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }
        let body: JsonRpcResponse = serde_json::from_slice(&response.bytes().await?)?;
        match (body.result, body.error) {
            (_, Some(error)) => Err(Error::Rpc {
                code: error.code,
                message: error.message,
            }),
            (Some(result), None) => Ok(result),
            (None, None) => Err(Error::Rpc {
                code: 0,
                message: "response carried neither result nor error".to_string(),
            }),
        }
    }
}

/// Remembers the chain id each endpoint reported. Failures are not cached.
#[derive(Debug)]
pub struct CachedChainProbe<P> {
    inner: P,
    resolved: DashMap<String, String>,
}

impl<P: ChainIdProbe> CachedChainProbe<P> {
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            resolved: DashMap::new(),
        }
    }

    pub fn cached(&self) -> usize {
        self.resolved.len()
    }
}

impl<P: ChainIdProbe> ChainIdProbe for CachedChainProbe<P> {
    async fn chain_id(&self, rpc: &str) -> Result<String> {
        if let Some(hit) = self.resolved.get(rpc).map(|entry| entry.value().clone()) {
            return Ok(hit);
        }
        let chain_id = self.inner.chain_id(rpc).await?;
        self.resolved.insert(rpc.to_string(), chain_id.clone());
        Ok(chain_id)
    }
}

/// The probe selected by [`ClientConfig::chain_id_cache`].
#[derive(Debug)]
pub enum ChainProbe {
    Direct(RpcChainIdProbe),
    Cached(CachedChainProbe<RpcChainIdProbe>),
}

impl ChainProbe {
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        let probe = RpcChainIdProbe::new(config.rpc_http_timeout)?;
        Ok(if config.chain_id_cache {
            ChainProbe::Cached(CachedChainProbe::new(probe))
        } else {
            ChainProbe::Direct(probe)
        })
    }
}

impl ChainIdProbe for ChainProbe {
    async fn chain_id(&self, rpc: &str) -> Result<String> {
        match self {
            ChainProbe::Direct(probe) => probe.chain_id(rpc).await,
            ChainProbe::Cached(probe) => probe.chain_id(rpc).await,
        }
    }
}

/// Probe every game's RPC concurrently and describe the distinct chains, first game wins.
/// Games without an RPC or whose probe fails are left out.
pub async fn resolve_chains<P: ChainIdProbe>(
    probe: &P,
    games: &[GameModel],
    counters: &FeedCounters,
) -> Vec<ChainDescriptor> {
    counters.record_chain_recomputation();
    let probes = games.iter().filter_map(|game| {
        let Some(rpc) = game.rpc() else {
            warn!(game = %game.identifier, "game has no rpc endpoint, skipping chain");
            return None;
        };
        Some(async move { (game, rpc, probe.chain_id(rpc).await) })
    });

    let mut descriptors = Vec::new();
    for (game, rpc, outcome) in join_all(probes).await {
        let descriptor = outcome.and_then(|raw| {
            ChainDescriptor::from_rpc(&raw, rpc).map_err(|e| Error::Rpc {
                code: 0,
                message: e.to_string(),
            })
        });
        match descriptor {
            Ok(descriptor) => descriptors.push(descriptor),
            Err(e) => {
                counters.record_chain_probe_failure();
                warn!(game = %game.identifier, rpc, error = %e, "chain id probe failed");
            }
        }
    }

    let chains = dedup_chains(descriptors);
    debug!(games = games.len(), chains = chains.len(), "chains recomputed");
    chains
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use arcade_shared::{GameConfig, GameMetadata, GameModel, GameSocials};
    use axum::extract::State;
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::{Value, json};

    use super::{CachedChainProbe, ChainIdProbe, RpcChainIdProbe, resolve_chains};
    use crate::error::Error;
    use crate::state::FeedCounters;
    use crate::testing::spawn_test_server;

    const SN_MAIN: &str = "0x534e5f4d41494e";
    const SN_SEPOLIA: &str = "0x534e5f5345504f4c4941";

    fn rpc_route(chain_id: &'static str) -> axum::routing::MethodRouter<Arc<AtomicUsize>> {
        post(move |State(hits): State<Arc<AtomicUsize>>, Json(body): Json<Value>| async move {
            hits.fetch_add(1, Ordering::SeqCst);
            assert_eq!(body["method"], json!("starknet_chainId"));
            Json(json!({"jsonrpc": "2.0", "id": body["id"], "result": chain_id}))
        })
    }

    async fn spawn_rpc_nodes() -> (SocketAddr, Arc<AtomicUsize>, tokio::task::JoinHandle<()>) {
        let hits = Arc::new(AtomicUsize::new(0));
        let app = Router::new()
            .route("/mainnet-a", rpc_route(SN_MAIN))
            .route("/mainnet-b", rpc_route(SN_MAIN))
            .route("/sepolia", rpc_route(SN_SEPOLIA))
            .route(
                "/broken",
                post(|| async {
                    Json(json!({"jsonrpc": "2.0", "id": 1, "error": {"code": -32603, "message": "boom"}}))
                }),
            )
            .with_state(hits.clone());
        let (addr, handle) = spawn_test_server(app).await;
        (addr, hits, handle)
    }

    fn game(identifier: &str, rpc: String) -> GameModel {
        GameModel {
            identifier: identifier.to_string(),
            world_address: String::new(),
            namespace: String::new(),
            project: "0x1".to_string(),
            metadata: GameMetadata::default(),
            socials: GameSocials::default(),
            owner: String::new(),
            config: GameConfig { rpc },
        }
    }

    #[tokio::test]
    async fn games_on_the_same_chain_yield_one_descriptor() {
        let (addr, _, server_handle) = spawn_rpc_nodes().await;
        let probe = RpcChainIdProbe::new(None).expect("probe");
        let games = vec![
            game("0x1", format!("http://{addr}/mainnet-a")),
            game("0x2", format!("http://{addr}/mainnet-b")),
            game("0x3", format!("http://{addr}/sepolia")),
        ];

        let chains = resolve_chains(&probe, &games, &FeedCounters::default()).await;

        assert_eq!(chains.len(), 2);
        assert_eq!(chains[0].name, "SN_MAIN");
        assert_eq!(
            chains[0].rpc_urls.default.http,
            vec![format!("http://{addr}/mainnet-a")]
        );
        assert_eq!(chains[1].name, "SN_SEPOLIA");

        server_handle.abort();
    }

    #[tokio::test]
    async fn failing_and_missing_rpcs_are_skipped() {
        let (addr, _, server_handle) = spawn_rpc_nodes().await;
        let probe = RpcChainIdProbe::new(None).expect("probe");
        let counters = FeedCounters::default();
        let games = vec![
            game("0x1", format!("http://{addr}/broken")),
            game("0x2", String::new()),
            game("0x3", format!("http://{addr}/sepolia")),
        ];

        let chains = resolve_chains(&probe, &games, &counters).await;

        assert_eq!(chains.len(), 1);
        assert_eq!(chains[0].id.as_str(), SN_SEPOLIA);
        assert_eq!(counters.snapshot().chain_probe_failures_total, 1);

        let error = probe
            .chain_id(&format!("http://{addr}/broken"))
            .await
            .expect_err("rpc error");
        assert!(matches!(error, Error::Rpc { code: -32603, .. }));

        server_handle.abort();
    }

    #[tokio::test]
    async fn cached_probe_hits_each_endpoint_once() {
        let (addr, hits, server_handle) = spawn_rpc_nodes().await;
        let probe = CachedChainProbe::new(RpcChainIdProbe::new(None).expect("probe"));
        let rpc = format!("http://{addr}/mainnet-a");

        assert_eq!(probe.chain_id(&rpc).await.expect("first"), SN_MAIN);
        assert_eq!(probe.chain_id(&rpc).await.expect("second"), SN_MAIN);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(probe.cached(), 1);

        server_handle.abort();
    }
}
