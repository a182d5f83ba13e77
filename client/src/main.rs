use arcade_client::{ArcadeContext, ClientConfig};
use tokio::signal;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = ClientConfig::from_env();
    let player = std::env::var("PLAYER_ADDRESS")
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty());
    tracing::info!(
        indexer = %config.indexer_url,
        namespace = %config.namespace,
        chain_id_cache = config.chain_id_cache,
        "starting arcade watcher"
    );

    let context = match ArcadeContext::from_config(&config) {
        Ok(context) => context,
        Err(e) => {
            tracing::error!(error = %e, "invalid configuration");
            return;
        }
    };
    if let Err(e) = context.start().await {
        tracing::error!(error = %e, "failed to start arcade context");
        return;
    }

    let mut games_rx = context.watch_games();
    let mut pins_rx = context.watch_pins();
    let mut chains_rx = context.watch_chains();
    log_games(&context);
    log_pins(&context, player.as_deref());

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            () = &mut shutdown => break,
            changed = games_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                log_games(&context);
            }
            changed = pins_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                log_pins(&context, player.as_deref());
            }
            changed = chains_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                for chain in chains_rx.borrow().iter() {
                    tracing::info!(
                        id = %chain.id,
                        name = %chain.name,
                        rpc = ?chain.rpc_urls.default.http,
                        "chain"
                    );
                }
            }
        }
    }

    context.shutdown();
    let counters = context.observability();
    tracing::info!(
        fetches = counters.fetches_total,
        fetch_failures = counters.fetch_failures_total,
        notifications = counters.notifications_total,
        subscription_errors = counters.subscription_errors_total,
        resubscriptions = counters.resubscriptions_total,
        parse_failures = counters.parse_failures_total,
        chain_recomputations = counters.chain_recomputations_total,
        chain_probe_failures = counters.chain_probe_failures_total,
        "arcade watcher stopped"
    );
}

fn log_games<T, P>(context: &ArcadeContext<T, P>)
where
    T: arcade_client::IndexerTransport,
    P: arcade_client::ChainIdProbe,
{
    let games = context.games();
    tracing::info!(count = games.len(), "games updated");
    for game in &games {
        tracing::info!(
            id = %game.identifier,
            name = game.name(),
            preset = game.preset(),
            rpc = game.rpc().unwrap_or("-"),
            "game"
        );
    }
}

fn log_pins<T, P>(context: &ArcadeContext<T, P>, player: Option<&str>)
where
    T: arcade_client::IndexerTransport,
    P: arcade_client::ChainIdProbe,
{
    match player {
        Some(address) => {
            let pinned = context.pinned_by(address);
            tracing::info!(player = address, pinned = ?pinned, "player pins updated");
        }
        None => {
            let pins = context.pins();
            tracing::info!(players = pins.players().count(), "pins updated");
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
