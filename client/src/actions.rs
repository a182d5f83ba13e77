use std::fmt;
use std::future::Future;

use arcade_shared::{ChainId, encode_short_string};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::pins::PinsProjection;

/// A contract invocation handed to the wallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Call {
    pub contract_address: String,
    pub entrypoint: String,
    pub calldata: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PinIntent {
    Pin { achievement_id: String },
    Unpin { achievement_id: String },
}

impl PinIntent {
    /// Pinned trophies get unpinned, the rest get pinned.
    pub fn toggle(achievement_id: &str, pinned: bool) -> Self {
        let achievement_id = achievement_id.to_string();
        if pinned {
            PinIntent::Unpin { achievement_id }
        } else {
            PinIntent::Pin { achievement_id }
        }
    }

    pub fn achievement_id(&self) -> &str {
        match self {
            PinIntent::Pin { achievement_id } | PinIntent::Unpin { achievement_id } => {
                achievement_id
            }
        }
    }

    pub fn entrypoint(&self) -> &'static str {
        match self {
            PinIntent::Pin { .. } => "pin",
            PinIntent::Unpin { .. } => "unpin",
        }
    }

    pub fn calls(&self, social_contract: &str) -> Vec<Call> {
        vec![Call {
            contract_address: social_contract.to_string(),
            entrypoint: self.entrypoint().to_string(),
            calldata: vec![encode_short_string(self.achievement_id())],
        }]
    }
}

/// The connected player, if any.
pub trait AccountProvider: Send + Sync {
    fn address(&self) -> Option<String>;
}

/// Submits calls on behalf of the connected player.
pub trait Executor: Send + Sync {
    type Error: fmt::Display + Send;

    /// `Ok(None)` means the player dismissed the request.
    fn execute(
        &self,
        calls: Vec<Call>,
        chain_id: &ChainId,
    ) -> impl Future<Output = Result<Option<String>, Self::Error>> + Send;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PinOutcome {
    /// Pinning is disabled and the trophy was not pinned.
    Skipped,
    Dismissed(PinIntent),
    Submitted {
        intent: PinIntent,
        transaction: String,
    },
    Failed {
        intent: PinIntent,
        reason: String,
    },
}

/// Pinned ids of the connected player; empty when nobody is connected.
pub fn player_pins<A: AccountProvider>(account: &A, pins: &PinsProjection) -> Vec<String> {
    account
        .address()
        .map(|address| pins.pinned_by(&address).to_vec())
        .unwrap_or_default()
}

pub async fn toggle_pin<E: Executor>(
    executor: &E,
    social_contract: &str,
    chain_id: &ChainId,
    achievement_id: &str,
    pinned: bool,
    enabled: bool,
) -> PinOutcome {
    if !enabled && !pinned {
        return PinOutcome::Skipped;
    }
    let intent = PinIntent::toggle(achievement_id, pinned);
    let calls = intent.calls(social_contract);
    match executor.execute(calls, chain_id).await {
        Ok(Some(transaction)) => {
            info!(
                achievement_id,
                action = intent.entrypoint(),
                %transaction,
                "trophy pin updated"
            );
            PinOutcome::Submitted {
                intent,
                transaction,
            }
        }
        Ok(None) => PinOutcome::Dismissed(intent),
        Err(e) => {
            warn!(
                achievement_id,
                action = intent.entrypoint(),
                error = %e,
                "trophy pin update failed"
            );
            PinOutcome::Failed {
                intent,
                reason: e.to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use arcade_shared::{ChainId, PinEvent};

    use super::{
        AccountProvider, Call, Executor, PinIntent, PinOutcome, player_pins, toggle_pin,
    };
    use crate::pins::PinsProjection;

    #[derive(Default)]
    struct RecordingExecutor {
        calls: Mutex<Vec<Call>>,
        reply: Option<Result<Option<String>, String>>,
    }

    impl Executor for RecordingExecutor {
        type Error = String;

        async fn execute(
            &self,
            calls: Vec<Call>,
            _chain_id: &ChainId,
        ) -> Result<Option<String>, String> {
            self.calls.lock().expect("calls lock").extend(calls);
            self.reply.clone().unwrap_or(Ok(Some("0xtx".to_string())))
        }
    }

    struct Wallet(Option<&'static str>);

    impl AccountProvider for Wallet {
        fn address(&self) -> Option<String> {
            self.0.map(str::to_string)
        }
    }

    fn mainnet() -> ChainId {
        ChainId::parse("0x534e5f4d41494e").expect("chain id")
    }

    #[test]
    fn intent_builds_social_calls() {
        let calls = PinIntent::toggle("EXPLORER", false).calls("0xsocial");
        assert_eq!(
            calls,
            vec![Call {
                contract_address: "0xsocial".to_string(),
                entrypoint: "pin".to_string(),
                calldata: vec!["0x4558504c4f524552".to_string()],
            }]
        );
        assert_eq!(PinIntent::toggle("EXPLORER", true).entrypoint(), "unpin");
    }

    #[tokio::test]
    async fn disabled_pinning_skips_unpinned_trophies() {
        let executor = RecordingExecutor::default();
        let outcome = toggle_pin(&executor, "0xsocial", &mainnet(), "A", false, false).await;
        assert_eq!(outcome, PinOutcome::Skipped);
        assert!(executor.calls.lock().expect("calls lock").is_empty());
    }

    #[tokio::test]
    async fn pinned_trophies_can_always_be_unpinned() {
        let executor = RecordingExecutor::default();
        let outcome = toggle_pin(&executor, "0xsocial", &mainnet(), "A", true, false).await;
        assert_eq!(
            outcome,
            PinOutcome::Submitted {
                intent: PinIntent::Unpin {
                    achievement_id: "A".to_string()
                },
                transaction: "0xtx".to_string(),
            }
        );
        assert_eq!(executor.calls.lock().expect("calls lock")[0].entrypoint, "unpin");
    }

    #[tokio::test]
    async fn executor_errors_are_reported_not_raised() {
        let executor = RecordingExecutor {
            reply: Some(Err("rejected".to_string())),
            ..RecordingExecutor::default()
        };
        let outcome = toggle_pin(&executor, "0xsocial", &mainnet(), "A", false, true).await;
        assert!(matches!(outcome, PinOutcome::Failed { ref reason, .. } if reason == "rejected"));

        let dismissed = RecordingExecutor {
            reply: Some(Ok(None)),
            ..RecordingExecutor::default()
        };
        let outcome = toggle_pin(&dismissed, "0xsocial", &mainnet(), "A", false, true).await;
        assert!(matches!(outcome, PinOutcome::Dismissed(PinIntent::Pin { .. })));
    }

    #[test]
    fn player_pins_follow_the_connected_account() {
        let mut pins = PinsProjection::default();
        pins.apply_event(&PinEvent {
            player_id: "0xabc".to_string(),
            achievement_id: "A".to_string(),
            time: 3,
        });
        assert_eq!(player_pins(&Wallet(Some("0x0abc")), &pins), vec!["A".to_string()]);
        assert!(player_pins(&Wallet(None), &pins).is_empty());
    }
}
