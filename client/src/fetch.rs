use arcade_shared::{Entity, Query, Selection};
use tracing::{debug, warn};

use crate::state::FeedCounters;
use crate::transport::IndexerTransport;

/// Classify every entity, logging and skipping each model that fails to parse.
pub(crate) fn discriminate_all<S: Selection>(
    entities: &[Entity],
    namespace: &str,
    counters: &FeedCounters,
) -> Vec<S::Model> {
    let mut models = Vec::new();
    for entity in entities {
        for result in S::discriminate(entity, namespace) {
            match result {
                Ok(model) => models.push(model),
                Err(e) => {
                    counters.record_parse_failure();
                    warn!(
                        topic = S::TOPIC,
                        entity_id = %entity.entity_id,
                        error = %e,
                        "skipping malformed model"
                    );
                }
            }
        }
    }
    models
}

/// One-shot fetch. The callback runs exactly once on success, with an empty list when the
/// service has nothing; transport failures are logged and the callback is not run.
pub async fn fetch<S, T, F>(
    transport: &T,
    query: &Query,
    namespace: &str,
    counters: &FeedCounters,
    callback: F,
) where
    S: Selection,
    T: IndexerTransport,
    F: FnOnce(Vec<S::Model>),
{
    counters.record_fetch();
    let payload = match transport.fetch_entities(query).await {
        Ok(payload) => payload,
        Err(e) => {
            counters.record_fetch_failure();
            warn!(topic = S::TOPIC, error = %e, "entity fetch failed");
            return;
        }
    };
    let entities = payload.into_vec();
    let models = discriminate_all::<S>(&entities, namespace, counters);
    debug!(
        topic = S::TOPIC,
        entities = entities.len(),
        models = models.len(),
        "entity fetch completed"
    );
    callback(models);
}
