use serde::{Deserialize, Serialize};

use crate::entity::{Entity, ParseError};
use crate::pin::{PIN_MODEL, PinEvent};
use crate::query::{Clause, Selection};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialOptions {
    pub pin: bool,
}

impl Default for SocialOptions {
    fn default() -> Self {
        Self { pin: true }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SocialModel {
    Pin(PinEvent),
}

impl Selection for SocialOptions {
    type Model = SocialModel;

    const TOPIC: &'static str = "social";

    fn clauses(&self, namespace: &str) -> Vec<Clause> {
        if self.pin {
            vec![Clause::model(namespace, PIN_MODEL)]
        } else {
            Vec::new()
        }
    }

    fn is_queryable(&self) -> bool {
        self.pin
    }

    fn discriminate(entity: &Entity, namespace: &str) -> Vec<Result<SocialModel, ParseError>> {
        entity
            .model(namespace, PIN_MODEL)
            .map(|fields| PinEvent::parse(fields).map(SocialModel::Pin))
            .into_iter()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{SocialModel, SocialOptions};
    use crate::entity::Entity;
    use crate::query::Selection;

    #[test]
    fn pin_record_yields_pin_event() {
        let entity = Entity::new("0x9").with_model(
            "ARCADE",
            "TrophyPinning",
            json!({"player_id": "0xp", "achievement_id": "A", "time": 5})
                .as_object()
                .cloned()
                .expect("object literal"),
        );
        let models: Vec<SocialModel> = SocialOptions::discriminate(&entity, "ARCADE")
            .into_iter()
            .collect::<Result<_, _>>()
            .expect("discriminate");
        let [SocialModel::Pin(event)] = models.as_slice() else {
            panic!("expected a single pin event, got {models:?}");
        };
        assert_eq!(event.achievement_id, "A");
        assert_eq!(event.time, 5);
    }

    #[test]
    fn registry_records_are_not_social_models() {
        let entity = Entity::new("0x9").with_model(
            "ARCADE",
            "Game",
            json!({"project": "p"}).as_object().cloned().expect("object literal"),
        );
        let models: Vec<SocialModel> = SocialOptions::discriminate(&entity, "ARCADE")
            .into_iter()
            .collect::<Result<_, _>>()
            .expect("discriminate");
        assert!(models.is_empty());
    }
}
