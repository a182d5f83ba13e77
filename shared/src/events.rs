use serde::{Deserialize, Serialize};

use crate::entity::Entity;

/// Entities as the service returns them: nothing, a single record or a list.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityPayload {
    #[default]
    Absent,
    Many(Vec<Entity>),
    One(Box<Entity>),
}

impl EntityPayload {
    pub fn into_vec(self) -> Vec<Entity> {
        match self {
            EntityPayload::Absent => Vec::new(),
            EntityPayload::Many(entities) => entities,
            EntityPayload::One(entity) => vec![*entity],
        }
    }
}

/// One push from an entity subscription.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Notification {
    #[serde(default)]
    pub data: EntityPayload,
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Notification {
    pub fn entities(entities: Vec<Entity>) -> Self {
        Self {
            data: EntityPayload::Many(entities),
            error: None,
        }
    }

    /// Non-sentinel entities carried by this push.
    pub fn into_changes(self) -> Vec<Entity> {
        self.data
            .into_vec()
            .into_iter()
            .filter(|entity| !entity.is_sentinel())
            .collect()
    }
}
