use serde::{Deserialize, Serialize};

use crate::entity::{Entity, FieldReader, Fields, ParseError, is_zero_felt};

pub const GAME_MODEL: &str = "Game";
pub const DEFAULT_PRESET: &str = "default";

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GameMetadata {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub banner: String,
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preset: Option<String>,
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GameSocials {
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub twitter: Option<String>,
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discord: Option<String>,
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub telegram: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GameConfig {
    #[serde(default)]
    pub rpc: String,
}

/// A game registered in the arcade registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameModel {
    /// Hashed key of the entity that holds this game.
    pub identifier: String,
    pub world_address: String,
    pub namespace: String,
    pub project: String,
    pub metadata: GameMetadata,
    pub socials: GameSocials,
    pub owner: String,
    pub config: GameConfig,
}

impl GameModel {
    pub fn parse(entity: &Entity, fields: &Fields) -> Result<Self, ParseError> {
        let reader = FieldReader::new(GAME_MODEL, fields);
        Ok(Self {
            identifier: entity.entity_id.clone(),
            world_address: reader.string("world_address"),
            namespace: reader.string("namespace"),
            project: reader.string("project"),
            metadata: reader.json("metadata")?,
            socials: reader.json("socials")?,
            owner: reader.string("owner"),
            config: reader.json("config")?,
        })
    }

    /// Deleted registrations come back with their value fields zeroed.
    pub fn exists(&self) -> bool {
        !is_zero_felt(&self.project)
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    pub fn preset(&self) -> &str {
        self.metadata
            .preset
            .as_deref()
            .filter(|preset| !preset.is_empty())
            .unwrap_or(DEFAULT_PRESET)
    }

    pub fn rpc(&self) -> Option<&str> {
        let rpc = self.config.rpc.trim();
        (!rpc.is_empty()).then_some(rpc)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{GAME_MODEL, GameModel};
    use crate::entity::Entity;

    fn entity(fields: serde_json::Value) -> Entity {
        Entity::new("0xgame").with_model(
            "ARCADE",
            GAME_MODEL,
            fields.as_object().cloned().expect("object literal"),
        )
    }

    #[test]
    fn parses_encoded_metadata_and_config() {
        let raw = entity(json!({
            "world_address": "0x123",
            "namespace": "dopewars",
            "project": "dopewars-mainnet",
            "metadata": "{\"name\":\"Dope Wars\",\"image\":\"https://img\",\"banner\":\"https://banner\",\"preset\":\"dope-wars\"}",
            "socials": {"website": "https://dopewars.game", "twitter": "https://x.com/dopewars"},
            "owner": "0xowner",
            "config": "{\"rpc\":\"https://api.cartridge.gg/x/starknet/mainnet\"}"
        }));
        let fields = raw.model("ARCADE", GAME_MODEL).expect("game fields");
        let game = GameModel::parse(&raw, fields).expect("parse game");

        assert_eq!(game.identifier, "0xgame");
        assert_eq!(game.name(), "Dope Wars");
        assert_eq!(game.preset(), "dope-wars");
        assert_eq!(game.metadata.banner, "https://banner");
        assert_eq!(game.socials.website.as_deref(), Some("https://dopewars.game"));
        assert_eq!(game.rpc(), Some("https://api.cartridge.gg/x/starknet/mainnet"));
        assert!(game.exists());
    }

    #[test]
    fn missing_fields_default_and_zero_project_means_deleted() {
        let raw = entity(json!({"project": "0x0"}));
        let fields = raw.model("ARCADE", GAME_MODEL).expect("game fields");
        let game = GameModel::parse(&raw, fields).expect("parse game");

        assert!(!game.exists());
        assert_eq!(game.name(), "");
        assert_eq!(game.preset(), "default");
        assert_eq!(game.rpc(), None);
    }

    #[test]
    fn garbled_metadata_is_reported() {
        let raw = entity(json!({"project": "p", "metadata": "{not json"}));
        let fields = raw.model("ARCADE", GAME_MODEL).expect("game fields");
        assert!(GameModel::parse(&raw, fields).is_err());
    }
}
