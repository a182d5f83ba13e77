use std::collections::HashMap;

use arcade_shared::{GameModel, RegistryModel};

#[derive(Debug, Clone, PartialEq)]
struct GameSlot {
    seq: u64,
    game: GameModel,
}

/// Known games keyed by identifier.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GamesProjection {
    slots: HashMap<String, GameSlot>,
    next_seq: u64,
}

impl GamesProjection {
    /// Fold a batch of registry models. Returns whether the set of games changed.
    pub fn apply(&mut self, models: &[RegistryModel]) -> bool {
        let mut changed = false;
        for game in models.iter().filter_map(RegistryModel::as_game) {
            changed |= self.apply_game(game);
        }
        changed
    }

    pub fn apply_game(&mut self, game: &GameModel) -> bool {
        if !game.exists() {
            return self.slots.remove(&game.identifier).is_some();
        }
        match self.slots.get_mut(&game.identifier) {
            Some(slot) if slot.game == *game => false,
            Some(slot) => {
                slot.game = game.clone();
                true
            }
            None => {
                let seq = self.next_seq;
                self.next_seq += 1;
                self.slots.insert(
                    game.identifier.clone(),
                    GameSlot {
                        seq,
                        game: game.clone(),
                    },
                );
                true
            }
        }
    }

    pub fn get(&self, identifier: &str) -> Option<&GameModel> {
        self.slots.get(identifier).map(|slot| &slot.game)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    fn ordered_slots(&self) -> Vec<&GameSlot> {
        let mut slots: Vec<&GameSlot> = self.slots.values().collect();
        slots.sort_by_key(|slot| slot.seq);
        slots
    }

    pub fn in_insertion_order(&self) -> Vec<GameModel> {
        self.ordered_slots()
            .into_iter()
            .map(|slot| slot.game.clone())
            .collect()
    }

    /// Display order: by name ignoring case, ties broken by when the game was first seen.
    pub fn sorted(&self) -> Vec<GameModel> {
        let mut slots = self.ordered_slots();
        slots.sort_by_cached_key(|slot| {
            let name = slot.game.name();
            (name.to_lowercase(), name.to_string())
        });
        slots.into_iter().map(|slot| slot.game.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use arcade_shared::{GameConfig, GameMetadata, GameModel, GameSocials, RegistryModel};

    use super::GamesProjection;

    fn game(identifier: &str, name: &str, project: &str) -> GameModel {
        GameModel {
            identifier: identifier.to_string(),
            world_address: "0xworld".to_string(),
            namespace: "dopewars".to_string(),
            project: project.to_string(),
            metadata: GameMetadata {
                name: name.to_string(),
                ..GameMetadata::default()
            },
            socials: GameSocials::default(),
            owner: "0xowner".to_string(),
            config: GameConfig {
                rpc: format!("http://rpc/{identifier}"),
            },
        }
    }

    #[test]
    fn existing_games_are_upserted_last_write_wins() {
        let mut games = GamesProjection::default();
        assert!(games.apply(&[RegistryModel::Game(game("0x1", "Zeta", "p"))]));
        assert!(!games.apply_game(&game("0x1", "Zeta", "p")));
        assert!(games.apply_game(&game("0x1", "Alpha", "p")));
        assert_eq!(games.len(), 1);
        assert_eq!(games.get("0x1").map(GameModel::name), Some("Alpha"));
    }

    #[test]
    fn deleted_game_is_removed_and_absent_delete_is_a_no_op() {
        let mut games = GamesProjection::default();
        games.apply_game(&game("0x1", "One", "p"));
        games.apply_game(&game("0x2", "Two", "p"));
        let before = games.clone();

        assert!(!games.apply_game(&game("0x9", "", "0x0")));
        assert_eq!(games, before);

        assert!(games.apply_game(&game("0x1", "", "0x0")));
        assert!(games.get("0x1").is_none());
        assert_eq!(games.len(), 1);
    }

    #[test]
    fn sorted_by_name_with_ties_in_arrival_order() {
        let mut games = GamesProjection::default();
        for (id, name) in [("0x1", "Loot"), ("0x2", "Dope"), ("0x3", "Loot"), ("0x4", "Arena")] {
            games.apply_game(&game(id, name, "p"));
        }
        let sorted: Vec<_> = games.sorted().into_iter().map(|g| g.identifier).collect();
        assert_eq!(sorted, vec!["0x4", "0x2", "0x1", "0x3"]);
        let arrival: Vec<_> = games
            .in_insertion_order()
            .into_iter()
            .map(|g| g.identifier)
            .collect();
        assert_eq!(arrival, vec!["0x1", "0x2", "0x3", "0x4"]);
    }

    #[test]
    fn sorting_ignores_case() {
        let mut games = GamesProjection::default();
        for (id, name) in [("0x1", "Zork"), ("0x2", "abyss"), ("0x3", "Bloom"), ("0x4", "ABYSS")] {
            games.apply_game(&game(id, name, "p"));
        }
        let names: Vec<_> = games
            .sorted()
            .iter()
            .map(|g| g.name().to_string())
            .collect();
        assert_eq!(names, vec!["ABYSS", "abyss", "Bloom", "Zork"]);
    }

    #[test]
    fn achievements_pass_through() {
        let mut games = GamesProjection::default();
        let achievement = serde_json::from_value(serde_json::json!({
            "identifier": "0xa",
            "id": "A",
            "group": "G",
            "index": 0,
            "title": "",
            "description": "",
            "hidden": false,
            "completed": false,
            "percentage": 0.0,
            "points": 0,
            "icon": "",
            "tasks": [],
            "timestamp": 0
        }))
        .expect("achievement");
        assert!(!games.apply(&[RegistryModel::Achievement(achievement)]));
        assert!(games.is_empty());
    }
}
