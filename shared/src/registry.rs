use serde::{Deserialize, Serialize};

use crate::achievement::{ACHIEVEMENT_MODEL, AchievementModel};
use crate::entity::{Entity, ParseError};
use crate::game::{GAME_MODEL, GameModel};
use crate::query::{Clause, Selection};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryOptions {
    pub game: bool,
    pub achievement: bool,
}

impl Default for RegistryOptions {
    fn default() -> Self {
        Self {
            game: true,
            achievement: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RegistryModel {
    Game(GameModel),
    Achievement(AchievementModel),
}

impl RegistryModel {
    pub fn as_game(&self) -> Option<&GameModel> {
        match self {
            RegistryModel::Game(game) => Some(game),
            RegistryModel::Achievement(_) => None,
        }
    }

    pub fn as_achievement(&self) -> Option<&AchievementModel> {
        match self {
            RegistryModel::Achievement(achievement) => Some(achievement),
            RegistryModel::Game(_) => None,
        }
    }
}

impl Selection for RegistryOptions {
    type Model = RegistryModel;

    const TOPIC: &'static str = "registry";

    fn clauses(&self, namespace: &str) -> Vec<Clause> {
        let mut clauses = Vec::new();
        if self.game {
            clauses.push(Clause::model(namespace, GAME_MODEL));
        }
        if self.achievement {
            clauses.push(Clause::model(namespace, ACHIEVEMENT_MODEL));
        }
        clauses
    }

    fn is_queryable(&self) -> bool {
        self.game || self.achievement
    }

    fn discriminate(entity: &Entity, namespace: &str) -> Vec<Result<RegistryModel, ParseError>> {
        let mut models = Vec::new();
        if let Some(fields) = entity.model(namespace, ACHIEVEMENT_MODEL) {
            models.push(AchievementModel::parse(entity, fields).map(RegistryModel::Achievement));
        }
        if let Some(fields) = entity.model(namespace, GAME_MODEL) {
            models.push(GameModel::parse(entity, fields).map(RegistryModel::Game));
        }
        models
    }
}
