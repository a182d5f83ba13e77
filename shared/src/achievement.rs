use serde::{Deserialize, Serialize};

use crate::entity::{Entity, FieldReader, Fields, ParseError};

pub const ACHIEVEMENT_MODEL: &str = "Achievement";

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AchievementTask {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AchievementModel {
    pub identifier: String,
    pub id: String,
    pub group: String,
    /// Display order inside the group.
    pub index: u32,
    pub title: String,
    pub description: String,
    pub hidden: bool,
    pub completed: bool,
    pub percentage: f64,
    pub points: u64,
    pub icon: String,
    pub tasks: Vec<AchievementTask>,
    pub timestamp: u64,
}

impl AchievementModel {
    pub fn parse(entity: &Entity, fields: &Fields) -> Result<Self, ParseError> {
        let reader = FieldReader::new(ACHIEVEMENT_MODEL, fields);
        let index = u32::try_from(reader.u64("index")?).map_err(|e| ParseError::InvalidField {
            model: ACHIEVEMENT_MODEL,
            field: "index",
            reason: e.to_string(),
        })?;
        Ok(Self {
            identifier: entity.entity_id.clone(),
            id: reader.required_string("id")?,
            group: reader.string("group"),
            index,
            title: reader.string("title"),
            description: reader.string("description"),
            hidden: reader.bool("hidden")?,
            completed: reader.bool("completed")?,
            percentage: reader.f64("percentage")?,
            points: reader.u64("points")?,
            icon: reader.string("icon"),
            tasks: reader.json("tasks")?,
            timestamp: reader.u64("timestamp")?,
        })
    }
}
