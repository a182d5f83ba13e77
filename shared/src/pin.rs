use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::{FieldReader, Fields, ParseError};

pub const PIN_MODEL: &str = "TrophyPinning";

/// A player pinning (or unpinning, `time == 0`) one of their trophies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PinEvent {
    pub player_id: String,
    pub achievement_id: String,
    pub time: u64,
}

impl PinEvent {
    pub fn parse(fields: &Fields) -> Result<Self, ParseError> {
        let reader = FieldReader::new(PIN_MODEL, fields);
        Ok(Self {
            player_id: reader.required_string("player_id")?,
            achievement_id: reader.required_string("achievement_id")?,
            time: reader.required_u64("time")?,
        })
    }

    pub fn is_unpin(&self) -> bool {
        self.time == 0
    }

    pub fn pinned_at(&self) -> Option<DateTime<Utc>> {
        if self.is_unpin() {
            return None;
        }
        i64::try_from(self.time)
            .ok()
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
    }
}
