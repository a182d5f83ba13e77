use std::collections::BTreeMap;

use arcade_shared::{PinEvent, SocialModel, pad_address};

/// Pinned achievement ids per player, keyed by padded player address.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PinsProjection {
    by_player: BTreeMap<String, Vec<String>>,
}

impl PinsProjection {
    /// Fold a batch of social models. Returns whether any player's pins changed.
    pub fn apply(&mut self, models: &[SocialModel]) -> bool {
        let mut changed = false;
        for model in models {
            match model {
                SocialModel::Pin(event) => changed |= self.apply_event(event),
            }
        }
        changed
    }

    /// Unpins drop every occurrence of the id; pins add it once. Events apply in arrival order.
    pub fn apply_event(&mut self, event: &PinEvent) -> bool {
        let player = pad_address(&event.player_id);
        if event.is_unpin() {
            let Some(pinned) = self.by_player.get_mut(&player) else {
                return false;
            };
            let before = pinned.len();
            pinned.retain(|id| *id != event.achievement_id);
            return pinned.len() != before;
        }
        let pinned = self.by_player.entry(player).or_default();
        if pinned.contains(&event.achievement_id) {
            return false;
        }
        pinned.push(event.achievement_id.clone());
        true
    }

    pub fn pinned_by(&self, address: &str) -> &[String] {
        self.by_player
            .get(&pad_address(address))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn players(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.by_player
            .iter()
            .map(|(player, pinned)| (player.as_str(), pinned.as_slice()))
    }

    pub fn is_empty(&self) -> bool {
        self.by_player.values().all(Vec::is_empty)
    }
}

#[cfg(test)]
mod tests {
    use arcade_shared::{PinEvent, SocialModel};

    use super::PinsProjection;

    const PLAYER: &str = "0x0000000000000000000000000000000000000000000000000000000000000abc";

    fn pin(achievement: &str, time: u64) -> PinEvent {
        PinEvent {
            player_id: PLAYER.to_string(),
            achievement_id: achievement.to_string(),
            time,
        }
    }

    #[test]
    fn unpin_removes_the_achievement() {
        let mut pins = PinsProjection::default();
        pins.apply(&[
            SocialModel::Pin(pin("A", 10)),
            SocialModel::Pin(pin("B", 11)),
        ]);
        assert_eq!(pins.pinned_by(PLAYER), ["A", "B"]);

        assert!(pins.apply_event(&pin("B", 0)));
        assert_eq!(pins.pinned_by(PLAYER), ["A"]);
        assert!(!pins.apply_event(&pin("B", 0)));
    }

    #[test]
    fn pinning_twice_keeps_one_entry() {
        let mut pins = PinsProjection::default();
        assert!(pins.apply_event(&pin("A", 10)));
        assert!(!pins.apply_event(&pin("A", 12)));
        assert_eq!(pins.pinned_by(PLAYER), ["A"]);
    }

    #[test]
    fn lookup_pads_the_address() {
        let mut pins = PinsProjection::default();
        pins.apply_event(&PinEvent {
            player_id: "0xABC".to_string(),
            achievement_id: "A".to_string(),
            time: 1,
        });
        assert_eq!(pins.pinned_by("0xabc"), ["A"]);
        assert_eq!(pins.pinned_by(PLAYER), ["A"]);
        assert!(pins.pinned_by("0xdef").is_empty());
        assert_eq!(pins.players().count(), 1);
    }

    #[test]
    fn unpin_for_unknown_player_is_a_no_op() {
        let mut pins = PinsProjection::default();
        assert!(!pins.apply_event(&pin("A", 0)));
        assert!(pins.is_empty());
        assert_eq!(pins, PinsProjection::default());
    }
}
