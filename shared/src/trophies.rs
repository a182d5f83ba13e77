use crate::achievement::AchievementModel;

pub const HIDDEN_GROUP: &str = "Hidden";

#[derive(Debug, Clone, PartialEq)]
pub struct TrophyGroup<'a> {
    pub name: String,
    pub items: Vec<&'a AchievementModel>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinControl {
    pub pinned: bool,
    pub disabled: bool,
}

/// Group achievements for display.
///
/// Hidden achievements the player has not completed yet go to [`HIDDEN_GROUP`], which always
/// comes last and is ordered by points. Every other group keeps first-seen order and is
/// ordered by `(index, id)`.
pub fn group_trophies(achievements: &[AchievementModel]) -> Vec<TrophyGroup<'_>> {
    let mut groups: Vec<TrophyGroup<'_>> = Vec::new();
    let mut hidden: Vec<&AchievementModel> = Vec::new();

    for achievement in achievements {
        let name = if achievement.hidden && !achievement.completed {
            HIDDEN_GROUP
        } else {
            achievement.group.as_str()
        };
        if name == HIDDEN_GROUP {
            hidden.push(achievement);
            continue;
        }
        match groups.iter_mut().find(|group| group.name == name) {
            Some(group) => group.items.push(achievement),
            None => groups.push(TrophyGroup {
                name: name.to_string(),
                items: vec![achievement],
            }),
        }
    }

    for group in &mut groups {
        group
            .items
            .sort_by(|a, b| a.index.cmp(&b.index).then_with(|| a.id.cmp(&b.id)));
    }

    if !hidden.is_empty() {
        hidden.sort_by(|a, b| {
            a.points
                .cmp(&b.points)
                .then_with(|| a.index.cmp(&b.index))
                .then_with(|| a.id.cmp(&b.id))
        });
        groups.push(TrophyGroup {
            name: HIDDEN_GROUP.to_string(),
            items: hidden,
        });
    }

    groups
}

/// Only completed trophies count as pinned, whatever the pin feed says.
pub fn is_pinned(pinned_ids: &[String], achievement: &AchievementModel) -> bool {
    achievement.completed && pinned_ids.iter().any(|id| *id == achievement.id)
}

/// Pin toggle for one trophy card. Soft views and incomplete trophies get no control; pinning
/// new trophies is disabled unless `enabled`, but unpinning is always allowed.
pub fn pin_control(
    achievement: &AchievementModel,
    pinned_ids: &[String],
    softview: bool,
    enabled: bool,
) -> Option<PinControl> {
    if softview || !achievement.completed {
        return None;
    }
    let pinned = is_pinned(pinned_ids, achievement);
    Some(PinControl {
        pinned,
        disabled: !pinned && !enabled,
    })
}
