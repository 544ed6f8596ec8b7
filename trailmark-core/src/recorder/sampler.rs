//! Step sampling: world + input -> observation record

use super::ObservationRecord;
use crate::input::MoveDirection;
use crate::world::{PoiCategory, Position, Scene, nearest_of};

/// Proximity flag per category, indexed by [`PoiCategory::flag_index`].
///
/// A flag is set iff that category's nearest active point lies strictly
/// within its radius.
pub fn proximity_flags(position: &Position, scene: &Scene) -> [bool; 3] {
    let mut flags = [false; 3];
    for category in PoiCategory::ALL {
        if !scene.is_category_active(category) {
            continue;
        }
        flags[category.flag_index()] =
            nearest_of(position, scene.active_points(), category).is_near();
    }
    flags
}

/// Reward for a tick: the highest-valued category in range while sitting.
///
/// Categories are a priority order, never summed.
pub fn reward_for(sit: bool, flags: &[bool; 3]) -> f64 {
    if !sit {
        return 0.0;
    }
    PoiCategory::ALL
        .iter()
        .filter(|c| flags[c.flag_index()])
        .map(|c| c.reward_value())
        .fold(0.0, f64::max)
}

/// Sample one tick. Pure: holds no memory of earlier ticks.
pub fn sample(
    position: &Position,
    movement: MoveDirection,
    sit: bool,
    scene: &Scene,
) -> ObservationRecord {
    let flags = proximity_flags(position, scene);
    let as_f64 = |b: bool| if b { 1.0 } else { 0.0 };

    let mut state = Vec::with_capacity(2 + flags.len());
    state.push(position.x);
    state.push(position.z);
    state.extend(flags.iter().copied().map(as_f64));

    ObservationRecord {
        state,
        action: vec![movement.as_f64(), as_f64(sit)],
        reward: reward_for(sit, &flags),
    }
}
