//! Built-in gameplay driver: players wander the board.

use level_component::{ActorType, MapHandle};
use level_math::IVec2;

use crate::level::LevelInstance;

/// Ticks between two player steps.
pub const STEP_INTERVAL: u64 = 15;

const STEPS: [IVec2; 4] = [IVec2::X, IVec2::Y, IVec2::NEG_X, IVec2::NEG_Y];

/// Every [`STEP_INTERVAL`] ticks each player steps to a free neighbouring
/// cell, trying the four directions in a rotating order.
pub fn wander_players(level: &mut LevelInstance, tick_id: u64) {
    if tick_id == 0 || tick_id % STEP_INTERVAL != 0 {
        return;
    }
    let Some(frame) = level.grid_frame().copied() else {
        return;
    };

    let players: Vec<MapHandle> = level
        .registry()
        .modules_with_actors(ActorType::Player.into())
        .collect();
    let turn = (tick_id / STEP_INTERVAL) as usize;

    for (offset, player) in players.into_iter().enumerate() {
        let Some(current) = level.modules().get(player).map(|module| module.cell()) else {
            continue;
        };
        let position = frame.position_of(current, level.grid());

        let target = (0..STEPS.len())
            .map(|i| STEPS[(turn + offset + i) % STEPS.len()])
            .map(|step| frame.cell_at(position.x + step.x, position.y + step.y, level.grid()))
            .find(|cell| cell.is_valid() && level.actor_at(*cell).is_none());

        if let Some(cell) = target {
            level.move_actor(player, cell.location());
        }
    }
}
