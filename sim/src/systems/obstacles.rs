//! Obstacle field - lane layout, wraparound motion and the per-tick map.

use crate::components::{Direction, GridDims, Obstacle};
use crate::config::SimConfig;
use crate::grid::{build_cost_map, GameMap};
use bevy_ecs::prelude::*;

/// Lay out the alternating obstacle lanes.
///
/// Lanes sit on every other row from row 1 up to `rows - 2`. Each lane holds
/// one obstacle every 4 columns; lanes with `row % 4 == 1` run right and are
/// offset by `(j + row) % cols`, the others run left and are offset by
/// `(cols - 1 - j - row) mod cols`.
pub fn create_obstacles(dims: GridDims) -> Vec<Obstacle> {
    let mut obstacles = Vec::new();
    if dims.cols == 0 {
        return obstacles;
    }
    let cols = dims.cols as i64;

    for row in (1..dims.rows.saturating_sub(1)).step_by(2) {
        let direction = Direction::for_lane(row);
        for j in (0..dims.cols).step_by(4) {
            let offset = match direction {
                Direction::Right => (j as i64 + row as i64).rem_euclid(cols),
                Direction::Left => (cols - 1 - j as i64 - row as i64).rem_euclid(cols),
            };
            obstacles.push(Obstacle::new(row, offset as usize, direction, 1));
        }
    }
    obstacles
}

/// Advance every obstacle one tick.
pub fn advance_obstacles(obstacles: &mut [Obstacle], cols: usize) {
    for obstacle in obstacles {
        obstacle.advance(cols);
    }
}

/// System that moves every obstacle along its lane.
pub fn obstacle_motion_system(dims: Res<GridDims>, mut query: Query<&mut Obstacle>) {
    for mut obstacle in query.iter_mut() {
        obstacle.advance(dims.cols);
    }
}

/// System that rebuilds the game map from the current obstacle positions.
pub fn cost_map_system(
    dims: Res<GridDims>,
    config: Res<SimConfig>,
    query: Query<&Obstacle>,
    mut map: ResMut<GameMap>,
) {
    *map = build_cost_map(query.iter(), *dims, config.penalty_enabled);
}
