//! The level context object.
//!
//! A [`LevelInstance`] owns everything that exists for the lifetime of one
//! level: the board placement and its grid, the placement modules of every
//! level actor, and the registry that replicates them. Gameplay code gets it
//! passed in explicitly.

// Part of this API is only driven by gameplay code and tests, not by main().
#![allow(dead_code)]

use level_component::{ActorType, MapComponent, MapComponentArena, MapHandle};
use level_math::{
    Cell, Cells, GridFrame, Placement, Vec3, cell_array_nearest, corner_cells,
    make_grid_from_placement, rescale_cell_to_grid,
};
use level_registry::MapRegistry;
use tracing::{debug, info, warn};

/// One running level.
#[derive(Debug)]
pub struct LevelInstance {
    board: Placement,
    grid: Cells,
    frame: Option<GridFrame>,
    modules: MapComponentArena,
    registry: MapRegistry,
}

impl LevelInstance {
    /// Creates a level with an empty board described by `board`.
    #[must_use]
    pub fn new(board: Placement) -> Self {
        let grid = make_grid_from_placement(&board);
        let frame = GridFrame::from_cells(&grid);
        info!(
            columns = board.columns(),
            rows = board.rows(),
            yaw = board.yaw_degrees(),
            cells = grid.len(),
            "level created"
        );
        Self {
            board,
            grid,
            frame,
            modules: MapComponentArena::new(),
            registry: MapRegistry::new(),
        }
    }

    #[must_use]
    pub fn board(&self) -> &Placement {
        &self.board
    }

    #[must_use]
    pub fn grid(&self) -> &Cells {
        &self.grid
    }

    /// Frame of the current grid, `None` while the board has no cells.
    #[must_use]
    pub fn grid_frame(&self) -> Option<&GridFrame> {
        self.frame.as_ref()
    }

    #[must_use]
    pub fn registry(&self) -> &MapRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut MapRegistry {
        &mut self.registry
    }

    #[must_use]
    pub fn modules(&self) -> &MapComponentArena {
        &self.modules
    }

    /// Grid cell nearest to a world location. Off-board locations resolve to
    /// the closest edge cell; on an empty board the location is snapped to
    /// the pitch.
    #[must_use]
    pub fn nearest_cell(&self, location: Vec3) -> Cell {
        let cell = Cell::new(location);
        if self.grid.is_empty() {
            return cell.snap();
        }
        cell_array_nearest(&self.grid, cell)
    }

    /// Places a new actor on the grid cell nearest `location` and registers
    /// it.
    pub fn spawn_actor(&mut self, actor_type: ActorType, location: Vec3) -> MapHandle {
        let mut module = MapComponent::new(&Placement::from_position(location), actor_type);
        // Cells of a rotated board are off the pitch the module snaps to.
        if !self.grid.contains(&module.cell()) {
            module.set_cell(self.nearest_cell(location));
        }

        let handle = self.modules.insert(module);
        if self.registry.emplace(&self.modules, handle).is_none() {
            warn!(%handle, "spawned module was not registered");
        }
        debug!(%handle, %actor_type, cell = %module.cell(), "actor spawned");
        handle
    }

    /// Moves an actor to the grid cell nearest `location`, updating its
    /// module and its registry entry together. Returns `false` for an actor
    /// that does not exist.
    pub fn move_actor(&mut self, handle: MapHandle, location: Vec3) -> bool {
        if !self.modules.contains(handle) {
            return false;
        }

        let cell = self.nearest_cell(location);
        self.registry.set_cell(handle, cell, &mut self.modules)
    }

    /// Removes an actor from the registry and frees its module.
    pub fn destroy_actor(&mut self, handle: MapHandle) -> bool {
        self.registry.remove(handle);
        let destroyed = self.modules.remove(handle).is_some();
        if destroyed {
            debug!(%handle, "actor destroyed");
        }
        destroyed
    }

    /// The actor standing on `cell`, if any.
    #[must_use]
    pub fn actor_at(&self, cell: Cell) -> Option<MapHandle> {
        self.registry.find_by_cell(cell).map(|entry| entry.module())
    }

    /// Grid cells no actor stands on.
    #[must_use]
    pub fn empty_cells(&self) -> Cells {
        self.registry.empty_cells(&self.grid)
    }

    /// Replaces the board and carries every actor over to the new grid by
    /// its relative position between the corners, snapped to the nearest
    /// cell of the new grid.
    pub fn resize_board(&mut self, board: Placement) {
        let original = corner_cells(&self.grid);
        let grid = make_grid_from_placement(&board);
        let target = corner_cells(&grid);

        let moves: Vec<(MapHandle, Cell)> = self
            .modules
            .iter()
            .map(|(handle, module)| {
                let rescaled = rescale_cell_to_grid(module.cell(), &original, &target);
                let cell = if rescaled.is_valid() {
                    cell_array_nearest(&grid, rescaled)
                } else {
                    cell_array_nearest(&grid, module.cell())
                };
                (handle, cell)
            })
            .collect();

        self.frame = GridFrame::from_cells(&grid);
        self.grid = grid;
        self.board = board;

        for &(handle, cell) in &moves {
            if cell.is_valid() {
                self.registry.set_cell(handle, cell, &mut self.modules);
            }
        }

        info!(
            columns = board.columns(),
            rows = board.rows(),
            actors = moves.len(),
            "board resized"
        );
    }

    /// Places the classic layout: a wall on every cell with odd column and
    /// odd row, and a player in each corner.
    pub fn seed_default_actors(&mut self) {
        let Some(frame) = self.frame else {
            return;
        };

        let size = frame.size();
        let mut walls = Vec::new();
        for row in (1..size.y).step_by(2) {
            for column in (1..size.x).step_by(2) {
                let cell = frame.cell_at(column, row, &self.grid);
                if cell.is_valid() {
                    walls.push(cell);
                }
            }
        }
        let corners = frame.corners(&self.grid).to_array();

        for cell in &walls {
            self.spawn_actor(ActorType::Wall, cell.location());
        }
        for cell in corners {
            if self.actor_at(cell).is_none() {
                self.spawn_actor(ActorType::Player, cell.location());
            }
        }
        info!(walls = walls.len(), actors = self.registry.len(), "level seeded");
    }

    /// Ends the level: clears the registry and drops every module.
    pub fn end(&mut self) {
        self.registry.clear();
        self.modules.clear();
        info!("level ended");
    }
}

#[cfg(test)]
mod tests {
    use level_component::ActorTypeMask;
    use level_math::{CornerKind, IVec2, cell_by_corner, grid_position_by_cell};

    use super::*;

    fn level(columns: u32, rows: u32) -> LevelInstance {
        LevelInstance::new(Placement::board(Vec3::ZERO, 0.0, columns, rows))
    }

    fn assert_module_matches_registry(level: &LevelInstance) {
        for entry in level.registry().entries() {
            let module = level.modules().get(entry.module()).unwrap();
            assert_eq!(module.cell(), entry.cell());
        }
    }

    #[test]
    fn test_spawn_snaps_to_grid() {
        let mut level = level(5, 5);
        let h = level.spawn_actor(ActorType::Box, Vec3::new(190.0, -230.0, 0.0));
        let cell = level.registry().find(h).unwrap().cell();
        assert_eq!(cell, Cell::from_xyz(200.0, -200.0, 0.0));
        assert!(level.grid().contains(&cell));
        assert_module_matches_registry(&level);
    }

    #[test]
    fn test_spawn_off_board_lands_on_edge() {
        let mut level = level(3, 3);
        let h = level.spawn_actor(ActorType::Item, Vec3::new(5000.0, 0.0, 0.0));
        assert_eq!(
            level.modules().get(h).unwrap().cell(),
            Cell::from_xyz(200.0, 0.0, 0.0)
        );
    }

    #[test]
    fn test_spawn_on_rotated_board_uses_members() {
        let mut level = LevelInstance::new(Placement::board(Vec3::ZERO, 30.0, 4, 4));
        for cell in level.grid().clone() {
            let h = level.spawn_actor(ActorType::Box, cell.location());
            assert_eq!(level.modules().get(h).unwrap().cell(), cell);
        }
        assert!(level.empty_cells().is_empty());
    }

    #[test]
    fn test_even_off_pitch_board_needs_no_fallback() {
        let mut level = LevelInstance::new(Placement::board(Vec3::new(130.0, -70.0, 0.0), 0.0, 4, 2));
        assert_eq!(level.grid().len(), 15);
        for cell in level.grid().clone() {
            let module = MapComponent::new(&Placement::from_position(cell.location()), ActorType::Box);
            assert_eq!(module.cell(), cell);
            level.spawn_actor(ActorType::Box, cell.location());
        }
        assert!(level.empty_cells().is_empty());
    }

    #[test]
    fn test_move_actor_updates_module_and_registry() {
        let mut level = level(5, 5);
        let h = level.spawn_actor(ActorType::Player, Vec3::ZERO);
        let version = level.registry().version();

        assert!(level.move_actor(h, Vec3::new(0.0, 400.0, 0.0)));
        assert_eq!(level.modules().get(h).unwrap().cell(), Cell::from_xyz(0.0, 400.0, 0.0));
        assert_eq!(level.actor_at(Cell::from_xyz(0.0, 400.0, 0.0)), Some(h));
        assert_eq!(level.actor_at(Cell::ZERO), None);
        assert!(level.registry().version() > version);
    }

    #[test]
    fn test_move_missing_actor() {
        let mut level = level(3, 3);
        assert!(!level.move_actor(MapHandle::INVALID, Vec3::ZERO));
    }

    #[test]
    fn test_destroy_actor() {
        let mut level = level(3, 3);
        let h = level.spawn_actor(ActorType::Bomb, Vec3::ZERO);
        assert!(level.destroy_actor(h));
        assert!(!level.registry().contains_module(h));
        assert!(!level.modules().contains(h));
        assert!(!level.destroy_actor(h));
    }

    #[test]
    fn test_resize_keeps_relative_positions() {
        let mut level = level(3, 3);
        let tl = cell_by_corner(CornerKind::TopLeft, level.grid());
        let br = cell_by_corner(CornerKind::BottomRight, level.grid());
        let corner = level.spawn_actor(ActorType::Player, tl.location());
        let far = level.spawn_actor(ActorType::Player, br.location());
        let centre = level.spawn_actor(ActorType::Wall, Vec3::ZERO);

        level.resize_board(Placement::board(Vec3::ZERO, 0.0, 5, 5));

        let grid = level.grid().clone();
        let position = |h| grid_position_by_cell(level.modules().get(h).unwrap().cell(), &grid);
        assert_eq!(position(corner), IVec2::new(0, 0));
        assert_eq!(position(far), IVec2::new(4, 4));
        assert_eq!(position(centre), IVec2::new(2, 2));
        assert_module_matches_registry(&level);
    }

    #[test]
    fn test_resize_snaps_to_new_members() {
        let mut level = level(3, 3);
        for cell in level.grid().clone() {
            level.spawn_actor(ActorType::Box, cell.location());
        }
        level.resize_board(Placement::board(Vec3::new(100.0, 100.0, 0.0), 0.0, 4, 4));
        for entry in level.registry().entries() {
            assert!(level.grid().contains(&entry.cell()));
        }
        assert_module_matches_registry(&level);
    }

    #[test]
    fn test_seed_default_actors() {
        let mut level = level(5, 5);
        level.seed_default_actors();
        let walls = level.registry().cells_with_actors(ActorType::Wall.into());
        let players = level.registry().cells_with_actors(ActorType::Player.into());
        assert_eq!(walls.len(), 4);
        assert_eq!(players.len(), 4);
        assert_eq!(level.empty_cells().len(), 25 - 8);
        assert!(level.registry().cells_with_actors(ActorTypeMask::ALL).len() == 8);
    }

    #[test]
    fn test_end_clears_everything() {
        let mut level = level(5, 5);
        level.seed_default_actors();
        level.end();
        assert!(level.registry().is_empty());
        assert!(level.modules().is_empty());
        assert_eq!(level.grid().len(), 25);
    }
}
