//! # level_math
//!
//! Spatial arithmetic for the level board. Re-exports [`glam`] for linear
//! algebra and defines the board-specific value types:
//!
//! - [`Cell`]: a board location quantised to whole world units.
//! - [`Placement`]: position, rotation and scale of a board or actor.
//! - [`grid`]: grid construction from a placement and the queries that
//!   address cells by column/row, corner and transform.
//!
//! Everything in this crate is pure and may be shared freely across threads.

pub mod cell;
pub mod grid;
pub mod placement;

// Re-export glam types for convenience.
pub use glam::{EulerRot, IVec2, Quat, Vec2, Vec3};

pub use cell::{CELL_SIZE, Cell, CellDirection, CellDistance, cell_array_average, cell_array_nearest};
pub use grid::{
    CornerCells, CornerKind, Cells, GridFrame, INVALID_POSITION, array_rotation, array_size,
    array_transform, cell_by_corner, cell_by_grid_position, corner_cells, grid_center_position,
    grid_position_by_cell, make_grid_from_placement, nearest_corner_cell, rescale_cell_to_grid,
};
pub use placement::Placement;
