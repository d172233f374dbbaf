//! Grid construction and cell addressing.
//!
//! A grid is a plain set of [`Cells`]. It is built from a board
//! [`Placement`] by [`make_grid_from_placement`], but every query below works
//! from the member cells alone, so a grid that arrived without its placement
//! (for example after deserialisation) is still fully addressable.
//!
//! Queries recover a [`GridFrame`] from the cells: the pivot, the yaw and
//! the column/row extent. The yaw is only known modulo 90°, so a board
//! rotated by a quarter turn reports its columns and rows swapped. Column
//! indices grow along the frame's local +X axis and row indices along its
//! local +Y axis; the top-left corner is column 0, row 0.
//!
//! Every cell a query returns is a member of the queried set.

use std::collections::HashSet;
use std::f32::consts::FRAC_PI_2;

use glam::{IVec2, Quat, Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::cell::{CELL_SIZE, Cell, cell_array_nearest};
use crate::placement::Placement;

/// A set of unique cells.
pub type Cells = HashSet<Cell>;

/// Returned for a cell that is not on the grid.
pub const INVALID_POSITION: IVec2 = IVec2::new(-1, -1);

/// Frames whose yaw lands this close below 90° are folded back towards 0°.
const YAW_TOLERANCE: f32 = 1e-3;

/// One of the four corners of a grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CornerKind {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl CornerKind {
    /// All four corners.
    pub const ALL: [CornerKind; 4] = [
        CornerKind::TopLeft,
        CornerKind::TopRight,
        CornerKind::BottomLeft,
        CornerKind::BottomRight,
    ];
}

/// The four corner cells of a grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CornerCells {
    pub top_left: Cell,
    pub top_right: Cell,
    pub bottom_left: Cell,
    pub bottom_right: Cell,
}

impl CornerCells {
    /// Corners of an empty grid.
    pub const INVALID: CornerCells = CornerCells {
        top_left: Cell::INVALID,
        top_right: Cell::INVALID,
        bottom_left: Cell::INVALID,
        bottom_right: Cell::INVALID,
    };

    /// Returns the corner cell of the given kind.
    #[must_use]
    pub fn get(&self, kind: CornerKind) -> Cell {
        match kind {
            CornerKind::TopLeft => self.top_left,
            CornerKind::TopRight => self.top_right,
            CornerKind::BottomLeft => self.bottom_left,
            CornerKind::BottomRight => self.bottom_right,
        }
    }

    /// Returns the corners in [`CornerKind::ALL`] order.
    #[must_use]
    pub fn to_array(&self) -> [Cell; 4] {
        CornerKind::ALL.map(|kind| self.get(kind))
    }

    /// Returns `true` when every corner is a real cell.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.to_array().iter().all(Cell::is_valid)
    }
}

/// The frame of a grid recovered from its member cells.
///
/// Building a frame is linear in the number of cells; callers that run many
/// queries against the same grid should build it once with
/// [`GridFrame::from_cells`] and reuse it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridFrame {
    /// Centroid of the member cells; local coordinates are relative to it.
    pivot: Vec3,
    /// Canonical yaw in radians, in `[-YAW_TOLERANCE, 90°)`.
    yaw: f32,
    /// Local coordinates of the column 0 / row 0 corner.
    min: Vec2,
    columns: i32,
    rows: i32,
}

impl GridFrame {
    /// Recover the frame of a grid. Returns `None` for an empty set.
    #[must_use]
    pub fn from_cells(cells: &Cells) -> Option<Self> {
        if cells.is_empty() {
            return None;
        }

        let sum: Vec3 = cells.iter().map(Cell::location).sum();
        let pivot = sum / cells.len() as f32;
        let yaw = canonical_yaw(cells);
        let inverse = Quat::from_rotation_z(-yaw);

        let mut min = Vec2::splat(f32::INFINITY);
        let mut max = Vec2::splat(f32::NEG_INFINITY);
        for cell in cells {
            let local = (inverse * (cell.location() - pivot)).truncate();
            min = min.min(local);
            max = max.max(local);
        }

        let extent = ((max - min) / CELL_SIZE).round();
        Some(Self {
            pivot,
            yaw,
            min,
            columns: extent.x as i32 + 1,
            rows: extent.y as i32 + 1,
        })
    }

    /// Column and row count.
    #[must_use]
    pub fn size(&self) -> IVec2 {
        IVec2::new(self.columns, self.rows)
    }

    /// Rotation of the grid around the world Z axis.
    #[must_use]
    pub fn rotation(&self) -> Quat {
        Quat::from_rotation_z(self.yaw)
    }

    /// A board placement that reproduces this grid through
    /// [`make_grid_from_placement`].
    #[must_use]
    pub fn transform(&self) -> Placement {
        let span = Vec2::new((self.columns - 1) as f32, (self.rows - 1) as f32) * CELL_SIZE;
        let middle = (self.min + span * 0.5).extend(0.0);
        Placement {
            position: self.pivot + self.rotation() * middle,
            rotation: self.rotation(),
            scale: Vec3::new(self.columns as f32, self.rows as f32, 1.0),
        }
    }

    /// Column/row position of `cell`, or [`INVALID_POSITION`] if it is not
    /// a member of `cells`.
    #[must_use]
    pub fn position_of(&self, cell: Cell, cells: &Cells) -> IVec2 {
        if !cells.contains(&cell) {
            return INVALID_POSITION;
        }
        self.local_position(cell)
    }

    /// The member cell at the given column and row, or [`Cell::INVALID`].
    #[must_use]
    pub fn cell_at(&self, column: i32, row: i32, cells: &Cells) -> Cell {
        let position = IVec2::new(column, row);
        if !self.in_bounds(position) {
            return Cell::INVALID;
        }

        let local = self.min + position.as_vec2() * CELL_SIZE;
        let guess = Cell::new(self.pivot + self.rotation() * local.extend(0.0));
        if cells.contains(&guess) {
            return guess;
        }

        // Quantisation on rotated boards can land one unit off the member.
        cells
            .iter()
            .copied()
            .filter(|cell| self.local_position(*cell) == position)
            .min()
            .unwrap_or(Cell::INVALID)
    }

    /// Integer position nearest the geometric centre.
    #[must_use]
    pub fn center_position(&self) -> IVec2 {
        IVec2::new((self.columns - 1) / 2, (self.rows - 1) / 2)
    }

    /// The member cells closest to each of the four extreme positions.
    #[must_use]
    pub fn corners(&self, cells: &Cells) -> CornerCells {
        let last = self.size() - IVec2::ONE;
        CornerCells {
            top_left: self.closest_member(IVec2::ZERO, cells),
            top_right: self.closest_member(IVec2::new(last.x, 0), cells),
            bottom_left: self.closest_member(IVec2::new(0, last.y), cells),
            bottom_right: self.closest_member(last, cells),
        }
    }

    fn in_bounds(&self, position: IVec2) -> bool {
        position.x >= 0 && position.y >= 0 && position.x < self.columns && position.y < self.rows
    }

    fn local_position(&self, cell: Cell) -> IVec2 {
        let inverse = Quat::from_rotation_z(-self.yaw);
        let local = (inverse * (cell.location() - self.pivot)).truncate();
        ((local - self.min) / CELL_SIZE).round().as_ivec2()
    }

    fn closest_member(&self, target: IVec2, cells: &Cells) -> Cell {
        cells
            .iter()
            .copied()
            .min_by(|a, b| {
                let da = (self.local_position(*a) - target).abs().element_sum();
                let db = (self.local_position(*b) - target).abs().element_sum();
                da.cmp(&db).then_with(|| a.cmp(b))
            })
            .unwrap_or(Cell::INVALID)
    }
}

/// Yaw of the grid, folded into `[0°, 90°)`, measured from the smallest
/// member to its nearest neighbour.
fn canonical_yaw(cells: &Cells) -> f32 {
    let Some(reference) = cells.iter().copied().min() else {
        return 0.0;
    };

    let neighbour = cells
        .iter()
        .copied()
        .filter(|cell| *cell != reference)
        .min_by(|a, b| {
            let da = a.location().distance_squared(reference.location());
            let db = b.location().distance_squared(reference.location());
            da.total_cmp(&db).then_with(|| a.cmp(b))
        });

    let Some(neighbour) = neighbour else {
        return 0.0;
    };

    let direction = neighbour.location() - reference.location();
    let yaw = direction.y.atan2(direction.x).rem_euclid(FRAC_PI_2);
    if FRAC_PI_2 - yaw < YAW_TOLERANCE {
        yaw - FRAC_PI_2
    } else {
        yaw
    }
}

/// Build the full rectangular grid described by a board placement.
///
/// The placement's position, snapped to the pitch, is the grid centre. Its
/// yaw is the grid orientation and its horizontal scale gives the column and
/// row counts, which [`Placement::columns`] keeps odd so the centre is
/// always a member. Offsets from the centre are whole pitch multiples,
/// which puts every cell of an axis-aligned board on the pitch.
#[must_use]
pub fn make_grid_from_placement(placement: &Placement) -> Cells {
    let columns = placement.columns();
    let rows = placement.rows();
    let centre = Cell::new(placement.position).snap().location();
    let rotation = Quat::from_rotation_z(placement.yaw_radians());
    let half = IVec2::new(columns / 2, rows / 2);

    let mut cells = Cells::with_capacity((columns * rows) as usize);
    for row in 0..rows {
        for column in 0..columns {
            let offset = (IVec2::new(column, row) - half).as_vec2() * CELL_SIZE;
            cells.insert(Cell::new(centre + rotation * offset.extend(0.0)));
        }
    }
    cells
}

/// The cell at `column`/`row` counted from the top-left corner, or
/// [`Cell::INVALID`] if there is none.
#[must_use]
pub fn cell_by_grid_position(column: i32, row: i32, cells: &Cells) -> Cell {
    GridFrame::from_cells(cells).map_or(Cell::INVALID, |frame| frame.cell_at(column, row, cells))
}

/// Column/row position of `cell`, or [`INVALID_POSITION`] if it is not a
/// member.
#[must_use]
pub fn grid_position_by_cell(cell: Cell, cells: &Cells) -> IVec2 {
    GridFrame::from_cells(cells).map_or(INVALID_POSITION, |frame| frame.position_of(cell, cells))
}

/// Column/row position nearest the grid centre, or [`INVALID_POSITION`] for
/// an empty grid.
#[must_use]
pub fn grid_center_position(cells: &Cells) -> IVec2 {
    GridFrame::from_cells(cells).map_or(INVALID_POSITION, |frame| frame.center_position())
}

/// The four corner cells of a grid. All four are members of `cells`.
#[must_use]
pub fn corner_cells(cells: &Cells) -> CornerCells {
    GridFrame::from_cells(cells).map_or(CornerCells::INVALID, |frame| frame.corners(cells))
}

/// A single corner cell of a grid.
#[must_use]
pub fn cell_by_corner(kind: CornerKind, cells: &Cells) -> Cell {
    corner_cells(cells).get(kind)
}

/// The corner cell closest to `cell`.
#[must_use]
pub fn nearest_corner_cell(cells: &Cells, cell: Cell) -> Cell {
    let corners: Cells = corner_cells(cells)
        .to_array()
        .into_iter()
        .filter(Cell::is_valid)
        .collect();
    cell_array_nearest(&corners, cell)
}

/// Re-target `cell` from one grid onto another by its relative position.
///
/// The cell's offset from the original top-left corner is measured along
/// the grid's own axes, top-left → top-right and top-left → bottom-left,
/// as a fraction of each edge. The fractions are then laid along the
/// matching edges of the new grid, so rotated boards map the same way as
/// axis-aligned ones. A degenerate edge contributes nothing.
///
/// The result is quantised but **not** snapped to any grid; snap it (or look
/// up the nearest member) before using it as a set key.
#[must_use]
pub fn rescale_cell_to_grid(cell: Cell, original: &CornerCells, new: &CornerCells) -> Cell {
    if !cell.is_valid() || !original.is_valid() || !new.is_valid() {
        return Cell::INVALID;
    }

    let from_origin = original.top_left.location();
    let from_across = original.top_right.location() - from_origin;
    let from_down = original.bottom_left.location() - from_origin;

    let to_origin = new.top_left.location();
    let to_across = new.top_right.location() - to_origin;
    let to_down = new.bottom_left.location() - to_origin;

    let offset = cell.location() - from_origin;
    let across = edge_fraction(offset, from_across);
    let down = edge_fraction(offset, from_down);
    Cell::new(to_origin + to_across * across + to_down * down)
}

/// Projection of `offset` onto `edge` as a fraction of the edge's length.
fn edge_fraction(offset: Vec3, edge: Vec3) -> f32 {
    let length_squared = edge.length_squared();
    if length_squared == 0.0 {
        0.0
    } else {
        offset.dot(edge) / length_squared
    }
}

/// Placement derived purely from the member cells; identity for an empty
/// grid.
#[must_use]
pub fn array_transform(cells: &Cells) -> Placement {
    GridFrame::from_cells(cells).map_or(Placement::IDENTITY, |frame| frame.transform())
}

/// Grid rotation derived from the member cells; identity for an empty grid.
#[must_use]
pub fn array_rotation(cells: &Cells) -> Quat {
    GridFrame::from_cells(cells).map_or(Quat::IDENTITY, |frame| frame.rotation())
}

/// Column and row count derived from the member cells; zero for an empty
/// grid.
#[must_use]
pub fn array_size(cells: &Cells) -> IVec2 {
    GridFrame::from_cells(cells).map_or(IVec2::ZERO, |frame| frame.size())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board(columns: u32, rows: u32) -> Cells {
        make_grid_from_placement(&Placement::board(Vec3::ZERO, 0.0, columns, rows))
    }

    #[test]
    fn test_make_grid_size() {
        let cells = board(5, 3);
        assert_eq!(cells.len(), 15);
        assert_eq!(array_size(&cells), IVec2::new(5, 3));
    }

    #[test]
    fn test_make_grid_odd_centre_is_member() {
        let cells = board(5, 5);
        assert!(cells.contains(&Cell::ZERO));
        assert_eq!(grid_center_position(&cells), IVec2::new(2, 2));
        assert_eq!(cell_by_grid_position(2, 2, &cells), Cell::ZERO);
    }

    #[test]
    fn test_make_grid_even_count_rounds_up_to_odd() {
        let cells = board(2, 1);
        let expected: Cells = [-200.0, 0.0, 200.0]
            .into_iter()
            .map(|x| Cell::from_xyz(x, 0.0, 0.0))
            .collect();
        assert_eq!(cells, expected);
        assert_eq!(array_size(&board(4, 6)), IVec2::new(5, 7));
    }

    #[test]
    fn test_make_grid_snaps_centre_to_pitch() {
        let placement = Placement::board(Vec3::new(150.0, -90.0, 30.0), 0.0, 3, 3);
        let cells = make_grid_from_placement(&placement);
        assert_eq!(cells.len(), 9);
        assert!(cells.contains(&Cell::from_xyz(200.0, 0.0, 0.0)));
        for cell in &cells {
            assert_eq!(cell.snap(), *cell);
        }
    }

    #[test]
    fn test_make_grid_is_deterministic() {
        let placement = Placement::board(Vec3::new(400.0, -200.0, 0.0), 33.0, 6, 4);
        assert_eq!(
            make_grid_from_placement(&placement),
            make_grid_from_placement(&placement)
        );
    }

    #[test]
    fn test_empty_placement_gives_empty_grid() {
        let cells = board(0, 4);
        assert!(cells.is_empty());
    }

    #[test]
    fn test_cell_by_grid_position_top_left() {
        let cells = board(3, 3);
        assert_eq!(
            cell_by_grid_position(0, 0, &cells),
            Cell::from_xyz(-200.0, -200.0, 0.0)
        );
        assert_eq!(
            cell_by_grid_position(2, 0, &cells),
            Cell::from_xyz(200.0, -200.0, 0.0)
        );
    }

    #[test]
    fn test_out_of_range_position_is_invalid() {
        let cells = board(3, 3);
        assert_eq!(cell_by_grid_position(3, 0, &cells), Cell::INVALID);
        assert_eq!(cell_by_grid_position(-1, 0, &cells), Cell::INVALID);
    }

    #[test]
    fn test_position_of_non_member() {
        let cells = board(3, 3);
        assert_eq!(
            grid_position_by_cell(Cell::from_xyz(1000.0, 0.0, 0.0), &cells),
            INVALID_POSITION
        );
    }

    #[test]
    fn test_grid_roundtrip_rotated() {
        let placement = Placement::board(Vec3::new(1000.0, 600.0, 0.0), 30.0, 7, 4);
        let cells = make_grid_from_placement(&placement);
        let frame = GridFrame::from_cells(&cells).unwrap();
        let size = frame.size();
        assert_eq!(size.x * size.y, 35);

        for column in 0..size.x {
            for row in 0..size.y {
                let cell = frame.cell_at(column, row, &cells);
                assert!(cells.contains(&cell));
                assert_eq!(frame.position_of(cell, &cells), IVec2::new(column, row));
            }
        }
    }

    #[test]
    fn test_corner_cells_axis_aligned() {
        let cells = board(5, 3);
        let corners = corner_cells(&cells);
        assert_eq!(corners.top_left, Cell::from_xyz(-400.0, -200.0, 0.0));
        assert_eq!(corners.top_right, Cell::from_xyz(400.0, -200.0, 0.0));
        assert_eq!(corners.bottom_left, Cell::from_xyz(-400.0, 200.0, 0.0));
        assert_eq!(corners.bottom_right, Cell::from_xyz(400.0, 200.0, 0.0));
        assert_eq!(
            cell_by_corner(CornerKind::BottomRight, &cells),
            corners.bottom_right
        );
    }

    #[test]
    fn test_corner_cells_are_members_of_sparse_grid() {
        let mut cells = board(4, 4);
        cells.remove(&cell_by_grid_position(0, 0, &cells));
        let corners = corner_cells(&cells);
        for corner in corners.to_array() {
            assert!(cells.contains(&corner));
        }
    }

    #[test]
    fn test_empty_grid_queries() {
        let cells = Cells::new();
        assert_eq!(corner_cells(&cells), CornerCells::INVALID);
        assert_eq!(cell_by_grid_position(0, 0, &cells), Cell::INVALID);
        assert_eq!(grid_position_by_cell(Cell::ZERO, &cells), INVALID_POSITION);
        assert_eq!(grid_center_position(&cells), INVALID_POSITION);
        assert_eq!(array_size(&cells), IVec2::ZERO);
        assert_eq!(array_transform(&cells), Placement::IDENTITY);
        assert_eq!(array_rotation(&cells), Quat::IDENTITY);
        assert_eq!(nearest_corner_cell(&cells, Cell::ZERO), Cell::INVALID);
    }

    #[test]
    fn test_array_transform_rebuilds_grid() {
        let placement = Placement::board(Vec3::new(200.0, 400.0, 0.0), 0.0, 4, 3);
        let cells = make_grid_from_placement(&placement);
        let transform = array_transform(&cells);
        assert_eq!(transform.columns(), 5);
        assert_eq!(transform.rows(), 3);
        assert_eq!(make_grid_from_placement(&transform), cells);
    }

    #[test]
    fn test_array_rotation_recovers_yaw() {
        let placement = Placement::board(Vec3::ZERO, 20.0, 5, 5);
        let cells = make_grid_from_placement(&placement);
        let (yaw, _, _) = array_rotation(&cells).to_euler(glam::EulerRot::ZYX);
        assert!((yaw.to_degrees() - 20.0).abs() < 0.5);
    }

    #[test]
    fn test_quarter_turn_swaps_columns_and_rows() {
        let placement = Placement::board(Vec3::ZERO, 90.0, 5, 3);
        let cells = make_grid_from_placement(&placement);
        assert_eq!(array_size(&cells), IVec2::new(3, 5));
    }

    #[test]
    fn test_rescale_centre_onto_larger_grid() {
        let original = CornerCells {
            top_left: Cell::from_xyz(0.0, 0.0, 0.0),
            top_right: Cell::from_xyz(4.0, 0.0, 0.0),
            bottom_left: Cell::from_xyz(0.0, 4.0, 0.0),
            bottom_right: Cell::from_xyz(4.0, 4.0, 0.0),
        };
        let new = CornerCells {
            top_left: Cell::from_xyz(0.0, 0.0, 0.0),
            top_right: Cell::from_xyz(8.0, 0.0, 0.0),
            bottom_left: Cell::from_xyz(0.0, 8.0, 0.0),
            bottom_right: Cell::from_xyz(8.0, 8.0, 0.0),
        };
        let rescaled = rescale_cell_to_grid(Cell::from_xyz(2.0, 2.0, 0.0), &original, &new);
        assert_eq!(rescaled, Cell::from_xyz(4.0, 4.0, 0.0));
    }

    #[test]
    fn test_rescale_between_boards_needs_snap() {
        let small = board(5, 5);
        let large = board(9, 9);
        let from = corner_cells(&small);
        let to = corner_cells(&large);

        let centre = rescale_cell_to_grid(Cell::ZERO, &from, &to);
        assert_eq!(centre, Cell::ZERO);

        let off_centre = cell_by_grid_position(1, 1, &small);
        let rescaled = rescale_cell_to_grid(off_centre, &from, &to);
        assert_eq!(rescaled, Cell::from_xyz(-400.0, -400.0, 0.0));
        assert!(large.contains(&rescaled.snap()));
    }

    #[test]
    fn test_rescale_on_diagonal_board_keeps_grid_position() {
        let small = make_grid_from_placement(&Placement::board(Vec3::ZERO, 45.0, 5, 5));
        let large = make_grid_from_placement(&Placement::board(Vec3::ZERO, 45.0, 9, 9));
        let from = corner_cells(&small);
        let to = corner_cells(&large);

        for column in 0..5 {
            for row in 0..5 {
                let cell = cell_by_grid_position(column, row, &small);
                let rescaled = rescale_cell_to_grid(cell, &from, &to);
                let landed = cell_array_nearest(&large, rescaled);
                assert_eq!(
                    grid_position_by_cell(landed, &large),
                    IVec2::new(column * 2, row * 2),
                    "cell at ({column}, {row}) landed on {landed}"
                );
            }
        }
    }

    #[test]
    fn test_rescale_invalid_corners() {
        let corners = corner_cells(&board(3, 3));
        assert_eq!(
            rescale_cell_to_grid(Cell::ZERO, &CornerCells::INVALID, &corners),
            Cell::INVALID
        );
    }

    #[test]
    fn test_nearest_corner_cell() {
        let cells = board(5, 5);
        assert_eq!(
            nearest_corner_cell(&cells, Cell::from_xyz(300.0, 350.0, 0.0)),
            Cell::from_xyz(400.0, 400.0, 0.0)
        );
    }

    #[test]
    fn test_single_cell_grid() {
        let cells: Cells = [Cell::FORWARD].into_iter().collect();
        assert_eq!(array_size(&cells), IVec2::ONE);
        assert_eq!(cell_by_grid_position(0, 0, &cells), Cell::FORWARD);
        assert_eq!(corner_cells(&cells).top_left, Cell::FORWARD);
    }
}
