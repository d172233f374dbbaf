//! Board cells.
//!
//! A [`Cell`] is a board location quantised to whole world units. Every
//! constructor quantises, so two cells compare equal exactly when their
//! quantised locations are bit-identical, and equal cells always hash equal.
//!
//! [`Cell::snap`] additionally aligns a cell to the [`CELL_SIZE`] pitch. Grid
//! construction produces cells whose offsets from the board centre are pitch
//! multiples; arbitrary arithmetic (scaling, rescaling between boards) does
//! not, and callers must snap before using such a result as a set key.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::grid::Cells;
use crate::placement::Placement;

/// World-space length of one cell edge (the grid pitch).
pub const CELL_SIZE: f32 = 200.0;

/// One of the four board directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellDirection {
    /// Towards world +X.
    Forward,
    /// Towards world -X.
    Backward,
    /// Towards world +Y.
    Right,
    /// Towards world -Y.
    Left,
}

impl CellDirection {
    /// All four directions.
    pub const ALL: [CellDirection; 4] = [
        CellDirection::Forward,
        CellDirection::Backward,
        CellDirection::Right,
        CellDirection::Left,
    ];
}

/// A location on the level board, quantised to whole world units.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(from = "Vec3", into = "Vec3")]
pub struct Cell {
    location: Vec3,
}

impl Cell {
    /// The origin cell.
    pub const ZERO: Cell = Cell {
        location: Vec3::ZERO,
    };

    /// Sentinel for "no such cell". It lies one unit below the origin, which
    /// no pitch-aligned board at height zero ever produces.
    pub const INVALID: Cell = Cell {
        location: Vec3::new(0.0, 0.0, -1.0),
    };

    /// One pitch towards world +X.
    pub const FORWARD: Cell = Cell {
        location: Vec3::new(CELL_SIZE, 0.0, 0.0),
    };

    /// One pitch towards world -X.
    pub const BACKWARD: Cell = Cell {
        location: Vec3::new(-CELL_SIZE, 0.0, 0.0),
    };

    /// One pitch towards world +Y.
    pub const RIGHT: Cell = Cell {
        location: Vec3::new(0.0, CELL_SIZE, 0.0),
    };

    /// One pitch towards world -Y.
    pub const LEFT: Cell = Cell {
        location: Vec3::new(0.0, -CELL_SIZE, 0.0),
    };

    /// Create a cell from a raw world location.
    ///
    /// Each component is rounded to the nearest whole unit. NaN components
    /// propagate unchanged.
    #[must_use]
    pub fn new(location: Vec3) -> Self {
        // Adding +0.0 turns a rounded -0.0 into +0.0 so equality stays bitwise.
        Self {
            location: location.round() + Vec3::ZERO,
        }
    }

    /// Convenience constructor from components.
    #[must_use]
    pub fn from_xyz(x: f32, y: f32, z: f32) -> Self {
        Self::new(Vec3::new(x, y, z))
    }

    /// The quantised world location.
    #[must_use]
    pub const fn location(&self) -> Vec3 {
        self.location
    }

    #[must_use]
    pub fn x(&self) -> f32 {
        self.location.x
    }

    #[must_use]
    pub fn y(&self) -> f32 {
        self.location.y
    }

    #[must_use]
    pub fn z(&self) -> f32 {
        self.location.z
    }

    /// Returns the unit cell for a direction.
    #[must_use]
    pub const fn direction(direction: CellDirection) -> Cell {
        match direction {
            CellDirection::Forward => Cell::FORWARD,
            CellDirection::Backward => Cell::BACKWARD,
            CellDirection::Right => Cell::RIGHT,
            CellDirection::Left => Cell::LEFT,
        }
    }

    /// Returns `true` unless this is [`Cell::INVALID`].
    #[must_use]
    pub fn is_valid(&self) -> bool {
        *self != Cell::INVALID
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        *self == Cell::ZERO
    }

    /// Round every component to the nearest multiple of [`CELL_SIZE`].
    ///
    /// Idempotent: `c.snap().snap() == c.snap()`.
    #[must_use]
    pub fn snap(self) -> Cell {
        Cell::new((self.location / CELL_SIZE).round() * CELL_SIZE)
    }

    /// Distance between two cells measured in cells, so axis-aligned
    /// neighbours are exactly `1` apart.
    #[must_use]
    pub fn distance<T: CellDistance>(a: Cell, b: Cell) -> T {
        T::from_cells(a.location.distance(b.location) / CELL_SIZE)
    }

    /// Rotate this cell around `origin.position` by the origin's yaw.
    ///
    /// The sign of `axis_z` picks the rotation axis (+Z or -Z), so a rotation
    /// with `1.0` is undone by the same call with `-1.0`. An `axis_z` of zero
    /// leaves the cell unchanged.
    #[must_use]
    pub fn rotate_around_origin(self, axis_z: f32, origin: &Placement) -> Cell {
        if axis_z == 0.0 || axis_z.is_nan() {
            return self;
        }

        let offset = self.location - origin.position;
        let yaw = origin.yaw_radians() * axis_z.signum();
        let rotated = Quat::from_rotation_z(yaw) * offset;
        Cell::new(origin.position + rotated)
    }

    fn bits(&self) -> [u32; 3] {
        self.location.to_array().map(f32::to_bits)
    }
}

impl Default for Cell {
    fn default() -> Self {
        Cell::INVALID
    }
}

impl From<Vec3> for Cell {
    fn from(location: Vec3) -> Self {
        Cell::new(location)
    }
}

impl From<Cell> for Vec3 {
    fn from(cell: Cell) -> Self {
        cell.location
    }
}

impl PartialEq for Cell {
    fn eq(&self, other: &Self) -> bool {
        self.bits() == other.bits()
    }
}

impl Eq for Cell {}

impl Hash for Cell {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.bits().hash(state);
    }
}

impl PartialOrd for Cell {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Total order by X, then Y, then Z. Used to break ties deterministically.
impl Ord for Cell {
    fn cmp(&self, other: &Self) -> Ordering {
        self.location
            .x
            .total_cmp(&other.location.x)
            .then_with(|| self.location.y.total_cmp(&other.location.y))
            .then_with(|| self.location.z.total_cmp(&other.location.z))
    }
}

impl Add for Cell {
    type Output = Cell;

    fn add(self, rhs: Cell) -> Cell {
        Cell::new(self.location + rhs.location)
    }
}

impl AddAssign for Cell {
    fn add_assign(&mut self, rhs: Cell) {
        *self = *self + rhs;
    }
}

impl Sub for Cell {
    type Output = Cell;

    fn sub(self, rhs: Cell) -> Cell {
        Cell::new(self.location - rhs.location)
    }
}

impl SubAssign for Cell {
    fn sub_assign(&mut self, rhs: Cell) {
        *self = *self - rhs;
    }
}

impl Mul<f32> for Cell {
    type Output = Cell;

    fn mul(self, rhs: f32) -> Cell {
        Cell::new(self.location * rhs)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {}, {})",
            self.location.x, self.location.y, self.location.z
        )
    }
}

/// Numeric types a cell distance can be expressed in.
pub trait CellDistance {
    /// Convert a distance measured in cells.
    fn from_cells(cells: f32) -> Self;
}

impl CellDistance for f32 {
    fn from_cells(cells: f32) -> Self {
        cells
    }
}

impl CellDistance for f64 {
    fn from_cells(cells: f32) -> Self {
        f64::from(cells)
    }
}

/// Truncates towards zero.
impl CellDistance for i32 {
    fn from_cells(cells: f32) -> Self {
        cells as i32
    }
}

/// Average location of a set of cells, or [`Cell::ZERO`] for an empty set.
#[must_use]
pub fn cell_array_average(cells: &Cells) -> Cell {
    if cells.is_empty() {
        return Cell::ZERO;
    }

    let sum: Vec3 = cells.iter().map(Cell::location).sum();
    Cell::new(sum / cells.len() as f32)
}

/// The member of `cells` closest to `cell`, or [`Cell::INVALID`] for an
/// empty set. Ties resolve to the smallest cell by [`Ord`].
#[must_use]
pub fn cell_array_nearest(cells: &Cells, cell: Cell) -> Cell {
    cells
        .iter()
        .copied()
        .min_by(|a, b| {
            let da = a.location.distance_squared(cell.location);
            let db = b.location.distance_squared(cell.location);
            da.total_cmp(&db).then_with(|| a.cmp(b))
        })
        .unwrap_or(Cell::INVALID)
}
