//! World placement of a board or a level actor.
//!
//! [`Placement`] carries position, rotation and scale. For a board, the
//! horizontal scale components are the column and row counts of its grid.

use glam::{EulerRot, Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Position, rotation and scale in world space.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Placement {
    /// World-space position. For a board this is the grid centre.
    pub position: Vec3,
    /// Rotation as a unit quaternion. Only the yaw matters to the grid.
    pub rotation: Quat,
    /// Scale. For a board, `x` is the column count and `y` the row count.
    pub scale: Vec3,
}

impl Placement {
    /// The identity placement: origin, no rotation, unit scale.
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    /// Create a placement at the given position with default rotation/scale.
    #[must_use]
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Self::IDENTITY
        }
    }

    /// Create a placement at the given position rotated by `yaw_degrees`
    /// around the world Z axis.
    #[must_use]
    pub fn from_position_yaw(position: Vec3, yaw_degrees: f32) -> Self {
        Self {
            position,
            rotation: Quat::from_rotation_z(yaw_degrees.to_radians()),
            ..Self::IDENTITY
        }
    }

    /// Create a board placement with `columns` × `rows` cells.
    #[must_use]
    pub fn board(position: Vec3, yaw_degrees: f32, columns: u32, rows: u32) -> Self {
        Self {
            scale: Vec3::new(columns as f32, rows as f32, 1.0),
            ..Self::from_position_yaw(position, yaw_degrees)
        }
    }

    /// Rotation around the world Z axis, in radians.
    #[must_use]
    pub fn yaw_radians(&self) -> f32 {
        let (yaw, _, _) = self.rotation.to_euler(EulerRot::ZYX);
        yaw
    }

    /// Rotation around the world Z axis, in degrees.
    #[must_use]
    pub fn yaw_degrees(&self) -> f32 {
        self.yaw_radians().to_degrees()
    }

    /// Number of grid columns described by this placement's scale.
    ///
    /// A board always has a middle column, so an even count is rounded up
    /// to the next odd one.
    #[must_use]
    pub fn columns(&self) -> i32 {
        odd_count(self.scale.x)
    }

    /// Number of grid rows described by this placement's scale, rounded up
    /// to odd like [`Placement::columns`].
    #[must_use]
    pub fn rows(&self) -> i32 {
        odd_count(self.scale.y)
    }
}

fn odd_count(scale: f32) -> i32 {
    let count = scale.round().max(0.0) as i32;
    if count > 0 && count % 2 == 0 { count + 1 } else { count }
}

impl Default for Placement {
    fn default() -> Self {
        Self::IDENTITY
    }
}
