//! Placed buildings: footprints, rotation, and placement records.

use serde::{Serialize, Deserialize};

use crate::connection::ConnectionPoint;
use crate::fixed::Fixed64;
use crate::grid::GridPos;
use crate::id::BuildingTypeId;
use crate::math::{Vec2Fixed, WorldPos};

/// Clockwise rotation in 90-degree steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Rotation {
    #[default]
    None,
    Cw90,
    Cw180,
    Cw270,
}

impl Rotation {
    /// Rotate a local offset into world space. Clockwise: (x, y) -> (y, -x).
    pub fn apply(self, v: Vec2Fixed) -> Vec2Fixed {
        match self {
            Rotation::None => v,
            Rotation::Cw90 => Vec2Fixed::new(v.y, -v.x),
            Rotation::Cw180 => Vec2Fixed::new(-v.x, -v.y),
            Rotation::Cw270 => Vec2Fixed::new(-v.y, v.x),
        }
    }

    pub fn degrees(self) -> i32 {
        match self {
            Rotation::None => 0,
            Rotation::Cw90 => 90,
            Rotation::Cw180 => 180,
            Rotation::Cw270 => 270,
        }
    }
}

/// Axis-aligned footprint in cells, before rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Footprint {
    pub width: i32,
    pub height: i32,
}

impl Footprint {
    pub fn new(width: i32, height: i32) -> Self {
        Footprint { width, height }
    }

    /// The footprint after rotation: quarter turns swap the extents.
    pub fn rotated(self, rotation: Rotation) -> Footprint {
        match rotation {
            Rotation::None | Rotation::Cw180 => self,
            Rotation::Cw90 | Rotation::Cw270 => Footprint::new(self.height, self.width),
        }
    }

    /// Every cell covered when placed at `origin`.
    pub fn tiles(self, origin: GridPos) -> impl Iterator<Item = GridPos> {
        (0..self.height)
            .flat_map(move |dy| (0..self.width).map(move |dx| GridPos::new(origin.x + dx, origin.y + dy)))
    }
}

/// A building placed in the world. Behavior and conveyor state live in
/// secondary maps keyed by the building's id, not here.
#[derive(Debug, Clone)]
pub struct Building {
    pub type_id: BuildingTypeId,
    pub origin: GridPos,
    pub rotation: Rotation,
    /// Footprint before rotation; use [`Building::footprint`] for the
    /// world-space extent.
    pub base_footprint: Footprint,
    /// Monotonic placement counter. Routing tie-breaks use it, so it must
    /// never be reused.
    pub seq: u64,
    /// World-space centroid, cached at placement.
    pub center: WorldPos,
    /// Connection points with offsets local to the centroid.
    pub points: Vec<ConnectionPoint>,
}

impl Building {
    pub fn footprint(&self) -> Footprint {
        self.base_footprint.rotated(self.rotation)
    }

    /// World position of one of this building's connection points.
    pub fn point_position(&self, index: usize) -> Option<WorldPos> {
        self.points
            .get(index)
            .map(|p| self.center.add(self.rotation.apply(p.offset)))
    }
}

/// Default routing search radius: just over one cell, so only points on
/// adjacent cell edges connect.
pub fn default_search_radius(cell_size: Fixed64) -> Fixed64 {
    cell_size + cell_size / Fixed64::from_num(10)
}
