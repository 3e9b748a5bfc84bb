//! Read-only snapshot views over the world for the embedding layer.
//!
//! The simulation owns its state; rendering and UI code never hold
//! references into it across ticks. Instead they take cheap owned
//! snapshots once per frame.

use crate::building::{Footprint, Rotation};
use crate::fixed::Fixed64;
use crate::grid::GridPos;
use crate::id::{BuildingId, BuildingTypeId, ResourceTypeId};
use crate::math::WorldPos;
use crate::world::World;

#[derive(Debug, Clone, PartialEq)]
pub struct BuildingSnapshot {
    pub id: BuildingId,
    pub type_id: BuildingTypeId,
    pub name: String,
    pub origin: GridPos,
    pub rotation: Rotation,
    /// Rotated footprint as placed.
    pub footprint: Footprint,
    pub center: WorldPos,
    pub seq: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConveyorItemSnapshot {
    pub resource_type: ResourceTypeId,
    /// Transit completion in [0, 1] for position interpolation.
    pub fraction: Fixed64,
    pub waiting: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConveyorSnapshot {
    pub building: BuildingId,
    pub items: Vec<ConveyorItemSnapshot>,
    pub blocked: bool,
}

impl World {
    pub fn building_snapshot(&self, id: BuildingId) -> Option<BuildingSnapshot> {
        let b = self.building(id)?;
        let name = self
            .registry()
            .building(b.type_id)
            .map(|d| d.name.clone())
            .unwrap_or_default();
        Some(BuildingSnapshot {
            id,
            type_id: b.type_id,
            name,
            origin: b.origin,
            rotation: b.rotation,
            footprint: b.footprint(),
            center: b.center,
            seq: b.seq,
        })
    }

    pub fn conveyor_snapshot(&self, id: BuildingId) -> Option<ConveyorSnapshot> {
        let conv = self.conveyor(id)?;
        Some(ConveyorSnapshot {
            building: id,
            items: conv
                .items()
                .iter()
                .map(|i| ConveyorItemSnapshot {
                    resource_type: i.resource_type,
                    fraction: i.fraction(),
                    waiting: i.phase == crate::conveyor::ItemPhase::WaitingAtOutput,
                })
                .collect(),
            blocked: conv.is_blocked(),
        })
    }

    /// Every building, in placement order.
    pub fn building_snapshots(&self) -> Vec<BuildingSnapshot> {
        self.building_order()
            .iter()
            .filter_map(|&id| self.building_snapshot(id))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixed::Seconds;
    use crate::test_utils::test_world;

    #[test]
    fn snapshots_follow_placement_order() {
        let (mut world, ids) = test_world();
        let a = world
            .place_building(ids.miner, GridPos::new(0, 0), Rotation::None)
            .unwrap();
        let b = world
            .place_building(ids.belt, GridPos::new(1, 0), Rotation::None)
            .unwrap();
        let snaps = world.building_snapshots();
        assert_eq!(snaps.len(), 2);
        assert_eq!(snaps[0].id, a);
        assert_eq!(snaps[0].name, "miner");
        assert_eq!(snaps[1].id, b);
        assert_eq!(snaps[1].name, "belt");
    }

    #[test]
    fn conveyor_snapshot_reports_items() {
        let (mut world, ids) = test_world();
        world
            .place_building(ids.miner, GridPos::new(0, 0), Rotation::None)
            .unwrap();
        let belt = world
            .place_building(ids.belt, GridPos::new(1, 0), Rotation::None)
            .unwrap();
        for _ in 0..12 {
            world.tick(Seconds::from_num(0.1));
        }
        let snap = world.conveyor_snapshot(belt).unwrap();
        assert_eq!(snap.items.len(), 1);
        assert_eq!(snap.items[0].resource_type, ids.iron);
        assert!(snap.items[0].fraction <= Fixed64::ONE);
        assert!(world.building_snapshot(belt).is_some());
    }
}
