//! Shared helpers for unit and integration tests.
//!
//! Provides a small registry (iron/plate resources, one building of each
//! behavior kind plus a belt) with connection points laid out so that
//! horizontally adjacent 1x1 buildings connect edge-to-edge.

use crate::behavior::{
    BehaviorConfig, ProcessingConfig, ProductionConfig, StorageConfig, TurretConfig,
};
use crate::building::Footprint;
use crate::connection::{ConnectionKind, ConnectionPoint};
use crate::conveyor::ConveyorConfig;
use crate::fixed::{Fixed64, Seconds};
use crate::grid::GridConfig;
use crate::id::{BuildingTypeId, ResourceTypeId};
use crate::math::Vec2Fixed;
use crate::registry::{BuildingDef, Registry, ResourceDef};
use crate::world::World;

pub fn fixed(v: f64) -> Fixed64 {
    Fixed64::from_num(v)
}

pub fn secs(v: f64) -> Seconds {
    Seconds::from_num(v)
}

fn input_at(x: f64, y: f64) -> ConnectionPoint {
    ConnectionPoint {
        kind: ConnectionKind::Input,
        offset: Vec2Fixed::new(fixed(x), fixed(y)),
    }
}

fn output_at(x: f64, y: f64) -> ConnectionPoint {
    ConnectionPoint {
        kind: ConnectionKind::Output,
        offset: Vec2Fixed::new(fixed(x), fixed(y)),
    }
}

/// Type ids assigned by [`test_registry`].
#[derive(Debug, Clone, Copy)]
pub struct TestIds {
    pub iron: ResourceTypeId,
    pub plate: ResourceTypeId,
    pub miner: BuildingTypeId,
    pub belt: BuildingTypeId,
    pub smelter: BuildingTypeId,
    pub turret: BuildingTypeId,
    pub vault: BuildingTypeId,
}

/// Registry used across the test suite. All buildings are 1x1 with points
/// on the left (input) and right (output) cell edges.
pub fn test_registry() -> (Registry, TestIds) {
    let mut reg = Registry::new();
    let iron = reg.add_resource(ResourceDef {
        name: "iron".into(),
        max_stack: 10,
    });
    let plate = reg.add_resource(ResourceDef {
        name: "plate".into(),
        max_stack: 10,
    });

    let miner = reg.add_building(BuildingDef {
        name: "miner".into(),
        footprint: Footprint::new(1, 1),
        points: vec![output_at(0.5, 0.0)],
        behaviors: vec![BehaviorConfig::Production(ProductionConfig {
            output_resource: iron,
            production_interval: secs(1.0),
            max_output_stack: 10,
            use_modifiers: false,
        })],
        conveyor: None,
    });

    let belt = reg.add_building(BuildingDef {
        name: "belt".into(),
        footprint: Footprint::new(1, 1),
        points: vec![input_at(-0.5, 0.0), output_at(0.5, 0.0)],
        behaviors: Vec::new(),
        conveyor: Some(ConveyorConfig::default()),
    });

    let smelter = reg.add_building(BuildingDef {
        name: "smelter".into(),
        footprint: Footprint::new(1, 1),
        points: vec![input_at(-0.5, 0.0), output_at(0.5, 0.0)],
        behaviors: vec![BehaviorConfig::Processing(ProcessingConfig {
            input_resource: iron,
            input_amount: 1,
            max_input_buffer: 10,
            output_resource: plate,
            output_amount: 1,
            max_output_buffer: 5,
            processing_time: secs(2.0),
            use_modifiers: false,
        })],
        conveyor: None,
    });

    let turret = reg.add_building(BuildingDef {
        name: "turret".into(),
        footprint: Footprint::new(1, 1),
        points: vec![input_at(-0.5, 0.0)],
        behaviors: vec![BehaviorConfig::Turret(TurretConfig {
            ammo_resource: iron,
            max_ammo_buffer: 10,
            attack_range: fixed(5.0),
            attack_cooldown: secs(1.0),
            damage: 50,
            projectile_speed: None,
            rotation_speed: fixed(720.0),
        })],
        conveyor: None,
    });

    let vault = reg.add_building(BuildingDef {
        name: "vault".into(),
        footprint: Footprint::new(1, 1),
        points: vec![input_at(-0.5, 0.0)],
        behaviors: vec![BehaviorConfig::Storage(StorageConfig {
            max_capacity: 100,
            can_output: false,
        })],
        conveyor: None,
    });

    (
        reg,
        TestIds {
            iron,
            plate,
            miner,
            belt,
            smelter,
            turret,
            vault,
        },
    )
}

/// A world over [`test_registry`] with the default grid.
pub fn test_world() -> (World, TestIds) {
    let (reg, ids) = test_registry();
    (World::new(reg, GridConfig::default()), ids)
}
