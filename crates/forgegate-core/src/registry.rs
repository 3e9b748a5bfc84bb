//! Immutable definition tables.
//!
//! The registry maps resource and building type ids to their definitions.
//! It is built once (by hand in tests, or by the data loader) before the
//! world is constructed and never mutated afterwards; ids are plain
//! indices into the definition vectors. Name uniqueness is the loader's
//! job — `add_*` here trusts its input.

use std::collections::HashMap;

use serde::{Serialize, Deserialize};

use crate::behavior::BehaviorConfig;
use crate::building::Footprint;
use crate::connection::ConnectionPoint;
use crate::conveyor::ConveyorConfig;
use crate::id::{BuildingTypeId, ResourceTypeId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceDef {
    pub name: String,
    pub max_stack: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildingDef {
    pub name: String,
    pub footprint: Footprint,
    /// Connection point offsets are local to the building centroid.
    pub points: Vec<ConnectionPoint>,
    /// One state machine per entry is created at placement.
    pub behaviors: Vec<BehaviorConfig>,
    /// Present only on conveyor buildings.
    pub conveyor: Option<ConveyorConfig>,
}

#[derive(Debug, Clone, Default)]
pub struct Registry {
    resources: Vec<ResourceDef>,
    buildings: Vec<BuildingDef>,
    resource_names: HashMap<String, ResourceTypeId>,
    building_names: HashMap<String, BuildingTypeId>,
}

impl Registry {
    pub fn new() -> Self {
        Registry::default()
    }

    pub fn add_resource(&mut self, def: ResourceDef) -> ResourceTypeId {
        let id = ResourceTypeId(self.resources.len() as u32);
        self.resource_names.insert(def.name.clone(), id);
        self.resources.push(def);
        id
    }

    pub fn add_building(&mut self, def: BuildingDef) -> BuildingTypeId {
        let id = BuildingTypeId(self.buildings.len() as u32);
        self.building_names.insert(def.name.clone(), id);
        self.buildings.push(def);
        id
    }

    pub fn resource(&self, id: ResourceTypeId) -> Option<&ResourceDef> {
        self.resources.get(id.0 as usize)
    }

    pub fn building(&self, id: BuildingTypeId) -> Option<&BuildingDef> {
        self.buildings.get(id.0 as usize)
    }

    pub fn resource_by_name(&self, name: &str) -> Option<ResourceTypeId> {
        self.resource_names.get(name).copied()
    }

    pub fn building_by_name(&self, name: &str) -> Option<BuildingTypeId> {
        self.building_names.get(name).copied()
    }

    /// Max stack for a resource type; unknown ids stack to 1.
    pub fn max_stack(&self, id: ResourceTypeId) -> u32 {
        self.resource(id).map(|d| d.max_stack).unwrap_or(1)
    }

    pub fn resource_count(&self) -> usize {
        self.resources.len()
    }

    pub fn building_count(&self) -> usize {
        self.buildings.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_stable_indices() {
        let mut reg = Registry::new();
        let iron = reg.add_resource(ResourceDef {
            name: "iron".into(),
            max_stack: 10,
        });
        let plate = reg.add_resource(ResourceDef {
            name: "plate".into(),
            max_stack: 5,
        });
        assert_eq!(iron, ResourceTypeId(0));
        assert_eq!(plate, ResourceTypeId(1));
        assert_eq!(reg.resource(iron).unwrap().name, "iron");
        assert_eq!(reg.resource_by_name("plate"), Some(plate));
        assert_eq!(reg.max_stack(plate), 5);
        assert_eq!(reg.max_stack(ResourceTypeId(99)), 1);
    }

    #[test]
    fn building_lookup() {
        let mut reg = Registry::new();
        let id = reg.add_building(BuildingDef {
            name: "miner".into(),
            footprint: Footprint::new(1, 1),
            points: Vec::new(),
            behaviors: Vec::new(),
            conveyor: None,
        });
        assert_eq!(reg.building_by_name("miner"), Some(id));
        assert!(reg.building(BuildingTypeId(7)).is_none());
    }
}
