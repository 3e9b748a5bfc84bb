use serde::{Serialize, Deserialize};
use slotmap::new_key_type;

new_key_type! {
    /// Identifies a placed building in the world.
    pub struct BuildingId;

    /// Identifies a live resource unit owned by the resource pool.
    pub struct ResourceUnitId;

    /// Identifies an active enemy.
    pub struct EnemyId;

    /// Identifies an in-flight projectile.
    pub struct ProjectileId;
}

/// Identifies a resource type in the registry. Cheap to copy and compare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ResourceTypeId(pub u32);

/// Identifies a building definition in the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BuildingTypeId(pub u32);
