//! Serde structs for the on-disk RON format.
//!
//! These mirror the engine config types but reference resources and
//! buildings by name; the loader resolves names into ids and converts
//! floating-point literals to fixed-point.

use serde::Deserialize;

// ===========================================================================
// Resources
// ===========================================================================

/// A resource type definition in a data file.
#[derive(Debug, Clone, Deserialize)]
pub struct ResourceData {
    pub name: String,
    #[serde(default = "default_max_stack")]
    pub max_stack: u32,
}

fn default_max_stack() -> u32 {
    1
}

// ===========================================================================
// Buildings
// ===========================================================================

/// A building definition in a data file.
#[derive(Debug, Clone, Deserialize)]
pub struct BuildingData {
    pub name: String,
    #[serde(default = "default_footprint")]
    pub footprint: FootprintData,
    /// Connection points, offsets local to the building centroid.
    #[serde(default)]
    pub points: Vec<PointData>,
    #[serde(default)]
    pub behaviors: Vec<BehaviorData>,
    #[serde(default)]
    pub conveyor: Option<ConveyorData>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FootprintData {
    pub width: i32,
    pub height: i32,
}

fn default_footprint() -> FootprintData {
    FootprintData {
        width: 1,
        height: 1,
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PointData {
    pub kind: PointKindData,
    pub offset: (f64, f64),
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub enum PointKindData {
    Input,
    Output,
}

/// A behavior attached to a building type.
#[derive(Debug, Clone, Deserialize)]
pub enum BehaviorData {
    Production {
        resource: String,
        /// Seconds per produced unit.
        interval: f64,
        #[serde(default = "default_stack")]
        max_output_stack: u32,
        #[serde(default)]
        use_modifiers: bool,
    },
    Processing {
        input: String,
        input_amount: u32,
        #[serde(default = "default_stack")]
        max_input_buffer: u32,
        output: String,
        output_amount: u32,
        #[serde(default = "default_stack")]
        max_output_buffer: u32,
        /// Seconds per conversion.
        time: f64,
        #[serde(default)]
        use_modifiers: bool,
    },
    Storage {
        max_capacity: u32,
        #[serde(default)]
        can_output: bool,
    },
    Turret {
        ammo: String,
        #[serde(default = "default_stack")]
        max_ammo_buffer: u32,
        range: f64,
        cooldown: f64,
        damage: u32,
        #[serde(default)]
        projectile_speed: Option<f64>,
        #[serde(default = "default_rotation_speed")]
        rotation_speed: f64,
    },
}

fn default_stack() -> u32 {
    10
}

fn default_rotation_speed() -> f64 {
    360.0
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConveyorData {
    #[serde(default = "default_speed")]
    pub speed: f64,
    #[serde(default = "default_capacity")]
    pub capacity: usize,
    #[serde(default = "default_poll_interval")]
    pub poll_interval: f64,
}

fn default_speed() -> f64 {
    2.0
}

fn default_capacity() -> usize {
    5
}

fn default_poll_interval() -> f64 {
    0.5
}

// ===========================================================================
// Level blocks
// ===========================================================================

/// A level block template: an NxN patch of cell modifiers with door edges.
#[derive(Debug, Clone, Deserialize)]
pub struct BlockData {
    pub name: String,
    pub size: i32,
    /// Modifiers for every cell not overridden below.
    #[serde(default)]
    pub base: CellModifierData,
    #[serde(default)]
    pub cells: Vec<CellOverrideData>,
    /// Edges that connect to a neighboring block.
    #[serde(default)]
    pub doors: Vec<DirectionData>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CellModifierData {
    #[serde(default = "default_true")]
    pub walkable: bool,
    #[serde(default = "default_true")]
    pub spawnable: bool,
    #[serde(default = "default_bonus")]
    pub production_bonus: f64,
    #[serde(default = "default_biome")]
    pub biome: String,
}

impl Default for CellModifierData {
    fn default() -> Self {
        CellModifierData {
            walkable: true,
            spawnable: true,
            production_bonus: 1.0,
            biome: default_biome(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_bonus() -> f64 {
    1.0
}

fn default_biome() -> String {
    "default".to_string()
}

/// A per-cell modifier override, local block coordinates.
#[derive(Debug, Clone, Deserialize)]
pub struct CellOverrideData {
    pub x: i32,
    pub y: i32,
    pub modifiers: CellModifierData,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum DirectionData {
    North,
    East,
    South,
    West,
}

// ===========================================================================
// Tests
// ===========================================================================
