//! Resolution pipeline: reads RON data files, resolves name references,
//! builds the frozen registry.
//!
//! A data directory holds `resources.ron` and `buildings.ron` (required)
//! plus `blocks.ron` (optional). Resources load first so building behaviors
//! can reference them by name; blocks resolve into [`BlockDef`]s for the
//! level generator.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;

use forgegate_core::behavior::{
    BehaviorConfig, ProcessingConfig, ProductionConfig, StorageConfig, TurretConfig,
};
use forgegate_core::building::Footprint;
use forgegate_core::connection::{validate_routing_points, ConnectionKind, ConnectionPoint};
use forgegate_core::conveyor::ConveyorConfig;
use forgegate_core::fixed::{Fixed64, Seconds};
use forgegate_core::grid::{CellModifiers, GridPos};
use forgegate_core::id::ResourceTypeId;
use forgegate_core::math::Vec2Fixed;
use forgegate_core::registry::{BuildingDef, Registry, ResourceDef};

use crate::level::{BlockDef, Direction};
use crate::schema::{
    BehaviorData, BlockData, BuildingData, CellModifierData, DirectionData, PointKindData,
    ResourceData,
};

// ===========================================================================
// Errors
// ===========================================================================

#[derive(Debug, thiserror::Error)]
pub enum DataLoadError {
    #[error("required file '{file}' not found in {dir}")]
    MissingRequired { file: &'static str, dir: PathBuf },

    #[error("parse error in {file}: {detail}")]
    Parse { file: PathBuf, detail: String },

    #[error("unresolved {expected_kind} reference '{name}' in {file}")]
    UnresolvedRef {
        file: PathBuf,
        name: String,
        expected_kind: &'static str,
    },

    #[error("duplicate name '{name}' in {file}")]
    DuplicateName { file: PathBuf, name: String },

    #[error("invalid building '{name}': {detail}")]
    InvalidBuilding { name: String, detail: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// ===========================================================================
// Loading
// ===========================================================================

/// Everything a data directory resolves to.
#[derive(Debug)]
pub struct GameData {
    pub registry: Registry,
    pub blocks: Vec<BlockDef>,
}

/// Load and resolve a data directory.
pub fn load_game_data(dir: &Path) -> Result<GameData, DataLoadError> {
    let resources_path = require_file(dir, "resources.ron")?;
    let buildings_path = require_file(dir, "buildings.ron")?;

    let mut registry = Registry::new();

    // Resources first; behaviors reference them by name.
    let resources: Vec<ResourceData> = read_ron(&resources_path)?;
    let mut resource_ids: HashMap<String, ResourceTypeId> = HashMap::new();
    for r in resources {
        check_duplicate(&resource_ids, &r.name, &resources_path)?;
        let id = registry.add_resource(ResourceDef {
            name: r.name.clone(),
            max_stack: r.max_stack,
        });
        resource_ids.insert(r.name, id);
    }

    let buildings: Vec<BuildingData> = read_ron(&buildings_path)?;
    let mut building_names: HashMap<String, ()> = HashMap::new();
    for b in buildings {
        check_duplicate(&building_names, &b.name, &buildings_path)?;
        let def = resolve_building(&b, &resource_ids, &buildings_path)?;
        building_names.insert(b.name, ());
        registry.add_building(def);
    }
    log::info!(
        "loaded {} resources and {} buildings from {}",
        registry.resource_count(),
        registry.building_count(),
        dir.display()
    );

    let blocks_path = dir.join("blocks.ron");
    let blocks = if blocks_path.exists() {
        let raw: Vec<BlockData> = read_ron(&blocks_path)?;
        let mut seen: HashMap<String, ()> = HashMap::new();
        let mut blocks = Vec::with_capacity(raw.len());
        for data in raw {
            check_duplicate(&seen, &data.name, &blocks_path)?;
            seen.insert(data.name.clone(), ());
            blocks.push(resolve_block(data));
        }
        blocks
    } else {
        Vec::new()
    };

    Ok(GameData { registry, blocks })
}

fn require_file(dir: &Path, file: &'static str) -> Result<PathBuf, DataLoadError> {
    let path = dir.join(file);
    if path.exists() {
        Ok(path)
    } else {
        Err(DataLoadError::MissingRequired {
            file,
            dir: dir.to_path_buf(),
        })
    }
}

fn read_ron<T: DeserializeOwned>(path: &Path) -> Result<T, DataLoadError> {
    let content = std::fs::read_to_string(path)?;
    ron::from_str(&content).map_err(|e| DataLoadError::Parse {
        file: path.to_path_buf(),
        detail: e.to_string(),
    })
}

fn check_duplicate<V>(
    map: &HashMap<String, V>,
    name: &str,
    file: &Path,
) -> Result<(), DataLoadError> {
    if map.contains_key(name) {
        Err(DataLoadError::DuplicateName {
            file: file.to_path_buf(),
            name: name.to_string(),
        })
    } else {
        Ok(())
    }
}

fn resolve_resource(
    ids: &HashMap<String, ResourceTypeId>,
    name: &str,
    file: &Path,
) -> Result<ResourceTypeId, DataLoadError> {
    ids.get(name)
        .copied()
        .ok_or_else(|| DataLoadError::UnresolvedRef {
            file: file.to_path_buf(),
            name: name.to_string(),
            expected_kind: "resource",
        })
}

// ===========================================================================
// Conversion
// ===========================================================================

fn resolve_building(
    data: &BuildingData,
    resource_ids: &HashMap<String, ResourceTypeId>,
    file: &Path,
) -> Result<BuildingDef, DataLoadError> {
    let points: Vec<ConnectionPoint> = data
        .points
        .iter()
        .map(|p| ConnectionPoint {
            kind: match p.kind {
                PointKindData::Input => ConnectionKind::Input,
                PointKindData::Output => ConnectionKind::Output,
            },
            offset: Vec2Fixed::new(Fixed64::from_num(p.offset.0), Fixed64::from_num(p.offset.1)),
        })
        .collect();

    let behaviors = data
        .behaviors
        .iter()
        .map(|b| resolve_behavior(b, resource_ids, file))
        .collect::<Result<Vec<_>, _>>()?;

    let conveyor = data.conveyor.as_ref().map(|c| ConveyorConfig {
        speed: Fixed64::from_num(c.speed),
        capacity: c.capacity,
        poll_interval: Seconds::from_num(c.poll_interval),
    });

    // Conveyor segments need both endpoints to exist.
    if conveyor.is_some() {
        validate_routing_points(&data.name, &points).map_err(|e| {
            DataLoadError::InvalidBuilding {
                name: data.name.clone(),
                detail: e.to_string(),
            }
        })?;
    }
    if data.footprint.width < 1 || data.footprint.height < 1 {
        return Err(DataLoadError::InvalidBuilding {
            name: data.name.clone(),
            detail: format!(
                "footprint {}x{} must be at least 1x1",
                data.footprint.width, data.footprint.height
            ),
        });
    }

    Ok(BuildingDef {
        name: data.name.clone(),
        footprint: Footprint::new(data.footprint.width, data.footprint.height),
        points,
        behaviors,
        conveyor,
    })
}

fn resolve_behavior(
    data: &BehaviorData,
    resource_ids: &HashMap<String, ResourceTypeId>,
    file: &Path,
) -> Result<BehaviorConfig, DataLoadError> {
    Ok(match data {
        BehaviorData::Production {
            resource,
            interval,
            max_output_stack,
            use_modifiers,
        } => BehaviorConfig::Production(ProductionConfig {
            output_resource: resolve_resource(resource_ids, resource, file)?,
            production_interval: Seconds::from_num(*interval),
            max_output_stack: *max_output_stack,
            use_modifiers: *use_modifiers,
        }),
        BehaviorData::Processing {
            input,
            input_amount,
            max_input_buffer,
            output,
            output_amount,
            max_output_buffer,
            time,
            use_modifiers,
        } => BehaviorConfig::Processing(ProcessingConfig {
            input_resource: resolve_resource(resource_ids, input, file)?,
            input_amount: *input_amount,
            max_input_buffer: *max_input_buffer,
            output_resource: resolve_resource(resource_ids, output, file)?,
            output_amount: *output_amount,
            max_output_buffer: *max_output_buffer,
            processing_time: Seconds::from_num(*time),
            use_modifiers: *use_modifiers,
        }),
        BehaviorData::Storage {
            max_capacity,
            can_output,
        } => BehaviorConfig::Storage(StorageConfig {
            max_capacity: *max_capacity,
            can_output: *can_output,
        }),
        BehaviorData::Turret {
            ammo,
            max_ammo_buffer,
            range,
            cooldown,
            damage,
            projectile_speed,
            rotation_speed,
        } => BehaviorConfig::Turret(TurretConfig {
            ammo_resource: resolve_resource(resource_ids, ammo, file)?,
            max_ammo_buffer: *max_ammo_buffer,
            attack_range: Fixed64::from_num(*range),
            attack_cooldown: Seconds::from_num(*cooldown),
            damage: *damage,
            projectile_speed: projectile_speed.map(Fixed64::from_num),
            rotation_speed: Fixed64::from_num(*rotation_speed),
        }),
    })
}

fn resolve_modifiers(data: &CellModifierData) -> CellModifiers {
    CellModifiers {
        walkable: data.walkable,
        spawnable: data.spawnable,
        production_bonus: Fixed64::from_num(data.production_bonus),
        biome: data.biome.clone(),
    }
}

fn resolve_block(data: BlockData) -> BlockDef {
    BlockDef {
        base: resolve_modifiers(&data.base),
        overrides: data
            .cells
            .iter()
            .map(|c| (GridPos::new(c.x, c.y), resolve_modifiers(&c.modifiers)))
            .collect(),
        doors: data
            .doors
            .iter()
            .map(|d| match d {
                DirectionData::North => Direction::North,
                DirectionData::East => Direction::East,
                DirectionData::South => Direction::South,
                DirectionData::West => Direction::West,
            })
            .collect(),
        name: data.name,
        size: data.size,
    }
}

// ===========================================================================
// Tests
// ===========================================================================
