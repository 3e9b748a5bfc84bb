//! The world: owns every simulation subsystem and drives the tick pipeline.
//!
//! There are no globals; everything a behavior or transport needs is a
//! field here and reaches them through explicit borrows. Building state is
//! stored structure-of-arrays style: the [`Building`] placement record in a
//! `SlotMap`, behavior states and conveyor state in `SecondaryMap`s keyed
//! by the same id.
//!
//! # Tick pipeline
//!
//! Each call to [`World::tick`] advances the simulation by `dt` seconds
//! through four phases, always in this order:
//!
//! 1. **Behaviors** -- production/processing/turret state machines, in
//!    placement order, each isolated so one failure cannot halt the rest.
//! 2. **Conveyors** -- advance in-transit units, transfer arrivals
//!    downstream, back off on refusal.
//! 3. **Combat** -- spawners emit enemies, enemies walk their paths and
//!    damage the core, projectiles home and hit, the dead are swept.
//! 4. **Bookkeeping** -- the tick counter advances.
//!
//! External collaborators drain the event queue between ticks via
//! [`World::drain_events`].

use slotmap::{SecondaryMap, SlotMap};
use thiserror::Error;

use crate::behavior::{self, Behavior, BehaviorHost};
use crate::building::{default_search_radius, Building, Rotation};
use crate::combat::{closest_enemy_in_range, BaseCore, Enemy, EnemySpawner, Projectile, ProjectileOutcome, SpawnerConfig};
use crate::connection::{closest_adjacent_input, AdjacentInput, ConnectionKind};
use crate::conveyor::Conveyor;
use crate::event::{Event, EventQueue};
use crate::fixed::{Fixed64, Seconds, Ticks};
use crate::grid::{CellModifiers, GridConfig, GridPos, SpatialGrid};
use crate::id::{BuildingId, BuildingTypeId, EnemyId, ProjectileId, ResourceTypeId, ResourceUnitId};
use crate::math::WorldPos;
use crate::path::{PathResult, Pathfinder};
use crate::pool::Pool;
use crate::registry::Registry;
use crate::resource::ResourceUnit;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlacementError {
    #[error("unknown building type {0:?}")]
    UnknownBuildingType(BuildingTypeId),
    #[error("area at ({x}, {y}) is not available")]
    AreaUnavailable { x: i32, y: i32 },
    #[error("building no longer exists")]
    UnknownBuilding,
    #[error("conveyor building needs both an input and an output point")]
    MissingConveyorPoints,
}

pub struct World {
    registry: Registry,
    grid: SpatialGrid,
    pathfinder: Pathfinder,

    buildings: SlotMap<BuildingId, Building>,
    behaviors: SecondaryMap<BuildingId, Vec<Behavior>>,
    conveyors: SecondaryMap<BuildingId, Conveyor>,
    /// Placement order; drives tick order and routing determinism.
    order: Vec<BuildingId>,
    next_seq: u64,

    resource_pool: Pool<ResourceUnitId, ResourceUnit>,

    enemies: SlotMap<EnemyId, Enemy>,
    enemy_order: Vec<EnemyId>,
    projectiles: SlotMap<ProjectileId, Projectile>,
    projectile_order: Vec<ProjectileId>,
    spawners: Vec<EnemySpawner>,
    base_core: Option<BaseCore>,

    events: EventQueue,
    tick_count: Ticks,
    search_radius: Fixed64,
}

impl World {
    pub fn new(registry: Registry, grid_config: GridConfig) -> Self {
        Self::with_grid(registry, SpatialGrid::new(grid_config))
    }

    /// Construct over a pre-stamped grid (level generation runs first).
    pub fn with_grid(registry: Registry, grid: SpatialGrid) -> Self {
        let search_radius = default_search_radius(grid.config().cell_size);
        World {
            registry,
            grid,
            pathfinder: Pathfinder::default(),
            buildings: SlotMap::with_key(),
            behaviors: SecondaryMap::new(),
            conveyors: SecondaryMap::new(),
            order: Vec::new(),
            next_seq: 0,
            resource_pool: Pool::default(),
            enemies: SlotMap::with_key(),
            enemy_order: Vec::new(),
            projectiles: SlotMap::with_key(),
            projectile_order: Vec::new(),
            spawners: Vec::new(),
            base_core: None,
            events: EventQueue::default(),
            tick_count: 0,
            search_radius,
        }
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn grid(&self) -> &SpatialGrid {
        &self.grid
    }

    pub fn current_tick(&self) -> Ticks {
        self.tick_count
    }

    pub fn building(&self, id: BuildingId) -> Option<&Building> {
        self.buildings.get(id)
    }

    pub fn building_order(&self) -> &[BuildingId] {
        &self.order
    }

    pub fn behavior(&self, id: BuildingId, index: usize) -> Option<&Behavior> {
        self.behaviors.get(id).and_then(|v| v.get(index))
    }

    pub fn conveyor(&self, id: BuildingId) -> Option<&Conveyor> {
        self.conveyors.get(id)
    }

    pub fn base_core(&self) -> Option<&BaseCore> {
        self.base_core.as_ref()
    }

    pub fn enemy(&self, id: EnemyId) -> Option<&Enemy> {
        self.enemies.get(id)
    }

    pub fn enemy_count(&self) -> usize {
        self.enemy_order.len()
    }

    pub fn live_resource_units(&self) -> usize {
        self.resource_pool.live()
    }

    pub fn drain_events(&mut self) -> Vec<Event> {
        self.events.drain()
    }

    pub fn events_mut(&mut self) -> &mut EventQueue {
        &mut self.events
    }

    // -----------------------------------------------------------------------
    // Placement
    // -----------------------------------------------------------------------

    /// Availability check without side effects beyond grid expansion.
    pub fn can_place(&mut self, type_id: BuildingTypeId, origin: GridPos, rotation: Rotation) -> bool {
        let Some(def) = self.registry.building(type_id) else {
            return false;
        };
        let fp = def.footprint.rotated(rotation);
        self.grid.is_area_available(origin, fp.width, fp.height)
    }

    pub fn place_building(
        &mut self,
        type_id: BuildingTypeId,
        origin: GridPos,
        rotation: Rotation,
    ) -> Result<BuildingId, PlacementError> {
        let def = self
            .registry
            .building(type_id)
            .ok_or(PlacementError::UnknownBuildingType(type_id))?
            .clone();
        let fp = def.footprint.rotated(rotation);
        if !self.grid.is_area_available(origin, fp.width, fp.height) {
            return Err(PlacementError::AreaUnavailable {
                x: origin.x,
                y: origin.y,
            });
        }

        let center = self.grid.center_position(origin, fp.width, fp.height);
        let building = Building {
            type_id,
            origin,
            rotation,
            base_footprint: def.footprint,
            seq: self.next_seq,
            center,
            points: def.points.clone(),
        };

        // Conveyor segment length is fixed at placement: input point to
        // output point. Validate before anything is committed.
        let conveyor = if def.conveyor.is_some() {
            let input = point_position_of(&building, ConnectionKind::Input);
            let output = point_position_of(&building, ConnectionKind::Output);
            match (input, output) {
                (Some(i), Some(o)) => Some(Conveyor::new(i.distance(o))),
                _ => return Err(PlacementError::MissingConveyorPoints),
            }
        } else {
            None
        };

        let id = self.buildings.insert(building);
        if self
            .grid
            .occupy_area(origin, fp.width, fp.height, id)
            .is_err()
        {
            self.buildings.remove(id);
            return Err(PlacementError::AreaUnavailable {
                x: origin.x,
                y: origin.y,
            });
        }
        self.next_seq += 1;

        self.behaviors
            .insert(id, def.behaviors.iter().map(Behavior::new_for).collect());
        if let Some(conv) = conveyor {
            self.conveyors.insert(id, conv);
        }
        self.order.push(id);
        self.pathfinder.invalidate();
        self.events.emit(Event::BuildingPlaced {
            building: id,
            building_type: type_id,
            tick: self.tick_count,
        });
        Ok(id)
    }

    pub fn demolish(&mut self, id: BuildingId) -> Result<(), PlacementError> {
        let building = self
            .buildings
            .remove(id)
            .ok_or(PlacementError::UnknownBuilding)?;
        let fp = building.footprint();
        self.grid.free_area(building.origin, fp.width, fp.height);
        self.behaviors.remove(id);
        if let Some(mut conv) = self.conveyors.remove(id) {
            for item in conv.drain_items() {
                self.resource_pool.release(item.unit);
                self.events.emit(Event::ResourceDestroyed {
                    unit: item.unit,
                    tick: self.tick_count,
                });
            }
        }
        self.order.retain(|&b| b != id);
        self.pathfinder.invalidate();
        self.events.emit(Event::BuildingDemolished {
            building: id,
            tick: self.tick_count,
        });
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Terrain, pathfinding, combat setup
    // -----------------------------------------------------------------------

    /// Stamp modifiers onto a cell and invalidate cached paths, since
    /// walkability may have changed.
    pub fn stamp_modifiers(&mut self, pos: GridPos, mods: CellModifiers) -> Result<(), crate::grid::GridError> {
        self.grid.set_modifiers(pos, mods)?;
        self.pathfinder.invalidate();
        Ok(())
    }

    pub fn find_path(&mut self, start: GridPos, end: GridPos) -> PathResult {
        self.pathfinder.find_path(&self.grid, start, end)
    }

    pub fn set_base_core(&mut self, max_hp: u32, cell: GridPos) {
        self.base_core = Some(BaseCore::new(max_hp, cell));
    }

    pub fn add_spawner(&mut self, config: SpawnerConfig) {
        self.spawners.push(EnemySpawner::new(config));
    }

    /// Spawn one enemy immediately, pathing from `cell` to the core.
    pub fn spawn_enemy(&mut self, config: &crate::combat::EnemyConfig, cell: GridPos) -> EnemyId {
        let path = match self.base_core.as_ref().map(|c| c.cell) {
            Some(core_cell) => self.pathfinder.find_path(&self.grid, cell, core_cell),
            None => Vec::new(),
        };
        let pos = self.grid.center_position(cell, 1, 1);
        let id = self.enemies.insert(Enemy::new(config, pos, path));
        self.enemy_order.push(id);
        self.events.emit(Event::EnemySpawned {
            enemy: id,
            tick: self.tick_count,
        });
        id
    }

    // -----------------------------------------------------------------------
    // Tick pipeline
    // -----------------------------------------------------------------------

    pub fn tick(&mut self, dt: Seconds) {
        self.tick_behaviors(dt);
        self.tick_conveyors(dt);
        self.tick_combat(dt);
        self.tick_count += 1;
    }

    fn tick_behaviors(&mut self, dt: Seconds) {
        let World {
            registry,
            grid,
            buildings,
            behaviors,
            conveyors,
            order,
            resource_pool,
            enemies,
            enemy_order,
            projectiles,
            projectile_order,
            events,
            tick_count,
            search_radius,
            ..
        } = self;

        let snapshot: Vec<BuildingId> = order.clone();
        for id in snapshot {
            // Take the state vec out so the host can borrow every other
            // building's behaviors mutably.
            let Some(mut states) = behaviors.remove(id) else {
                continue;
            };
            let Some(building) = buildings.get(id) else {
                continue;
            };
            let Some(def) = registry.building(building.type_id) else {
                behaviors.insert(id, states);
                continue;
            };
            let bonus = grid
                .cell(building.origin)
                .map(|c| c.modifiers.production_bonus)
                .unwrap_or(Fixed64::ONE);
            let owner_center = building.center;

            let mut host = Host {
                registry,
                buildings,
                behaviors,
                conveyors,
                order,
                pool: resource_pool,
                enemies,
                enemy_order,
                projectiles,
                projectile_order,
                events,
                owner: id,
                owner_center,
                bonus,
                tick: *tick_count,
                search_radius: *search_radius,
            };
            for (i, state) in states.iter_mut().enumerate() {
                let Some(cfg) = def.behaviors.get(i) else {
                    break;
                };
                // One faulty behavior never halts the scheduler.
                if let Err(e) = behavior::tick_behavior(cfg, state, id, &mut host, dt) {
                    log::warn!("behavior {i} of building {id:?} skipped: {e}");
                }
            }
            drop(host);
            behaviors.insert(id, states);
        }
    }

    fn tick_conveyors(&mut self, dt: Seconds) {
        let World {
            registry,
            buildings,
            behaviors,
            conveyors,
            order,
            resource_pool,
            events,
            tick_count,
            search_radius,
            ..
        } = self;

        for &id in order.iter() {
            let Some(mut conv) = conveyors.remove(id) else {
                continue;
            };
            let (def, from) = match buildings.get(id).and_then(|b| {
                registry
                    .building(b.type_id)
                    .map(|d| (d, point_position_of(b, ConnectionKind::Output)))
            }) {
                Some((d, f)) => (d, f),
                None => {
                    conveyors.insert(id, conv);
                    continue;
                }
            };
            let Some(cfg) = def.conveyor.as_ref() else {
                conveyors.insert(id, conv);
                continue;
            };

            if conv.advance(dt) {
                let waiting: Vec<(ResourceUnitId, ResourceTypeId)> = conv
                    .waiting_items()
                    .map(|i| (i.unit, i.resource_type))
                    .collect();
                // Transfer attempts are per-unit: one stuck unit must not
                // starve units the next hop would still accept.
                let mut any_stuck = false;
                for (unit, resource_type) in waiting {
                    let adj = from.and_then(|from| {
                        closest_adjacent_input(
                            from,
                            id,
                            *search_radius,
                            order
                                .iter()
                                .filter_map(|&bid| buildings.get(bid).map(|b| (bid, b))),
                        )
                    });
                    let transferred = transfer_unit(
                        registry,
                        buildings,
                        behaviors,
                        conveyors,
                        resource_pool,
                        events,
                        *tick_count,
                        &mut conv,
                        adj,
                        unit,
                        resource_type,
                    );
                    any_stuck |= !transferred;
                }
                if any_stuck && conv.mark_blocked(cfg) {
                    events.emit(Event::ConveyorBlocked {
                        building: id,
                        tick: *tick_count,
                    });
                }
            }
            conveyors.insert(id, conv);
        }
    }

    fn tick_combat(&mut self, dt: Seconds) {
        // Spawners only run against a live core; an enemy needs somewhere
        // to go.
        let core_cell = match &self.base_core {
            Some(core) if !core.is_destroyed() => Some(core.cell),
            _ => None,
        };
        if let Some(core_cell) = core_cell {
            for sp in &mut self.spawners {
                for _ in 0..sp.tick(dt) {
                    let path =
                        self.pathfinder
                            .find_path(&self.grid, sp.config.spawn_cell, core_cell);
                    let pos = self.grid.center_position(sp.config.spawn_cell, 1, 1);
                    let id = self.enemies.insert(Enemy::new(&sp.config.enemy, pos, path));
                    self.enemy_order.push(id);
                    self.events.emit(Event::EnemySpawned {
                        enemy: id,
                        tick: self.tick_count,
                    });
                }
            }
        }

        // Enemy movement. Arrival consumes the enemy and damages the core;
        // an enemy with no path arrives immediately.
        let moving: Vec<EnemyId> = self.enemy_order.clone();
        for id in moving {
            let Some(enemy) = self.enemies.get_mut(id) else {
                continue;
            };
            if enemy.hp == 0 {
                continue;
            }
            if enemy.move_along_path(&self.grid, dt) {
                let damage = enemy.damage;
                self.enemies.remove(id);
                self.enemy_order.retain(|&e| e != id);
                self.events.emit(Event::EnemyReachedCore {
                    enemy: id,
                    tick: self.tick_count,
                });
                if let Some(core) = &mut self.base_core {
                    if !core.is_destroyed() {
                        let destroyed = core.take_damage(damage);
                        self.events.emit(Event::CoreHealthChanged {
                            hp: core.hp,
                            max_hp: core.max_hp,
                            tick: self.tick_count,
                        });
                        if destroyed {
                            self.events.emit(Event::CoreDestroyed {
                                tick: self.tick_count,
                            });
                        }
                    }
                }
            }
        }

        // Projectiles home on their target; a dead target wastes the shot.
        let flying: Vec<ProjectileId> = self.projectile_order.clone();
        for pid in flying {
            let Some(p) = self.projectiles.get_mut(pid) else {
                continue;
            };
            let target_pos = self
                .enemies
                .get(p.target)
                .filter(|e| e.hp > 0)
                .map(|e| e.pos);
            match p.advance(target_pos, dt) {
                ProjectileOutcome::InFlight => {}
                ProjectileOutcome::Hit => {
                    let (target, damage) = (p.target, p.damage);
                    self.projectiles.remove(pid);
                    self.projectile_order.retain(|&x| x != pid);
                    if let Some(e) = self.enemies.get_mut(target) {
                        e.apply_damage(damage);
                    }
                }
                ProjectileOutcome::Lost => {
                    self.projectiles.remove(pid);
                    self.projectile_order.retain(|&x| x != pid);
                }
            }
        }

        // Sweep the dead.
        let dead: Vec<EnemyId> = self
            .enemy_order
            .iter()
            .copied()
            .filter(|&id| self.enemies.get(id).map(|e| e.hp == 0).unwrap_or(false))
            .collect();
        for id in dead {
            self.enemies.remove(id);
            self.enemy_order.retain(|&e| e != id);
            self.events.emit(Event::EnemyDied {
                enemy: id,
                tick: self.tick_count,
            });
        }
    }
}

/// World position of a building's first point of the given kind.
fn point_position_of(building: &Building, kind: ConnectionKind) -> Option<WorldPos> {
    building
        .points
        .iter()
        .position(|p| p.kind == kind)
        .and_then(|i| building.point_position(i))
}

/// Move one waiting unit to the resolved downstream input: onto the next
/// belt when the target is a conveyor, otherwise into the target's
/// behavior buffers (the unit is recycled to the pool).
#[allow(clippy::too_many_arguments)]
fn transfer_unit(
    registry: &Registry,
    buildings: &SlotMap<BuildingId, Building>,
    behaviors: &mut SecondaryMap<BuildingId, Vec<Behavior>>,
    conveyors: &mut SecondaryMap<BuildingId, Conveyor>,
    pool: &mut Pool<ResourceUnitId, ResourceUnit>,
    events: &mut EventQueue,
    tick: Ticks,
    conv: &mut Conveyor,
    adj: Option<AdjacentInput>,
    unit: ResourceUnitId,
    resource_type: ResourceTypeId,
) -> bool {
    let Some(adj) = adj else {
        return false;
    };
    let Some(target) = buildings.get(adj.building) else {
        return false;
    };
    let Some(def) = registry.building(target.type_id) else {
        return false;
    };

    if let (Some(next), Some(cfg)) = (conveyors.get_mut(adj.building), def.conveyor.as_ref()) {
        if !next.can_accept(cfg, resource_type) {
            return false;
        }
        if conv.remove_unit(unit).is_none() {
            return false;
        }
        next.accept(cfg, unit, resource_type);
        return true;
    }

    if let Some(states) = behaviors.get_mut(adj.building) {
        let amount = pool.get(unit).map(|u| u.amount).unwrap_or(1);
        for (i, state) in states.iter_mut().enumerate() {
            let Some(cfg) = def.behaviors.get(i) else {
                break;
            };
            if behavior::can_accept(cfg, state, resource_type) {
                let taken = behavior::receive(cfg, state, resource_type, amount);
                conv.remove_unit(unit);
                pool.release(unit);
                events.emit(Event::ResourceDelivered {
                    resource_type,
                    amount: taken,
                    to: adj.building,
                    tick,
                });
                return true;
            }
        }
    }
    false
}

// ---------------------------------------------------------------------------
// Behavior host
// ---------------------------------------------------------------------------

/// Split-borrow view of the world handed to behavior ticks. The owner's
/// own behavior vec is removed from the map for the duration, so `behaviors`
/// here only ever reaches *other* buildings.
struct Host<'a> {
    registry: &'a Registry,
    buildings: &'a SlotMap<BuildingId, Building>,
    behaviors: &'a mut SecondaryMap<BuildingId, Vec<Behavior>>,
    conveyors: &'a mut SecondaryMap<BuildingId, Conveyor>,
    order: &'a [BuildingId],
    pool: &'a mut Pool<ResourceUnitId, ResourceUnit>,
    enemies: &'a mut SlotMap<EnemyId, Enemy>,
    enemy_order: &'a [EnemyId],
    projectiles: &'a mut SlotMap<ProjectileId, Projectile>,
    projectile_order: &'a mut Vec<ProjectileId>,
    events: &'a mut EventQueue,
    owner: BuildingId,
    owner_center: WorldPos,
    bonus: Fixed64,
    tick: Ticks,
    search_radius: Fixed64,
}

impl Host<'_> {
    fn output_position(&self) -> Option<WorldPos> {
        self.buildings
            .get(self.owner)
            .and_then(|b| point_position_of(b, ConnectionKind::Output))
    }
}

impl BehaviorHost for Host<'_> {
    fn production_bonus(&self) -> Fixed64 {
        self.bonus
    }

    fn owner_center(&self) -> WorldPos {
        self.owner_center
    }

    fn current_tick(&self) -> Ticks {
        self.tick
    }

    fn try_push_output(&mut self, resource_type: ResourceTypeId) -> bool {
        let Some(from) = self.output_position() else {
            return false;
        };
        let Some(adj) = closest_adjacent_input(
            from,
            self.owner,
            self.search_radius,
            self.order
                .iter()
                .filter_map(|&bid| self.buildings.get(bid).map(|b| (bid, b))),
        ) else {
            return false;
        };
        let Some(target) = self.buildings.get(adj.building) else {
            return false;
        };
        let Some(def) = self.registry.building(target.type_id) else {
            return false;
        };

        if let (Some(conv), Some(cfg)) =
            (self.conveyors.get_mut(adj.building), def.conveyor.as_ref())
        {
            // Acceptance first; the unit is only allocated for a taker.
            if !conv.can_accept(cfg, resource_type) {
                return false;
            }
            let max_stack = self.registry.max_stack(resource_type);
            match self
                .pool
                .acquire(ResourceUnit::new_clamped(resource_type, 1, max_stack))
            {
                Ok(unit) => {
                    conv.accept(cfg, unit, resource_type);
                    self.events.emit(Event::ResourceSpawned {
                        unit,
                        resource_type,
                        by: self.owner,
                        tick: self.tick,
                    });
                    true
                }
                Err(_) => false,
            }
        } else if let Some(states) = self.behaviors.get_mut(adj.building) {
            // Direct edge-to-edge delivery: no transit, no pooled unit.
            for (i, state) in states.iter_mut().enumerate() {
                let Some(cfg) = def.behaviors.get(i) else {
                    break;
                };
                if behavior::can_accept(cfg, state, resource_type) {
                    behavior::receive(cfg, state, resource_type, 1);
                    self.events.emit(Event::ResourceDelivered {
                        resource_type,
                        amount: 1,
                        to: adj.building,
                        tick: self.tick,
                    });
                    return true;
                }
            }
            false
        } else {
            false
        }
    }

    fn acquire_target(&self, range: Fixed64) -> Option<EnemyId> {
        closest_enemy_in_range(
            self.owner_center,
            range,
            self.enemy_order
                .iter()
                .filter_map(|&id| self.enemies.get(id).filter(|e| e.hp > 0).map(|e| (id, e))),
        )
    }

    fn enemy_position(&self, enemy: EnemyId) -> Option<WorldPos> {
        self.enemies.get(enemy).filter(|e| e.hp > 0).map(|e| e.pos)
    }

    fn fire_at(&mut self, target: EnemyId, damage: u32, projectile_speed: Option<Fixed64>) {
        match projectile_speed {
            Some(speed) => {
                let pid = self.projectiles.insert(Projectile {
                    target,
                    pos: self.owner_center,
                    speed,
                    damage,
                });
                self.projectile_order.push(pid);
            }
            // Instant hit; the combat phase sweeps anything this kills.
            None => {
                if let Some(enemy) = self.enemies.get_mut(target) {
                    enemy.apply_damage(damage);
                }
            }
        }
    }

    fn emit(&mut self, event: Event) {
        self.events.emit(event);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::behavior::Behavior;
    use crate::combat::EnemyConfig;
    use crate::event::EventKind;
    use crate::test_utils::{fixed, secs, test_world};

    #[test]
    fn place_occupies_and_demolish_frees() {
        let (mut world, ids) = test_world();
        let origin = GridPos::new(2, 2);
        let id = world
            .place_building(ids.miner, origin, Rotation::None)
            .unwrap();
        assert!(!world.can_place(ids.miner, origin, Rotation::None));
        assert_eq!(world.grid().cell(origin).unwrap().owner, Some(id));

        world.demolish(id).unwrap();
        assert!(world.can_place(ids.miner, origin, Rotation::None));
        assert!(world.building(id).is_none());

        let events = world.drain_events();
        assert!(events
            .iter()
            .any(|e| matches!(e, Event::BuildingPlaced { .. })));
        assert!(events
            .iter()
            .any(|e| matches!(e, Event::BuildingDemolished { .. })));
    }

    #[test]
    fn placement_rejects_overlap_and_unknown_type() {
        let (mut world, ids) = test_world();
        world
            .place_building(ids.miner, GridPos::new(0, 0), Rotation::None)
            .unwrap();
        let err = world
            .place_building(ids.miner, GridPos::new(0, 0), Rotation::None)
            .unwrap_err();
        assert!(matches!(err, PlacementError::AreaUnavailable { .. }));

        let err = world
            .place_building(BuildingTypeId(99), GridPos::new(5, 5), Rotation::None)
            .unwrap_err();
        assert!(matches!(err, PlacementError::UnknownBuildingType(_)));
    }

    #[test]
    fn placement_seq_is_monotonic() {
        let (mut world, ids) = test_world();
        let a = world
            .place_building(ids.miner, GridPos::new(0, 0), Rotation::None)
            .unwrap();
        let b = world
            .place_building(ids.miner, GridPos::new(2, 0), Rotation::None)
            .unwrap();
        world.demolish(a).unwrap();
        let c = world
            .place_building(ids.miner, GridPos::new(4, 0), Rotation::None)
            .unwrap();
        // Sequence numbers are never reused.
        assert_eq!(world.building(b).unwrap().seq, 1);
        assert_eq!(world.building(c).unwrap().seq, 2);
    }

    #[test]
    fn production_blocks_without_downstream() {
        let (mut world, ids) = test_world();
        let miner = world
            .place_building(ids.miner, GridPos::new(0, 0), Rotation::None)
            .unwrap();
        for _ in 0..15 {
            world.tick(secs(0.1));
        }
        // ~1.5s at 1s interval: one unit accumulated, push refused.
        let Some(Behavior::Production(st)) = world.behavior(miner, 0) else {
            panic!("expected production state");
        };
        assert!(st.blocked);
        assert_eq!(st.accumulated, 1);
        assert_eq!(world.live_resource_units(), 0);
        let events = world.drain_events();
        assert!(events
            .iter()
            .any(|e| matches!(e, Event::ProductionBlocked { .. })));
    }

    #[test]
    fn production_feeds_adjacent_belt() {
        let (mut world, ids) = test_world();
        world
            .place_building(ids.miner, GridPos::new(0, 0), Rotation::None)
            .unwrap();
        let belt = world
            .place_building(ids.belt, GridPos::new(1, 0), Rotation::None)
            .unwrap();
        for _ in 0..11 {
            world.tick(secs(0.1));
        }
        // One unit produced at ~1s and placed on the belt.
        assert_eq!(world.live_resource_units(), 1);
        assert_eq!(world.conveyor(belt).unwrap().items().len(), 1);
        let events = world.drain_events();
        assert!(events
            .iter()
            .any(|e| matches!(e, Event::ResourceSpawned { .. })));
    }

    #[test]
    fn direct_delivery_into_adjacent_smelter() {
        let (mut world, ids) = test_world();
        world
            .place_building(ids.miner, GridPos::new(0, 0), Rotation::None)
            .unwrap();
        let smelter = world
            .place_building(ids.smelter, GridPos::new(1, 0), Rotation::None)
            .unwrap();
        for _ in 0..11 {
            world.tick(secs(0.1));
        }
        // Edge-to-edge delivery: no pooled unit, input buffer filled.
        assert_eq!(world.live_resource_units(), 0);
        let Some(Behavior::Processing(st)) = world.behavior(smelter, 0) else {
            panic!("expected processing state");
        };
        assert!(st.input_buffer >= 1 || st.processing);
    }

    #[test]
    fn conveyor_blocked_emits_once_and_demolition_recycles_units() {
        let (mut world, ids) = test_world();
        world
            .place_building(ids.miner, GridPos::new(0, 0), Rotation::None)
            .unwrap();
        let belt = world
            .place_building(ids.belt, GridPos::new(1, 0), Rotation::None)
            .unwrap();
        // No consumer at the end of the belt.
        for _ in 0..20 {
            world.tick(secs(0.1));
        }
        assert!(world.conveyor(belt).unwrap().is_blocked());
        let events = world.drain_events();
        let blocked = events
            .iter()
            .filter(|e| matches!(e, Event::ConveyorBlocked { .. }))
            .count();
        assert_eq!(blocked, 1);

        assert_eq!(world.live_resource_units(), 1);
        world.demolish(belt).unwrap();
        assert_eq!(world.live_resource_units(), 0);
        assert!(world
            .drain_events()
            .iter()
            .any(|e| matches!(e, Event::ResourceDestroyed { .. })));
    }

    #[test]
    fn stuck_unit_does_not_starve_other_types_on_the_belt() {
        let (mut world, ids) = test_world();
        // Plate line: miner -> belt -> smelter, then the smelter's plates
        // land on a second belt whose only consumer is a turret. The turret
        // takes iron (ammo) but never plates, so the first plate is stuck
        // at the output end for good.
        world
            .place_building(ids.miner, GridPos::new(0, 0), Rotation::None)
            .unwrap();
        world
            .place_building(ids.belt, GridPos::new(1, 0), Rotation::None)
            .unwrap();
        world
            .place_building(ids.smelter, GridPos::new(2, 0), Rotation::None)
            .unwrap();
        let belt = world
            .place_building(ids.belt, GridPos::new(3, 0), Rotation::None)
            .unwrap();
        let turret = world
            .place_building(ids.turret, GridPos::new(4, 0), Rotation::None)
            .unwrap();
        // A second miner from below feeds iron onto the same belt.
        world
            .place_building(ids.miner, GridPos::new(2, -1), Rotation::None)
            .unwrap();

        for _ in 0..80 {
            world.tick(secs(0.1));
        }

        // The stuck plate is still on the belt...
        let items = world.conveyor(belt).unwrap().items();
        assert!(items.iter().any(|i| i.resource_type == ids.plate));
        // ...but iron kept flowing past it into the turret, one unit per
        // second from the second miner.
        let Some(Behavior::Turret(st)) = world.behavior(turret, 0) else {
            panic!("expected turret state");
        };
        assert!(st.ammo >= 6, "iron starved behind the stuck plate: {}", st.ammo);
    }

    #[test]
    fn routing_ties_break_by_placement_order() {
        let (mut world, ids) = test_world();
        // Two turrets whose input points sit at the same distance from the
        // miner's output: above and below, one cell offset each.
        let miner = world
            .place_building(ids.miner, GridPos::new(1, 1), Rotation::None)
            .unwrap();
        let above = world
            .place_building(ids.turret, GridPos::new(2, 2), Rotation::None)
            .unwrap();
        let below = world
            .place_building(ids.turret, GridPos::new(2, 0), Rotation::None)
            .unwrap();
        let _ = miner;
        for _ in 0..11 {
            world.tick(secs(0.1));
        }
        // The earlier placement wins the tie.
        let Some(Behavior::Turret(a)) = world.behavior(above, 0) else {
            panic!("expected turret state");
        };
        let Some(Behavior::Turret(b)) = world.behavior(below, 0) else {
            panic!("expected turret state");
        };
        assert_eq!(a.ammo, 1);
        assert_eq!(b.ammo, 0);
    }

    #[test]
    fn turret_defends_the_core() {
        let (mut world, ids) = test_world();
        world.set_base_core(1000, GridPos::new(10, 0));
        let turret = world
            .place_building(ids.turret, GridPos::new(5, 1), Rotation::None)
            .unwrap();
        // Load ammo directly.
        let miner = world
            .place_building(ids.miner, GridPos::new(4, 1), Rotation::None)
            .unwrap();
        let _ = miner;

        let slow = EnemyConfig {
            max_hp: 100,
            speed: fixed(0.5),
            damage: 100,
        };
        let enemy = world.spawn_enemy(&slow, GridPos::new(0, 0));
        // Give the miner time to feed ammo and the turret time to kill:
        // enemy takes 20s to cross; 2 shots of 50 suffice.
        for _ in 0..100 {
            world.tick(secs(0.1));
        }
        assert!(world.enemy(enemy).is_none());
        assert_eq!(world.base_core().unwrap().hp, 1000);
        let _ = turret;
        let events = world.drain_events();
        assert!(events
            .iter()
            .any(|e| matches!(e, Event::TurretFired { .. })));
        assert!(events.iter().any(|e| matches!(e, Event::EnemyDied { .. })));
    }

    #[test]
    fn enemy_reaches_core_and_damages_it() {
        let (mut world, _ids) = test_world();
        world.set_base_core(1000, GridPos::new(3, 0));
        let cfg = EnemyConfig {
            max_hp: 10,
            speed: fixed(2.0),
            damage: 150,
        };
        world.spawn_enemy(&cfg, GridPos::new(0, 0));
        for _ in 0..30 {
            world.tick(secs(0.1));
        }
        assert_eq!(world.enemy_count(), 0);
        assert_eq!(world.base_core().unwrap().hp, 850);
        let events = world.drain_events();
        assert!(events
            .iter()
            .any(|e| matches!(e, Event::EnemyReachedCore { .. })));
        assert!(events
            .iter()
            .any(|e| matches!(e, Event::CoreHealthChanged { hp: 850, .. })));
    }

    #[test]
    fn spawner_emits_enemies_toward_core() {
        let (mut world, _ids) = test_world();
        world.set_base_core(1000, GridPos::new(5, 5));
        world.add_spawner(SpawnerConfig {
            spawn_cell: GridPos::new(0, 0),
            interval: secs(1.0),
            enemy: EnemyConfig {
                max_hp: 10,
                speed: fixed(0.1),
                damage: 1,
            },
        });
        for _ in 0..25 {
            world.tick(secs(0.1));
        }
        // 2.5 seconds at a 1s interval: two spawns.
        assert_eq!(
            world.events_mut().total_emitted(EventKind::EnemySpawned),
            2
        );
    }

    #[test]
    fn behavior_error_is_isolated() {
        let (mut world, ids) = test_world();
        let miner = world
            .place_building(ids.miner, GridPos::new(0, 0), Rotation::None)
            .unwrap();
        // Corrupt the state variant to force a config mismatch.
        world.behaviors.insert(miner, vec![Behavior::Storage(Default::default())]);
        let other = world
            .place_building(ids.miner, GridPos::new(3, 0), Rotation::None)
            .unwrap();
        for _ in 0..11 {
            world.tick(secs(0.1));
        }
        // The healthy miner still ran.
        let Some(Behavior::Production(st)) = world.behavior(other, 0) else {
            panic!("expected production state");
        };
        assert_eq!(st.accumulated, 1);
    }
}
