//! Building behavior state machines.
//!
//! Behaviors follow a config/state split: a [`BehaviorConfig`] is immutable
//! data from the registry, and a [`Behavior`] is the per-building mutable
//! state created by [`Behavior::new_for`]. The two enums match by variant;
//! [`tick_behavior`] pairs them and fails with
//! [`BehaviorError::ConfigMismatch`] if they ever diverge.
//!
//! Behaviors never reach into the world directly. Everything they need from
//! outside — routing a produced unit downstream, enemy queries, event
//! emission — goes through the [`BehaviorHost`] seam, which the world
//! implements with split borrows and tests implement with mocks.
//!
//! # Kinds
//!
//! - **Production**: interval timer fills an output accumulator (capped),
//!   pushes one unit per tick downstream, flags blocked on refusal.
//! - **Processing**: input buffer -> timed conversion -> output buffer,
//!   with capacity checks on both ends.
//! - **Storage**: declared but inert. Fields exist; no tick transitions
//!   and no acceptance yet.
//! - **Turret**: ammo buffer, sticky targeting, bounded rotation, cooldown.

use serde::{Serialize, Deserialize};
use thiserror::Error;

use crate::event::Event;
use crate::fixed::{Fixed64, Seconds, Ticks};
use crate::id::{EnemyId, ResourceTypeId};
use crate::math::{atan2_deg, delta_angle, move_towards_angle, WorldPos};

/// Turrets fire once the aim error is under this many degrees.
pub const AIM_TOLERANCE_DEG: f64 = 5.0;

// ---------------------------------------------------------------------------
// Configs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductionConfig {
    pub output_resource: ResourceTypeId,
    /// Seconds per produced unit.
    pub production_interval: Seconds,
    /// Accumulator cap; production pauses while full.
    pub max_output_stack: u32,
    /// Apply the cell production bonus to timer advance.
    pub use_modifiers: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingConfig {
    pub input_resource: ResourceTypeId,
    /// Units consumed per conversion.
    pub input_amount: u32,
    pub max_input_buffer: u32,
    pub output_resource: ResourceTypeId,
    /// Units produced per conversion.
    pub output_amount: u32,
    pub max_output_buffer: u32,
    pub processing_time: Seconds,
    pub use_modifiers: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    pub max_capacity: u32,
    pub can_output: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurretConfig {
    pub ammo_resource: ResourceTypeId,
    pub max_ammo_buffer: u32,
    pub attack_range: Fixed64,
    pub attack_cooldown: Seconds,
    pub damage: u32,
    /// `None` means instant-hit; `Some` spawns a homing projectile.
    pub projectile_speed: Option<Fixed64>,
    /// Degrees per second.
    pub rotation_speed: Fixed64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BehaviorConfig {
    Production(ProductionConfig),
    Processing(ProcessingConfig),
    Storage(StorageConfig),
    Turret(TurretConfig),
}

// ---------------------------------------------------------------------------
// States
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductionState {
    pub timer: Seconds,
    pub accumulated: u32,
    pub blocked: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProcessingState {
    pub input_buffer: u32,
    pub output_buffer: u32,
    pub processing: bool,
    pub timer: Seconds,
    pub blocked: bool,
}

/// Inert. Holds its fill level and nothing else happens to it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StorageState {
    pub stored: u32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TurretState {
    pub ammo: u32,
    pub cooldown: Seconds,
    /// Current facing in degrees, (-180, 180].
    pub facing_deg: Fixed64,
    pub target: Option<EnemyId>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Behavior {
    Production(ProductionState),
    Processing(ProcessingState),
    Storage(StorageState),
    Turret(TurretState),
}

impl Behavior {
    /// Fresh state for a config. Variants always match by construction.
    pub fn new_for(config: &BehaviorConfig) -> Behavior {
        match config {
            BehaviorConfig::Production(_) => Behavior::Production(ProductionState::default()),
            BehaviorConfig::Processing(_) => Behavior::Processing(ProcessingState::default()),
            BehaviorConfig::Storage(_) => Behavior::Storage(StorageState::default()),
            BehaviorConfig::Turret(_) => Behavior::Turret(TurretState::default()),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BehaviorError {
    #[error("behavior state does not match its config variant")]
    ConfigMismatch,
}

// ---------------------------------------------------------------------------
// Host seam
// ---------------------------------------------------------------------------

/// What a behavior can see and do outside its own state. Implemented by the
/// world with split borrows; tests use mocks.
pub trait BehaviorHost {
    /// Production bonus of the cell under the owner (1 when unmodified).
    fn production_bonus(&self) -> Fixed64;

    fn owner_center(&self) -> WorldPos;

    fn current_tick(&self) -> Ticks;

    /// Route one unit of `resource_type` to the closest adjacent input.
    /// Acceptance is checked before any unit is allocated; `false` means
    /// nothing downstream would take it.
    fn try_push_output(&mut self, resource_type: ResourceTypeId) -> bool;

    /// Closest living enemy within `range` of the owner.
    fn acquire_target(&self, range: Fixed64) -> Option<EnemyId>;

    /// Position of a living enemy; `None` once it is dead.
    fn enemy_position(&self, enemy: EnemyId) -> Option<WorldPos>;

    /// Fire on a target: spawns a projectile when `projectile_speed` is
    /// set, otherwise applies `damage` instantly.
    fn fire_at(&mut self, target: EnemyId, damage: u32, projectile_speed: Option<Fixed64>);

    fn emit(&mut self, event: Event);
}

// ---------------------------------------------------------------------------
// Acceptance & delivery
// ---------------------------------------------------------------------------

/// Whether this behavior would take one unit of `resource_type` right now.
/// Checked by routing before any unit is allocated.
pub fn can_accept(config: &BehaviorConfig, state: &Behavior, resource_type: ResourceTypeId) -> bool {
    match (config, state) {
        (BehaviorConfig::Processing(cfg), Behavior::Processing(st)) => {
            resource_type == cfg.input_resource && st.input_buffer < cfg.max_input_buffer
        }
        (BehaviorConfig::Turret(cfg), Behavior::Turret(st)) => {
            resource_type == cfg.ammo_resource && st.ammo < cfg.max_ammo_buffer
        }
        // Production has no inputs; storage is inert.
        _ => false,
    }
}

/// Deliver `amount` of `resource_type` into this behavior's buffers.
/// Returns how much was absorbed; overflow past the buffer cap is lost,
/// and wrong-type deliveries are refused with a warning.
pub fn receive(
    config: &BehaviorConfig,
    state: &mut Behavior,
    resource_type: ResourceTypeId,
    amount: u32,
) -> u32 {
    match (config, state) {
        (BehaviorConfig::Processing(cfg), Behavior::Processing(st)) => {
            if resource_type != cfg.input_resource {
                log::warn!(
                    "processing building refused resource type {:?} (wants {:?})",
                    resource_type,
                    cfg.input_resource
                );
                return 0;
            }
            let space = cfg.max_input_buffer.saturating_sub(st.input_buffer);
            let taken = amount.min(space);
            st.input_buffer += taken;
            taken
        }
        (BehaviorConfig::Turret(cfg), Behavior::Turret(st)) => {
            if resource_type != cfg.ammo_resource {
                log::warn!(
                    "turret refused resource type {:?} (wants ammo {:?})",
                    resource_type,
                    cfg.ammo_resource
                );
                return 0;
            }
            let space = cfg.max_ammo_buffer.saturating_sub(st.ammo);
            let taken = amount.min(space);
            st.ammo += taken;
            taken
        }
        (BehaviorConfig::Production(_), Behavior::Production(_)) => {
            log::warn!("production building received a resource; it has no inputs");
            0
        }
        (BehaviorConfig::Storage(_), Behavior::Storage(_)) => 0,
        _ => 0,
    }
}

// ---------------------------------------------------------------------------
// Tick
// ---------------------------------------------------------------------------

/// Advance one behavior by `dt`. Dispatches on the config/state pair.
pub fn tick_behavior(
    config: &BehaviorConfig,
    state: &mut Behavior,
    owner: crate::id::BuildingId,
    host: &mut dyn BehaviorHost,
    dt: Seconds,
) -> Result<(), BehaviorError> {
    match (config, state) {
        (BehaviorConfig::Production(cfg), Behavior::Production(st)) => {
            tick_production(cfg, st, owner, host, dt);
            Ok(())
        }
        (BehaviorConfig::Processing(cfg), Behavior::Processing(st)) => {
            tick_processing(cfg, st, owner, host, dt);
            Ok(())
        }
        // Storage is a stub: state exists, nothing transitions.
        (BehaviorConfig::Storage(_), Behavior::Storage(_)) => Ok(()),
        (BehaviorConfig::Turret(cfg), Behavior::Turret(st)) => {
            tick_turret(cfg, st, owner, host, dt);
            Ok(())
        }
        _ => Err(BehaviorError::ConfigMismatch),
    }
}

fn effective_dt(dt: Seconds, use_modifiers: bool, bonus: Fixed64) -> Seconds {
    if use_modifiers { dt * bonus } else { dt }
}

fn tick_production(
    cfg: &ProductionConfig,
    st: &mut ProductionState,
    owner: crate::id::BuildingId,
    host: &mut dyn BehaviorHost,
    dt: Seconds,
) {
    // Timer only advances while the accumulator has room.
    if st.accumulated < cfg.max_output_stack && cfg.production_interval > Seconds::ZERO {
        st.timer += effective_dt(dt, cfg.use_modifiers, host.production_bonus());
        while st.timer >= cfg.production_interval && st.accumulated < cfg.max_output_stack {
            st.timer -= cfg.production_interval;
            st.accumulated += 1;
        }
        if st.accumulated >= cfg.max_output_stack {
            st.timer = Seconds::ZERO;
        }
    }

    // One push attempt per tick.
    if st.accumulated > 0 {
        if host.try_push_output(cfg.output_resource) {
            st.accumulated -= 1;
            if st.blocked {
                st.blocked = false;
                let tick = host.current_tick();
                host.emit(Event::ProductionResumed {
                    building: owner,
                    tick,
                });
            }
        } else if !st.blocked {
            st.blocked = true;
            let tick = host.current_tick();
            host.emit(Event::ProductionBlocked {
                building: owner,
                tick,
            });
        }
    }
}

fn tick_processing(
    cfg: &ProcessingConfig,
    st: &mut ProcessingState,
    owner: crate::id::BuildingId,
    host: &mut dyn BehaviorHost,
    dt: Seconds,
) {
    // Start a conversion only when the inputs are there and the finished
    // batch will fit. A full output defers the start, it never overfills.
    if !st.processing
        && st.input_buffer >= cfg.input_amount
        && st.output_buffer + cfg.output_amount <= cfg.max_output_buffer
    {
        st.processing = true;
        st.timer = Seconds::ZERO;
        let tick = host.current_tick();
        host.emit(Event::ProcessingStarted {
            building: owner,
            tick,
        });
    }

    if st.processing {
        st.timer += effective_dt(dt, cfg.use_modifiers, host.production_bonus());
        if st.timer >= cfg.processing_time {
            st.processing = false;
            st.timer = Seconds::ZERO;
            st.input_buffer = st.input_buffer.saturating_sub(cfg.input_amount);
            st.output_buffer += cfg.output_amount;
            let tick = host.current_tick();
            host.emit(Event::ProcessingCompleted {
                building: owner,
                resource_type: cfg.output_resource,
                amount: cfg.output_amount,
                tick,
            });
        }
    }

    if st.output_buffer > 0 {
        if host.try_push_output(cfg.output_resource) {
            st.output_buffer -= 1;
            st.blocked = false;
        } else {
            st.blocked = true;
        }
    }
}

fn tick_turret(
    cfg: &TurretConfig,
    st: &mut TurretState,
    owner: crate::id::BuildingId,
    host: &mut dyn BehaviorHost,
    dt: Seconds,
) {
    if st.cooldown > Seconds::ZERO {
        st.cooldown = (st.cooldown - dt).max(Seconds::ZERO);
    }

    let center = host.owner_center();
    let range_sq = cfg.attack_range * cfg.attack_range;

    // Sticky targeting: keep the current target while it lives and stays
    // in range, otherwise reacquire the closest enemy.
    let target_pos = st.target.and_then(|t| {
        host.enemy_position(t)
            .filter(|pos| center.distance_sq(*pos) <= range_sq)
    });
    let (target, target_pos) = match (st.target, target_pos) {
        (Some(t), Some(pos)) => (Some(t), Some(pos)),
        _ => {
            let t = host.acquire_target(cfg.attack_range);
            (t, t.and_then(|t| host.enemy_position(t)))
        }
    };
    st.target = target;

    let (Some(target), Some(pos)) = (target, target_pos) else {
        return;
    };

    let desired = atan2_deg(pos.y - center.y, pos.x - center.x);
    st.facing_deg = move_towards_angle(st.facing_deg, desired, cfg.rotation_speed * dt);

    let aim_error = delta_angle(st.facing_deg, desired).abs();
    if aim_error < Fixed64::from_num(AIM_TOLERANCE_DEG)
        && st.cooldown <= Seconds::ZERO
        && st.ammo > 0
    {
        st.ammo -= 1;
        st.cooldown = cfg.attack_cooldown;
        host.fire_at(target, cfg.damage, cfg.projectile_speed);
        let tick = host.current_tick();
        host.emit(Event::TurretFired {
            building: owner,
            target,
            tick,
        });
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::BuildingId;
    use crate::math::Vec2Fixed;
    use slotmap::SlotMap;

    fn iron() -> ResourceTypeId {
        ResourceTypeId(0)
    }

    fn plate() -> ResourceTypeId {
        ResourceTypeId(1)
    }

    fn owner_id() -> BuildingId {
        let mut sm = SlotMap::<BuildingId, ()>::with_key();
        sm.insert(())
    }

    fn enemy_id() -> EnemyId {
        let mut sm = SlotMap::<EnemyId, ()>::with_key();
        sm.insert(())
    }

    fn secs(v: f64) -> Seconds {
        Seconds::from_num(v)
    }

    /// Host with scripted push results and a single optional enemy.
    struct MockHost {
        bonus: Fixed64,
        push_accepts: bool,
        pushes: Vec<ResourceTypeId>,
        enemy: Option<(EnemyId, WorldPos)>,
        shots: Vec<(EnemyId, u32, Option<Fixed64>)>,
        events: Vec<Event>,
    }

    impl Default for MockHost {
        fn default() -> Self {
            MockHost {
                bonus: Fixed64::ONE,
                push_accepts: true,
                pushes: Vec::new(),
                enemy: None,
                shots: Vec::new(),
                events: Vec::new(),
            }
        }
    }

    impl BehaviorHost for MockHost {
        fn production_bonus(&self) -> Fixed64 {
            self.bonus
        }
        fn owner_center(&self) -> WorldPos {
            Vec2Fixed::ZERO
        }
        fn current_tick(&self) -> Ticks {
            0
        }
        fn try_push_output(&mut self, resource_type: ResourceTypeId) -> bool {
            if self.push_accepts {
                self.pushes.push(resource_type);
            }
            self.push_accepts
        }
        fn acquire_target(&self, range: Fixed64) -> Option<EnemyId> {
            self.enemy.and_then(|(id, pos)| {
                (Vec2Fixed::ZERO.distance_sq(pos) <= range * range).then_some(id)
            })
        }
        fn enemy_position(&self, enemy: EnemyId) -> Option<WorldPos> {
            self.enemy
                .and_then(|(id, pos)| (id == enemy).then_some(pos))
        }
        fn fire_at(&mut self, target: EnemyId, damage: u32, projectile_speed: Option<Fixed64>) {
            self.shots.push((target, damage, projectile_speed));
        }
        fn emit(&mut self, event: Event) {
            self.events.push(event);
        }
    }

    fn production_cfg() -> BehaviorConfig {
        BehaviorConfig::Production(ProductionConfig {
            output_resource: iron(),
            production_interval: secs(2.0),
            max_output_stack: 3,
            use_modifiers: false,
        })
    }

    fn processing_cfg() -> BehaviorConfig {
        BehaviorConfig::Processing(ProcessingConfig {
            input_resource: iron(),
            input_amount: 2,
            max_input_buffer: 10,
            output_resource: plate(),
            output_amount: 1,
            max_output_buffer: 5,
            processing_time: secs(2.0),
            use_modifiers: false,
        })
    }

    fn turret_cfg() -> BehaviorConfig {
        BehaviorConfig::Turret(TurretConfig {
            ammo_resource: iron(),
            max_ammo_buffer: 5,
            attack_range: Fixed64::from_num(10),
            attack_cooldown: secs(1.0),
            damage: 25,
            projectile_speed: None,
            rotation_speed: Fixed64::from_num(360),
        })
    }

    fn run(
        cfg: &BehaviorConfig,
        st: &mut Behavior,
        host: &mut MockHost,
        dt: f64,
        ticks: usize,
    ) {
        let owner = owner_id();
        for _ in 0..ticks {
            tick_behavior(cfg, st, owner, host, secs(dt)).unwrap();
        }
    }

    #[test]
    fn new_for_matches_variant() {
        assert!(matches!(
            Behavior::new_for(&production_cfg()),
            Behavior::Production(_)
        ));
        assert!(matches!(
            Behavior::new_for(&turret_cfg()),
            Behavior::Turret(_)
        ));
    }

    #[test]
    fn mismatched_pair_errors() {
        let cfg = production_cfg();
        let mut st = Behavior::new_for(&turret_cfg());
        let err = tick_behavior(&cfg, &mut st, owner_id(), &mut MockHost::default(), secs(0.1))
            .unwrap_err();
        assert_eq!(err, BehaviorError::ConfigMismatch);
    }

    // -- Production --

    #[test]
    fn production_caps_at_max_output_stack() {
        let cfg = production_cfg();
        let mut st = Behavior::new_for(&cfg);
        let mut host = MockHost::default();
        host.push_accepts = false;
        // 2s interval, cap 3: after ~6 seconds exactly 3 units accumulated.
        run(&cfg, &mut st, &mut host, 0.1, 61);
        let Behavior::Production(st) = &st else { panic!() };
        assert_eq!(st.accumulated, 3);
        // Keep running: still 3.
        let mut st = Behavior::Production(st.clone());
        run(&cfg, &mut st, &mut host, 0.1, 60);
        let Behavior::Production(st) = &st else { panic!() };
        assert_eq!(st.accumulated, 3);
    }

    #[test]
    fn production_pushes_and_clears_blocked_flag() {
        let cfg = production_cfg();
        let mut st = Behavior::new_for(&cfg);
        let mut host = MockHost::default();
        host.push_accepts = false;
        run(&cfg, &mut st, &mut host, 0.5, 4); // 2s: one unit, push refused
        {
            let Behavior::Production(p) = &st else { panic!() };
            assert!(p.blocked);
            assert_eq!(p.accumulated, 1);
        }
        assert!(host
            .events
            .iter()
            .any(|e| matches!(e, Event::ProductionBlocked { .. })));

        host.push_accepts = true;
        run(&cfg, &mut st, &mut host, 0.1, 1);
        let Behavior::Production(p) = &st else { panic!() };
        assert!(!p.blocked);
        assert_eq!(p.accumulated, 0);
        assert_eq!(host.pushes, vec![iron()]);
        assert!(host
            .events
            .iter()
            .any(|e| matches!(e, Event::ProductionResumed { .. })));
    }

    #[test]
    fn production_bonus_scales_timer() {
        let cfg = BehaviorConfig::Production(ProductionConfig {
            output_resource: iron(),
            production_interval: secs(2.0),
            max_output_stack: 10,
            use_modifiers: true,
        });
        let mut st = Behavior::new_for(&cfg);
        let mut host = MockHost::default();
        host.bonus = Fixed64::from_num(2);
        host.push_accepts = false;
        // Bonus 2 halves the interval: ~2 seconds yields 2 units.
        run(&cfg, &mut st, &mut host, 0.1, 21);
        let Behavior::Production(p) = &st else { panic!() };
        assert_eq!(p.accumulated, 2);
    }

    #[test]
    fn production_rejects_received_resources() {
        let cfg = production_cfg();
        let mut st = Behavior::new_for(&cfg);
        assert!(!can_accept(&cfg, &st, iron()));
        assert_eq!(receive(&cfg, &mut st, iron(), 1), 0);
    }

    // -- Processing --

    #[test]
    fn processing_waits_for_enough_input() {
        let cfg = processing_cfg();
        let mut st = Behavior::new_for(&cfg);
        let mut host = MockHost::default();
        assert_eq!(receive(&cfg, &mut st, iron(), 1), 1);
        // Needs 2 inputs; never starts with 1.
        run(&cfg, &mut st, &mut host, 0.5, 20);
        let Behavior::Processing(p) = &st else { panic!() };
        assert!(!p.processing);
        assert_eq!(p.input_buffer, 1);
        assert_eq!(p.output_buffer, 0);
    }

    #[test]
    fn processing_converts_and_pushes() {
        let cfg = processing_cfg();
        let mut st = Behavior::new_for(&cfg);
        let mut host = MockHost::default();
        host.push_accepts = false;
        assert_eq!(receive(&cfg, &mut st, iron(), 4), 4);
        // 2s conversion: consumes 2 iron, produces 1 plate.
        run(&cfg, &mut st, &mut host, 0.1, 21);
        {
            let Behavior::Processing(p) = &st else { panic!() };
            assert_eq!(p.input_buffer, 2);
            assert_eq!(p.output_buffer, 1);
        }
        assert!(host
            .events
            .iter()
            .any(|e| matches!(e, Event::ProcessingCompleted { amount: 1, .. })));

        host.push_accepts = true;
        run(&cfg, &mut st, &mut host, 0.1, 1);
        let Behavior::Processing(p) = &st else { panic!() };
        assert_eq!(p.output_buffer, 0);
        assert_eq!(host.pushes, vec![plate()]);
    }

    #[test]
    fn processing_defers_start_when_output_full() {
        let cfg = BehaviorConfig::Processing(ProcessingConfig {
            input_resource: iron(),
            input_amount: 1,
            max_input_buffer: 10,
            output_resource: plate(),
            output_amount: 1,
            max_output_buffer: 1,
            processing_time: secs(1.0),
            use_modifiers: false,
        });
        let mut st = Behavior::new_for(&cfg);
        let mut host = MockHost::default();
        host.push_accepts = false;
        receive(&cfg, &mut st, iron(), 5);
        run(&cfg, &mut st, &mut host, 0.1, 50);
        let Behavior::Processing(p) = &st else { panic!() };
        // One batch fits; the second never starts while the output is full.
        assert_eq!(p.output_buffer, 1);
        assert!(!p.processing);
        assert_eq!(p.input_buffer, 4);
    }

    #[test]
    fn processing_refuses_wrong_type_and_clamps_overflow() {
        let cfg = processing_cfg();
        let mut st = Behavior::new_for(&cfg);
        assert!(!can_accept(&cfg, &st, plate()));
        assert_eq!(receive(&cfg, &mut st, plate(), 3), 0);
        // Buffer cap 10: delivering 15 absorbs 10, loses the rest.
        assert_eq!(receive(&cfg, &mut st, iron(), 15), 10);
        assert!(!can_accept(&cfg, &st, iron()));
    }

    // -- Storage --

    #[test]
    fn storage_is_inert() {
        let cfg = BehaviorConfig::Storage(StorageConfig {
            max_capacity: 100,
            can_output: false,
        });
        let mut st = Behavior::new_for(&cfg);
        let mut host = MockHost::default();
        assert!(!can_accept(&cfg, &st, iron()));
        assert_eq!(receive(&cfg, &mut st, iron(), 5), 0);
        run(&cfg, &mut st, &mut host, 0.5, 10);
        assert_eq!(st, Behavior::Storage(StorageState { stored: 0 }));
        assert!(host.events.is_empty());
    }

    // -- Turret --

    #[test]
    fn turret_fires_when_aimed_and_loaded() {
        let cfg = turret_cfg();
        let mut st = Behavior::new_for(&cfg);
        let mut host = MockHost::default();
        let enemy = enemy_id();
        host.enemy = Some((
            enemy,
            Vec2Fixed::new(Fixed64::from_num(5), Fixed64::ZERO),
        ));
        receive(&cfg, &mut st, iron(), 3);
        // Facing starts at 0 which already points at the enemy.
        run(&cfg, &mut st, &mut host, 0.1, 1);
        assert_eq!(host.shots.len(), 1);
        assert_eq!(host.shots[0], (enemy, 25, None));
        let Behavior::Turret(t) = &st else { panic!() };
        assert_eq!(t.ammo, 2);
        assert!(t.cooldown > Seconds::ZERO);
        assert!(host
            .events
            .iter()
            .any(|e| matches!(e, Event::TurretFired { .. })));
    }

    #[test]
    fn turret_respects_cooldown() {
        let cfg = turret_cfg();
        let mut st = Behavior::new_for(&cfg);
        let mut host = MockHost::default();
        host.enemy = Some((
            enemy_id(),
            Vec2Fixed::new(Fixed64::from_num(3), Fixed64::ZERO),
        ));
        receive(&cfg, &mut st, iron(), 5);
        // 1s cooldown, 0.1s ticks over 2.05s: 3 shots (t=0, 1.0, 2.0).
        run(&cfg, &mut st, &mut host, 0.1, 21);
        assert_eq!(host.shots.len(), 3);
    }

    #[test]
    fn turret_holds_fire_without_ammo() {
        let cfg = turret_cfg();
        let mut st = Behavior::new_for(&cfg);
        let mut host = MockHost::default();
        host.enemy = Some((
            enemy_id(),
            Vec2Fixed::new(Fixed64::from_num(3), Fixed64::ZERO),
        ));
        run(&cfg, &mut st, &mut host, 0.1, 20);
        assert!(host.shots.is_empty());
    }

    #[test]
    fn turret_rotates_before_firing() {
        let cfg = BehaviorConfig::Turret(TurretConfig {
            rotation_speed: Fixed64::from_num(90),
            ..match turret_cfg() {
                BehaviorConfig::Turret(c) => c,
                _ => unreachable!(),
            }
        });
        let mut st = Behavior::new_for(&cfg);
        let mut host = MockHost::default();
        // Enemy at 90 degrees; turret starts facing 0 at 90 deg/s.
        host.enemy = Some((
            enemy_id(),
            Vec2Fixed::new(Fixed64::ZERO, Fixed64::from_num(5)),
        ));
        receive(&cfg, &mut st, iron(), 5);
        run(&cfg, &mut st, &mut host, 0.1, 5);
        // 0.5s in: facing ~45 degrees, outside tolerance, no shot yet.
        assert!(host.shots.is_empty());
        run(&cfg, &mut st, &mut host, 0.1, 6);
        assert_eq!(host.shots.len(), 1);
    }

    #[test]
    fn turret_drops_dead_or_out_of_range_target() {
        let cfg = turret_cfg();
        let mut st = Behavior::new_for(&cfg);
        let mut host = MockHost::default();
        let enemy = enemy_id();
        host.enemy = Some((enemy, Vec2Fixed::new(Fixed64::from_num(5), Fixed64::ZERO)));
        receive(&cfg, &mut st, iron(), 5);
        run(&cfg, &mut st, &mut host, 0.1, 1);
        {
            let Behavior::Turret(t) = &st else { panic!() };
            assert_eq!(t.target, Some(enemy));
        }
        // Enemy dies: target cleared on the next tick.
        host.enemy = None;
        run(&cfg, &mut st, &mut host, 0.1, 1);
        let Behavior::Turret(t) = &st else { panic!() };
        assert_eq!(t.target, None);
    }

    #[test]
    fn turret_ammo_clamps_to_buffer() {
        let cfg = turret_cfg();
        let mut st = Behavior::new_for(&cfg);
        assert_eq!(receive(&cfg, &mut st, iron(), 99), 5);
        assert!(!can_accept(&cfg, &st, iron()));
        assert!(!can_accept(&cfg, &st, plate()));
    }
}
