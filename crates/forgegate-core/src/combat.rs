//! The defense layer: enemies, projectiles, spawners, and the base core.
//!
//! Enemies follow cached grid paths toward the core and deal their damage
//! on arrival; an enemy with no path counts as arrived. Projectiles home
//! on a target enemy and despawn if it dies first. All movement is
//! fixed-point and ticked by the world.

use serde::{Serialize, Deserialize};

use crate::fixed::{Fixed64, Seconds};
use crate::grid::{GridPos, SpatialGrid};
use crate::id::EnemyId;
use crate::math::{Vec2Fixed, WorldPos};

/// An enemy counts a waypoint as reached within this distance.
pub const WAYPOINT_EPSILON: f64 = 0.05;

/// A projectile hits its target within this distance.
pub const PROJECTILE_HIT_RADIUS: f64 = 0.1;

// ---------------------------------------------------------------------------
// Enemies
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnemyConfig {
    pub max_hp: u32,
    /// World units per second.
    pub speed: Fixed64,
    /// Damage dealt to the core on arrival.
    pub damage: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Enemy {
    pub hp: u32,
    pub max_hp: u32,
    pub speed: Fixed64,
    pub damage: u32,
    pub pos: WorldPos,
    /// Cell path toward the core; waypoints are cell centers.
    pub path: Vec<GridPos>,
    pub next_waypoint: usize,
}

impl Enemy {
    pub fn new(config: &EnemyConfig, pos: WorldPos, path: Vec<GridPos>) -> Self {
        Enemy {
            hp: config.max_hp,
            max_hp: config.max_hp,
            speed: config.speed,
            damage: config.damage,
            pos,
            path,
            next_waypoint: 0,
        }
    }

    /// Returns true if the enemy died.
    pub fn apply_damage(&mut self, amount: u32) -> bool {
        self.hp = self.hp.saturating_sub(amount);
        self.hp == 0
    }

    /// Walk toward the next waypoint. Returns true once the final waypoint
    /// is reached; an empty path is treated as already arrived.
    pub fn move_along_path(&mut self, grid: &SpatialGrid, dt: Seconds) -> bool {
        let eps = Fixed64::from_num(WAYPOINT_EPSILON);
        let mut budget = self.speed * dt;
        loop {
            let Some(&cell) = self.path.get(self.next_waypoint) else {
                return true;
            };
            let target = grid.center_position(cell, 1, 1);
            let delta = target.sub(self.pos);
            let dist = delta.length();
            if dist <= eps {
                self.next_waypoint += 1;
                continue;
            }
            if dist <= budget {
                self.pos = target;
                budget -= dist;
                self.next_waypoint += 1;
                continue;
            }
            // Partial step toward the waypoint.
            let step = Vec2Fixed::new(delta.x / dist * budget, delta.y / dist * budget);
            self.pos = self.pos.add(step);
            return false;
        }
    }
}

/// Closest living enemy to `from` within `range`. Ties break by iteration
/// order, which the world keeps stable (spawn order).
pub fn closest_enemy_in_range<'a, I>(from: WorldPos, range: Fixed64, enemies: I) -> Option<EnemyId>
where
    I: IntoIterator<Item = (EnemyId, &'a Enemy)>,
{
    let range_sq = range * range;
    let mut best: Option<(Fixed64, EnemyId)> = None;
    for (id, enemy) in enemies {
        let d = from.distance_sq(enemy.pos);
        if d > range_sq {
            continue;
        }
        if best.map(|(bd, _)| d < bd).unwrap_or(true) {
            best = Some((d, id));
        }
    }
    best.map(|(_, id)| id)
}

// ---------------------------------------------------------------------------
// Projectiles
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Projectile {
    pub target: EnemyId,
    pub pos: WorldPos,
    pub speed: Fixed64,
    pub damage: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectileOutcome {
    InFlight,
    Hit,
    /// Target died before impact.
    Lost,
}

impl Projectile {
    /// Home on the target. `target_pos` is `None` once the target is gone.
    pub fn advance(&mut self, target_pos: Option<WorldPos>, dt: Seconds) -> ProjectileOutcome {
        let Some(target) = target_pos else {
            return ProjectileOutcome::Lost;
        };
        let delta = target.sub(self.pos);
        let dist = delta.length();
        let step = self.speed * dt;
        if dist <= step.max(Fixed64::from_num(PROJECTILE_HIT_RADIUS)) {
            self.pos = target;
            return ProjectileOutcome::Hit;
        }
        self.pos = self
            .pos
            .add(Vec2Fixed::new(delta.x / dist * step, delta.y / dist * step));
        ProjectileOutcome::InFlight
    }
}

// ---------------------------------------------------------------------------
// Base core
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaseCore {
    pub hp: u32,
    pub max_hp: u32,
    /// Cell the core occupies; enemy paths end here.
    pub cell: GridPos,
}

impl BaseCore {
    pub fn new(max_hp: u32, cell: GridPos) -> Self {
        BaseCore {
            hp: max_hp,
            max_hp,
            cell,
        }
    }

    /// Returns true when this damage destroyed the core.
    pub fn take_damage(&mut self, amount: u32) -> bool {
        let was_alive = self.hp > 0;
        self.hp = self.hp.saturating_sub(amount);
        was_alive && self.hp == 0
    }

    pub fn heal(&mut self, amount: u32) {
        self.hp = (self.hp + amount).min(self.max_hp);
    }

    pub fn is_destroyed(&self) -> bool {
        self.hp == 0
    }
}

// ---------------------------------------------------------------------------
// Spawners
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpawnerConfig {
    pub spawn_cell: GridPos,
    pub interval: Seconds,
    pub enemy: EnemyConfig,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnemySpawner {
    pub config: SpawnerConfig,
    pub timer: Seconds,
    pub active: bool,
}

impl EnemySpawner {
    pub fn new(config: SpawnerConfig) -> Self {
        EnemySpawner {
            config,
            timer: Seconds::ZERO,
            active: true,
        }
    }

    /// Number of spawns due this tick. Normally 0 or 1; catches up after
    /// a long dt.
    pub fn tick(&mut self, dt: Seconds) -> u32 {
        if !self.active || self.config.interval <= Seconds::ZERO {
            return 0;
        }
        self.timer += dt;
        let mut spawns = 0;
        while self.timer >= self.config.interval {
            self.timer -= self.config.interval;
            spawns += 1;
        }
        spawns
    }
}
