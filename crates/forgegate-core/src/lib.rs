//! Deterministic factory-defense simulation core.
//!
//! This crate is the headless substrate for a grid-based factory builder
//! with tower defense: an expandable spatial grid, cached A* pathfinding,
//! connection-point resource routing, per-building behavior state machines,
//! conveyor transport with backpressure, and a combat layer of spawners,
//! enemies, projectiles, and a base core.
//!
//! Everything is fixed-point ([`fixed::Fixed64`], Q32.32) and advances in
//! discrete ticks, so the same inputs always produce the same state on any
//! platform. There is no rendering, audio, or input handling here; the
//! embedding layer drives [`world::World::tick`] and drains the event
//! queue.
//!
//! # Architecture
//!
//! - [`grid`] — sparse expandable grid of cells with occupancy and terrain
//!   modifiers.
//! - [`path`] — A* over walkable cells with a bounded path cache.
//! - [`connection`] — input/output point geometry and routing resolution.
//! - [`behavior`] — production, processing, storage, and turret state
//!   machines behind the [`behavior::BehaviorHost`] seam.
//! - [`conveyor`] — in-transit units, polling backpressure.
//! - [`combat`] — enemies, projectiles, spawners, the base core.
//! - [`pool`] — bounded object pool for resource units.
//! - [`world`] — owns everything and runs the tick pipeline:
//!   behaviors, then conveyors, then combat, then bookkeeping.
//! - [`query`] — owned snapshots for the embedding layer.
//! - [`event`] — per-kind ring buffers drained once per tick.

pub mod behavior;
pub mod building;
pub mod combat;
pub mod connection;
pub mod conveyor;
pub mod event;
pub mod fixed;
pub mod grid;
pub mod id;
pub mod math;
pub mod path;
pub mod pool;
pub mod query;
pub mod registry;
pub mod resource;
pub mod rng;
pub mod world;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
