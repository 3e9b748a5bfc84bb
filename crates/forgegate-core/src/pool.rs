//! Handle-based arena pooling for high-churn entities.
//!
//! A [`Pool`] wraps a `SlotMap`: acquiring inserts a value and hands back a
//! generational key, releasing removes it and recycles the slot. Stale
//! handles simply miss instead of aliasing a recycled entity. A size cap
//! bounds churn; acquisition past the cap is refused, never silently grown.

use slotmap::{Key, SlotMap};
use thiserror::Error;

/// Default initial slot reservation.
pub const DEFAULT_INITIAL_CAPACITY: usize = 50;

/// Default maximum live entities per pool.
pub const DEFAULT_MAX_SIZE: usize = 500;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PoolError {
    #[error("pool exhausted: {live} live entities at cap {cap}")]
    Exhausted { live: usize, cap: usize },
}

#[derive(Debug, Clone)]
pub struct Pool<K: Key, V> {
    slots: SlotMap<K, V>,
    max_size: usize,
}

impl<K: Key, V> Default for Pool<K, V> {
    fn default() -> Self {
        Pool::new(DEFAULT_INITIAL_CAPACITY, DEFAULT_MAX_SIZE)
    }
}

impl<K: Key, V> Pool<K, V> {
    pub fn new(initial_capacity: usize, max_size: usize) -> Self {
        Pool {
            slots: SlotMap::with_capacity_and_key(initial_capacity),
            max_size,
        }
    }

    /// Take a slot for `value`. Refused once `max_size` entities are live.
    pub fn acquire(&mut self, value: V) -> Result<K, PoolError> {
        if self.slots.len() >= self.max_size {
            log::warn!(
                "pool at capacity ({} live), acquisition refused",
                self.slots.len()
            );
            return Err(PoolError::Exhausted {
                live: self.slots.len(),
                cap: self.max_size,
            });
        }
        Ok(self.slots.insert(value))
    }

    /// Return an entity to the pool. Stale handles yield `None`.
    pub fn release(&mut self, key: K) -> Option<V> {
        self.slots.remove(key)
    }

    pub fn get(&self, key: K) -> Option<&V> {
        self.slots.get(key)
    }

    pub fn get_mut(&mut self, key: K) -> Option<&mut V> {
        self.slots.get_mut(key)
    }

    pub fn contains(&self, key: K) -> bool {
        self.slots.contains_key(key)
    }

    pub fn live(&self) -> usize {
        self.slots.len()
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn iter(&self) -> impl Iterator<Item = (K, &V)> {
        self.slots.iter()
    }
}
