//! Typed event queue with pre-allocated ring buffers.
//!
//! Simulation code emits events during the tick; the embedding layer
//! (rendering, UI, audio) drains the queue once per tick and reacts. There
//! are no subscribers or callbacks inside the simulation: everything that
//! happens to simulation state happens in the tick pipeline itself.
//!
//! Each event kind has its own [`EventBuffer`] ring; when a buffer fills,
//! the oldest events are dropped. Kinds can be suppressed via
//! [`EventQueue::suppress`], which prevents any allocation or recording
//! for that kind.

use crate::fixed::Ticks;
use crate::id::{BuildingId, BuildingTypeId, EnemyId, ResourceTypeId, ResourceUnitId};

// ---------------------------------------------------------------------------
// Event types
// ---------------------------------------------------------------------------

/// A simulation event. All events carry the tick at which they occurred.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    // -- Placement --
    BuildingPlaced {
        building: BuildingId,
        building_type: BuildingTypeId,
        tick: Ticks,
    },
    BuildingDemolished {
        building: BuildingId,
        tick: Ticks,
    },

    // -- Resources --
    ResourceSpawned {
        unit: ResourceUnitId,
        resource_type: ResourceTypeId,
        by: BuildingId,
        tick: Ticks,
    },
    ResourceDelivered {
        resource_type: ResourceTypeId,
        amount: u32,
        to: BuildingId,
        tick: Ticks,
    },
    ResourceDestroyed {
        unit: ResourceUnitId,
        tick: Ticks,
    },

    // -- Behavior state --
    ProductionBlocked {
        building: BuildingId,
        tick: Ticks,
    },
    ProductionResumed {
        building: BuildingId,
        tick: Ticks,
    },
    ProcessingStarted {
        building: BuildingId,
        tick: Ticks,
    },
    ProcessingCompleted {
        building: BuildingId,
        resource_type: ResourceTypeId,
        amount: u32,
        tick: Ticks,
    },
    ConveyorBlocked {
        building: BuildingId,
        tick: Ticks,
    },

    // -- Combat --
    TurretFired {
        building: BuildingId,
        target: EnemyId,
        tick: Ticks,
    },
    EnemySpawned {
        enemy: EnemyId,
        tick: Ticks,
    },
    EnemyDied {
        enemy: EnemyId,
        tick: Ticks,
    },
    EnemyReachedCore {
        enemy: EnemyId,
        tick: Ticks,
    },
    CoreHealthChanged {
        hp: u32,
        max_hp: u32,
        tick: Ticks,
    },
    CoreDestroyed {
        tick: Ticks,
    },
}

/// Discriminant tag for event types, used for suppression and filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    BuildingPlaced,
    BuildingDemolished,
    ResourceSpawned,
    ResourceDelivered,
    ResourceDestroyed,
    ProductionBlocked,
    ProductionResumed,
    ProcessingStarted,
    ProcessingCompleted,
    ConveyorBlocked,
    TurretFired,
    EnemySpawned,
    EnemyDied,
    EnemyReachedCore,
    CoreHealthChanged,
    CoreDestroyed,
}

/// Total number of event kinds.
const EVENT_KIND_COUNT: usize = 16;

impl Event {
    /// Get the discriminant kind for this event.
    pub fn kind(&self) -> EventKind {
        match self {
            Event::BuildingPlaced { .. } => EventKind::BuildingPlaced,
            Event::BuildingDemolished { .. } => EventKind::BuildingDemolished,
            Event::ResourceSpawned { .. } => EventKind::ResourceSpawned,
            Event::ResourceDelivered { .. } => EventKind::ResourceDelivered,
            Event::ResourceDestroyed { .. } => EventKind::ResourceDestroyed,
            Event::ProductionBlocked { .. } => EventKind::ProductionBlocked,
            Event::ProductionResumed { .. } => EventKind::ProductionResumed,
            Event::ProcessingStarted { .. } => EventKind::ProcessingStarted,
            Event::ProcessingCompleted { .. } => EventKind::ProcessingCompleted,
            Event::ConveyorBlocked { .. } => EventKind::ConveyorBlocked,
            Event::TurretFired { .. } => EventKind::TurretFired,
            Event::EnemySpawned { .. } => EventKind::EnemySpawned,
            Event::EnemyDied { .. } => EventKind::EnemyDied,
            Event::EnemyReachedCore { .. } => EventKind::EnemyReachedCore,
            Event::CoreHealthChanged { .. } => EventKind::CoreHealthChanged,
            Event::CoreDestroyed { .. } => EventKind::CoreDestroyed,
        }
    }
}

impl EventKind {
    fn index(self) -> usize {
        self as usize
    }
}

// ---------------------------------------------------------------------------
// EventBuffer — pre-allocated ring buffer
// ---------------------------------------------------------------------------

/// A pre-allocated ring buffer for events. Fixed capacity; when full, the
/// oldest events are dropped.
#[derive(Debug)]
pub struct EventBuffer {
    events: Vec<Option<Event>>,
    /// Write position (wraps around).
    head: usize,
    len: usize,
    /// Total events ever written (including dropped).
    total_written: u64,
}

impl EventBuffer {
    /// Create a new ring buffer. A capacity of 0 is clamped to 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            events: (0..capacity).map(|_| None).collect(),
            head: 0,
            len: 0,
            total_written: 0,
        }
    }

    /// Push an event. If full, the oldest event is dropped.
    pub fn push(&mut self, event: Event) {
        self.events[self.head] = Some(event);
        self.head = (self.head + 1) % self.capacity();
        if self.len < self.capacity() {
            self.len += 1;
        }
        self.total_written += 1;
    }

    pub fn capacity(&self) -> usize {
        self.events.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Total events written since creation (including dropped).
    pub fn total_written(&self) -> u64 {
        self.total_written
    }

    /// Number of events dropped because the buffer was full.
    pub fn dropped_count(&self) -> u64 {
        self.total_written.saturating_sub(self.len as u64)
    }

    /// Iterate over events from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &Event> {
        let start = if self.len < self.capacity() {
            0
        } else {
            // head is the next write position, which is the oldest entry
            self.head
        };
        (0..self.len).filter_map(move |i| self.events[(start + i) % self.capacity()].as_ref())
    }

    pub fn clear(&mut self) {
        for slot in &mut self.events {
            *slot = None;
        }
        self.head = 0;
        self.len = 0;
    }
}

// ---------------------------------------------------------------------------
// EventQueue
// ---------------------------------------------------------------------------

/// One ring buffer per event kind, plus suppression flags. The embedding
/// layer drains this once per tick.
#[derive(Debug)]
pub struct EventQueue {
    buffers: [Option<EventBuffer>; EVENT_KIND_COUNT],
    suppressed: [bool; EVENT_KIND_COUNT],
    default_capacity: usize,
}

impl EventQueue {
    /// Create a queue with the given buffer capacity per kind.
    pub fn new(default_capacity: usize) -> Self {
        Self {
            buffers: Default::default(),
            suppressed: [false; EVENT_KIND_COUNT],
            default_capacity,
        }
    }

    /// Suppress an event kind. Suppressed events are never allocated or
    /// buffered.
    pub fn suppress(&mut self, kind: EventKind) {
        self.suppressed[kind.index()] = true;
        self.buffers[kind.index()] = None;
    }

    pub fn is_suppressed(&self, kind: EventKind) -> bool {
        self.suppressed[kind.index()]
    }

    /// Record an event. No-op if the kind is suppressed.
    pub fn emit(&mut self, event: Event) {
        let idx = event.kind().index();
        if self.suppressed[idx] {
            return;
        }
        // Lazily allocate the buffer on first emit.
        let buffer = self.buffers[idx].get_or_insert_with(|| EventBuffer::new(self.default_capacity));
        buffer.push(event);
    }

    /// Take every buffered event, oldest-first within each kind, kinds in
    /// declaration order. Buffers are cleared.
    pub fn drain(&mut self) -> Vec<Event> {
        let mut out = Vec::new();
        for buffer in self.buffers.iter_mut().flatten() {
            out.extend(buffer.iter().cloned());
            buffer.clear();
        }
        out
    }

    pub fn buffered_count(&self, kind: EventKind) -> usize {
        self.buffers[kind.index()]
            .as_ref()
            .map(|b| b.len())
            .unwrap_or(0)
    }

    /// Total events ever emitted for a kind (including dropped).
    pub fn total_emitted(&self, kind: EventKind) -> u64 {
        self.buffers[kind.index()]
            .as_ref()
            .map(|b| b.total_written())
            .unwrap_or(0)
    }

    /// Clear all buffers without delivering.
    pub fn clear_all(&mut self) {
        for buffer in self.buffers.iter_mut().flatten() {
            buffer.clear();
        }
    }
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new(1024)
    }
}
