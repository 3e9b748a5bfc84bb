//! Conveyor transport with backpressure.
//!
//! Each conveyor building carries an ordered list of in-transit resource
//! units. Transit duration is the segment length divided by belt speed.
//! Units that reach the output end wait there until the next hop accepts
//! them; while anything is waiting, retry attempts run on a fixed polling
//! interval rather than every tick.
//!
//! Acceptance rules (checked before a unit is ever allocated upstream):
//! the belt is below capacity AND no unit of the same resource type is
//! already in flight. There is no ordering guarantee across units.

use serde::{Serialize, Deserialize};

use crate::fixed::{Fixed64, Seconds};
use crate::id::{ResourceTypeId, ResourceUnitId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConveyorConfig {
    /// World units per second.
    pub speed: Fixed64,
    /// Max units in transit at once.
    pub capacity: usize,
    /// Retry interval while blocked at the output end.
    pub poll_interval: Seconds,
}

impl Default for ConveyorConfig {
    fn default() -> Self {
        ConveyorConfig {
            speed: Fixed64::from_num(2),
            capacity: 5,
            poll_interval: Seconds::from_num(0.5),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemPhase {
    Moving,
    WaitingAtOutput,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConveyorItem {
    pub unit: ResourceUnitId,
    pub resource_type: ResourceTypeId,
    pub progress: Seconds,
    pub duration: Seconds,
    pub phase: ItemPhase,
}

impl ConveyorItem {
    /// Transit completion in [0, 1] for interpolation by the render layer.
    pub fn fraction(&self) -> Fixed64 {
        if self.duration <= Seconds::ZERO {
            return Fixed64::ONE;
        }
        (self.progress / self.duration).min(Fixed64::ONE)
    }
}

/// Per-building conveyor state. The segment length is fixed at placement
/// (input point to output point distance).
#[derive(Debug, Clone, PartialEq)]
pub struct Conveyor {
    items: Vec<ConveyorItem>,
    length: Fixed64,
    poll_timer: Seconds,
    blocked: bool,
}

impl Conveyor {
    pub fn new(length: Fixed64) -> Self {
        Conveyor {
            items: Vec::new(),
            length,
            poll_timer: Seconds::ZERO,
            blocked: false,
        }
    }

    pub fn items(&self) -> &[ConveyorItem] {
        &self.items
    }

    pub fn length(&self) -> Fixed64 {
        self.length
    }

    pub fn is_blocked(&self) -> bool {
        self.blocked
    }

    /// False at capacity or when the same resource type is already in
    /// flight on this belt.
    pub fn can_accept(&self, config: &ConveyorConfig, resource_type: ResourceTypeId) -> bool {
        self.items.len() < config.capacity
            && !self.items.iter().any(|i| i.resource_type == resource_type)
    }

    /// Put a unit on the input end. The caller must have checked
    /// [`Conveyor::can_accept`] first.
    pub fn accept(
        &mut self,
        config: &ConveyorConfig,
        unit: ResourceUnitId,
        resource_type: ResourceTypeId,
    ) {
        let duration = if config.speed > Fixed64::ZERO {
            self.length / config.speed
        } else {
            Seconds::ZERO
        };
        self.items.push(ConveyorItem {
            unit,
            resource_type,
            progress: Seconds::ZERO,
            duration,
            phase: ItemPhase::Moving,
        });
    }

    /// Advance all moving units and the blocked-poll timer. Returns true
    /// when at least one unit is at the output end and a transfer attempt
    /// is due (fresh arrival, or the poll interval elapsed).
    pub fn advance(&mut self, dt: Seconds) -> bool {
        let mut fresh_arrival = false;
        for item in &mut self.items {
            if item.phase == ItemPhase::Moving {
                item.progress += dt;
                if item.progress >= item.duration {
                    item.phase = ItemPhase::WaitingAtOutput;
                    fresh_arrival = true;
                }
            }
        }
        if self.poll_timer > Seconds::ZERO {
            self.poll_timer = (self.poll_timer - dt).max(Seconds::ZERO);
        }
        let has_waiting = self.items.iter().any(|i| i.phase == ItemPhase::WaitingAtOutput);
        has_waiting && (fresh_arrival || self.poll_timer <= Seconds::ZERO)
    }

    /// Units waiting at the output, in arrival order.
    pub fn waiting_items(&self) -> impl Iterator<Item = &ConveyorItem> {
        self.items
            .iter()
            .filter(|i| i.phase == ItemPhase::WaitingAtOutput)
    }

    /// Remove a unit that was transferred downstream. Clears the blocked
    /// flag; remaining waiting units retry on their own.
    pub fn remove_unit(&mut self, unit: ResourceUnitId) -> Option<ConveyorItem> {
        let idx = self.items.iter().position(|i| i.unit == unit)?;
        self.blocked = false;
        Some(self.items.remove(idx))
    }

    /// A transfer attempt failed: back off until the next poll.
    /// Returns true on the transition into the blocked state.
    pub fn mark_blocked(&mut self, config: &ConveyorConfig) -> bool {
        self.poll_timer = config.poll_interval;
        let newly = !self.blocked;
        self.blocked = true;
        newly
    }

    /// Drain every unit (demolition). The caller releases them to the pool.
    pub fn drain_items(&mut self) -> Vec<ConveyorItem> {
        self.blocked = false;
        std::mem::take(&mut self.items)
    }
}
