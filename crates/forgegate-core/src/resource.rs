//! Resource units moving through the factory.

use serde::{Serialize, Deserialize};

use crate::id::ResourceTypeId;

/// A discrete quantity of one resource type. Exclusively owned by whatever
/// holds it (a conveyor slot, a behavior buffer, the pool); transfer moves
/// ownership, never copies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceUnit {
    pub resource_type: ResourceTypeId,
    pub amount: u32,
}

impl ResourceUnit {
    /// Build a unit, clamping the amount to the type's max stack.
    pub fn new_clamped(resource_type: ResourceTypeId, amount: u32, max_stack: u32) -> Self {
        ResourceUnit {
            resource_type,
            amount: amount.min(max_stack),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amount_clamps_to_max_stack() {
        let u = ResourceUnit::new_clamped(ResourceTypeId(0), 99, 10);
        assert_eq!(u.amount, 10);
        let u = ResourceUnit::new_clamped(ResourceTypeId(0), 3, 10);
        assert_eq!(u.amount, 3);
    }
}
