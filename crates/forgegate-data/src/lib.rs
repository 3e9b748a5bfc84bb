//! Data files and level generation for the forgegate simulation.
//!
//! Game content lives in RON files: resource types, building definitions
//! (footprint, connection points, behaviors, conveyor config), and level
//! blocks. The [`loader`] resolves name references into ids and produces
//! the frozen [`forgegate_core::registry::Registry`]; [`level`] stamps
//! seeded block layouts onto the spatial grid.

pub mod level;
pub mod loader;
pub mod schema;

pub use loader::{load_game_data, DataLoadError, GameData};
