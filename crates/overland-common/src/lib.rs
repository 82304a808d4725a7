//! # Overland Common
//!
//! Common types and shared abstractions for the Overland simulation.
//!
//! This crate provides foundational pieces used across all subsystems:
//! - Coordinate types (world pixels, absolute map cells)
//! - ID types (`EntityId`)
//! - Deterministic hashing and RNG streams for world generation

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod coords;
pub mod ids;
pub mod rng;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::coords::*;
    pub use crate::ids::*;
    pub use crate::rng::*;
}

pub use prelude::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_coords_conversion() {
        let cell = CellCoord::from_pixels(300.0, -40.0, 256);
        assert_eq!(cell, CellCoord::new(1, -1));
        assert_eq!(cell.origin_pixels(256), (256.0, -256.0));
    }

    #[test]
    fn test_entity_id_generation() {
        let id1 = EntityId::new();
        let id2 = EntityId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_cell_hash_is_pure() {
        let a = cell_hash(7, -12, 40, 0);
        let b = cell_hash(7, -12, 40, 0);
        assert_eq!(a, b);
    }
}
