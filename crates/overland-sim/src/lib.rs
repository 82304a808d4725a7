//! # Overland Sim
//!
//! Simulation core for Overland, a top-down open-world action/driving game.
//!
//! This crate is the whole game minus its presentation: the renderer,
//! audio and window layers consume it through [`session::Session`]'s tick
//! and accessor surface. It provides:
//! - Camera-anchored world grid and procedural obstacle generation
//! - A* pathfinding over the local window
//! - NPC behavior (objectives, stress, combat) and spawning
//! - The shared weapon state machine and ballistic projectiles
//! - Player avatars (walker and car) and mount logic
//! - Inventory, ground items and merchant trade
//! - An event bus for sound/visual cues

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod city;
pub mod events;
pub mod grid;
pub mod input;
pub mod inventory;
pub mod items;
pub mod npc;
pub mod pathfind;
pub mod player;
pub mod projectile;
pub mod session;
pub mod weapon;
pub mod worldgen;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::events::*;
    pub use crate::grid::*;
    pub use crate::input::*;
    pub use crate::inventory::*;
    pub use crate::items::*;
    pub use crate::npc::*;
    pub use crate::pathfind::*;
    pub use crate::player::*;
    pub use crate::projectile::*;
    pub use crate::session::*;
    pub use crate::weapon::*;
    pub use crate::worldgen::*;
}

pub use prelude::*;
