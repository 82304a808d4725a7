//! Event bus for simulation → presentation communication.
//!
//! The core never plays sounds or spawns effects itself; it publishes
//! events and the presentation layer drains them once per frame to cue
//! audio (gunshot, scream, pickup) and visuals.

use crate::input::Vec2;
use crate::projectile::Side;
use crossbeam_channel::{bounded, Receiver, Sender};
use overland_common::EntityId;
use serde::{Deserialize, Serialize};

/// Events the presentation layer consumes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    /// A weapon fired
    GunFired {
        /// Which side pulled the trigger
        side: Side,
        /// Muzzle position
        position: Vec2,
    },
    /// An NPC died
    NpcDied {
        /// The NPC
        entity_id: EntityId,
        /// Where it fell
        position: Vec2,
    },
    /// An item left the ground into the player's inventory
    ItemPickedUp {
        /// Where it was
        position: Vec2,
    },
    /// A merchant bought an item off the ground
    Trade {
        /// Sale price credited to the player
        price: u64,
    },
    /// The player took damage
    PlayerDamaged {
        /// Post-reduction damage applied
        damage: i32,
    },
    /// The player died
    PlayerDied,
}

/// Bounded broadcast channel for game events.
#[derive(Debug)]
pub struct EventBus {
    sender: Sender<GameEvent>,
    receiver: Receiver<GameEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(1024)
    }
}

impl EventBus {
    /// Creates a bus with the given capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = bounded(capacity);
        Self { sender, receiver }
    }

    /// Publishes an event. A full channel drops the event rather than
    /// blocking the tick; the presentation layer missing a sound cue is
    /// preferable to a simulation stall.
    pub fn publish(&self, event: GameEvent) {
        let _ = self.sender.try_send(event);
    }

    /// Drains all pending events.
    pub fn drain(&self) -> Vec<GameEvent> {
        self.receiver.try_iter().collect()
    }

    /// Number of undelivered events.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.receiver.len()
    }
}
