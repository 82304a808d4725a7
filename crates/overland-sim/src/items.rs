//! Item kinds and the ground-item layer.
//!
//! Dropped loot lives in the world until the player walks over it, a
//! merchant buys it, or it scrolls out of the active window.

use crate::events::{EventBus, GameEvent};
use crate::grid::pixel_to_local;
use crate::input::{Aabb, Vec2};
use crate::inventory::{ContainerKind, Inventory};
use crate::weapon::{AmmoKind, Weapon};
use serde::{Deserialize, Serialize};

/// A box of loose rounds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmmoBox {
    /// Caliber inside
    pub kind: AmmoKind,
    /// Round count
    pub rounds: u32,
}

impl AmmoBox {
    /// Flat trade price for any ammo box.
    pub const PRICE: u64 = 100;
}

/// A single-use healing item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Medkit {
    /// Health restored on use
    pub heal: i32,
}

impl Default for Medkit {
    fn default() -> Self {
        Self { heal: 25 }
    }
}

/// Wearable protection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gear {
    /// Display name
    pub name: String,
    /// Added to the damage-reduction divisor while worn
    pub protection: f32,
    /// Trade price
    pub price: u64,
}

/// Anything that can sit in a slot or lie on the ground.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Item {
    /// A weapon instance (stats fixed at creation)
    Weapon(Weapon),
    /// Loose ammunition; merges into the pool on pickup
    Ammo(AmmoBox),
    /// A consumable healing item
    Medkit(Medkit),
    /// Armor or a helmet
    Gear(Gear),
}

impl Item {
    /// Trade price when sold to a merchant.
    #[must_use]
    pub fn price(&self) -> u64 {
        match self {
            Item::Weapon(w) => w.price,
            Item::Ammo(_) => AmmoBox::PRICE,
            Item::Medkit(_) => 150,
            Item::Gear(g) => g.price,
        }
    }

    /// The inventory container this item is stored in, or `None` for items
    /// that dissolve into a pool instead (ammo).
    #[must_use]
    pub fn container(&self) -> Option<ContainerKind> {
        match self {
            Item::Weapon(_) => Some(ContainerKind::Arms),
            Item::Ammo(_) => None,
            Item::Medkit(_) => Some(ContainerKind::Consumables),
            Item::Gear(_) => Some(ContainerKind::Equipment),
        }
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Item::Weapon(w) => &w.name,
            Item::Ammo(b) => match b.kind {
                AmmoKind::Mm9 => "9mm rounds",
                AmmoKind::Mm762 => "7.62mm rounds",
                AmmoKind::Mm20 => "20mm rounds",
            },
            Item::Medkit(_) => "medkit",
            Item::Gear(g) => &g.name,
        }
    }
}

/// An item lying in the world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroundItem {
    /// The item itself
    pub item: Item,
    /// World position (box anchor)
    pub pos: Vec2,
}

impl GroundItem {
    /// The pickup/trade box anchored at the item's position.
    #[must_use]
    pub fn bounds(&self) -> Aabb {
        Aabb::anchored(self.pos, GroundItems::REACH_BOX)
    }
}

/// All items currently on the ground.
#[derive(Debug, Default)]
pub struct GroundItems {
    items: Vec<GroundItem>,
}

impl GroundItems {
    /// Side of the box in which a player or merchant reaches an item.
    pub const REACH_BOX: f32 = 64.0;

    /// Empty layer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops an item into the world.
    pub fn add(&mut self, item: Item, pos: Vec2) {
        self.items.push(GroundItem { item, pos });
    }

    /// Number of items on the ground.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True when nothing lies on the ground.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterates items for rendering.
    pub fn iter(&self) -> impl Iterator<Item = &GroundItem> {
        self.items.iter()
    }

    /// A living merchant standing on an item buys it: the item vanishes
    /// and the player is owed its price. Returns the money earned.
    pub fn sell_to_merchant(&mut self, merchant_pos: Vec2, events: &EventBus) -> u64 {
        let mut earned = 0;
        self.items.retain(|ground| {
            if ground.bounds().contains(merchant_pos) {
                earned += ground.item.price();
                events.publish(GameEvent::Trade {
                    price: ground.item.price(),
                });
                false
            } else {
                true
            }
        });
        earned
    }

    /// Per-tick sweep: despawn items that scrolled out of the window
    /// margin, and auto-pick-up items the on-foot player stands on.
    ///
    /// Items the inventory has no room for stay on the ground.
    pub fn update(
        &mut self,
        inventory: &mut Inventory,
        player_pos: Vec2,
        on_foot: bool,
        cam: Vec2,
        events: &EventBus,
    ) {
        let mut kept = Vec::with_capacity(self.items.len());
        for ground in self.items.drain(..) {
            let (gx, gy) = pixel_to_local(ground.pos, cam);
            if !(1..29).contains(&gx) || !(1..29).contains(&gy) {
                continue;
            }
            if on_foot && ground.bounds().contains(player_pos) {
                match inventory.pickup(ground.item) {
                    None => {
                        events.publish(GameEvent::ItemPickedUp { position: ground.pos });
                        continue;
                    }
                    Some(item) => {
                        kept.push(GroundItem { item, pos: ground.pos });
                        continue;
                    }
                }
            }
            kept.push(ground);
        }
        self.items = kept;
    }
}
