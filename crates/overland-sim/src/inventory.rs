//! The player's inventory: typed containers, hand slots and the ammo pool.
//!
//! Containers are addressed by [`ContainerKind`] plus slot index — never by
//! comparing list identities. The hand row is special: each hand slot only
//! accepts items from one container kind, which is what keeps "the weapon
//! in hand" a weapon by construction.

use crate::items::Item;
use crate::weapon::{AmmoPool, Weapon};
use serde::{Deserialize, Serialize};

/// Which container a slot address refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContainerKind {
    /// Carried weapons
    Arms,
    /// Armor and helmets
    Equipment,
    /// Medkits and other consumables
    Consumables,
    /// Keys (never swapped, never dropped)
    Keys,
    /// The equipped row: weapon, held item, armor, helmet
    Hand,
}

/// Slot counts per container.
const ARMS_SLOTS: usize = 3;
const EQUIPMENT_SLOTS: usize = 4;
const CONSUMABLE_SLOTS: usize = 16;
const KEY_SLOTS: usize = 16;
const HAND_SLOTS: usize = 4;

/// Hand-slot roles: 0 weapon, 1 held consumable, 2 armor, 3 helmet.
const HAND_WEAPON: usize = 0;
const HAND_CONSUMABLE: usize = 1;

/// The player's inventory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Inventory {
    arms: Vec<Option<Item>>,
    equipment: Vec<Option<Item>>,
    consumables: Vec<Option<Item>>,
    keys: Vec<Option<Item>>,
    hand: Vec<Option<Item>>,
    /// Shared ammunition pool all reloads draw from
    pub ammo: AmmoPool,
}

impl Default for Inventory {
    fn default() -> Self {
        Self::new()
    }
}

impl Inventory {
    /// Creates an inventory with the starting ammo stock.
    #[must_use]
    pub fn new() -> Self {
        Self {
            arms: vec![None; ARMS_SLOTS],
            equipment: vec![None; EQUIPMENT_SLOTS],
            consumables: vec![None; CONSUMABLE_SLOTS],
            keys: vec![None; KEY_SLOTS],
            hand: vec![None; HAND_SLOTS],
            ammo: AmmoPool::starting_stock(),
        }
    }

    fn container(&self, kind: ContainerKind) -> &Vec<Option<Item>> {
        match kind {
            ContainerKind::Arms => &self.arms,
            ContainerKind::Equipment => &self.equipment,
            ContainerKind::Consumables => &self.consumables,
            ContainerKind::Keys => &self.keys,
            ContainerKind::Hand => &self.hand,
        }
    }

    fn container_mut(&mut self, kind: ContainerKind) -> &mut Vec<Option<Item>> {
        match kind {
            ContainerKind::Arms => &mut self.arms,
            ContainerKind::Equipment => &mut self.equipment,
            ContainerKind::Consumables => &mut self.consumables,
            ContainerKind::Keys => &mut self.keys,
            ContainerKind::Hand => &mut self.hand,
        }
    }

    /// Number of slots in a container.
    #[must_use]
    pub fn slot_count(&self, kind: ContainerKind) -> usize {
        self.container(kind).len()
    }

    /// The item at a slot, if any.
    #[must_use]
    pub fn slot(&self, kind: ContainerKind, index: usize) -> Option<&Item> {
        self.container(kind).get(index).and_then(Option::as_ref)
    }

    /// Adds an item, routing it to its container's first free slot (ammo
    /// dissolves into the pool). Returns the item back when there is no
    /// room — it never disappears.
    pub fn pickup(&mut self, item: Item) -> Option<Item> {
        let Some(kind) = item.container() else {
            // Ammo boxes merge into the pool.
            if let Item::Ammo(ammo_box) = item {
                self.ammo.add(ammo_box.kind, ammo_box.rounds);
            }
            return None;
        };
        let slots = self.container_mut(kind);
        match slots.iter().position(Option::is_none) {
            Some(free) => {
                slots[free] = Some(item);
                None
            }
            None => Some(item),
        }
    }

    /// Removes and returns the item at a slot (to drop it on the ground).
    /// Keys cannot be thrown away.
    pub fn take(&mut self, kind: ContainerKind, index: usize) -> Option<Item> {
        if kind == ContainerKind::Keys {
            return None;
        }
        self.container_mut(kind).get_mut(index)?.take()
    }

    /// True when the hand slot at `hand_index` may hold items from `kind`.
    fn hand_accepts(hand_index: usize, kind: ContainerKind) -> bool {
        match hand_index {
            0 => kind == ContainerKind::Arms,
            1 => kind == ContainerKind::Consumables,
            2 | 3 => kind == ContainerKind::Equipment,
            _ => false,
        }
    }

    /// Swaps two slots.
    ///
    /// Allowed moves: within one container (except Keys and Hand), or
    /// between a hand slot and its matching container. Anything else is
    /// refused and returns `false`.
    pub fn swap(
        &mut self,
        a: (ContainerKind, usize),
        b: (ContainerKind, usize),
    ) -> bool {
        let ((ka, ia), (kb, ib)) = (a, b);
        if ia >= self.slot_count(ka) || ib >= self.slot_count(kb) {
            return false;
        }
        if ka == kb {
            if matches!(ka, ContainerKind::Keys | ContainerKind::Hand) || ia == ib {
                return false;
            }
            self.container_mut(ka).swap(ia, ib);
            return true;
        }
        // Across containers only via the hand row.
        let (hand_index, other_kind, other_index) = match (ka, kb) {
            (ContainerKind::Hand, _) => (ia, kb, ib),
            (_, ContainerKind::Hand) => (ib, ka, ia),
            _ => return false,
        };
        if !Self::hand_accepts(hand_index, other_kind) {
            return false;
        }
        let held = self.hand[hand_index].take();
        let stored = self.container_mut(other_kind)[other_index].take();
        self.hand[hand_index] = stored;
        self.container_mut(other_kind)[other_index] = held;
        true
    }

    /// The weapon currently in hand.
    #[must_use]
    pub fn hand_weapon(&self) -> Option<&Weapon> {
        match self.hand[HAND_WEAPON].as_ref() {
            Some(Item::Weapon(w)) => Some(w),
            _ => None,
        }
    }

    /// Mutable access to the weapon in hand (for firing and reloading).
    pub fn hand_weapon_mut(&mut self) -> Option<&mut Weapon> {
        match self.hand[HAND_WEAPON].as_mut() {
            Some(Item::Weapon(w)) => Some(w),
            _ => None,
        }
    }

    /// Reloads the weapon in hand from the ammo pool, returning the rounds
    /// transferred (zero with no weapon, a full magazine or an empty pool).
    pub fn reload_hand(&mut self) -> u32 {
        match self.hand[HAND_WEAPON].as_mut() {
            Some(Item::Weapon(weapon)) => weapon.reload_from(&mut self.ammo),
            _ => 0,
        }
    }

    /// Consumes the medkit held in the hand row, returning its heal amount.
    pub fn use_held_medkit(&mut self) -> Option<i32> {
        match self.hand[HAND_CONSUMABLE].take() {
            Some(Item::Medkit(kit)) => Some(kit.heal),
            other => {
                self.hand[HAND_CONSUMABLE] = other;
                None
            }
        }
    }

    /// Damage-reduction contribution of worn gear (armor + helmet slots).
    #[must_use]
    pub fn worn_protection(&self) -> f32 {
        self.hand[2..]
            .iter()
            .filter_map(|slot| match slot {
                Some(Item::Gear(gear)) => Some(gear.protection),
                _ => None,
            })
            .sum()
    }
}
