//! Weapon models, the shared fire/reload state machine, and ammunition.
//!
//! Models are data: loaded from a JSON catalog (or the built-in one) and
//! never mutated. A [`Weapon`] is one physical instance, stamped from a
//! model with wear factors fixed at creation, owned by exactly one holder
//! at a time. The same fire gate serves the player and every NPC.

use crate::input::Vec2;
use crate::projectile::{Shot, Side};
use overland_common::SimRng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use thiserror::Error;

/// Errors raised while loading a weapon catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Catalog file could not be read
    #[error("failed to read weapon catalog: {0}")]
    Io(#[from] std::io::Error),
    /// Catalog file is not valid JSON / schema mismatch
    #[error("failed to parse weapon catalog: {0}")]
    Parse(#[from] serde_json::Error),
    /// Catalog parsed but contains no models
    #[error("weapon catalog contains no models")]
    Empty,
}

/// Ammunition calibers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AmmoKind {
    /// 9mm pistol rounds
    #[serde(rename = "9mm")]
    Mm9,
    /// 7.62mm rifle rounds
    #[serde(rename = "7.62mm")]
    Mm762,
    /// 20mm heavy rounds
    #[serde(rename = "20mm")]
    Mm20,
}

impl AmmoKind {
    /// Every caliber, in catalog order.
    pub const ALL: [AmmoKind; 3] = [AmmoKind::Mm9, AmmoKind::Mm762, AmmoKind::Mm20];
}

impl fmt::Display for AmmoKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AmmoKind::Mm9 => "9mm",
            AmmoKind::Mm762 => "7.62mm",
            AmmoKind::Mm20 => "20mm",
        };
        f.write_str(s)
    }
}

/// A weapon model definition from the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeaponModel {
    /// Display name
    pub name: String,
    /// Flavor description
    pub description: String,
    /// Carry weight
    pub weight: f32,
    /// Magazine capacity in rounds
    pub capacity: u32,
    /// Seconds to reload
    pub reload_time: f32,
    /// Caliber consumed
    pub ammo: AmmoKind,
    /// Shots per second
    pub fire_rate: f32,
    /// Effective range in pixels
    pub reach: f32,
    /// Angular spread in degrees
    pub accuracy: f32,
    /// Damage per round
    pub damage: i32,
    /// Trade price
    pub price: u64,
}

/// The weapon model catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeaponCatalog {
    models: Vec<WeaponModel>,
}

/// Built-in catalog, compiled into the binary so a bare library build has
/// weapons without any data directory.
const BUILTIN_CATALOG: &str = include_str!("../assets/weapons.json");

impl WeaponCatalog {
    /// Parses a catalog from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let catalog: Self = serde_json::from_str(json)?;
        if catalog.models.is_empty() {
            return Err(CatalogError::Empty);
        }
        Ok(catalog)
    }

    /// Loads a catalog from a JSON file on disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// The catalog shipped with the crate.
    #[must_use]
    pub fn builtin() -> Self {
        Self::from_json(BUILTIN_CATALOG).expect("built-in weapon catalog is valid")
    }

    /// Number of models.
    #[must_use]
    pub fn len(&self) -> usize {
        self.models.len()
    }

    /// True if the catalog has no models (never, once constructed).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// All models.
    #[must_use]
    pub fn models(&self) -> &[WeaponModel] {
        &self.models
    }

    /// Looks a model up by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&WeaponModel> {
        self.models.iter().find(|m| m.name == name)
    }

    /// Picks a uniformly random model.
    pub fn pick(&self, rng: &mut SimRng) -> &WeaponModel {
        let idx = rng.below(self.models.len() as u32) as usize;
        &self.models[idx]
    }
}

/// Degradation applied to a weapon instance at creation time.
///
/// Each factor is a fraction in `[0, 1)`: rate, reach and damage shrink by
/// it, the accuracy spread widens by it. Factors never change over the
/// weapon's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct WearFactors {
    /// Fire rate loss fraction
    pub rate: f32,
    /// Range loss fraction
    pub reach: f32,
    /// Spread gain fraction
    pub accuracy: f32,
    /// Damage loss fraction
    pub damage: f32,
}

impl WearFactors {
    /// Factory-fresh weapon.
    pub const NONE: Self = Self {
        rate: 0.0,
        reach: 0.0,
        accuracy: 0.0,
        damage: 0.0,
    };

    /// Rolls uniform wear up to `max` on every stat.
    pub fn rolled(rng: &mut SimRng, max: f32) -> Self {
        let max = max.clamp(0.0, 0.99);
        Self {
            rate: rng.unit() * max,
            reach: rng.unit() * max,
            accuracy: rng.unit() * max,
            damage: rng.unit() * max,
        }
    }

    fn clamped(self) -> Self {
        Self {
            rate: self.rate.clamp(0.0, 0.99),
            reach: self.reach.clamp(0.0, 0.99),
            accuracy: self.accuracy.clamp(0.0, 0.99),
            damage: self.damage.clamp(0.0, 0.99),
        }
    }
}

/// Shared ammunition pool, keyed by caliber.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AmmoPool {
    counts: HashMap<AmmoKind, u32>,
}

impl AmmoPool {
    /// Empty pool.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The player's starting stock.
    #[must_use]
    pub fn starting_stock() -> Self {
        let mut pool = Self::new();
        pool.add(AmmoKind::Mm9, 300);
        pool.add(AmmoKind::Mm762, 100);
        pool.add(AmmoKind::Mm20, 100);
        pool
    }

    /// Rounds held of a caliber.
    #[must_use]
    pub fn count(&self, kind: AmmoKind) -> u32 {
        self.counts.get(&kind).copied().unwrap_or(0)
    }

    /// Total rounds across calibers.
    #[must_use]
    pub fn total(&self) -> u32 {
        self.counts.values().sum()
    }

    /// Adds rounds.
    pub fn add(&mut self, kind: AmmoKind, amount: u32) {
        *self.counts.entry(kind).or_insert(0) += amount;
    }

    /// Takes up to `want` rounds, returning how many were actually taken.
    /// An empty pool yields zero; never an error.
    pub fn take(&mut self, kind: AmmoKind, want: u32) -> u32 {
        let have = self.counts.entry(kind).or_insert(0);
        let taken = (*have).min(want);
        *have -= taken;
        taken
    }
}

/// Timer value meaning "long enough ago that no gate applies".
const NEVER: f32 = 1.0e9;

/// A weapon instance.
///
/// Stats are the model's, degraded once by the wear factors. The loaded
/// count never exceeds capacity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Weapon {
    /// Model name
    pub name: String,
    /// Caliber consumed
    pub ammo: AmmoKind,
    /// Magazine capacity
    pub capacity: u32,
    /// Seconds per reload
    pub reload_time: f32,
    /// Shots per second (post-wear)
    pub rate: f32,
    /// Effective range in pixels (post-wear)
    pub reach: f32,
    /// Spread in degrees (post-wear)
    pub accuracy: f32,
    /// Damage per round (post-wear)
    pub damage: i32,
    /// Trade price
    pub price: u64,
    /// Carry weight
    pub weight: f32,
    loaded: u32,
    since_shot: f32,
    since_load: f32,
}

impl Weapon {
    /// Stamps a new instance from a model, applying wear once.
    #[must_use]
    pub fn from_model(model: &WeaponModel, wear: WearFactors) -> Self {
        let wear = wear.clamped();
        Self {
            name: model.name.clone(),
            ammo: model.ammo,
            capacity: model.capacity,
            reload_time: model.reload_time,
            rate: model.fire_rate * (1.0 - wear.rate),
            reach: model.reach * (1.0 - wear.reach),
            accuracy: model.accuracy * (1.0 + wear.accuracy),
            damage: (model.damage as f32 * (1.0 - wear.damage)).round() as i32,
            price: model.price,
            weight: model.weight,
            loaded: 0,
            // No shot and no reload has happened yet, so neither gate is
            // engaged on a fresh weapon. Finite so the instance stays
            // JSON-serializable.
            since_shot: NEVER,
            since_load: NEVER,
        }
    }

    /// Sets the loaded count, clamped to capacity.
    #[must_use]
    pub fn with_loaded(mut self, rounds: u32) -> Self {
        self.loaded = rounds.min(self.capacity);
        self
    }

    /// Rounds currently in the magazine.
    #[must_use]
    pub fn loaded(&self) -> u32 {
        self.loaded
    }

    /// Advances the fire-rate and reload timers.
    pub fn tick(&mut self, dt: f32) {
        self.since_shot += dt;
        self.since_load += dt;
    }

    /// True when a fire request would be honored this tick: rounds in the
    /// magazine, the post-reload delay has elapsed, and the shot interval
    /// (`1 / rate`) has elapsed.
    #[must_use]
    pub fn ready(&self) -> bool {
        self.loaded > 0
            && self.since_load > self.reload_time
            && self.since_shot > 1.0 / self.rate
    }

    /// Attempts to fire toward `aim` from `origin`.
    ///
    /// On success the magazine loses one round, the shot timer resets and
    /// the returned shot's direction carries a uniform jitter within
    /// ±accuracy degrees. A degenerate aim vector fires nothing.
    pub fn try_fire(
        &mut self,
        origin: Vec2,
        aim: Vec2,
        side: Side,
        rng: &mut SimRng,
    ) -> Option<Shot> {
        if !self.ready() {
            return None;
        }
        let dir = aim.try_normalized()?;
        self.loaded -= 1;
        self.since_shot = 0.0;
        let jitter = rng.signed_unit() * self.accuracy.to_radians();
        Some(Shot {
            origin,
            dir: dir.rotated(jitter),
            reach: self.reach,
            damage: self.damage,
            side,
        })
    }

    /// Reloads from a shared pool, taking at most what is available.
    /// Returns the number of rounds transferred.
    pub fn reload_from(&mut self, pool: &mut AmmoPool) -> u32 {
        let want = self.capacity - self.loaded;
        let got = pool.take(self.ammo, want);
        self.loaded += got;
        if got > 0 {
            self.since_load = 0.0;
        }
        got
    }

    /// NPC reload: once empty and past the reload delay, refill to capacity.
    /// NPC holders do not draw from the player's pool.
    pub fn auto_reload(&mut self) {
        if self.loaded == 0 && self.since_load > self.reload_time {
            self.loaded = self.capacity;
            if self.loaded > 0 {
                self.since_load = 0.0;
            }
        }
    }
}
