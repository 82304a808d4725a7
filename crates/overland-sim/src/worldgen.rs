//! Procedural tile field: the obstacle window, prop cache and NPC spawns.
//!
//! The window is regenerated from scratch every tick, which keeps memory
//! flat no matter how far the player drives. Revisited regions look
//! identical because every decision is a pure hash of the absolute cell
//! coordinate — nothing about the map is ever persisted.

use crate::city;
use crate::grid::{local_to_cell, OccupancyGrid, CELL_SIZE, MAP_SIZE};
use crate::input::Vec2;
use crate::npc::NpcKind;
use ahash::AHashMap;
use overland_common::{cell_hash, unit_f32, CellCoord, PropId};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Salt streams keeping the per-cell decisions uncorrelated.
const SALT_OBSTACLE: u64 = 0;
const SALT_OBSTACLE_KIND: u64 = 1;
const SALT_SPAWN: u64 = 2;
const SALT_SPAWN_KIND: u64 = 3;

/// Number of obstacle sprite codes (tile codes 1..=PALETTE).
pub const OBSTACLE_PALETTE: u8 = 10;

/// World generation tuning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorldConfig {
    /// World seed
    pub seed: u64,
    /// Hash draw above which a wilderness cell is an obstacle (~1%)
    pub obstacle_threshold: f32,
    /// NPC spawn chance per wilderness cell
    pub spawn_chance_wild: f32,
    /// NPC spawn chance per city cell
    pub spawn_chance_city: f32,
    /// Share of city spawns that are merchants
    pub merchant_share: f32,
    /// Window border (in cells) excluded from spawn rolls
    pub spawn_margin: i64,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            seed: 12345,
            obstacle_threshold: 0.99,
            spawn_chance_wild: 0.05,
            spawn_chance_city: 0.25,
            merchant_share: 0.25,
            spawn_margin: 2,
        }
    }
}

/// Visual-prop service implemented by the presentation layer.
///
/// The simulation owns the cache keyed by absolute cell; the presentation
/// layer owns whatever a [`PropId`] actually is. Props for cells still in
/// view are never destroyed and recreated.
pub trait Scenery {
    /// Creates the visual representation of an obstacle tile.
    fn create(&mut self, cell: CellCoord, tile: u8) -> PropId;
    /// Destroys a representation that scrolled out of view.
    fn destroy(&mut self, prop: PropId);
}

/// Scenery that renders nothing; headless runs and tests.
#[derive(Debug, Default)]
pub struct NullScenery {
    next: u64,
}

impl Scenery for NullScenery {
    fn create(&mut self, _cell: CellCoord, _tile: u8) -> PropId {
        self.next += 1;
        PropId::from_raw(self.next)
    }

    fn destroy(&mut self, _prop: PropId) {}
}

/// A spawn the generator decided this tick; the session turns it into an
/// actual NPC.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnRequest {
    /// NPC archetype
    pub kind: NpcKind,
    /// World position (cell center)
    pub pos: Vec2,
}

/// The spawn roll for one cell: a pure function of the cell coordinate.
fn spawn_decision(config: &WorldConfig, cell: CellCoord, in_city: bool) -> Option<NpcKind> {
    let chance = if in_city {
        config.spawn_chance_city
    } else {
        config.spawn_chance_wild
    };
    let roll = unit_f32(cell_hash(config.seed, cell.x, cell.y, SALT_SPAWN));
    if roll >= chance {
        return None;
    }
    let kind_roll = unit_f32(cell_hash(config.seed, cell.x, cell.y, SALT_SPAWN_KIND));
    if in_city && kind_roll < config.merchant_share {
        return Some(NpcKind::Merchant);
    }
    // Remaining mass splits evenly across the walking kinds.
    let base = if in_city {
        (kind_roll - config.merchant_share) / (1.0 - config.merchant_share)
    } else {
        kind_roll
    };
    Some(match (base * 3.0) as u32 {
        0 => NpcKind::Wanderer,
        1 => NpcKind::Raider,
        _ => NpcKind::Sentinel,
    })
}

/// The regenerated-every-tick obstacle window and its caches.
#[derive(Debug)]
pub struct TileField {
    config: WorldConfig,
    grid: OccupancyGrid,
    props: AHashMap<CellCoord, PropId>,
    spawn_decisions: AHashMap<CellCoord, Option<NpcKind>>,
}

impl TileField {
    /// Creates an empty field.
    #[must_use]
    pub fn new(config: WorldConfig) -> Self {
        info!(seed = config.seed, "tile field initialized");
        Self {
            config,
            grid: OccupancyGrid::window(),
            props: AHashMap::new(),
            spawn_decisions: AHashMap::new(),
        }
    }

    /// The tuning in effect.
    #[must_use]
    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    /// The current occupancy window.
    #[must_use]
    pub fn grid(&self) -> &OccupancyGrid {
        &self.grid
    }

    /// Number of live visual props.
    #[must_use]
    pub fn prop_count(&self) -> usize {
        self.props.len()
    }

    /// Rebuilds the window for the camera position.
    ///
    /// Obstacles come from the city layouts where one applies and from the
    /// coordinate hash elsewhere. Props are reused by absolute cell and
    /// destroyed when out of view. Cells inside the spawn margin get a
    /// once-per-visit spawn decision; fresh positive decisions are pushed
    /// into `spawns`.
    pub fn regenerate(
        &mut self,
        cam: Vec2,
        scenery: &mut dyn Scenery,
        spawns: &mut Vec<SpawnRequest>,
    ) {
        let size = MAP_SIZE as i64;
        let margin = self.config.spawn_margin;
        let mut props = AHashMap::with_capacity(self.props.len());
        let mut decisions = AHashMap::with_capacity(self.spawn_decisions.len());

        for gy in 0..size {
            for gx in 0..size {
                let cell = local_to_cell(gx, gy, cam);
                let city_tile = city::city_tile_at(cell);
                let in_city = city_tile.is_some();
                let tile = city_tile.unwrap_or_else(|| self.wild_tile(cell));
                self.grid.set_tile(gx, gy, tile);

                if tile != 0 {
                    let prop = self
                        .props
                        .remove(&cell)
                        .unwrap_or_else(|| scenery.create(cell, tile));
                    props.insert(cell, prop);
                }

                // Border cells are excluded so nothing spawns already half
                // out of the window.
                let in_margin = (margin..size - margin).contains(&gx)
                    && (margin..size - margin).contains(&gy);
                if !in_margin {
                    continue;
                }
                let decision = match self.spawn_decisions.remove(&cell) {
                    Some(cached) => cached,
                    None => {
                        let decision = spawn_decision(&self.config, cell, in_city);
                        if let Some(kind) = decision {
                            let (cx, cy) = cell.center_pixels(CELL_SIZE);
                            spawns.push(SpawnRequest {
                                kind,
                                pos: Vec2::new(cx, cy),
                            });
                        }
                        decision
                    }
                };
                decisions.insert(cell, decision);
            }
        }

        // Whatever was not reused has scrolled out of view.
        for (_, prop) in self.props.drain() {
            scenery.destroy(prop);
        }
        self.props = props;
        self.spawn_decisions = decisions;
    }

    fn wild_tile(&self, cell: CellCoord) -> u8 {
        let roll = unit_f32(cell_hash(self.config.seed, cell.x, cell.y, SALT_OBSTACLE));
        if roll > self.config.obstacle_threshold {
            let kind = cell_hash(self.config.seed, cell.x, cell.y, SALT_OBSTACLE_KIND);
            1 + (kind % u64::from(OBSTACLE_PALETTE)) as u8
        } else {
            0
        }
    }
}
