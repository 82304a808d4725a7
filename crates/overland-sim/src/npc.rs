//! NPC decision logic, movement with obstacle avoidance, and combat.
//!
//! Every tick an NPC picks an objective from its kind's policy, moves
//! toward it (falling back to A* when the straight line is blocked), and
//! runs the shared weapon state machine if it is the shooting kind. Death
//! is one-way: a dead NPC never moves, fires or revives, it only waits to
//! scroll out of the window.

use crate::events::{EventBus, GameEvent};
use crate::grid::{self, pixel_to_local, OccupancyGrid, CELL_SIZE};
use crate::input::{Aabb, Vec2};
use crate::items::{AmmoBox, GroundItems, Item};
use crate::pathfind;
use crate::projectile::{BulletManager, Shot, Side};
use crate::weapon::{AmmoKind, Weapon, WeaponCatalog, WearFactors};
use overland_common::{EntityId, SimRng};
use serde::{Deserialize, Serialize};

/// NPC archetypes. Behavior differences are expressed through the
/// capability methods below, not scattered integer comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NpcKind {
    /// Unarmed drifter; ignores the player entirely
    Wanderer,
    /// Armed and aggressive; shoots when the player is close or has hurt it
    Raider,
    /// Armed and territorial; shoots at the player on sight
    Sentinel,
    /// Stationary trader; buys items dropped at its feet
    Merchant,
}

impl NpcKind {
    /// Whether this kind carries a weapon at spawn.
    #[must_use]
    pub const fn armed(self) -> bool {
        matches!(self, NpcKind::Raider | NpcKind::Sentinel)
    }

    /// Whether this kind reacts to the player's position at all.
    #[must_use]
    pub const fn engages(self) -> bool {
        matches!(self, NpcKind::Raider | NpcKind::Sentinel)
    }

    /// Whether this kind stays at its spawn point.
    #[must_use]
    pub const fn stationary(self) -> bool {
        matches!(self, NpcKind::Merchant)
    }
}

/// NPC tuning. Every empirically chosen number lives here.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NpcConfig {
    /// Health at spawn
    pub max_health: i32,
    /// Walking speed, px/s
    pub base_speed: f32,
    /// Walking speed above the stress threshold, px/s
    pub stressed_speed: f32,
    /// Stress above which the faster speed kicks in
    pub stress_speed_threshold: u32,
    /// Player distance under which a provoked shooter pursues, px
    pub pursuit_radius: f32,
    /// Below this health any kind falls back to its default objective
    pub flee_health: i32,
    /// Side of the square hit-box anchored at the NPC position, px
    pub hitbox_size: f32,
    /// Health granted to the player per kill
    pub kill_heal: i32,
    /// Upper bound on the wear rolled for spawned NPC weapons
    pub weapon_wear_max: f32,
}

impl Default for NpcConfig {
    fn default() -> Self {
        Self {
            max_health: 100,
            base_speed: 90.0,
            stressed_speed: 180.0,
            stress_speed_threshold: 1,
            pursuit_radius: 200.0,
            flee_health: 25,
            hitbox_size: 32.0,
            kill_heal: 20,
            weapon_wear_max: 0.25,
        }
    }
}

/// One non-player character.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Npc {
    id: EntityId,
    /// Archetype
    pub kind: NpcKind,
    /// World position
    pub pos: Vec2,
    health: i32,
    /// Hits taken recently; raises speed and aggression
    pub stress: u32,
    /// Owned weapon, dropped on death
    pub weapon: Option<Weapon>,
    /// Long-term objective, fixed at spawn (nearest city, jittered)
    home_objective: Vec2,
    objective: Vec2,
    /// Unit direction of the last movement, for sprite rotation
    pub facing: Vec2,
    dead: bool,
}

impl Npc {
    /// Creates an NPC at a position with its memoized default objective.
    #[must_use]
    pub fn new(kind: NpcKind, pos: Vec2, weapon: Option<Weapon>, home_objective: Vec2, config: &NpcConfig) -> Self {
        // Stationary kinds hold their spawn point instead of drifting.
        let home_objective = if kind.stationary() { pos } else { home_objective };
        Self {
            id: EntityId::new(),
            kind,
            pos,
            health: config.max_health,
            stress: 0,
            weapon,
            home_objective,
            objective: home_objective,
            facing: Vec2::Y,
            dead: false,
        }
    }

    /// Entity ID.
    #[must_use]
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// Current health.
    #[must_use]
    pub fn health(&self) -> i32 {
        self.health
    }

    /// True until the death transition.
    #[must_use]
    pub fn alive(&self) -> bool {
        !self.dead
    }

    /// The square hit-box anchored at the NPC's position.
    #[must_use]
    pub fn hitbox(&self, config: &NpcConfig) -> Aabb {
        Aabb::anchored(self.pos, config.hitbox_size)
    }

    /// Applies bullet damage. Corpses are not valid targets and ignore hits.
    pub fn apply_hit(&mut self, damage: i32) {
        if self.dead {
            return;
        }
        self.health -= damage;
        self.stress += 1;
    }

    /// Distance to the player.
    #[must_use]
    pub fn distance_to(&self, target: Vec2) -> f32 {
        self.pos.distance(target)
    }

    fn choose_objective(&mut self, player_pos: Vec2, config: &NpcConfig) {
        if !self.kind.engages() {
            self.objective = self.home_objective;
            return;
        }
        // Wounded shooters break off and head for their default objective
        // regardless of aggression.
        if self.health < config.flee_health {
            self.objective = self.home_objective;
            return;
        }
        if self.stress > 0 && self.distance_to(player_pos) < config.pursuit_radius {
            self.objective = player_pos;
        } else {
            self.objective = self.home_objective;
        }
    }

    fn speed(&self, config: &NpcConfig) -> f32 {
        if self.stress > config.stress_speed_threshold {
            config.stressed_speed
        } else {
            config.base_speed
        }
    }

    /// Marches along `dir` from the NPC until the next step would leave the
    /// window, and returns the last covered cell: the pathfinding goal for
    /// "keep going that way".
    fn ray_to_window_edge(&self, dir: Vec2, cam: Vec2) -> (i64, i64) {
        let step = CELL_SIZE as f32 / 4.0;
        let mut pos = self.pos;
        // The window diagonal is under 11k px; quarter-cell steps cross it
        // in well under this bound.
        for _ in 0..256 {
            let next = pos + dir * step;
            let (gx, gy) = pixel_to_local(next, cam);
            if !grid::in_window(gx, gy) {
                break;
            }
            pos = next;
        }
        pixel_to_local(pos, cam)
    }

    /// Movement for this tick toward `target`, avoiding obstacles.
    ///
    /// The straight-line move is taken when its destination cell is free;
    /// otherwise A* runs from the current cell toward the window edge along
    /// the desired direction, and the first path step gives the corrected
    /// direction. No path means no movement this tick.
    fn step_toward(
        &self,
        target: Vec2,
        grid: &OccupancyGrid,
        cam: Vec2,
        dt: f32,
        config: &NpcConfig,
    ) -> Vec2 {
        let Some(dir) = (target - self.pos).try_normalized() else {
            return Vec2::ZERO;
        };
        let mov = dir * (self.speed(config) * dt);
        let (gx, gy) = pixel_to_local(self.pos + mov, cam);
        if !grid.is_blocked(gx, gy) {
            return mov;
        }

        let goal = self.ray_to_window_edge(dir, cam);
        let start = pixel_to_local(self.pos, cam);
        let Some(path) = pathfind::find_path(grid, start, goal) else {
            return Vec2::ZERO;
        };
        let Some(((ax, ay), (bx, by))) = path.first_step() else {
            return Vec2::ZERO;
        };
        let Some(corrected) = Vec2::new((bx - ax) as f32, (by - ay) as f32).try_normalized()
        else {
            return Vec2::ZERO;
        };
        corrected * (self.speed(config) * dt)
    }

    fn run_weapon(
        &mut self,
        player_pos: Vec2,
        dt: f32,
        rng: &mut SimRng,
        config: &NpcConfig,
    ) -> Option<Shot> {
        let weapon = self.weapon.as_mut()?;
        weapon.tick(dt);
        weapon.auto_reload();

        let engaged = match self.kind {
            // Raiders open up once provoked or once the player walks into
            // pursuit range; sentinels shoot on sight.
            NpcKind::Raider => {
                self.stress > 0 || self.pos.distance(player_pos) < config.pursuit_radius
            }
            NpcKind::Sentinel => true,
            NpcKind::Wanderer | NpcKind::Merchant => false,
        };
        if !engaged {
            return None;
        }
        weapon.try_fire(self.pos, player_pos - self.pos, Side::Npc, rng)
    }

    /// Per-tick update: objective, movement, combat. Returns a shot if the
    /// weapon fired.
    pub fn update(
        &mut self,
        player_pos: Vec2,
        cam: Vec2,
        grid: &OccupancyGrid,
        dt: f32,
        rng: &mut SimRng,
        config: &NpcConfig,
    ) -> Option<Shot> {
        if self.dead {
            return None;
        }
        self.choose_objective(player_pos, config);
        let mov = self.step_toward(self.objective, grid, cam, dt, config);
        if mov != Vec2::ZERO {
            self.pos += mov;
            self.facing = mov.normalized_or_zero();
        }
        self.run_weapon(player_pos, dt, rng, config)
    }
}

/// What one NPC tick owes the rest of the simulation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NpcTickReport {
    /// Health owed to the player (kill rewards)
    pub heal: i32,
    /// Money owed to the player (merchant purchases)
    pub money: u64,
}

/// Owns the active NPC set.
#[derive(Debug, Default)]
pub struct NpcManager {
    npcs: Vec<Npc>,
    config: NpcConfig,
}

impl NpcManager {
    /// Creates a manager with the given tuning.
    #[must_use]
    pub fn new(config: NpcConfig) -> Self {
        Self {
            npcs: Vec::new(),
            config,
        }
    }

    /// The tuning in effect.
    #[must_use]
    pub fn config(&self) -> &NpcConfig {
        &self.config
    }

    /// Number of active NPCs (dead ones included until they despawn).
    #[must_use]
    pub fn len(&self) -> usize {
        self.npcs.len()
    }

    /// True when no NPCs are active.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.npcs.is_empty()
    }

    /// Iterates NPCs for rendering and HUD.
    pub fn iter(&self) -> impl Iterator<Item = &Npc> {
        self.npcs.iter()
    }

    /// Looks an NPC up by ID.
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&Npc> {
        self.npcs.iter().find(|npc| npc.id == id)
    }

    /// Spawns an NPC of a kind, arming it from the catalog when the kind
    /// calls for it. The default objective is the nearest city center with
    /// up to one cell of jitter, fixed for the NPC's lifetime.
    pub fn spawn(
        &mut self,
        kind: NpcKind,
        pos: Vec2,
        catalog: &WeaponCatalog,
        rng: &mut SimRng,
    ) -> EntityId {
        let weapon = if kind.armed() {
            let wear = WearFactors::rolled(rng, self.config.weapon_wear_max);
            Some(Weapon::from_model(catalog.pick(rng), wear))
        } else {
            None
        };
        let jitter = Vec2::new(rng.signed_unit(), rng.signed_unit()) * CELL_SIZE as f32;
        let home = crate::city::nearest_center(pos) + jitter;
        let npc = Npc::new(kind, pos, weapon, home, &self.config);
        let id = npc.id;
        self.npcs.push(npc);
        id
    }

    /// Inserts a pre-built NPC (tests, scripted encounters).
    pub fn insert(&mut self, npc: Npc) -> EntityId {
        let id = npc.id;
        self.npcs.push(npc);
        id
    }

    /// Updates every NPC for one tick.
    ///
    /// Order per NPC mirrors the simulation contract: despawn check,
    /// merchant trading, player-bullet hits and the death transition, then
    /// movement and firing. The active list is rebuilt, never mutated in
    /// place.
    #[allow(clippy::too_many_arguments)]
    pub fn update(
        &mut self,
        dt: f32,
        player_pos: Vec2,
        cam: Vec2,
        grid: &OccupancyGrid,
        bullets: &mut BulletManager,
        ground: &mut GroundItems,
        events: &EventBus,
        rng: &mut SimRng,
    ) -> NpcTickReport {
        let config = self.config;
        let mut report = NpcTickReport::default();
        let mut kept = Vec::with_capacity(self.npcs.len());

        for mut npc in std::mem::take(&mut self.npcs) {
            let (gx, gy) = pixel_to_local(npc.pos, cam);
            if !grid::in_window(gx, gy) {
                // Scrolled out; the cell's spawn decision stays cached, the
                // NPC itself is gone.
                continue;
            }

            if npc.kind == NpcKind::Merchant && npc.alive() {
                report.money += ground.sell_to_merchant(npc.pos, events);
            }

            for bullet in bullets.player_bullets_mut() {
                if bullet.alive() && npc.alive() && npc.hitbox(&config).contains(bullet.pos)
                {
                    npc.apply_hit(bullet.damage);
                    bullet.kill();
                }
            }

            if npc.health <= 0 && !npc.dead {
                npc.dead = true;
                events.publish(GameEvent::NpcDied {
                    entity_id: npc.id,
                    position: npc.pos,
                });
                report.heal += config.kill_heal;
                if let Some(weapon) = npc.weapon.take() {
                    ground.add(Item::Weapon(weapon), npc.pos);
                }
                if npc.kind == NpcKind::Merchant {
                    let kind = AmmoKind::ALL[rng.below(AmmoKind::ALL.len() as u32) as usize];
                    let rounds = rng.range(1, 20);
                    ground.add(Item::Ammo(AmmoBox { kind, rounds }), npc.pos);
                }
            }

            if let Some(shot) = npc.update(player_pos, cam, grid, dt, rng, &config) {
                events.publish(GameEvent::GunFired {
                    side: Side::Npc,
                    position: shot.origin,
                });
                bullets.spawn(shot);
            }

            kept.push(npc);
        }

        self.npcs = kept;
        report
    }
}
