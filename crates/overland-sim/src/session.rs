//! The simulation session: owns every subsystem and runs the fixed tick.
//!
//! Tick order is a contract, not an accident: player control first, then
//! the tile window for the new camera, then NPC decisions and firing, then
//! bullet flight and collision, then the ground-item sweep. Each stage
//! reads state the previous stage finished writing; nothing mutates a
//! collection it is iterating.

use crate::events::{EventBus, GameEvent};
use crate::grid::OccupancyGrid;
use crate::input::{Input, Vec2};
use crate::inventory::Inventory;
use crate::items::GroundItems;
use crate::npc::{NpcConfig, NpcManager};
use crate::player::{Player, PlayerConfig};
use crate::projectile::{BulletManager, ProjectileConfig, Side};
use crate::weapon::WeaponCatalog;
use crate::worldgen::{NullScenery, Scenery, SpawnRequest, TileField, WorldConfig};
use overland_common::SimRng;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Top-level session tuning: every subsystem's config plus the seed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// World generation tuning
    pub world: WorldConfig,
    /// NPC tuning
    pub npc: NpcConfig,
    /// Player tuning
    pub player: PlayerConfig,
    /// Projectile tuning
    pub projectile: ProjectileConfig,
    /// Seed for the session's sequential RNG stream
    pub rng_seed: u64,
    /// Player spawn position (a street cell in Carvois)
    pub spawn_position: Vec2,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            world: WorldConfig::default(),
            npc: NpcConfig::default(),
            player: PlayerConfig::default(),
            projectile: ProjectileConfig::default(),
            rng_seed: 12345,
            spawn_position: Vec2::new(98.5 * 256.0, -279.5 * 256.0),
        }
    }
}

/// One running game world.
pub struct Session {
    config: SessionConfig,
    rng: SimRng,
    input: Input,
    player: Player,
    inventory: Inventory,
    catalog: WeaponCatalog,
    tiles: TileField,
    npcs: NpcManager,
    bullets: BulletManager,
    ground: GroundItems,
    events: EventBus,
    scenery: Box<dyn Scenery>,
    spawn_buf: Vec<SpawnRequest>,
    cam: Vec2,
    time: f64,
    game_over: bool,
}

impl Session {
    /// Creates a session with the built-in weapon catalog and no visuals.
    #[must_use]
    pub fn new(config: SessionConfig) -> Self {
        Self::with_parts(config, WeaponCatalog::builtin(), Box::new(NullScenery::default()))
    }

    /// Creates a session with an explicit catalog and scenery service.
    #[must_use]
    pub fn with_parts(
        config: SessionConfig,
        catalog: WeaponCatalog,
        scenery: Box<dyn Scenery>,
    ) -> Self {
        info!(seed = config.rng_seed, "session starting");
        let cam = config.spawn_position;
        Self {
            config,
            rng: SimRng::new(config.rng_seed),
            input: Input::default(),
            player: Player::new(config.spawn_position, &config.player),
            inventory: Inventory::new(),
            catalog,
            tiles: TileField::new(config.world),
            npcs: NpcManager::new(config.npc),
            bullets: BulletManager::new(config.projectile),
            ground: GroundItems::new(),
            events: EventBus::default(),
            scenery,
            spawn_buf: Vec::new(),
            cam,
            time: 0.0,
            game_over: false,
        }
    }

    /// Advances the whole simulation by one frame.
    pub fn tick(&mut self, dt: f32) {
        if self.game_over {
            return;
        }
        self.time += f64::from(dt);

        // Player control, then weapon handling against the fresh position.
        self.player.update(&mut self.input, dt, &self.config.player);
        self.run_player_weapon(dt);

        // The window follows the avatar (plus any mouse-drag override).
        self.cam = self.player.position() + self.input.camera_drag.unwrap_or(Vec2::ZERO);
        let mut spawns = std::mem::take(&mut self.spawn_buf);
        spawns.clear();
        self.tiles
            .regenerate(self.cam, &mut *self.scenery, &mut spawns);
        for spawn in &spawns {
            self.npcs
                .spawn(spawn.kind, spawn.pos, &self.catalog, &mut self.rng);
        }
        self.spawn_buf = spawns;

        // NPCs: decisions, movement, firing, hits from player bullets.
        let report = self.npcs.update(
            dt,
            self.player.walker.pos,
            self.cam,
            self.tiles.grid(),
            &mut self.bullets,
            &mut self.ground,
            &self.events,
            &mut self.rng,
        );
        if report.heal > 0 {
            self.player.heal(report.heal, &self.config.player);
        }
        self.player.money += report.money;

        // Bullet flight, obstacle collision, then hits on the player.
        self.bullets.advance(dt, self.tiles.grid(), self.cam);
        self.resolve_player_hits();
        self.bullets.sweep();

        // Ground items: despawn, auto-pickup, and the death clock.
        self.ground.update(
            &mut self.inventory,
            self.player.walker.pos,
            self.player.on_foot(),
            self.cam,
            &self.events,
        );
        if self.player.death_elapsed() > self.config.player.death_restart_delay {
            self.game_over = true;
        }
    }

    fn run_player_weapon(&mut self, dt: f32) {
        if self.input.reload {
            self.input.reload = false;
            self.inventory.reload_hand();
        }
        let firing = self.input.fire && self.player.on_foot() && !self.player.is_dead();
        let origin = self.player.walker.pos;
        let aim = self.input.aim;
        if let Some(weapon) = self.inventory.hand_weapon_mut() {
            weapon.tick(dt);
            if firing {
                if let Some(shot) = weapon.try_fire(origin, aim, Side::Player, &mut self.rng) {
                    self.events.publish(GameEvent::GunFired {
                        side: Side::Player,
                        position: shot.origin,
                    });
                    self.bullets.spawn(shot);
                }
            }
        }
    }

    fn resolve_player_hits(&mut self) {
        let hitbox = self.player.hitbox(&self.config.player);
        let protection = self.inventory.worn_protection();
        for bullet in self.bullets.hostile_bullets_mut() {
            if !bullet.alive() || self.player.is_dead() {
                continue;
            }
            if hitbox.contains(bullet.pos) {
                let taken =
                    self.player
                        .apply_damage(bullet.damage, protection, &self.config.player);
                bullet.kill();
                self.events.publish(GameEvent::PlayerDamaged { damage: taken });
                if self.player.is_dead() {
                    self.events.publish(GameEvent::PlayerDied);
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // Read/write surface for the presentation layer
    // ------------------------------------------------------------------

    /// The tuning in effect.
    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Write access to the per-frame input intents.
    pub fn input_mut(&mut self) -> &mut Input {
        &mut self.input
    }

    /// Camera position the window is built around.
    #[must_use]
    pub fn camera(&self) -> Vec2 {
        self.cam
    }

    /// Elapsed simulated time, seconds.
    #[must_use]
    pub fn time(&self) -> f64 {
        self.time
    }

    /// True once the player has been dead past the restart delay.
    #[must_use]
    pub fn game_over(&self) -> bool {
        self.game_over
    }

    /// The player (position, rotation, health, money for the HUD).
    #[must_use]
    pub fn player(&self) -> &Player {
        &self.player
    }

    /// Mutable player access (spawn placement, scripted damage).
    pub fn player_mut(&mut self) -> &mut Player {
        &mut self.player
    }

    /// The inventory (HUD and the inventory screen drive it directly).
    #[must_use]
    pub fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    /// Mutable inventory access.
    pub fn inventory_mut(&mut self) -> &mut Inventory {
        &mut self.inventory
    }

    /// Rounds in the held weapon: `(loaded, capacity)`.
    #[must_use]
    pub fn hand_ammo(&self) -> Option<(u32, u32)> {
        self.inventory
            .hand_weapon()
            .map(|w| (w.loaded(), w.capacity))
    }

    /// The weapon catalog.
    #[must_use]
    pub fn catalog(&self) -> &WeaponCatalog {
        &self.catalog
    }

    /// The active NPC set, for sprite placement.
    #[must_use]
    pub fn npcs(&self) -> &NpcManager {
        &self.npcs
    }

    /// Mutable NPC access (scripted encounters).
    pub fn npcs_mut(&mut self) -> &mut NpcManager {
        &mut self.npcs
    }

    /// Live bullets, for tracer rendering.
    #[must_use]
    pub fn bullets(&self) -> &BulletManager {
        &self.bullets
    }

    /// Items on the ground, for sprite placement.
    #[must_use]
    pub fn ground_items(&self) -> &GroundItems {
        &self.ground
    }

    /// Drops an item into the world (the inventory screen's throw-away
    /// action, routed through here so ownership moves in one place).
    pub fn drop_item(&mut self, item: crate::items::Item, pos: Vec2) {
        self.ground.add(item, pos);
    }

    /// The current occupancy window, for tile rendering.
    #[must_use]
    pub fn grid(&self) -> &OccupancyGrid {
        self.tiles.grid()
    }

    /// Drains the events accumulated since the last drain.
    pub fn drain_events(&self) -> Vec<GameEvent> {
        self.events.drain()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::ContainerKind;
    use crate::items::Item;
    use crate::npc::{Npc, NpcKind};
    use crate::weapon::{AmmoKind, Weapon, WeaponModel, WearFactors};

    const DT: f32 = 1.0 / 60.0;

    fn session() -> Session {
        Session::new(SessionConfig::default())
    }

    /// A session in empty wilderness: no obstacles, no ambient spawns.
    /// Scripted-encounter tests use this so nothing else shoots.
    fn quiet_session() -> Session {
        let mut config = SessionConfig::default();
        config.world.obstacle_threshold = 2.0;
        config.world.spawn_chance_wild = 0.0;
        config.world.spawn_chance_city = 0.0;
        config.spawn_position = Vec2::new(5000.5 * 256.0, 5000.5 * 256.0);
        Session::new(config)
    }

    fn give_hand_weapon(session: &mut Session, model: &WeaponModel, loaded: u32) {
        let weapon = Weapon::from_model(model, WearFactors::NONE).with_loaded(loaded);
        assert!(session
            .inventory_mut()
            .pickup(Item::Weapon(weapon))
            .is_none());
        assert!(session
            .inventory_mut()
            .swap((ContainerKind::Hand, 0), (ContainerKind::Arms, 0)));
    }

    #[test]
    fn test_session_runs_and_generates_world() {
        let mut session = session();
        for _ in 0..60 {
            session.tick(DT);
        }
        assert!(!session.game_over());
        assert!((session.time() - 1.0).abs() < 1e-4);
        // The spawn street is inside Carvois: the window carries city tiles.
        let blocked = (0..30)
            .flat_map(|y| (0..30).map(move |x| (x, y)))
            .filter(|&(x, y)| session.grid().is_blocked(x, y))
            .count();
        assert!(blocked > 0);
    }

    #[test]
    fn test_sessions_are_deterministic() {
        let mut a = session();
        let mut b = session();
        for _ in 0..120 {
            a.tick(DT);
            b.tick(DT);
        }
        assert_eq!(a.player().position(), b.player().position());
        assert_eq!(a.npcs().len(), b.npcs().len());
        assert_eq!(a.bullets().len(), b.bullets().len());
        assert_eq!(a.player().health(), b.player().health());
    }

    #[test]
    fn test_player_fires_held_weapon() {
        let mut session = quiet_session();
        let model = session.catalog().models()[0].clone();
        give_hand_weapon(&mut session, &model, 10);
        session.input_mut().fire = true;
        session.input_mut().aim = Vec2::new(1.0, 0.0);
        session.tick(DT);

        assert!(!session.bullets().player_bullets().is_empty());
        assert!(session
            .drain_events()
            .iter()
            .any(|e| matches!(e, GameEvent::GunFired { side: Side::Player, .. })));
        let (loaded, _) = session.hand_ammo().expect("weapon in hand");
        assert_eq!(loaded, 9);
    }

    #[test]
    fn test_reload_draws_from_pool_and_conserves_rounds() {
        let mut session = quiet_session();
        let model = session.catalog().models()[0].clone();
        assert_eq!(model.ammo, AmmoKind::Mm9);
        give_hand_weapon(&mut session, &model, 0);

        let pool_before = session.inventory().ammo.count(AmmoKind::Mm9);
        session.input_mut().reload = true;
        session.tick(DT);

        let (loaded, capacity) = session.hand_ammo().expect("weapon in hand");
        assert_eq!(loaded, capacity);
        let pool_after = session.inventory().ammo.count(AmmoKind::Mm9);
        assert_eq!(pool_before, pool_after + loaded);
        assert!(!session.input_mut().reload, "reload intent consumed");
    }

    #[test]
    fn test_npc_engagement_is_rate_and_damage_bounded() {
        // The end-to-end bound: an aggressive NPC with a rate-5, damage-10
        // weapon and the player inside pursuit range for three seconds
        // fires at most 15 rounds, and each hit costs at most 10 health.
        let mut session = quiet_session();
        let mut model = session.catalog().models()[0].clone();
        model.fire_rate = 5.0;
        model.capacity = 10;
        model.damage = 10;
        model.accuracy = 2.0;
        let weapon = Weapon::from_model(&model, WearFactors::NONE).with_loaded(10);

        let pos = session.player().walker.pos + Vec2::new(150.0, -16.0);
        let npc = Npc::new(
            NpcKind::Raider,
            pos,
            Some(weapon),
            pos,
            session.npcs().config(),
        );
        session.npcs_mut().insert(npc);

        for _ in 0..180 {
            session.tick(DT);
        }

        let shots = session
            .drain_events()
            .iter()
            .filter(|e| matches!(e, GameEvent::GunFired { side: Side::Npc, .. }))
            .count();
        assert!(shots > 0, "raider engages inside pursuit range");
        assert!(shots <= 15, "{shots} shots in 3 s at rate 5");

        let lost = session.config().player.max_health - session.player().health();
        assert!(lost <= (shots as i32) * 10, "lost {lost} from {shots} shots");
    }

    #[test]
    fn test_npc_death_rewards_player_and_drops_loot() {
        let mut session = quiet_session();
        let mut model = session.catalog().models()[0].clone();
        model.damage = 60;
        model.capacity = 30;
        model.fire_rate = 6.0;
        model.accuracy = 1.0;
        give_hand_weapon(&mut session, &model, 30);

        // Soften the player first so the kill reward is visible.
        session
            .player_mut()
            .apply_damage(50, 0.0, &PlayerConfig::default());
        let health_before = session.player().health();

        // Hit-box centered on the player's aim line.
        let pos = session.player().walker.pos + Vec2::new(100.0, -16.0);
        let npc = Npc::new(NpcKind::Wanderer, pos, None, pos, session.npcs().config());
        let id = session.npcs_mut().insert(npc);

        session.input_mut().fire = true;
        session.input_mut().aim = Vec2::new(1.0, 0.0);
        let mut killed = false;
        for _ in 0..600 {
            session.tick(DT);
            if session.npcs().get(id).map_or(true, |npc| !npc.alive()) {
                killed = true;
                break;
            }
        }
        assert!(killed, "close-range fire kills the wanderer");
        assert!(
            session.player().health() > health_before,
            "kill heal applied"
        );
        // The wanderer had no weapon; nothing fell, but picking over the
        // corpse position finds no loot either way.
        assert!(session.bullets().hostile_bullets().is_empty());
    }

    #[test]
    fn test_game_over_after_death_delay() {
        let mut session = quiet_session();
        session
            .player_mut()
            .apply_damage(1000, 0.0, &PlayerConfig::default());
        assert!(session.player().is_dead());
        for _ in 0..(4 * 60 + 10) {
            session.tick(DT);
        }
        assert!(session.game_over());
        // A finished session holds state steady.
        let t = session.time();
        session.tick(DT);
        assert!((session.time() - t).abs() < f64::EPSILON);
    }

    #[test]
    fn test_world_spawns_npcs_around_city_start() {
        let mut session = session();
        for _ in 0..10 {
            session.tick(DT);
        }
        // The default spawn is a city street; the first window rolls spawn
        // decisions for hundreds of cells at city density.
        assert!(!session.npcs().is_empty());
    }

    #[test]
    fn test_merchant_trade_credits_money() {
        let mut session = quiet_session();
        let merchant_pos = session.player().walker.pos + Vec2::new(400.0, 0.0);
        let npc = Npc::new(
            NpcKind::Merchant,
            merchant_pos,
            None,
            merchant_pos,
            session.npcs().config(),
        );
        session.npcs_mut().insert(npc);

        // Drop a weapon from the arms container at the merchant's feet.
        let model = session.catalog().models()[0].clone();
        let price = model.price;
        let weapon = Weapon::from_model(&model, WearFactors::NONE);
        assert!(session
            .inventory_mut()
            .pickup(Item::Weapon(weapon))
            .is_none());
        let item = session
            .inventory_mut()
            .take(ContainerKind::Arms, 0)
            .expect("weapon to drop");
        // Anchor the reach box so the merchant stands inside it.
        session.drop_item(item, merchant_pos - Vec2::new(10.0, 10.0));

        session.tick(DT);
        assert_eq!(session.player().money, price);
        assert!(session
            .drain_events()
            .iter()
            .any(|e| matches!(e, GameEvent::Trade { .. })));
    }
}
