//! Ballistic projectiles and their per-tick simulation.
//!
//! Bullets are line-segment movers: unit direction, fixed speed, a
//! time-to-live derived from the firing weapon's reach. Collision is a
//! point test per tick — against the occupancy grid's 256 px cells here,
//! and against entity hit-boxes wherever the entities live.

use crate::grid::{pixel_to_local, OccupancyGrid};
use crate::input::Vec2;
use serde::{Deserialize, Serialize};

/// Which side fired a bullet; decides what it may hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    /// Fired by the player — hits NPCs.
    Player,
    /// Fired by an NPC — hits the player.
    Npc,
}

/// Output of a successful weapon fire, consumed by [`BulletManager::spawn`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Shot {
    /// Muzzle position
    pub origin: Vec2,
    /// Unit flight direction (jitter already applied)
    pub dir: Vec2,
    /// Effective range in pixels
    pub reach: f32,
    /// Damage on hit
    pub damage: i32,
    /// Owning side
    pub side: Side,
}

/// Projectile tuning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProjectileConfig {
    /// Flight speed in pixels per second
    pub speed: f32,
    /// Tracer segment length handed to the renderer
    pub tracer_length: f32,
}

impl Default for ProjectileConfig {
    fn default() -> Self {
        Self {
            speed: 1860.0,
            tracer_length: 16.0,
        }
    }
}

/// A bullet in flight.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bullet {
    /// Current position
    pub pos: Vec2,
    /// Unit flight direction
    pub dir: Vec2,
    /// Damage on hit
    pub damage: i32,
    /// Owning side
    pub side: Side,
    age: f32,
    ttl: f32,
    alive: bool,
}

impl Bullet {
    fn from_shot(shot: Shot, speed: f32) -> Self {
        Self {
            pos: shot.origin,
            dir: shot.dir,
            damage: shot.damage,
            side: shot.side,
            age: 0.0,
            ttl: if speed > 0.0 { shot.reach / speed } else { 0.0 },
            alive: true,
        }
    }

    /// True while the bullet is still in flight.
    #[must_use]
    pub fn alive(&self) -> bool {
        self.alive
    }

    /// Seconds in flight.
    #[must_use]
    pub fn age(&self) -> f32 {
        self.age
    }

    /// Marks the bullet spent (hit something).
    pub fn kill(&mut self) {
        self.alive = false;
    }

    fn advance(&mut self, dt: f32, speed: f32) {
        if !self.alive {
            return;
        }
        self.pos += self.dir * (speed * dt);
        self.age += dt;
        if self.age > self.ttl {
            self.alive = false;
        }
    }
}

/// Owns and advances all live bullets, split by firing side.
#[derive(Debug, Default)]
pub struct BulletManager {
    config: ProjectileConfig,
    player: Vec<Bullet>,
    hostile: Vec<Bullet>,
}

impl BulletManager {
    /// Creates a manager with the given tuning.
    #[must_use]
    pub fn new(config: ProjectileConfig) -> Self {
        Self {
            config,
            player: Vec::new(),
            hostile: Vec::new(),
        }
    }

    /// The tuning in effect.
    #[must_use]
    pub fn config(&self) -> &ProjectileConfig {
        &self.config
    }

    /// Materializes a shot into a live bullet.
    pub fn spawn(&mut self, shot: Shot) {
        let bullet = Bullet::from_shot(shot, self.config.speed);
        match shot.side {
            Side::Player => self.player.push(bullet),
            Side::Npc => self.hostile.push(bullet),
        }
    }

    /// Player-fired bullets still alive.
    #[must_use]
    pub fn player_bullets(&self) -> &[Bullet] {
        &self.player
    }

    /// Mutable access for target-hit marking.
    pub fn player_bullets_mut(&mut self) -> &mut [Bullet] {
        &mut self.player
    }

    /// NPC-fired bullets still alive.
    #[must_use]
    pub fn hostile_bullets(&self) -> &[Bullet] {
        &self.hostile
    }

    /// Mutable access for target-hit marking.
    pub fn hostile_bullets_mut(&mut self) -> &mut [Bullet] {
        &mut self.hostile
    }

    /// Total live bullets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.player.len() + self.hostile.len()
    }

    /// True when no bullets are in flight.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.player.is_empty() && self.hostile.is_empty()
    }

    /// Advances every bullet and resolves obstacle collisions.
    ///
    /// A bullet whose position lands in an occupied cell of the window is
    /// spent; so is one that leaves the window entirely (nothing outside
    /// the window is simulated or drawn).
    pub fn advance(&mut self, dt: f32, grid: &OccupancyGrid, cam: Vec2) {
        for bullet in self.player.iter_mut().chain(self.hostile.iter_mut()) {
            bullet.advance(dt, self.config.speed);
            if bullet.alive {
                let (gx, gy) = pixel_to_local(bullet.pos, cam);
                if grid.is_blocked(gx, gy) {
                    bullet.alive = false;
                }
            }
        }
    }

    /// Drops spent bullets. Lists are rebuilt, never mutated mid-iteration.
    pub fn sweep(&mut self) {
        self.player.retain(Bullet::alive);
        self.hostile.retain(Bullet::alive);
    }

    /// Tracer segments for line rendering: `(tail, head, side)`.
    pub fn segments(&self) -> impl Iterator<Item = (Vec2, Vec2, Side)> + '_ {
        let len = self.config.tracer_length;
        self.player
            .iter()
            .chain(self.hostile.iter())
            .filter(|b| b.alive)
            .map(move |b| (b.pos - b.dir * len, b.pos, b.side))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::OccupancyGrid;

    fn shot(dir: Vec2, reach: f32, side: Side) -> Shot {
        Shot {
            origin: Vec2::new(4000.0, 4000.0),
            dir,
            reach,
            damage: 10,
            side,
        }
    }

    /// Camera placed so the shot origin sits mid-window.
    fn cam() -> Vec2 {
        Vec2::new(4000.0, 4000.0)
    }

    #[test]
    fn test_bullet_lifetime_matches_reach() {
        // reach 1860 at speed 1860 expires at age ~1.0 s.
        let mut bullets = BulletManager::new(ProjectileConfig::default());
        bullets.spawn(shot(Vec2::X, 1860.0, Side::Player));
        let grid = OccupancyGrid::window();
        let dt = 1.0 / 60.0;
        let mut flight_time = 0.0;
        for _ in 0..120 {
            bullets.advance(dt, &grid, cam());
            if !bullets.player_bullets()[0].alive() {
                break;
            }
            flight_time += dt;
        }
        assert!(
            (flight_time - 1.0).abs() <= 2.0 * dt,
            "expired at {flight_time}s"
        );
    }

    #[test]
    fn test_bullet_travels_straight() {
        let mut bullets = BulletManager::new(ProjectileConfig::default());
        bullets.spawn(shot(Vec2::Y, 1860.0, Side::Npc));
        let grid = OccupancyGrid::window();
        bullets.advance(0.1, &grid, cam());
        let b = &bullets.hostile_bullets()[0];
        assert!((b.pos.x - 4000.0).abs() < 1e-3);
        assert!((b.pos.y - 4186.0).abs() < 1e-2);
    }

    #[test]
    fn test_obstacle_stops_bullet() {
        let mut bullets = BulletManager::new(ProjectileConfig::default());
        bullets.spawn(shot(Vec2::X, 10_000.0, Side::Player));
        let mut grid = OccupancyGrid::window();
        // Wall one cell east of the origin's cell.
        let (gx, gy) = pixel_to_local(Vec2::new(4000.0 + 256.0, 4000.0), cam());
        grid.set_tile(gx, gy, 5);

        let dt = 1.0 / 60.0;
        for _ in 0..60 {
            bullets.advance(dt, &grid, cam());
        }
        let b = &bullets.player_bullets()[0];
        assert!(!b.alive());
        // Died on entering the wall cell, far short of its reach.
        assert!(b.age() < 0.5);
    }

    #[test]
    fn test_sweep_rebuilds_lists() {
        let mut bullets = BulletManager::new(ProjectileConfig::default());
        bullets.spawn(shot(Vec2::X, 1860.0, Side::Player));
        bullets.spawn(shot(Vec2::Y, 1860.0, Side::Npc));
        assert_eq!(bullets.len(), 2);

        bullets.player_bullets_mut()[0].kill();
        bullets.sweep();
        assert_eq!(bullets.len(), 1);
        assert!(bullets.player_bullets().is_empty());
        assert_eq!(bullets.hostile_bullets().len(), 1);
    }

    #[test]
    fn test_segments_follow_direction() {
        let mut bullets = BulletManager::new(ProjectileConfig::default());
        bullets.spawn(shot(Vec2::X, 1860.0, Side::Player));
        let (tail, head, side) = bullets.segments().next().expect("segment");
        assert_eq!(side, Side::Player);
        assert!(head.x > tail.x);
        assert!((head.y - tail.y).abs() < 1e-6);
    }

    #[test]
    fn test_leaving_window_kills_bullet() {
        let mut bullets = BulletManager::new(ProjectileConfig::default());
        bullets.spawn(shot(Vec2::X, 100_000.0, Side::Player));
        let grid = OccupancyGrid::window();
        let dt = 1.0 / 60.0;
        for _ in 0..300 {
            bullets.advance(dt, &grid, cam());
        }
        assert!(!bullets.player_bullets()[0].alive());
    }
}
