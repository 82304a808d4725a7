//! The player: a walker avatar, a car, and the mount logic between them.
//!
//! The car model is deliberately arcade: steering authority follows a grip
//! curve of current speed (killed by the handbrake), engine force falls off
//! inversely with speed, and velocity is rotated with the chassis unless
//! the handbrake lets the rear slide.

use crate::input::{Aabb, Input, Vec2};
use serde::{Deserialize, Serialize};

/// Player tuning. The movement curves were tuned in cell-per-tick units at
/// the fixed 60 Hz step; [`SPEED_NORM`] converts px/s into that domain.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlayerConfig {
    /// Walker acceleration, px/s²
    pub walk_accel: f32,
    /// Walker ground friction, px/s²
    pub walk_friction: f32,
    /// Walker speed cap, px/s
    pub walk_max_speed: f32,
    /// Car engine strength, px/s² at standstill
    pub car_accel: f32,
    /// Car rolling drag, px/s²
    pub car_drag: f32,
    /// Car brake strength, px/s² per unit of brake input
    pub car_brake: f32,
    /// Car forward speed cap, px/s
    pub car_top_speed: f32,
    /// Full-grip steering rate, rad/s
    pub steer_rate: f32,
    /// Distance at which interact mounts the car, px
    pub mount_radius: f32,
    /// Distance at which the walker is drawn toward the car, px
    pub magnet_radius: f32,
    /// Car speed below which dismounting is allowed, px/s
    pub dismount_speed: f32,
    /// Health at spawn and the heal cap
    pub max_health: i32,
    /// Side of the player hit-box, px
    pub hitbox_size: f32,
    /// Base divisor applied to incoming damage (worn gear adds to it)
    pub damage_divisor: f32,
    /// Seconds after death before the session reports game over
    pub death_restart_delay: f32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            walk_accel: 3600.0,
            walk_friction: 480.0,
            walk_max_speed: 180.0,
            car_accel: 960.0,
            car_drag: 60.0,
            car_brake: 240.0,
            car_top_speed: 720.0,
            steer_rate: std::f32::consts::FRAC_PI_2,
            mount_radius: 8.0,
            magnet_radius: 256.0,
            dismount_speed: 60.0,
            max_health: 100,
            hitbox_size: 32.0,
            damage_divisor: 1.0,
            death_restart_delay: 4.0,
        }
    }
}

/// px/s corresponding to one px-per-tick at the 60 Hz step; the grip and
/// torque curves below were tuned in that unit.
const SPEED_NORM: f32 = 60.0;

/// Which avatar the player currently controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mount {
    /// Walking
    OnFoot,
    /// Driving the car
    Driving,
}

/// The on-foot avatar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Walker {
    /// World position
    pub pos: Vec2,
    /// Velocity, px/s
    pub vel: Vec2,
    /// Unit facing (mouse aim)
    pub facing: Vec2,
}

impl Walker {
    fn new(pos: Vec2) -> Self {
        Self {
            pos,
            vel: Vec2::ZERO,
            facing: Vec2::Y,
        }
    }

    fn stop(&mut self) {
        self.vel = Vec2::ZERO;
    }

    /// One tick of walking. `accel_override` replaces key input while the
    /// walker is being drawn toward the car.
    fn update(
        &mut self,
        input: &Input,
        dt: f32,
        config: &PlayerConfig,
        accel_override: Option<Vec2>,
    ) {
        if let Some(aim) = input.aim.try_normalized() {
            self.facing = aim;
        }
        let accel_dir = accel_override
            .unwrap_or_else(|| input.move_dir())
            .normalized_or_zero();
        self.vel += accel_dir * (config.walk_accel * dt);

        // Friction pulls straight toward rest and never overshoots.
        let speed = self.vel.length();
        let drop = config.walk_friction * dt;
        if speed <= drop {
            self.vel = Vec2::ZERO;
        } else {
            self.vel = self.vel * ((speed - drop) / speed);
        }

        self.vel = self.vel.clamped_length(config.walk_max_speed);
        self.pos += self.vel * dt;
    }
}

/// The car avatar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Car {
    /// World position
    pub pos: Vec2,
    /// Velocity, px/s
    pub vel: Vec2,
    /// Unit chassis direction
    pub dir: Vec2,
}

impl Car {
    fn new(pos: Vec2) -> Self {
        Self {
            pos,
            vel: Vec2::ZERO,
            dir: Vec2::Y,
        }
    }

    /// Current speed, px/s.
    #[must_use]
    pub fn speed(&self) -> f32 {
        self.vel.length()
    }

    fn stop(&mut self) {
        self.vel = Vec2::ZERO;
    }

    /// Steering authority as a function of speed: none at rest, rising
    /// quadratically, then falling off again at speed — a car, not a tank.
    fn grip(speed: f32) -> f32 {
        let s = speed / SPEED_NORM;
        if s <= 0.0 {
            0.0
        } else if s < 0.755 {
            4.0 * s * s
        } else {
            4.0 / (s + 1.0)
        }
    }

    fn rotate(&mut self, input: &Input, dt: f32, config: &PlayerConfig) {
        let angle = config.steer_rate * input.steer() * dt * Self::grip(self.speed());
        if angle == 0.0 {
            return;
        }
        self.dir = self.dir.rotated(angle).normalized_or_zero();
        // Grip carries the velocity around with the chassis; the handbrake
        // breaks that coupling and lets the car slide.
        if !input.handbrake {
            self.vel = self.vel.rotated(angle);
        }
    }

    fn accelerate(&mut self, input: &Input, dt: f32, config: &PlayerConfig) {
        // Drag plus brakes, never reversing the velocity through zero.
        let brake_input = if input.handbrake {
            1.0
        } else if input.down {
            0.5
        } else {
            0.0
        };
        let speed = self.speed();
        let drop = (config.car_drag + config.car_brake * brake_input) * dt;
        if speed <= drop {
            self.vel = Vec2::ZERO;
        } else {
            self.vel = self.vel * ((speed - drop) / speed);
        }

        // Engine torque falls off with speed.
        let throttle = f32::from(u8::from(input.up)) - 0.5 * f32::from(u8::from(input.down));
        let falloff = 1.0 / (self.speed() / SPEED_NORM + 1.0);
        self.vel += self.dir * (config.car_accel * falloff * throttle * dt);

        // Cap only applies under power; a slide keeps its momentum.
        if input.up && self.speed() > config.car_top_speed {
            self.vel = self.vel.clamped_length(config.car_top_speed);
        }

        self.pos += self.vel * dt;
    }

    fn update(&mut self, input: &Input, dt: f32, config: &PlayerConfig) {
        self.rotate(input, dt, config);
        self.accelerate(input, dt, config);
    }
}

/// The player: both avatars, vitals and wallet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    /// On-foot avatar
    pub walker: Walker,
    /// Car avatar
    pub car: Car,
    mount: Mount,
    health: i32,
    /// Money earned through trade
    pub money: u64,
    death_time: f32,
}

impl Player {
    /// Spawns the player (and the car) at a position.
    #[must_use]
    pub fn new(pos: Vec2, config: &PlayerConfig) -> Self {
        Self {
            walker: Walker::new(pos),
            car: Car::new(pos),
            mount: Mount::OnFoot,
            health: config.max_health,
            money: 0,
            death_time: 0.0,
        }
    }

    /// Which avatar is active.
    #[must_use]
    pub fn mount(&self) -> Mount {
        self.mount
    }

    /// True while walking.
    #[must_use]
    pub fn on_foot(&self) -> bool {
        self.mount == Mount::OnFoot
    }

    /// Position of the active avatar — also the camera target.
    #[must_use]
    pub fn position(&self) -> Vec2 {
        match self.mount {
            Mount::OnFoot => self.walker.pos,
            Mount::Driving => self.car.pos,
        }
    }

    /// Heading of the active avatar, radians.
    #[must_use]
    pub fn rotation(&self) -> f32 {
        match self.mount {
            Mount::OnFoot => self.walker.facing.heading(),
            Mount::Driving => self.car.dir.heading(),
        }
    }

    /// Current health.
    #[must_use]
    pub fn health(&self) -> i32 {
        self.health
    }

    /// True once health reached zero.
    #[must_use]
    pub fn is_dead(&self) -> bool {
        self.health <= 0
    }

    /// Seconds since death (zero while alive).
    #[must_use]
    pub fn death_elapsed(&self) -> f32 {
        self.death_time
    }

    /// Heals up to the cap. Dead players stay dead.
    pub fn heal(&mut self, amount: i32, config: &PlayerConfig) {
        if self.is_dead() {
            return;
        }
        self.health = (self.health + amount).min(config.max_health);
    }

    /// Applies bullet damage through the reduction divisor (base divisor
    /// plus worn protection). Returns the damage actually taken.
    pub fn apply_damage(&mut self, damage: i32, protection: f32, config: &PlayerConfig) -> i32 {
        if self.is_dead() {
            return 0;
        }
        let divisor = (config.damage_divisor + protection).max(1.0);
        let taken = (damage as f32 / divisor).round() as i32;
        self.health = (self.health - taken).max(0);
        taken
    }

    /// The player hit-box (only the walker is shootable; the car soaks
    /// hits with its body in the presentation layer).
    #[must_use]
    pub fn hitbox(&self, config: &PlayerConfig) -> Aabb {
        Aabb::anchored(self.walker.pos, config.hitbox_size)
    }

    /// One tick of player control.
    ///
    /// The interact flag is consumed on a successful mount or dismount so
    /// one key press is one transition.
    pub fn update(&mut self, input: &mut Input, dt: f32, config: &PlayerConfig) {
        if self.is_dead() {
            self.death_time += dt;
            return;
        }
        match self.mount {
            Mount::OnFoot => {
                if input.interact {
                    let to_car = self.car.pos - self.walker.pos;
                    let dist = to_car.length();
                    if dist < config.mount_radius {
                        self.mount = Mount::Driving;
                        input.interact = false;
                        self.car.stop();
                        return;
                    }
                    if dist < config.magnet_radius {
                        // Close enough: the walker is pulled to the door.
                        self.walker.update(input, dt, config, Some(to_car));
                    } else {
                        self.walker.update(input, dt, config, None);
                    }
                } else {
                    self.walker.update(input, dt, config, None);
                }
            }
            Mount::Driving => {
                // The walker rides along, invisible but positioned.
                self.walker.pos = self.car.pos;
                if input.interact && self.car.speed() < config.dismount_speed {
                    self.mount = Mount::OnFoot;
                    input.interact = false;
                    self.walker.stop();
                } else {
                    self.car.update(input, dt, config);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> PlayerConfig {
        PlayerConfig::default()
    }

    fn ticks(player: &mut Player, input: &mut Input, n: usize) {
        for _ in 0..n {
            player.update(input, 1.0 / 60.0, &cfg());
        }
    }

    #[test]
    fn test_walker_accelerates_and_caps() {
        let mut player = Player::new(Vec2::ZERO, &cfg());
        let mut input = Input {
            right: true,
            ..Input::default()
        };
        ticks(&mut player, &mut input, 120);
        assert!(player.walker.pos.x > 0.0);
        assert!(player.walker.vel.length() <= cfg().walk_max_speed + 1e-3);
        // At the cap after two seconds of holding the key.
        assert!(player.walker.vel.length() > cfg().walk_max_speed * 0.95);
    }

    #[test]
    fn test_walker_friction_stops_movement() {
        let mut player = Player::new(Vec2::ZERO, &cfg());
        let mut input = Input {
            right: true,
            ..Input::default()
        };
        ticks(&mut player, &mut input, 60);
        input.right = false;
        ticks(&mut player, &mut input, 120);
        assert_eq!(player.walker.vel, Vec2::ZERO);
    }

    #[test]
    fn test_walker_faces_aim() {
        let mut player = Player::new(Vec2::ZERO, &cfg());
        let mut input = Input {
            aim: Vec2::new(-3.0, 0.0),
            ..Input::default()
        };
        ticks(&mut player, &mut input, 1);
        assert!((player.walker.facing.x + 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_mount_requires_proximity() {
        let mut player = Player::new(Vec2::ZERO, &cfg());
        player.car.pos = Vec2::new(500.0, 0.0);
        let mut input = Input {
            interact: true,
            ..Input::default()
        };
        ticks(&mut player, &mut input, 1);
        assert!(player.on_foot(), "car too far to enter");

        player.car.pos = player.walker.pos + Vec2::new(5.0, 0.0);
        input.interact = true;
        ticks(&mut player, &mut input, 1);
        assert_eq!(player.mount(), Mount::Driving);
        assert!(!input.interact, "interact consumed by the mount");
    }

    #[test]
    fn test_magnet_pulls_walker_toward_car() {
        let mut player = Player::new(Vec2::ZERO, &cfg());
        player.car.pos = Vec2::new(200.0, 0.0);
        let mut input = Input {
            interact: true,
            ..Input::default()
        };
        ticks(&mut player, &mut input, 30);
        assert!(player.on_foot());
        assert!(player.walker.pos.x > 0.0, "drawn toward the car");
    }

    #[test]
    fn test_car_drives_and_dismount_needs_low_speed() {
        let mut player = Player::new(Vec2::ZERO, &cfg());
        let mut input = Input {
            interact: true,
            ..Input::default()
        };
        ticks(&mut player, &mut input, 1);
        assert_eq!(player.mount(), Mount::Driving);

        input.up = true;
        ticks(&mut player, &mut input, 120);
        assert!(player.car.speed() > cfg().dismount_speed);
        assert!(player.car.pos.distance(Vec2::ZERO) > 100.0);

        // Trying to bail at speed does nothing.
        input.interact = true;
        ticks(&mut player, &mut input, 1);
        assert_eq!(player.mount(), Mount::Driving);
        input.interact = false;

        // Roll to a stop, then dismount sticks.
        input.up = false;
        input.handbrake = true;
        ticks(&mut player, &mut input, 300);
        input.interact = true;
        ticks(&mut player, &mut input, 1);
        assert_eq!(player.mount(), Mount::OnFoot);
        assert_eq!(player.walker.pos, player.car.pos);
    }

    #[test]
    fn test_car_speed_is_capped_under_power() {
        let mut player = Player::new(Vec2::ZERO, &cfg());
        let mut input = Input {
            interact: true,
            ..Input::default()
        };
        ticks(&mut player, &mut input, 1);
        input.up = true;
        ticks(&mut player, &mut input, 600);
        assert!(player.car.speed() <= cfg().car_top_speed + 1e-2);
    }

    #[test]
    fn test_handbrake_decouples_velocity_from_steering() {
        let mut player = Player::new(Vec2::ZERO, &cfg());
        let mut input = Input {
            interact: true,
            ..Input::default()
        };
        ticks(&mut player, &mut input, 1);
        input.up = true;
        ticks(&mut player, &mut input, 120);

        input.up = false;
        input.left = true;
        input.handbrake = true;
        let before = player.car.vel.normalized_or_zero();
        ticks(&mut player, &mut input, 10);
        let after = player.car.vel.normalized_or_zero();
        // Chassis turned, velocity direction did not.
        assert!(before.dot(after) > 0.9999);
        assert!(player.car.dir.dot(after) < 0.999);
    }

    #[test]
    fn test_damage_divisor_and_death() {
        let mut player = Player::new(Vec2::ZERO, &cfg());
        let taken = player.apply_damage(30, 0.0, &cfg());
        assert_eq!(taken, 30);
        assert_eq!(player.health(), 70);

        // Protection halves the damage at divisor 2.
        let taken = player.apply_damage(30, 1.0, &cfg());
        assert_eq!(taken, 15);
        assert_eq!(player.health(), 55);

        player.apply_damage(1000, 0.0, &cfg());
        assert!(player.is_dead());
        assert_eq!(player.health(), 0, "clamped at zero");

        // Death is one-way: no healing, no further damage accounting.
        player.heal(50, &cfg());
        assert!(player.is_dead());
        assert_eq!(player.apply_damage(10, 0.0, &cfg()), 0);
    }

    #[test]
    fn test_death_timer_advances_only_after_death() {
        let mut player = Player::new(Vec2::ZERO, &cfg());
        let mut input = Input::default();
        ticks(&mut player, &mut input, 60);
        assert_eq!(player.death_elapsed(), 0.0);

        player.apply_damage(1000, 0.0, &cfg());
        ticks(&mut player, &mut input, 60);
        assert!((player.death_elapsed() - 1.0).abs() < 1e-3);
    }

    #[test]
    fn test_heal_clamps_at_max() {
        let mut player = Player::new(Vec2::ZERO, &cfg());
        player.apply_damage(10, 0.0, &cfg());
        player.heal(500, &cfg());
        assert_eq!(player.health(), cfg().max_health);
    }
}
