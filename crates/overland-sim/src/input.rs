//! Input intents and the 2D vector type used throughout the simulation.
//!
//! The presentation layer translates raw keyboard/mouse state into an
//! [`Input`] each frame; the simulation never sees key codes.

use serde::{Deserialize, Serialize};

/// 2D vector for positions, velocities and directions (world pixels).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    /// X component
    pub x: f32,
    /// Y component
    pub y: f32,
}

impl Vec2 {
    /// Zero vector.
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    /// Unit vector pointing along +X.
    pub const X: Self = Self { x: 1.0, y: 0.0 };

    /// Unit vector pointing along +Y.
    pub const Y: Self = Self { x: 0.0, y: 1.0 };

    /// Creates a new Vec2.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Returns the length (magnitude) of the vector.
    #[must_use]
    pub fn length(self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    /// Returns a normalized version of the vector, or `None` for a
    /// degenerate (zero-length) input.
    ///
    /// Callers decide what "no direction" means for them — usually "no
    /// movement this tick".
    #[must_use]
    pub fn try_normalized(self) -> Option<Self> {
        let len = self.length();
        if len > f32::EPSILON {
            Some(Self {
                x: self.x / len,
                y: self.y / len,
            })
        } else {
            None
        }
    }

    /// Returns a normalized version of the vector, or zero if degenerate.
    #[must_use]
    pub fn normalized_or_zero(self) -> Self {
        self.try_normalized().unwrap_or(Self::ZERO)
    }

    /// Dot product of two vectors.
    #[must_use]
    pub fn dot(self, other: Self) -> f32 {
        self.x * other.x + self.y * other.y
    }

    /// Distance between two points.
    #[must_use]
    pub fn distance(self, other: Self) -> f32 {
        (self - other).length()
    }

    /// Rotates the vector by `angle` radians (counterclockwise).
    #[must_use]
    pub fn rotated(self, angle: f32) -> Self {
        let (sin, cos) = angle.sin_cos();
        Self {
            x: cos * self.x - sin * self.y,
            y: sin * self.x + cos * self.y,
        }
    }

    /// Heading angle in radians (`atan2(y, x)`).
    #[must_use]
    pub fn heading(self) -> f32 {
        self.y.atan2(self.x)
    }

    /// Clamps the vector's length to `max`, preserving direction.
    #[must_use]
    pub fn clamped_length(self, max: f32) -> Self {
        let len = self.length();
        if len > max && len > f32::EPSILON {
            self * (max / len)
        } else {
            self
        }
    }
}

impl std::ops::Add for Vec2 {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self {
            x: self.x + other.x,
            y: self.y + other.y,
        }
    }
}

impl std::ops::AddAssign for Vec2 {
    fn add_assign(&mut self, other: Self) {
        self.x += other.x;
        self.y += other.y;
    }
}

impl std::ops::Sub for Vec2 {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self {
            x: self.x - other.x,
            y: self.y - other.y,
        }
    }
}

impl std::ops::Mul<f32> for Vec2 {
    type Output = Self;

    fn mul(self, scalar: f32) -> Self {
        Self {
            x: self.x * scalar,
            y: self.y * scalar,
        }
    }
}

impl std::ops::Neg for Vec2 {
    type Output = Self;

    fn neg(self) -> Self {
        Self {
            x: -self.x,
            y: -self.y,
        }
    }
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    /// Minimum corner
    pub min: Vec2,
    /// Maximum corner
    pub max: Vec2,
}

impl Aabb {
    /// Creates a box from its minimum corner and a square side length.
    #[must_use]
    pub fn anchored(min: Vec2, side: f32) -> Self {
        Self {
            min,
            max: Vec2::new(min.x + side, min.y + side),
        }
    }

    /// Point-in-box test (min-inclusive, max-exclusive).
    #[must_use]
    pub fn contains(&self, p: Vec2) -> bool {
        self.min.x <= p.x && p.x < self.max.x && self.min.y <= p.y && p.y < self.max.y
    }
}

/// Per-frame player intent, written by the presentation layer.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Input {
    /// Move/accelerate forward (up)
    pub up: bool,
    /// Move/brake backward (down)
    pub down: bool,
    /// Move/steer left
    pub left: bool,
    /// Move/steer right
    pub right: bool,
    /// Handbrake
    pub handbrake: bool,
    /// Enter/exit vehicle, pick up, talk
    pub interact: bool,
    /// Fire the held weapon
    pub fire: bool,
    /// Reload the held weapon
    pub reload: bool,
    /// Toggle the inventory screen
    pub open_inventory: bool,
    /// Aim direction relative to the avatar (need not be normalized)
    pub aim: Vec2,
    /// Camera override while mouse-dragging
    pub camera_drag: Option<Vec2>,
}

impl Input {
    /// Returns the raw 4-way movement direction implied by the held keys.
    #[must_use]
    pub fn move_dir(&self) -> Vec2 {
        let mut dir = Vec2::ZERO;
        if self.right {
            dir.x += 1.0;
        }
        if self.left {
            dir.x -= 1.0;
        }
        if self.up {
            dir.y += 1.0;
        }
        if self.down {
            dir.y -= 1.0;
        }
        dir
    }

    /// Steering input for the car: positive turns left.
    #[must_use]
    pub fn steer(&self) -> f32 {
        f32::from(u8::from(self.left)) - f32::from(u8::from(self.right))
    }
}
