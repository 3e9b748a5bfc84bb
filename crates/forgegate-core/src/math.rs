//! Fixed-point world-space geometry.
//!
//! Everything here is deterministic: square roots go through an integer
//! Newton step on the raw bits and angles use a polynomial arctangent
//! approximation, so the same inputs give the same bits on every platform.
//! Angles are in degrees, matching the turret rotation-speed units.

use serde::{Serialize, Deserialize};

use crate::fixed::Fixed64;

/// A 2D point or vector in world space (fixed-point).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Vec2Fixed {
    pub x: Fixed64,
    pub y: Fixed64,
}

/// World-space position. Alias kept separate from vectors for readability.
pub type WorldPos = Vec2Fixed;

impl Vec2Fixed {
    pub const ZERO: Vec2Fixed = Vec2Fixed {
        x: Fixed64::ZERO,
        y: Fixed64::ZERO,
    };

    pub fn new(x: Fixed64, y: Fixed64) -> Self {
        Vec2Fixed { x, y }
    }

    pub fn add(self, other: Vec2Fixed) -> Vec2Fixed {
        Vec2Fixed::new(self.x + other.x, self.y + other.y)
    }

    pub fn sub(self, other: Vec2Fixed) -> Vec2Fixed {
        Vec2Fixed::new(self.x - other.x, self.y - other.y)
    }

    pub fn scale(self, s: Fixed64) -> Vec2Fixed {
        Vec2Fixed::new(self.x * s, self.y * s)
    }

    /// Squared Euclidean distance. Prefer this for comparisons; it avoids
    /// the square root entirely.
    pub fn distance_sq(self, other: Vec2Fixed) -> Fixed64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    pub fn distance(self, other: Vec2Fixed) -> Fixed64 {
        sqrt_fixed(self.distance_sq(other))
    }

    pub fn length(self) -> Fixed64 {
        sqrt_fixed(self.x * self.x + self.y * self.y)
    }
}

/// Deterministic square root for non-negative Fixed64 values.
///
/// Operates on the raw Q32.32 bits: sqrt(raw / 2^32) = isqrt(raw << 32) / 2^32.
/// Negative inputs clamp to zero.
pub fn sqrt_fixed(v: Fixed64) -> Fixed64 {
    let raw = v.to_bits();
    if raw <= 0 {
        return Fixed64::ZERO;
    }
    let wide = (raw as u128) << 32;
    Fixed64::from_bits(wide.isqrt() as i64)
}

/// Arctangent in degrees for |z| <= 1, polynomial approximation
/// (max error well under the turret aim tolerance).
fn atan_deg(z: Fixed64) -> Fixed64 {
    let abs = z.abs();
    let c45 = Fixed64::from_num(45);
    let c14 = Fixed64::from_num(14.02);
    let c38 = Fixed64::from_num(3.80);
    c45 * z - z * (abs - Fixed64::ONE) * (c14 + c38 * abs)
}

/// Full-quadrant arctangent in degrees, result in (-180, 180].
pub fn atan2_deg(y: Fixed64, x: Fixed64) -> Fixed64 {
    let c90 = Fixed64::from_num(90);
    let c180 = Fixed64::from_num(180);
    if x == Fixed64::ZERO && y == Fixed64::ZERO {
        return Fixed64::ZERO;
    }
    if y.abs() <= x.abs() {
        let base = atan_deg(y / x);
        if x > Fixed64::ZERO {
            base
        } else if y >= Fixed64::ZERO {
            base + c180
        } else {
            base - c180
        }
    } else {
        let base = atan_deg(x / y);
        if y > Fixed64::ZERO { c90 - base } else { -c90 - base }
    }
}

/// Smallest signed difference from `from` to `to`, in (-180, 180].
pub fn delta_angle(from: Fixed64, to: Fixed64) -> Fixed64 {
    let c180 = Fixed64::from_num(180);
    let c360 = Fixed64::from_num(360);
    let mut d = to - from;
    while d > c180 {
        d -= c360;
    }
    while d <= -c180 {
        d += c360;
    }
    d
}

/// Rotate `current` toward `target` by at most `max_delta` degrees.
pub fn move_towards_angle(current: Fixed64, target: Fixed64, max_delta: Fixed64) -> Fixed64 {
    let d = delta_angle(current, target);
    if d.abs() <= max_delta {
        target
    } else if d > Fixed64::ZERO {
        current + max_delta
    } else {
        current - max_delta
    }
}
