//! Play-area boundary rebound

use glam::Vec2;

/// Axis-aligned playable rectangle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: Vec2,
    pub max: Vec2,
}

impl Bounds {
    /// Rectangle covering a `width` x `height` map
    pub fn from_size(width: u32, height: u32) -> Self {
        Self {
            min: Vec2::ZERO,
            max: Vec2::new(width as f32, height as f32),
        }
    }

    #[inline]
    pub fn contains(&self, pos: Vec2) -> bool {
        pos.x >= self.min.x && pos.y >= self.min.y && pos.x < self.max.x && pos.y < self.max.y
    }
}

/// Standard reflection: v' = v - 2(v·n)n
#[inline]
pub fn reflect_velocity(velocity: Vec2, normal: Vec2) -> Vec2 {
    velocity - 2.0 * velocity.dot(normal) * normal
}

/// Bounce off any edge that was reached or crossed
///
/// Velocity is reflected only while it still points outward, so a body
/// sitting on the edge is not flipped back and forth. Position is clamped
/// into the rectangle. Returns true if any edge was hit.
pub fn rebound(pos: &mut Vec2, vel: &mut Vec2, bounds: &Bounds) -> bool {
    let mut hit = false;
    // (reached, inward normal)
    let edges = [
        (pos.x <= bounds.min.x, Vec2::X),
        (pos.x >= bounds.max.x, Vec2::NEG_X),
        (pos.y <= bounds.min.y, Vec2::Y),
        (pos.y >= bounds.max.y, Vec2::NEG_Y),
    ];
    for (reached, normal) in edges {
        if !reached {
            continue;
        }
        hit = true;
        if vel.dot(normal) < 0.0 {
            *vel = reflect_velocity(*vel, normal);
        }
    }
    if hit {
        *pos = pos.clamp(bounds.min, bounds.max);
    }
    hit
}
