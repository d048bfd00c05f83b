//! Pixel Territory - simulation core of a territory-painting arcade game
//!
//! Core modules:
//! - `mass`: Unbounded integer mass (health, ammunition, value)
//! - `map`: Shared pixel-ownership raster with a rate-limited write queue
//! - `raster`: Disc and capsule rasterization onto the integer lattice
//! - `sim`: Deterministic simulation (pool, combat, spawning, tick)
//! - `settings`: Data-driven simulation configuration

pub mod error;
pub mod map;
pub mod mass;
pub mod raster;
pub mod settings;
pub mod sim;

pub use error::SimError;
pub use map::{Color, PixelMap};
pub use mass::Mass;
pub use settings::{Settings, ThroughputPreset};

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    use glam::Vec2;

    /// Fixed simulation timestep (60 Hz physics frames)
    pub const SIM_DT: f32 = 1.0 / 60.0;

    /// Default map dimensions
    pub const MAP_WIDTH: u32 = 256;
    pub const MAP_HEIGHT: u32 = 256;
    /// Pixel writes applied per tick
    pub const FLUSH_BUDGET: usize = 1000;
    /// Ticks between boundary checks
    pub const BOUNDARY_CHECK_INTERVAL: u64 = 10;

    /// Projectile defaults
    pub const PROJECTILE_RADIUS: f32 = 6.0;
    pub const PROJECTILE_SPEED: f32 = 400.0;
    pub const PROJECTILE_MASS: i64 = 1000;
    /// Pellet bursts (scatter / snipe rewards)
    pub const PELLET_SPEED: f32 = 600.0;
    pub const PELLET_MAX_COUNT: u32 = 100;
    pub const SCATTER_SPREAD: f32 = 0.15;
    pub const SNIPE_JITTER: f32 = 4.0;

    /// Faction defaults
    pub const FACTION_HEALTH: i64 = 1_000_000;
    pub const FACTION_AMMUNITION: i64 = 5000;
    pub const SHOTS_PER_TICK: u32 = 3;
    pub const FIRE_DISPERSION: f32 = 0.1;
    /// Idle turret spin (radians per second)
    pub const IDLE_SPIN_RATE: f32 = 2.0;
    /// Where a defeated faction is parked, far outside any map
    pub const DISABLED_FACTION_POS: Vec2 = Vec2::new(114_514.0, 114_514.0);

    /// Area body visual scale: mass / divisor, clamped
    pub const AREA_BODY_SCALE_DIVISOR: f64 = 50_000.0;
    pub const AREA_BODY_MIN_SCALE: f32 = 3.0;
    pub const AREA_BODY_MAX_SCALE: f32 = 25.0;
    pub const AREA_BODY_BASE_RADIUS: f32 = 8.0;
    pub const AREA_BODY_MAX_SPAWN_SPEED: f32 = 100.0;

    /// Reward multipliers
    pub const AREA_BODY_VALUE_MULTIPLIER: u32 = 100;
    pub const HEALTH_VALUE_MULTIPLIER: u32 = 10;
    /// Reward values are clamped to this when they are created
    pub const REWARD_VALUE_CEILING: i64 = 9_999_999_999;
}

/// Unit firing direction for a turret rotation.
///
/// Rotation 0 points up the screen (negative y), growing clockwise.
#[inline]
pub fn direction_from_rotation(rotation: f32) -> Vec2 {
    Vec2::new(rotation.sin(), -rotation.cos())
}

/// Turret rotation that makes [`direction_from_rotation`] point from `from` to `to`
#[inline]
pub fn rotation_toward(from: Vec2, to: Vec2) -> f32 {
    let delta = to - from;
    delta.y.atan2(delta.x) + std::f32::consts::FRAC_PI_2
}

/// Round a world position to its pixel
#[inline]
pub fn to_pixel(pos: Vec2) -> glam::IVec2 {
    pos.round().as_ivec2()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rotation_roundtrip() {
        let from = Vec2::new(10.0, 10.0);
        let to = Vec2::new(40.0, -30.0);
        let dir = direction_from_rotation(rotation_toward(from, to));
        let expected = (to - from).normalize();
        assert!((dir - expected).length() < 1e-5);
    }

    #[test]
    fn test_zero_rotation_points_up() {
        let dir = direction_from_rotation(0.0);
        assert!(dir.x.abs() < 1e-6);
        assert!((dir.y + 1.0).abs() < 1e-6);
    }
}
