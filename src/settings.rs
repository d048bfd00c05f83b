//! Simulation settings
//!
//! Loaded from JSON; any field left out falls back to the game defaults.

use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::SimError;

/// Pixel-write throughput presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ThroughputPreset {
    Low,
    #[default]
    Medium,
    High,
}

impl ThroughputPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            ThroughputPreset::Low => "Low",
            ThroughputPreset::Medium => "Medium",
            ThroughputPreset::High => "High",
        }
    }

    /// Pixel writes flushed per tick for this preset
    pub fn flush_budget(&self) -> usize {
        match self {
            ThroughputPreset::Low => FLUSH_BUDGET / 4,
            ThroughputPreset::Medium => FLUSH_BUDGET,
            ThroughputPreset::High => FLUSH_BUDGET * 4,
        }
    }
}

impl FromStr for ThroughputPreset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(ThroughputPreset::Low),
            "medium" | "med" => Ok(ThroughputPreset::Medium),
            "high" => Ok(ThroughputPreset::High),
            other => Err(format!("unknown throughput preset '{other}'")),
        }
    }
}

/// Per-faction starting values and turret behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FactionSettings {
    pub health: i64,
    pub ammunition: i64,
    /// Shots fired per tick while ammunition lasts
    pub shots_per_tick: u32,
    /// Random spread applied to each shot (radians, +-)
    pub dispersion: f32,
    /// Idle turret spin (radians per second)
    pub spin_rate: f32,
}

impl Default for FactionSettings {
    fn default() -> Self {
        Self {
            health: FACTION_HEALTH,
            ammunition: FACTION_AMMUNITION,
            shots_per_tick: SHOTS_PER_TICK,
            dispersion: FIRE_DISPERSION,
            spin_rate: IDLE_SPIN_RATE,
        }
    }
}

/// Regular shot parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectileSettings {
    /// Capsule radius in pixels
    pub radius: f32,
    pub speed: f32,
    pub mass: i64,
}

impl Default for ProjectileSettings {
    fn default() -> Self {
        Self {
            radius: PROJECTILE_RADIUS,
            speed: PROJECTILE_SPEED,
            mass: PROJECTILE_MASS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub map_width: u32,
    pub map_height: u32,
    /// Pixel writes applied per tick
    pub flush_budget: usize,
    /// RNG seed for reproducible runs
    pub seed: u64,
    /// Ticks between boundary rebound checks
    pub boundary_check_interval: u64,
    pub faction: FactionSettings,
    pub projectile: ProjectileSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            map_width: MAP_WIDTH,
            map_height: MAP_HEIGHT,
            flush_budget: FLUSH_BUDGET,
            seed: 0,
            boundary_check_interval: BOUNDARY_CHECK_INTERVAL,
            faction: FactionSettings::default(),
            projectile: ProjectileSettings::default(),
        }
    }
}

impl Settings {
    /// Create settings from a throughput preset
    pub fn from_preset(preset: ThroughputPreset) -> Self {
        let mut settings = Self::default();
        settings.apply_preset(preset);
        settings
    }

    /// Apply a throughput preset
    ///
    /// The preset only picks a flush budget; the budget is the one stored
    /// knob, so a settings file can still set any value directly.
    pub fn apply_preset(&mut self, preset: ThroughputPreset) {
        self.flush_budget = preset.flush_budget();
        log::info!(
            "Throughput preset {}: flushing {} writes per tick",
            preset.as_str(),
            self.flush_budget
        );
    }

    /// Reject settings the simulation cannot be built from
    pub fn validate(&self) -> Result<(), SimError> {
        if self.map_width == 0 || self.map_height == 0 {
            return Err(SimError::InvalidDimensions {
                width: self.map_width,
                height: self.map_height,
            });
        }
        if self.flush_budget == 0 {
            return Err(SimError::InvalidFlushBudget);
        }
        Ok(())
    }

    /// Parse and validate settings from JSON
    pub fn from_json(json: &str) -> Result<Self, SimError> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SimError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let settings = Self::from_json(&json)?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }
}
