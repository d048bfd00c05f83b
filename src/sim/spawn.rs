//! Faction spawn path: turret fire and reward actions

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::pool::ProjectileId;
use super::state::{AreaBody, AreaBodyId, FactionId, SimulationContext};
use crate::consts::*;
use crate::direction_from_rotation;
use crate::mass::Mass;
use crate::rotation_toward;

/// Reward granted to a faction, carrying its value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Reward {
    /// Extra rounds for the turret
    Ammunition(Mass),
    /// Health, ten per unit of value
    Health(Mass),
    /// A new area body worth a hundred per unit of value
    AreaBody(Mass),
    /// Fan of heavy pellets around the turret heading
    Scatter(Mass),
    /// Tight column of pellets straight down the turret heading
    Snipe(Mass),
}

impl Reward {
    pub fn value(&self) -> &Mass {
        match self {
            Reward::Ammunition(v)
            | Reward::Health(v)
            | Reward::AreaBody(v)
            | Reward::Scatter(v)
            | Reward::Snipe(v) => v,
        }
    }
}

/// Pellets in a burst of `value`
pub fn pellet_count(value: &Mass) -> u32 {
    if *value > Mass::from(PELLET_MAX_COUNT as i64) {
        PELLET_MAX_COUNT
    } else {
        value.to_u64().unwrap_or(0) as u32
    }
}

/// Mass of each pellet in a burst of `value`
///
/// Small bursts use the fixed `base`; past the count cap the surplus value
/// feeds the pellets instead.
pub fn pellet_mass(value: &Mass, base: i64) -> Mass {
    let cap = Mass::from(PELLET_MAX_COUNT as i64);
    if *value > cap {
        let surplus = (value - &cap).divided(20);
        &Mass::new(100) + &surplus
    } else {
        Mass::new(base)
    }
}

impl SimulationContext {
    /// Launch one projectile from the pool
    pub fn spawn_projectile(
        &mut self,
        faction: FactionId,
        pos: Vec2,
        vel: Vec2,
        mass: Mass,
    ) -> ProjectileId {
        let id = self.projectiles.acquire();
        let tie_break = self.next_tie_break();
        if let Some(projectile) = self.projectiles.get_mut(id) {
            projectile.reset(pos, vel, mass, faction, tie_break);
        }
        id
    }

    /// Add an area body; ids only grow, so the list stays sorted
    pub fn spawn_area_body(
        &mut self,
        faction: FactionId,
        pos: Vec2,
        vel: Vec2,
        mass: Mass,
    ) -> AreaBodyId {
        let id = self.next_area_body_id();
        let tie_break = self.next_tie_break();
        self.area_bodies.push(AreaBody {
            id,
            pos,
            vel,
            mass,
            faction,
            tie_break,
        });
        log::debug!("Area body {} spawned for faction {}", id.0, faction.0);
        id
    }

    /// Apply a reward to a faction; disabled or unknown factions get nothing
    pub fn apply_reward(&mut self, faction: FactionId, reward: Reward) -> bool {
        let Some(f) = self.faction(faction).filter(|f| f.is_active()) else {
            log::debug!("Reward for inactive faction {} dropped", faction.0);
            return false;
        };
        let (pos, rotation) = (f.pos, f.rotation);
        let value = reward.value().clone().capped(&Mass::new(REWARD_VALUE_CEILING));

        match reward {
            Reward::Ammunition(_) => {
                if let Some(f) = self.faction_mut(faction) {
                    f.ammunition += &value;
                }
            }
            Reward::Health(_) => {
                if let Some(f) = self.faction_mut(faction) {
                    f.health += &value.scaled(HEALTH_VALUE_MULTIPLIER);
                }
            }
            Reward::AreaBody(_) => {
                let vel = Vec2::new(
                    self.rng.random_range(-AREA_BODY_MAX_SPAWN_SPEED..=AREA_BODY_MAX_SPAWN_SPEED),
                    self.rng.random_range(-AREA_BODY_MAX_SPAWN_SPEED..=AREA_BODY_MAX_SPAWN_SPEED),
                );
                self.spawn_area_body(faction, pos, vel, value.scaled(AREA_BODY_VALUE_MULTIPLIER));
            }
            Reward::Scatter(_) => {
                let mass = pellet_mass(&value, 200);
                for _ in 0..pellet_count(&value) {
                    let spread = self.rng.random_range(-SCATTER_SPREAD..=SCATTER_SPREAD);
                    let vel = direction_from_rotation(rotation + spread) * PELLET_SPEED;
                    self.spawn_projectile(faction, pos, vel, mass.clone());
                }
            }
            Reward::Snipe(_) => {
                let mass = pellet_mass(&value, 100);
                let vel = direction_from_rotation(rotation) * PELLET_SPEED;
                for _ in 0..pellet_count(&value) {
                    let jitter = Vec2::new(
                        self.rng.random_range(-SNIPE_JITTER..=SNIPE_JITTER),
                        self.rng.random_range(-SNIPE_JITTER..=SNIPE_JITTER),
                    );
                    self.spawn_projectile(faction, pos + jitter, vel, mass.clone());
                }
            }
        }
        true
    }

    /// Turret fire for every active faction; returns shots fired
    ///
    /// Each shot costs one round and turns the turret first: toward the aim
    /// target when one is set, otherwise an idle spin.
    pub(crate) fn fire_factions(&mut self, dt: f32) -> usize {
        let shots_per_tick = self.settings.faction.shots_per_tick;
        let dispersion = self.settings.faction.dispersion;
        let spin_rate = self.settings.faction.spin_rate;
        let speed = self.settings.projectile.speed;
        let mass = Mass::new(self.settings.projectile.mass);

        let mut fired = 0;
        for i in 0..self.factions.len() {
            for _ in 0..shots_per_tick {
                let faction = &mut self.factions[i];
                if !faction.is_active() || faction.ammunition.is_depleted() {
                    break;
                }
                faction.ammunition.decrement();
                faction.rotation = match faction.aim_target {
                    Some(target) => rotation_toward(faction.pos, target),
                    None => faction.rotation + dt * spin_rate,
                };
                let (id, pos, rotation) = (faction.id, faction.pos, faction.rotation);

                let spread = if dispersion > 0.0 {
                    self.rng.random_range(-dispersion..=dispersion)
                } else {
                    0.0
                };
                let vel = direction_from_rotation(rotation + spread) * speed;
                self.spawn_projectile(id, pos, vel, mass.clone());
                fired += 1;
            }
        }
        fired
    }
}
