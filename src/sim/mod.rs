//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (factions by id, projectiles by slot, bodies by id)
//! - Despawns deferred to the end of the tick

pub mod bounds;
pub mod combat;
pub mod pool;
pub mod spawn;
pub mod state;
pub mod tick;

pub use bounds::{Bounds, rebound, reflect_velocity};
pub use combat::{ContactOutcome, outranks, resolve_contact};
pub use pool::{ProjectileId, ProjectilePool};
pub use spawn::Reward;
pub use state::{
    AreaBody, AreaBodyId, Combatant, Despawn, EntityRef, Faction, FactionId, FactionStatus,
    Projectile, SimulationContext, TieBreakId,
};
pub use tick::{PaintOutcome, TickInput, TickReport, paint_with_cost, tick};
