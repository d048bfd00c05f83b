//! Simulation entities and the context that owns them
//!
//! Everything the tick mutates lives in [`SimulationContext`]: the map, the
//! projectile pool, area bodies, factions, the tie-break counter and the
//! seeded RNG. It is built once and threaded through every call.

use glam::{IVec2, Vec2};
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::pool::{ProjectileId, ProjectilePool};
use crate::consts::*;
use crate::error::SimError;
use crate::map::{Color, PixelMap};
use crate::mass::Mass;
use crate::raster::CapsuleRasterizer;
use crate::settings::Settings;

/// Index of a faction in the context registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FactionId(pub u32);

impl FactionId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AreaBodyId(pub u32);

/// Spawn order, only used to break exact mass ties
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TieBreakId(pub u64);

/// Reference to any entity that can take part in a contact
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EntityRef {
    Projectile(ProjectileId),
    AreaBody(AreaBodyId),
    Faction(FactionId),
}

/// What the combat rules read to rank two entities
pub trait Combatant {
    fn mass(&self) -> &Mass;
    fn faction(&self) -> FactionId;
    fn tie_break(&self) -> TieBreakId;
}

/// Whether a faction still plays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FactionStatus {
    Active,
    /// Health ran out: parked off-map, no spawning, no contact effects
    Disabled,
}

/// A player-like turret owning a color (a "battery")
#[derive(Debug, Clone)]
pub struct Faction {
    pub id: FactionId,
    pub color: Color,
    pub health: Mass,
    pub ammunition: Mass,
    pub pos: Vec2,
    /// Turret rotation, 0 = up
    pub rotation: f32,
    /// Enemy to track; spins idly when unset
    pub aim_target: Option<Vec2>,
    pub status: FactionStatus,
    pub tie_break: TieBreakId,
}

impl Faction {
    #[inline]
    pub fn is_active(&self) -> bool {
        self.status == FactionStatus::Active
    }

    /// Disable if health has run out; returns true on the transition
    pub fn disable_if_depleted(&mut self) -> bool {
        if self.is_active() && self.health.is_depleted() {
            self.status = FactionStatus::Disabled;
            self.pos = DISABLED_FACTION_POS;
            self.aim_target = None;
            log::info!("Faction {} disabled (health {})", self.id.0, self.health);
            true
        } else {
            false
        }
    }
}

impl Combatant for Faction {
    fn mass(&self) -> &Mass {
        &self.health
    }

    fn faction(&self) -> FactionId {
        self.id
    }

    fn tie_break(&self) -> TieBreakId {
        self.tie_break
    }
}

/// A fast point-like shot painting a capsule along its motion (a "bullet")
#[derive(Debug, Clone)]
pub struct Projectile {
    pub pos: Vec2,
    /// Position at the end of the previous tick
    pub last_pos: Vec2,
    pub vel: Vec2,
    pub mass: Mass,
    pub faction: FactionId,
    pub tie_break: TieBreakId,
    /// False once despawn is pending; the slot is released at end of tick
    pub active: bool,
}

impl Default for Projectile {
    fn default() -> Self {
        Self {
            pos: Vec2::ZERO,
            last_pos: Vec2::ZERO,
            vel: Vec2::ZERO,
            mass: Mass::zero(),
            faction: FactionId(0),
            tie_break: TieBreakId(0),
            active: false,
        }
    }
}

impl Projectile {
    /// Reinitialise a pooled instance for a new shot
    pub fn reset(
        &mut self,
        pos: Vec2,
        vel: Vec2,
        mass: Mass,
        faction: FactionId,
        tie_break: TieBreakId,
    ) {
        self.pos = pos;
        self.last_pos = pos;
        self.vel = vel;
        self.mass = mass;
        self.faction = faction;
        self.tie_break = tie_break;
        self.active = true;
    }
}

impl Combatant for Projectile {
    fn mass(&self) -> &Mass {
        &self.mass
    }

    fn faction(&self) -> FactionId {
        self.faction
    }

    fn tie_break(&self) -> TieBreakId {
        self.tie_break
    }
}

/// A large slow body painting a disc that grows and shrinks with its mass
#[derive(Debug, Clone)]
pub struct AreaBody {
    pub id: AreaBodyId,
    pub pos: Vec2,
    pub vel: Vec2,
    pub mass: Mass,
    pub faction: FactionId,
    pub tie_break: TieBreakId,
}

impl AreaBody {
    /// Visual scale, clamped; the stored mass is never clamped
    pub fn scale(&self) -> f32 {
        let raw = (self.mass.to_f64() / AREA_BODY_SCALE_DIVISOR) as f32;
        if raw.is_nan() {
            return AREA_BODY_MIN_SCALE;
        }
        raw.clamp(AREA_BODY_MIN_SCALE, AREA_BODY_MAX_SCALE)
    }

    /// Paint radius in pixels
    pub fn radius(&self) -> f32 {
        AREA_BODY_BASE_RADIUS * self.scale()
    }
}

impl Combatant for AreaBody {
    fn mass(&self) -> &Mass {
        &self.mass
    }

    fn faction(&self) -> FactionId {
        self.faction
    }

    fn tie_break(&self) -> TieBreakId {
        self.tie_break
    }
}

/// Entity removal collected during a tick and applied at its end
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Despawn {
    Projectile(ProjectileId),
    AreaBody(AreaBodyId),
}

/// All mutable simulation state
#[derive(Debug)]
pub struct SimulationContext {
    pub settings: Settings,
    pub map: PixelMap,
    pub projectiles: ProjectilePool,
    /// Sorted by id for deterministic iteration
    pub area_bodies: Vec<AreaBody>,
    /// Indexed by `FactionId`; factions are disabled, never removed
    pub factions: Vec<Faction>,
    /// Simulation tick counter
    pub time_ticks: u64,
    pub(crate) rng: Pcg32,
    pub(crate) contacts: Vec<(EntityRef, EntityRef)>,
    pub(crate) pending_despawns: Vec<Despawn>,
    pub(crate) rasterizer: CapsuleRasterizer,
    /// Shape buffer reused by every entity each tick
    pub(crate) scratch: Vec<IVec2>,
    next_tie_break: u64,
    next_body_id: u32,
}

impl SimulationContext {
    /// Build the context; fails only on invalid settings
    pub fn new(settings: Settings) -> Result<Self, SimError> {
        settings.validate()?;
        let map = PixelMap::new(settings.map_width, settings.map_height)?;
        log::info!(
            "Simulation context: map {}x{}, flush budget {}, seed {}",
            settings.map_width,
            settings.map_height,
            settings.flush_budget,
            settings.seed
        );
        Ok(Self {
            rng: Pcg32::seed_from_u64(settings.seed),
            settings,
            map,
            projectiles: ProjectilePool::new(),
            area_bodies: Vec::new(),
            factions: Vec::new(),
            time_ticks: 0,
            contacts: Vec::new(),
            pending_despawns: Vec::new(),
            rasterizer: CapsuleRasterizer::new(),
            scratch: Vec::new(),
            next_tie_break: 1,
            next_body_id: 1,
        })
    }

    /// Draw the next tie-break value
    pub fn next_tie_break(&mut self) -> TieBreakId {
        let id = self.next_tie_break;
        self.next_tie_break += 1;
        TieBreakId(id)
    }

    pub(crate) fn next_area_body_id(&mut self) -> AreaBodyId {
        let id = self.next_body_id;
        self.next_body_id += 1;
        AreaBodyId(id)
    }

    /// Register a faction with the configured starting health and ammunition
    pub fn add_faction(&mut self, color: Color, pos: Vec2) -> FactionId {
        let id = FactionId(self.factions.len() as u32);
        let tie_break = self.next_tie_break();
        self.factions.push(Faction {
            id,
            color,
            health: Mass::new(self.settings.faction.health),
            ammunition: Mass::new(self.settings.faction.ammunition),
            pos,
            rotation: 0.0,
            aim_target: None,
            status: FactionStatus::Active,
            tie_break,
        });
        id
    }

    /// Non-owning lookup; a missing faction means its entities are orphaned
    pub fn faction(&self, id: FactionId) -> Option<&Faction> {
        self.factions.get(id.index())
    }

    pub fn faction_mut(&mut self, id: FactionId) -> Option<&mut Faction> {
        self.factions.get_mut(id.index())
    }

    pub fn area_body(&self, id: AreaBodyId) -> Option<&AreaBody> {
        let i = area_body_index(&self.area_bodies, id)?;
        Some(&self.area_bodies[i])
    }

    pub fn area_body_mut(&mut self, id: AreaBodyId) -> Option<&mut AreaBody> {
        let i = area_body_index(&self.area_bodies, id)?;
        Some(&mut self.area_bodies[i])
    }

    /// Physics callback: two entities overlap this tick
    ///
    /// Reports are buffered and resolved at the start of the next tick;
    /// repeated reports of the same pair resolve once.
    pub fn on_overlap(&mut self, a: EntityRef, b: EntityRef) {
        if a != b {
            self.contacts.push((a, b));
        }
    }

    /// Queue every point of a shape in `color`
    pub fn paint_shape(&mut self, points: &[IVec2], color: Color) {
        for p in points {
            self.map.request_paint(p.x, p.y, color);
        }
    }

    /// Owner of a pixel as of the last flush
    #[inline]
    pub fn query_color(&self, x: i32, y: i32) -> Color {
        self.map.read(x, y)
    }

    /// Pixels currently owned by a faction
    pub fn territory(&self, id: FactionId) -> usize {
        self.faction(id)
            .map(|f| self.map.count_color(f.color))
            .unwrap_or(0)
    }

    /// Ensure area bodies are sorted by ID for deterministic iteration
    pub fn normalize_order(&mut self) {
        self.area_bodies.sort_by_key(|b| b.id);
    }

    /// Drop all idle projectiles (teardown)
    pub fn shutdown(&mut self) -> usize {
        let drained = self.projectiles.drain();
        log::info!("Simulation shutdown: {} pooled projectiles released", drained);
        drained
    }
}

pub(crate) fn area_body_index(bodies: &[AreaBody], id: AreaBodyId) -> Option<usize> {
    bodies.binary_search_by_key(&id, |b| b.id).ok()
}

/// Two distinct elements of a slice at once
pub(crate) fn pair_mut<T>(items: &mut [T], i: usize, j: usize) -> Option<(&mut T, &mut T)> {
    if i == j || i.max(j) >= items.len() {
        return None;
    }
    if i < j {
        let (head, tail) = items.split_at_mut(j);
        Some((&mut head[i], &mut tail[0]))
    } else {
        let (head, tail) = items.split_at_mut(i);
        Some((&mut tail[0], &mut head[j]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(mass: i64) -> AreaBody {
        AreaBody {
            id: AreaBodyId(1),
            pos: Vec2::ZERO,
            vel: Vec2::ZERO,
            mass: Mass::new(mass),
            faction: FactionId(0),
            tie_break: TieBreakId(1),
        }
    }

    #[test]
    fn test_area_body_radius_clamped() {
        assert_eq!(body(0).scale(), AREA_BODY_MIN_SCALE);
        assert_eq!(body(-400).radius(), 24.0);
        assert_eq!(body(500_000).scale(), 10.0);
        assert_eq!(body(i64::MAX).radius(), 200.0);

        // Astronomical mass only saturates the visual, not the value
        let mut huge = body(1);
        for _ in 0..200 {
            huge.mass = huge.mass.scaled(8);
        }
        assert_eq!(huge.scale(), AREA_BODY_MAX_SCALE);
        assert!(huge.mass > Mass::from(u64::MAX));
    }

    #[test]
    fn test_context_rejects_bad_settings() {
        let settings = Settings {
            map_width: 0,
            ..Settings::default()
        };
        assert!(SimulationContext::new(settings).is_err());
    }

    #[test]
    fn test_tie_breaks_are_monotonic() {
        let mut ctx = SimulationContext::new(Settings::default()).expect("default settings");
        let f = ctx.add_faction(Color::rgb(255, 0, 0), Vec2::ZERO);
        let a = ctx.next_tie_break();
        let b = ctx.next_tie_break();
        assert!(ctx.faction(f).expect("registered").tie_break < a);
        assert!(a < b);
    }

    #[test]
    fn test_faction_disable_parks_once() {
        let mut ctx = SimulationContext::new(Settings::default()).expect("default settings");
        let id = ctx.add_faction(Color::rgb(0, 255, 0), Vec2::new(10.0, 10.0));
        let faction = ctx.faction_mut(id).expect("registered");
        assert!(!faction.disable_if_depleted());

        faction.health = Mass::new(-3);
        assert!(faction.disable_if_depleted());
        assert!(!faction.disable_if_depleted());
        assert_eq!(faction.pos, DISABLED_FACTION_POS);
        assert!(!faction.is_active());
    }

    #[test]
    fn test_overlap_ignores_self_contact() {
        let mut ctx = SimulationContext::new(Settings::default()).expect("default settings");
        let e = EntityRef::Faction(FactionId(0));
        ctx.on_overlap(e, e);
        assert!(ctx.contacts.is_empty());
    }

    #[test]
    fn test_paint_shape_and_query() {
        let mut ctx = SimulationContext::new(Settings::default()).expect("default settings");
        let red = Color::rgb(255, 0, 0);
        ctx.paint_shape(&[IVec2::new(1, 1), IVec2::new(-1, 1)], red);
        assert_eq!(ctx.map.pending(), 1);
        ctx.map.flush(10);
        assert_eq!(ctx.query_color(1, 1), red);
        assert_eq!(ctx.query_color(-1, 1), Color::UNSET);
    }

    #[test]
    fn test_pair_mut() {
        let mut v = vec![1, 2, 3];
        let (a, b) = pair_mut(&mut v, 2, 0).expect("distinct");
        std::mem::swap(a, b);
        assert_eq!(v, vec![3, 2, 1]);
        assert!(pair_mut(&mut v, 1, 1).is_none());
        assert!(pair_mut(&mut v, 1, 3).is_none());
    }
}
