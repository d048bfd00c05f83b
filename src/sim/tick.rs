//! Fixed timestep simulation tick
//!
//! One call advances the world by `dt`: buffered contacts are resolved,
//! factions act, every surviving projectile and area body paints its shape
//! and pays for the territory it takes, despawns are applied, and the map
//! flushes one bounded batch of writes.

use std::collections::HashSet;

use glam::{IVec2, Vec2};

use super::bounds::{Bounds, rebound};
use super::combat::resolve_contact;
use super::spawn::Reward;
use super::state::{AreaBodyId, Despawn, EntityRef, FactionId, SimulationContext};
use crate::map::{Color, PixelMap};
use crate::mass::Mass;
use crate::raster::points_in_disc;

/// External commands for a single tick (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Rewards earned since the last tick, applied in order
    pub rewards: Vec<(FactionId, Reward)>,
    /// Aim changes; `None` returns a turret to idle spin
    pub aim_targets: Vec<(FactionId, Option<Vec2>)>,
}

/// Summary of what a tick did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Distinct contacts whose rule mutated a mass
    pub contacts_resolved: usize,
    pub shots_fired: usize,
    /// Projectiles returned to the pool
    pub projectiles_released: usize,
    pub area_bodies_removed: usize,
    pub factions_disabled: Vec<FactionId>,
    /// Paint requests accepted into the write queue
    pub pixels_requested: usize,
    /// Writes applied by this tick's flush
    pub pixels_flushed: usize,
}

/// Result of painting one shape
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PaintOutcome {
    /// Pixels queued (each cost one mass)
    pub charged: usize,
    /// Mass ran out; remaining points were skipped
    pub depleted: bool,
}

/// Paint a shape for an entity, charging one mass per pixel it takes over
///
/// Points are sorted and de-duplicated first, so each pixel is paid for at
/// most once and the write order does not depend on how the shape was
/// produced. Pixels already showing `color` and out-of-bounds points are
/// free and not queued.
pub fn paint_with_cost(
    map: &mut PixelMap,
    points: &mut Vec<IVec2>,
    color: Color,
    mass: &mut Mass,
) -> PaintOutcome {
    let mut outcome = PaintOutcome::default();
    if mass.is_depleted() {
        outcome.depleted = true;
        return outcome;
    }

    points.sort_unstable_by_key(|p| (p.y, p.x));
    points.dedup();

    for p in points.iter() {
        if !map.contains(p.x, p.y) || map.read(p.x, p.y) == color {
            continue;
        }
        map.request_paint(p.x, p.y, color);
        mass.decrement();
        outcome.charged += 1;
        if mass.is_depleted() {
            outcome.depleted = true;
            break;
        }
    }
    outcome
}

/// Advance the simulation by one fixed timestep
pub fn tick(ctx: &mut SimulationContext, input: &TickInput, dt: f32) -> TickReport {
    let mut report = TickReport::default();
    ctx.time_ticks += 1;

    // Contacts reported since the last tick, once per unordered pair
    let contacts = std::mem::take(&mut ctx.contacts);
    let mut seen: HashSet<(EntityRef, EntityRef)> = HashSet::with_capacity(contacts.len());
    for (a, b) in contacts {
        if !seen.insert((a.min(b), a.max(b))) {
            continue;
        }
        let outcome = resolve_contact(ctx, a, b);
        if outcome.applied {
            report.contacts_resolved += 1;
        }
        ctx.pending_despawns.extend(outcome.despawns);
        report.factions_disabled.extend(outcome.disabled);
    }

    // Health can also run out outside combat (e.g. edited settings)
    for faction in &mut ctx.factions {
        if faction.disable_if_depleted() {
            report.factions_disabled.push(faction.id);
        }
    }

    for &(id, target) in &input.aim_targets {
        if let Some(faction) = ctx.faction_mut(id).filter(|f| f.is_active()) {
            faction.aim_target = target;
        }
    }
    for (id, reward) in &input.rewards {
        ctx.apply_reward(*id, reward.clone());
    }
    report.shots_fired = ctx.fire_factions(dt);

    let bounds = Bounds::from_size(ctx.map.width(), ctx.map.height());
    let interval = ctx.settings.boundary_check_interval;
    let check_bounds = interval <= 1 || ctx.time_ticks % interval == 0;
    let radius = ctx.settings.projectile.radius;

    // Projectiles, in slot order
    for id in ctx.projectiles.active_ids() {
        let Some(p) = ctx.projectiles.get_mut(id) else {
            continue;
        };
        if !p.active {
            continue;
        }
        let Some(color) = ctx.factions.get(p.faction.index()).map(|f| f.color) else {
            continue;
        };

        p.pos += p.vel * dt;
        ctx.scratch.clear();
        ctx.scratch
            .extend_from_slice(ctx.rasterizer.sweep(p.last_pos, p.pos, radius));
        let paint = paint_with_cost(&mut ctx.map, &mut ctx.scratch, color, &mut p.mass);
        report.pixels_requested += paint.charged;

        if paint.depleted {
            p.active = false;
            ctx.pending_despawns.push(Despawn::Projectile(id));
        } else if check_bounds {
            rebound(&mut p.pos, &mut p.vel, &bounds);
        }
        p.last_pos = p.pos;
    }

    // Area bodies, in id order
    for body in &mut ctx.area_bodies {
        if body.mass.is_depleted() {
            continue;
        }
        let Some(color) = ctx.factions.get(body.faction.index()).map(|f| f.color) else {
            continue;
        };

        body.pos += body.vel * dt;
        ctx.scratch.clear();
        ctx.scratch.extend(points_in_disc(body.pos, body.radius()));
        let paint = paint_with_cost(&mut ctx.map, &mut ctx.scratch, color, &mut body.mass);
        report.pixels_requested += paint.charged;

        if paint.depleted {
            ctx.pending_despawns.push(Despawn::AreaBody(body.id));
        } else if check_bounds {
            rebound(&mut body.pos, &mut body.vel, &bounds);
        }
    }

    // Deferred removals
    let mut removed_bodies: HashSet<AreaBodyId> = HashSet::new();
    for despawn in ctx.pending_despawns.drain(..) {
        match despawn {
            Despawn::Projectile(id) => {
                if ctx.projectiles.release(id) {
                    report.projectiles_released += 1;
                }
            }
            Despawn::AreaBody(id) => {
                removed_bodies.insert(id);
            }
        }
    }
    if !removed_bodies.is_empty() {
        let before = ctx.area_bodies.len();
        ctx.area_bodies.retain(|b| !removed_bodies.contains(&b.id));
        report.area_bodies_removed = before - ctx.area_bodies.len();
    }

    report.pixels_flushed = ctx.map.flush(ctx.settings.flush_budget);
    ctx.normalize_order();

    log::debug!(
        "Tick {}: {} contacts, {} shots, {} queued, {} flushed, {} pending",
        ctx.time_ticks,
        report.contacts_resolved,
        report.shots_fired,
        report.pixels_requested,
        report.pixels_flushed,
        ctx.map.pending()
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::*;
    use crate::settings::Settings;

    const RED: Color = Color::rgb(255, 0, 0);
    const BLUE: Color = Color::rgb(0, 0, 255);

    /// Context whose factions hold no ammunition, so nothing fires on its own
    fn quiet_context(width: u32, height: u32) -> SimulationContext {
        let mut settings = Settings {
            map_width: width,
            map_height: height,
            flush_budget: 100_000,
            ..Settings::default()
        };
        settings.faction.ammunition = 0;
        let mut ctx = SimulationContext::new(settings).expect("valid settings");
        ctx.add_faction(RED, Vec2::new(1.0, 1.0));
        ctx.add_faction(BLUE, Vec2::new(2.0, 2.0));
        ctx
    }

    #[test]
    fn test_disc_end_to_end() {
        let mut ctx = quiet_context(10, 10);
        let center = IVec2::new(5, 5);
        let points: Vec<IVec2> = points_in_disc(center.as_vec2(), 2.0).into_iter().collect();
        ctx.paint_shape(&points, RED);
        while ctx.map.flush(7) > 0 {}

        for x in 0..10 {
            for y in 0..10 {
                let expected = if (IVec2::new(x, y) - center).length_squared() <= 5 {
                    RED
                } else {
                    Color::UNSET
                };
                assert_eq!(ctx.query_color(x, y), expected, "pixel ({x}, {y})");
            }
        }
    }

    #[test]
    fn test_paint_with_cost() {
        let mut map = PixelMap::new(4, 4).expect("valid size");
        map.request_paint(0, 0, RED);
        map.flush(1);

        let mut mass = Mass::new(100);
        let mut points = vec![
            IVec2::new(0, 0),
            IVec2::new(1, 0),
            IVec2::new(1, 0),
            IVec2::new(-1, 0),
            IVec2::new(2, 0),
        ];
        let outcome = paint_with_cost(&mut map, &mut points, RED, &mut mass);
        // Own pixel, duplicate and off-map point are free
        assert_eq!(outcome.charged, 2);
        assert!(!outcome.depleted);
        assert_eq!(mass, Mass::new(98));
        assert_eq!(map.pending(), 2);
    }

    #[test]
    fn test_paint_truncates_at_depletion() {
        let mut map = PixelMap::new(8, 8).expect("valid size");
        let mut mass = Mass::new(3);
        let mut points: Vec<IVec2> = (0..8).map(|x| IVec2::new(x, 0)).collect();
        let outcome = paint_with_cost(&mut map, &mut points, BLUE, &mut mass);
        assert_eq!(outcome.charged, 3);
        assert!(outcome.depleted);
        assert!(mass.is_depleted());
        map.flush(100);
        assert_eq!(map.read(2, 0), BLUE);
        assert_eq!(map.read(3, 0), Color::UNSET);
    }

    #[test]
    fn test_projectile_paints_and_pays() {
        let mut ctx = quiet_context(64, 64);
        let id = ctx.spawn_projectile(
            FactionId(0),
            Vec2::new(20.0, 20.0),
            Vec2::new(600.0, 0.0),
            Mass::new(100_000),
        );
        let report = tick(&mut ctx, &TickInput::default(), SIM_DT);

        let p = ctx.projectiles.get(id).expect("live");
        assert!((p.pos - Vec2::new(30.0, 20.0)).length() < 1e-3);
        assert_eq!(p.last_pos, p.pos);
        assert!(report.pixels_requested > 0);
        assert_eq!(p.mass, Mass::new(100_000 - report.pixels_requested as i64));
        assert_eq!(ctx.query_color(20, 20), RED);
        assert_eq!(ctx.query_color(30, 20), RED);
        assert_eq!(ctx.territory(FactionId(0)), report.pixels_requested);

        // Re-painting its own trail is free
        ctx.projectiles.get_mut(id).expect("live").vel = Vec2::ZERO;
        let report = tick(&mut ctx, &TickInput::default(), SIM_DT);
        assert_eq!(report.pixels_requested, 0);
    }

    #[test]
    fn test_spent_projectile_returns_to_pool() {
        let mut ctx = quiet_context(64, 64);
        let id = ctx.spawn_projectile(FactionId(1), Vec2::new(30.0, 30.0), Vec2::ZERO, Mass::new(5));
        let report = tick(&mut ctx, &TickInput::default(), SIM_DT);
        assert_eq!(report.projectiles_released, 1);
        assert!(ctx.projectiles.is_idle(id));

        // The next shot reuses the slot
        let next = ctx.spawn_projectile(FactionId(0), Vec2::ZERO, Vec2::ZERO, Mass::new(5));
        assert_eq!(next, id);
        assert_eq!(ctx.projectiles.constructed(), 1);
    }

    #[test]
    fn test_area_body_shrinks_and_dies() {
        let mut ctx = quiet_context(128, 128);
        let big = ctx.spawn_area_body(FactionId(0), Vec2::new(64.0, 64.0), Vec2::ZERO, Mass::new(10_000_000));
        let small = ctx.spawn_area_body(FactionId(1), Vec2::new(10.0, 10.0), Vec2::ZERO, Mass::new(50));

        let report = tick(&mut ctx, &TickInput::default(), SIM_DT);
        assert!(ctx.area_body(big).expect("alive").mass < Mass::new(10_000_000));
        assert!(ctx.area_body(small).is_none());
        assert_eq!(report.area_bodies_removed, 1);
    }

    #[test]
    fn test_duplicate_contacts_resolve_once() {
        let mut ctx = quiet_context(512, 512);
        let a = ctx.spawn_area_body(FactionId(0), Vec2::new(100.0, 100.0), Vec2::ZERO, Mass::new(1_000_000));
        let b = ctx.spawn_area_body(FactionId(1), Vec2::new(400.0, 400.0), Vec2::ZERO, Mass::new(800_000));
        let (ea, eb) = (EntityRef::AreaBody(a), EntityRef::AreaBody(b));
        ctx.on_overlap(ea, eb);
        ctx.on_overlap(eb, ea);
        ctx.on_overlap(ea, eb);

        let report = tick(&mut ctx, &TickInput::default(), SIM_DT);
        assert_eq!(report.contacts_resolved, 1);
        // 800k halved then drained by the winner's 600k
        assert!(ctx.area_body(b).is_none());
        assert!(ctx.area_body(a).expect("winner").mass < Mass::new(600_000));
        assert!(ctx.contacts.is_empty());
    }

    #[test]
    fn test_projectile_rebounds_off_edge() {
        let mut ctx = quiet_context(32, 32);
        ctx.settings.boundary_check_interval = 1;
        let id = ctx.spawn_projectile(
            FactionId(0),
            Vec2::new(30.0, 16.0),
            Vec2::new(300.0, 0.0),
            Mass::new(1_000_000),
        );
        tick(&mut ctx, &TickInput::default(), SIM_DT);
        let p = ctx.projectiles.get(id).expect("live");
        assert_eq!(p.pos.x, 32.0);
        assert_eq!(p.vel, Vec2::new(-300.0, 0.0));
    }

    #[test]
    fn test_tick_input_rewards_and_aim() {
        let mut ctx = quiet_context(64, 64);
        let input = TickInput {
            rewards: vec![(FactionId(0), Reward::Ammunition(Mass::new(2)))],
            aim_targets: vec![(FactionId(0), Some(Vec2::new(40.0, 1.0)))],
        };
        let report = tick(&mut ctx, &input, SIM_DT);
        assert_eq!(report.shots_fired, 2);
        let faction = ctx.faction(FactionId(0)).expect("registered");
        assert_eq!(faction.aim_target, Some(Vec2::new(40.0, 1.0)));
        assert!(faction.ammunition.is_depleted());
    }

    #[test]
    fn test_faction_killed_by_contact() {
        let mut ctx = quiet_context(64, 64);
        ctx.faction_mut(FactionId(1)).expect("registered").health = Mass::new(10);
        let shot = ctx.spawn_projectile(FactionId(0), Vec2::new(2.0, 2.0), Vec2::ZERO, Mass::new(500));
        ctx.on_overlap(EntityRef::Projectile(shot), EntityRef::Faction(FactionId(1)));

        let report = tick(&mut ctx, &TickInput::default(), SIM_DT);
        assert_eq!(report.factions_disabled, vec![FactionId(1)]);
        assert!(ctx.projectiles.is_idle(shot));
        assert_eq!(ctx.faction(FactionId(1)).expect("kept").pos, DISABLED_FACTION_POS);
    }

    #[test]
    fn test_determinism() {
        let settings = Settings {
            map_width: 96,
            map_height: 96,
            seed: 4242,
            ..Settings::default()
        };
        let run = || {
            let mut ctx = SimulationContext::new(settings.clone()).expect("valid settings");
            let red = ctx.add_faction(RED, Vec2::new(20.0, 48.0));
            let blue = ctx.add_faction(BLUE, Vec2::new(76.0, 48.0));
            let mut inputs = vec![TickInput::default(); 30];
            inputs[0].rewards.push((red, Reward::AreaBody(Mass::new(600))));
            inputs[3].rewards.push((blue, Reward::Scatter(Mass::new(20))));
            inputs[5].aim_targets.push((red, Some(Vec2::new(76.0, 48.0))));
            for input in &inputs {
                tick(&mut ctx, input, SIM_DT);
            }
            ctx
        };

        let a = run();
        let b = run();
        assert_eq!(a.time_ticks, 30);
        assert_eq!(a.map.as_rgba_bytes(), b.map.as_rgba_bytes());
        assert_eq!(a.projectiles.active_ids(), b.projectiles.active_ids());
        assert_eq!(a.area_bodies.len(), b.area_bodies.len());
        assert_eq!(a.map.pending(), b.map.pending());
    }
}
