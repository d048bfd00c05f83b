//! Contact resolution
//!
//! Each rule mutates masses for one overlapping pair. Contests between two
//! entities of the same kind are decided by [`outranks`]: only the winner
//! acts, so a contact reported by both participants still resolves once.
//! Cross-kind rules always act from the same side.

use super::pool::ProjectileId;
use super::state::{
    AreaBody, AreaBodyId, Combatant, Despawn, EntityRef, Faction, FactionId, Projectile,
    SimulationContext, area_body_index, pair_mut,
};

/// Strict total order deciding which side of a contest acts
#[inline]
pub fn outranks<A: Combatant + ?Sized, B: Combatant + ?Sized>(a: &A, b: &B) -> bool {
    a.mass() > b.mass() || (a.mass() == b.mass() && a.tie_break() > b.tie_break())
}

/// `a` absorbs `b` if it outranks it; returns whether `a` acted
pub fn projectile_vs_projectile(a: &mut Projectile, b: &mut Projectile) -> bool {
    if a.faction == b.faction || !outranks(a, b) {
        return false;
    }
    a.mass -= &b.mass;
    b.mass.set_zero();
    true
}

/// Feed an allied body or damage an enemy one
///
/// The projectile is spent on any body contact; always returns true.
pub fn projectile_vs_area_body(projectile: &Projectile, body: &mut AreaBody) -> bool {
    if projectile.faction == body.faction {
        body.mass += &projectile.mass;
    } else {
        body.mass -= &projectile.mass;
    }
    true
}

/// Damage an enemy faction; returns whether the projectile is spent
pub fn projectile_vs_faction(projectile: &Projectile, faction: &mut Faction) -> bool {
    if projectile.faction == faction.id || !faction.is_active() {
        return false;
    }
    faction.health -= &projectile.mass;
    true
}

/// Body against body; `b` is drained by `a`'s already reduced mass
pub fn area_body_vs_area_body(a: &mut AreaBody, b: &mut AreaBody) -> bool {
    if a.faction == b.faction || !outranks(a, b) {
        return false;
    }
    a.mass -= &b.mass.half();
    b.mass.halve();
    b.mass -= &a.mass;
    true
}

/// Body rams a faction; a body driven negative gives the overshoot back
pub fn area_body_vs_faction(body: &mut AreaBody, faction: &mut Faction) -> bool {
    if body.faction == faction.id || !faction.is_active() {
        return false;
    }
    body.mass -= &faction.health.half();
    faction.health.halve();
    if body.mass.is_negative() {
        faction.health -= &body.mass;
    }
    true
}

/// What one contact did to the world
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactOutcome {
    /// A rule mutated at least one mass
    pub applied: bool,
    /// Entities destroyed by this contact, removed at end of tick
    pub despawns: Vec<Despawn>,
    /// Factions disabled by this contact
    pub disabled: Vec<FactionId>,
}

/// Resolve one reported overlap against the context
///
/// Projectiles already spent, bodies already depleted and disabled
/// factions are skipped.
pub fn resolve_contact(ctx: &mut SimulationContext, a: EntityRef, b: EntityRef) -> ContactOutcome {
    use EntityRef as E;

    let mut outcome = ContactOutcome::default();
    match (a, b) {
        (E::Projectile(x), E::Projectile(y)) => {
            let Some((px, py)) = ctx.projectiles.get_pair_mut(x, y) else {
                return outcome;
            };
            if !px.active || !py.active {
                return outcome;
            }
            outcome.applied = projectile_vs_projectile(px, py) || projectile_vs_projectile(py, px);
            for (id, p) in [(x, px), (y, py)] {
                if p.mass.is_depleted() {
                    spend(p, id, &mut outcome);
                }
            }
        }
        (E::Projectile(p), E::AreaBody(q)) | (E::AreaBody(q), E::Projectile(p)) => {
            let Some(projectile) = ctx.projectiles.get_mut(p).filter(|p| p.active) else {
                return outcome;
            };
            let Some(body) = live_body(&mut ctx.area_bodies, q) else {
                return outcome;
            };
            outcome.applied = projectile_vs_area_body(projectile, body);
            spend(projectile, p, &mut outcome);
            if body.mass.is_depleted() {
                outcome.despawns.push(Despawn::AreaBody(q));
            }
        }
        (E::Projectile(p), E::Faction(f)) | (E::Faction(f), E::Projectile(p)) => {
            let Some(projectile) = ctx.projectiles.get_mut(p).filter(|p| p.active) else {
                return outcome;
            };
            let Some(faction) = ctx.factions.get_mut(f.index()) else {
                return outcome;
            };
            if projectile_vs_faction(projectile, faction) {
                outcome.applied = true;
                spend(projectile, p, &mut outcome);
                if faction.disable_if_depleted() {
                    outcome.disabled.push(f);
                }
            }
        }
        (E::AreaBody(x), E::AreaBody(y)) => {
            let (Some(i), Some(j)) = (
                area_body_index(&ctx.area_bodies, x),
                area_body_index(&ctx.area_bodies, y),
            ) else {
                return outcome;
            };
            let Some((bx, by)) = pair_mut(&mut ctx.area_bodies, i, j) else {
                return outcome;
            };
            if bx.mass.is_depleted() || by.mass.is_depleted() {
                return outcome;
            }
            outcome.applied = area_body_vs_area_body(bx, by) || area_body_vs_area_body(by, bx);
            for body in [bx, by] {
                if body.mass.is_depleted() {
                    outcome.despawns.push(Despawn::AreaBody(body.id));
                }
            }
        }
        (E::AreaBody(q), E::Faction(f)) | (E::Faction(f), E::AreaBody(q)) => {
            let Some(body) = live_body(&mut ctx.area_bodies, q) else {
                return outcome;
            };
            let Some(faction) = ctx.factions.get_mut(f.index()) else {
                return outcome;
            };
            if area_body_vs_faction(body, faction) {
                outcome.applied = true;
                if body.mass.is_depleted() {
                    outcome.despawns.push(Despawn::AreaBody(q));
                }
                if faction.disable_if_depleted() {
                    outcome.disabled.push(f);
                }
            }
        }
        (E::Faction(_), E::Faction(_)) => {}
    }
    outcome
}

fn live_body(bodies: &mut [AreaBody], id: AreaBodyId) -> Option<&mut AreaBody> {
    let i = area_body_index(bodies, id)?;
    let body = &mut bodies[i];
    (!body.mass.is_depleted()).then_some(body)
}

fn spend(projectile: &mut Projectile, id: ProjectileId, outcome: &mut ContactOutcome) {
    projectile.active = false;
    outcome.despawns.push(Despawn::Projectile(id));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::Color;
    use crate::mass::Mass;
    use crate::settings::Settings;
    use crate::sim::state::TieBreakId;
    use glam::Vec2;
    use proptest::prelude::*;

    fn projectile(mass: i64, faction: u32, tie: u64) -> Projectile {
        let mut p = Projectile::default();
        p.reset(
            Vec2::ZERO,
            Vec2::ZERO,
            Mass::new(mass),
            FactionId(faction),
            TieBreakId(tie),
        );
        p
    }

    fn body(id: u32, mass: i64, faction: u32, tie: u64) -> AreaBody {
        AreaBody {
            id: AreaBodyId(id),
            pos: Vec2::ZERO,
            vel: Vec2::ZERO,
            mass: Mass::new(mass),
            faction: FactionId(faction),
            tie_break: TieBreakId(tie),
        }
    }

    fn context_with_factions(n: usize) -> SimulationContext {
        let mut ctx = SimulationContext::new(Settings::default()).expect("default settings");
        for i in 0..n {
            ctx.add_faction(Color::rgb(40 * i as u8 + 10, 0, 0), Vec2::splat(20.0));
        }
        ctx
    }

    fn spawn_projectile(ctx: &mut SimulationContext, mass: i64, faction: u32) -> ProjectileId {
        let id = ctx.projectiles.acquire();
        let tie = ctx.next_tie_break();
        ctx.projectiles.get_mut(id).expect("acquired").reset(
            Vec2::ZERO,
            Vec2::ZERO,
            Mass::new(mass),
            FactionId(faction),
            tie,
        );
        id
    }

    #[test]
    fn test_equal_mass_tie_break_acts_once() {
        let mut a = projectile(5, 0, 1);
        let mut b = projectile(5, 1, 2);

        // Lower tie-break loses the contest in either delivery order
        assert!(!projectile_vs_projectile(&mut a, &mut b));
        assert!(projectile_vs_projectile(&mut b, &mut a));
        assert!(!projectile_vs_projectile(&mut a, &mut b));
        assert_eq!(b.mass, Mass::zero());
        assert_eq!(a.mass, Mass::zero());

        let mut x = body(1, 5, 0, 1);
        let mut y = body(2, 5, 1, 2);
        assert!(!area_body_vs_area_body(&mut x, &mut y));
        assert!(area_body_vs_area_body(&mut y, &mut x));
    }

    #[test]
    fn test_outranks_across_entity_kinds() {
        // Ranking needs only mass and tie-break, whatever the entity is
        let shot = projectile(7, 0, 3);
        let heavy = body(1, 9, 1, 1);
        let even = body(2, 7, 1, 4);
        let ranked: [&dyn Combatant; 3] = [&shot, &heavy, &even];

        assert!(outranks(ranked[1], ranked[0]));
        assert!(!outranks(ranked[0], ranked[1]));
        assert!(outranks(ranked[2], ranked[0]));
        assert!(!outranks(ranked[0], ranked[2]));
        // Never both ways, never against itself
        for a in ranked {
            assert!(!outranks(a, a));
            for b in ranked {
                assert!(!(outranks(a, b) && outranks(b, a)));
            }
        }
    }

    #[test]
    fn test_area_body_drain_order() {
        let mut a = body(1, 100, 0, 1);
        let mut b = body(2, 80, 1, 2);
        assert!(area_body_vs_area_body(&mut a, &mut b));
        assert_eq!(a.mass, Mass::new(60));
        assert_eq!(b.mass, Mass::new(-20));
    }

    #[test]
    fn test_same_faction_never_fights() {
        let mut a = projectile(9, 0, 1);
        let mut b = projectile(3, 0, 2);
        assert!(!projectile_vs_projectile(&mut a, &mut b));
        assert_eq!(b.mass, Mass::new(3));

        let mut x = body(1, 9, 0, 1);
        let mut y = body(2, 3, 0, 2);
        assert!(!area_body_vs_area_body(&mut x, &mut y));
    }

    #[test]
    fn test_projectile_feeds_or_damages_body() {
        let mut ally = body(1, 100, 0, 1);
        let mut enemy = body(2, 100, 1, 2);
        let shot = projectile(30, 0, 3);
        assert!(projectile_vs_area_body(&shot, &mut ally));
        assert!(projectile_vs_area_body(&shot, &mut enemy));
        assert_eq!(ally.mass, Mass::new(130));
        assert_eq!(enemy.mass, Mass::new(70));
    }

    #[test]
    fn test_area_body_vs_faction_absorption() {
        let mut ctx = context_with_factions(1);
        let faction = ctx.faction_mut(FactionId(0)).expect("registered");
        faction.health = Mass::new(1000);

        // Small body: 50 - 500 = -450, faction 500 + 450
        let mut small = body(1, 50, 1, 9);
        assert!(area_body_vs_faction(&mut small, faction));
        assert_eq!(small.mass, Mass::new(-450));
        assert_eq!(faction.health, Mass::new(950));

        // Large body: 2000 - 475, faction halved with no refund
        let mut large = body(2, 2000, 1, 10);
        assert!(area_body_vs_faction(&mut large, faction));
        assert_eq!(large.mass, Mass::new(1525));
        assert_eq!(faction.health, Mass::new(475));
    }

    #[test]
    fn test_disabled_faction_takes_no_effects() {
        let mut ctx = context_with_factions(1);
        let faction = ctx.faction_mut(FactionId(0)).expect("registered");
        faction.health = Mass::zero();
        assert!(faction.disable_if_depleted());

        let shot = projectile(10, 1, 5);
        assert!(!projectile_vs_faction(&shot, faction));
        let mut rammer = body(1, 10, 1, 6);
        assert!(!area_body_vs_faction(&mut rammer, faction));
        assert_eq!(faction.health, Mass::zero());
        assert_eq!(rammer.mass, Mass::new(10));
    }

    #[test]
    fn test_resolve_projectile_pair_despawns_loser() {
        let mut ctx = context_with_factions(2);
        let big = spawn_projectile(&mut ctx, 50, 0);
        let small = spawn_projectile(&mut ctx, 20, 1);

        let outcome = resolve_contact(&mut ctx, EntityRef::Projectile(small), EntityRef::Projectile(big));
        assert!(outcome.applied);
        assert_eq!(outcome.despawns, vec![Despawn::Projectile(small)]);
        assert_eq!(ctx.projectiles.get(big).expect("live").mass, Mass::new(30));

        // Second report of the same contact finds the loser already spent
        let again = resolve_contact(&mut ctx, EntityRef::Projectile(big), EntityRef::Projectile(small));
        assert_eq!(again, ContactOutcome::default());
    }

    #[test]
    fn test_resolve_equal_projectiles_destroys_both() {
        let mut ctx = context_with_factions(2);
        let a = spawn_projectile(&mut ctx, 5, 0);
        let b = spawn_projectile(&mut ctx, 5, 1);
        let outcome = resolve_contact(&mut ctx, EntityRef::Projectile(a), EntityRef::Projectile(b));
        assert!(outcome.applied);
        assert_eq!(outcome.despawns.len(), 2);
    }

    #[test]
    fn test_resolve_projectile_kills_faction() {
        let mut ctx = context_with_factions(2);
        ctx.faction_mut(FactionId(1)).expect("registered").health = Mass::new(100);
        let shot = spawn_projectile(&mut ctx, 100, 0);

        let outcome = resolve_contact(&mut ctx, EntityRef::Faction(FactionId(1)), EntityRef::Projectile(shot));
        assert_eq!(outcome.disabled, vec![FactionId(1)]);
        assert_eq!(outcome.despawns, vec![Despawn::Projectile(shot)]);
        assert!(!ctx.faction(FactionId(1)).expect("kept").is_active());

        // Own shot passes through its own faction untouched
        let own = spawn_projectile(&mut ctx, 100, 0);
        let outcome = resolve_contact(&mut ctx, EntityRef::Projectile(own), EntityRef::Faction(FactionId(0)));
        assert!(!outcome.applied);
        assert!(ctx.projectiles.get(own).expect("live").active);
    }

    #[test]
    fn test_resolve_body_contacts() {
        let mut ctx = context_with_factions(2);
        ctx.area_bodies.push(body(1, 100, 0, 90));
        ctx.area_bodies.push(body(2, 80, 1, 91));

        let outcome = resolve_contact(&mut ctx, EntityRef::AreaBody(AreaBodyId(2)), EntityRef::AreaBody(AreaBodyId(1)));
        assert!(outcome.applied);
        assert_eq!(outcome.despawns, vec![Despawn::AreaBody(AreaBodyId(2))]);
        assert_eq!(ctx.area_body(AreaBodyId(1)).expect("live").mass, Mass::new(60));

        // A depleted body awaiting removal is inert
        let shot = spawn_projectile(&mut ctx, 10, 0);
        let outcome = resolve_contact(&mut ctx, EntityRef::Projectile(shot), EntityRef::AreaBody(AreaBodyId(2)));
        assert!(!outcome.applied);
        assert!(ctx.projectiles.get(shot).expect("live").active);

        // Feeding an ally spends the shot
        let outcome = resolve_contact(&mut ctx, EntityRef::AreaBody(AreaBodyId(1)), EntityRef::Projectile(shot));
        assert_eq!(outcome.despawns, vec![Despawn::Projectile(shot)]);
        assert_eq!(ctx.area_body(AreaBodyId(1)).expect("live").mass, Mass::new(70));
    }

    proptest! {
        #[test]
        fn prop_projectile_exchange_conserves(
            ma in -1_000_000i64..1_000_000,
            mb in -1_000_000i64..1_000_000,
            ta in 0u64..4,
            tb in 4u64..8,
        ) {
            let mut a = projectile(ma, 0, ta);
            let mut b = projectile(mb, 1, tb);
            let (prior_a, prior_b) = (a.mass.clone(), b.mass.clone());

            let a_acted = projectile_vs_projectile(&mut a, &mut b);
            let b_acted = projectile_vs_projectile(&mut b, &mut a);
            prop_assert!(a_acted != b_acted);

            let (winner, prior_winner, loser, prior_loser) = if a_acted {
                (&a, &prior_a, &b, &prior_b)
            } else {
                (&b, &prior_b, &a, &prior_a)
            };
            prop_assert_eq!(&winner.mass, &(prior_winner - prior_loser));
            prop_assert_eq!(&loser.mass, &Mass::zero());
        }
    }
}
