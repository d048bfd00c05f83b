//! Pixel Territory headless demo
//!
//! Runs a few factions against each other on a fixed timestep and logs how
//! the territory is split. Overlaps are found with a naive pairwise circle
//! test, standing in for a physics engine.

#[cfg(not(target_arch = "wasm32"))]
mod demo {
    use std::path::PathBuf;

    use clap::Parser;
    use glam::Vec2;

    use pixel_territory::consts::*;
    use pixel_territory::map::Color;
    use pixel_territory::mass::Mass;
    use pixel_territory::sim::{EntityRef, FactionId, Reward, SimulationContext, TickInput, tick};
    use pixel_territory::{Settings, SimError, ThroughputPreset};

    /// Collision radius of a faction turret
    const FACTION_RADIUS: f32 = 16.0;
    /// Turrets notice enemies inside this range
    const SENSE_RANGE: f32 = 96.0;
    /// Ticks between demo rewards
    const REWARD_INTERVAL: u64 = 120;
    const REWARD_VALUE: i64 = 10;

    const PALETTE: [Color; 4] = [
        Color::rgb(230, 60, 60),
        Color::rgb(60, 120, 230),
        Color::rgb(70, 200, 90),
        Color::rgb(240, 200, 50),
    ];

    #[derive(Parser)]
    #[command(author, version, about, long_about = None)]
    pub struct Cli {
        /// JSON settings file; defaults are used when absent
        #[arg(long)]
        settings: Option<PathBuf>,
        /// Throughput preset overriding the flush budget (low, medium, high)
        #[arg(long)]
        preset: Option<ThroughputPreset>,
        /// Override the RNG seed
        #[arg(long)]
        seed: Option<u64>,
        /// Ticks to simulate
        #[arg(long, default_value_t = 600)]
        ticks: u64,
        /// Number of factions (1-4)
        #[arg(long, default_value_t = 2)]
        factions: usize,
    }

    /// Circle footprint of one entity for overlap tests
    struct Footprint {
        entity: EntityRef,
        faction: FactionId,
        pos: Vec2,
        radius: f32,
    }

    fn footprints(ctx: &SimulationContext) -> Vec<Footprint> {
        let mut out = Vec::new();
        for f in ctx.factions.iter().filter(|f| f.is_active()) {
            out.push(Footprint {
                entity: EntityRef::Faction(f.id),
                faction: f.id,
                pos: f.pos,
                radius: FACTION_RADIUS,
            });
        }
        for id in ctx.projectiles.active_ids() {
            if let Some(p) = ctx.projectiles.get(id).filter(|p| p.active) {
                out.push(Footprint {
                    entity: EntityRef::Projectile(id),
                    faction: p.faction,
                    pos: p.pos,
                    radius: ctx.settings.projectile.radius,
                });
            }
        }
        for body in &ctx.area_bodies {
            out.push(Footprint {
                entity: EntityRef::AreaBody(body.id),
                faction: body.faction,
                pos: body.pos,
                radius: body.radius(),
            });
        }
        out
    }

    /// Report every overlapping pair and pick an aim target per faction
    fn sense(ctx: &mut SimulationContext, input: &mut TickInput) {
        let shapes = footprints(ctx);
        for (i, a) in shapes.iter().enumerate() {
            for b in &shapes[i + 1..] {
                let reach = a.radius + b.radius;
                if a.pos.distance_squared(b.pos) <= reach * reach {
                    ctx.on_overlap(a.entity, b.entity);
                }
            }
        }

        for faction in ctx.factions.iter().filter(|f| f.is_active()) {
            let target = shapes
                .iter()
                .filter(|s| s.faction != faction.id)
                .map(|s| (s.pos, s.pos.distance_squared(faction.pos)))
                .filter(|(_, d)| *d <= SENSE_RANGE * SENSE_RANGE)
                .min_by(|a, b| a.1.total_cmp(&b.1))
                .map(|(pos, _)| pos);
            input.aim_targets.push((faction.id, target));
        }
    }

    fn scheduled_reward(round: u64, faction: usize) -> Reward {
        let value = Mass::new(REWARD_VALUE);
        match (round as usize + faction) % 5 {
            0 => Reward::AreaBody(value),
            1 => Reward::Scatter(value),
            2 => Reward::Ammunition(value),
            3 => Reward::Snipe(value),
            _ => Reward::Health(value),
        }
    }

    pub fn run(cli: Cli) -> Result<(), SimError> {
        let mut settings = match &cli.settings {
            Some(path) => Settings::load(path)?,
            None => Settings::default(),
        };
        if let Some(preset) = cli.preset {
            settings.apply_preset(preset);
        }
        if let Some(seed) = cli.seed {
            settings.seed = seed;
        }

        let mut ctx = SimulationContext::new(settings)?;
        let size = Vec2::new(ctx.map.width() as f32, ctx.map.height() as f32);
        let corners = [
            Vec2::new(0.2, 0.2),
            Vec2::new(0.8, 0.8),
            Vec2::new(0.8, 0.2),
            Vec2::new(0.2, 0.8),
        ];
        for (color, corner) in PALETTE.iter().zip(corners).take(cli.factions.clamp(1, 4)) {
            ctx.add_faction(*color, corner * size);
        }

        for t in 0..cli.ticks {
            let mut input = TickInput::default();
            sense(&mut ctx, &mut input);
            if t % REWARD_INTERVAL == 0 {
                let round = t / REWARD_INTERVAL;
                for (i, f) in ctx.factions.iter().enumerate() {
                    input.rewards.push((f.id, scheduled_reward(round, i)));
                }
            }

            let report = tick(&mut ctx, &input, SIM_DT);
            if !report.factions_disabled.is_empty() {
                log::info!("Tick {}: factions {:?} knocked out", ctx.time_ticks, report.factions_disabled);
            }
            if ctx.time_ticks % 60 == 0 {
                log::info!(
                    "Tick {}: {} projectiles, {} area bodies, {} writes pending",
                    ctx.time_ticks,
                    ctx.projectiles.active_len(),
                    ctx.area_bodies.len(),
                    ctx.map.pending()
                );
            }
        }

        let total = ctx.map.width() as usize * ctx.map.height() as usize;
        for f in &ctx.factions {
            let owned = ctx.territory(f.id);
            println!(
                "faction {}: {:>6} px ({:5.1}%), health {}, ammunition {}, {:?}",
                f.id.0,
                owned,
                100.0 * owned as f64 / total as f64,
                f.health,
                f.ammunition,
                f.status
            );
        }
        ctx.shutdown();
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use clap::Parser;

    env_logger::init();
    log::info!("Pixel Territory (headless) starting...");

    if let Err(e) = demo::run(demo::Cli::parse()) {
        log::error!("{e}");
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The library is embedded by a host; there is no wasm entry point
}
