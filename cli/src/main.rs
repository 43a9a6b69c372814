use std::path::PathBuf;

use clap::{Parser, Subcommand};
use skirmish::events::Observer;
use skirmish::spellbook::{allowed_at_level, trim_to_caps};
use skirmish::{
    roll_pool, simulate_battle, simulate_battle_observed, BattleEvent, Catalog, ClassId,
    DamageDice, Dice, PacingConfig, Side,
};

mod config;

#[derive(Subcommand)]
enum Cmd {
    /// Run one battle and print its log
    Battle {
        /// YAML or JSON battle config
        #[arg(long)]
        config: Option<PathBuf>,
        /// Party id (overrides the config)
        #[arg(long)]
        party: Option<String>,
        /// Encounter id (overrides the config)
        #[arg(long)]
        encounter: Option<String>,
        /// RNG seed for determinism (overrides the config)
        #[arg(long)]
        seed: Option<u64>,
        /// Pause between actions like the interactive view
        #[arg(long, default_value_t = false)]
        paced: bool,
        /// Print the full report as JSON instead of a live log
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// List the built-in parties and encounters
    List,
    /// Show the spells a class keeps at a given level
    Spellbook {
        #[arg(long)]
        class: String,
        #[arg(long, default_value_t = 1)]
        level: u32,
    },
    /// Roll a dice pool (XdY) a number of times
    Roll {
        #[arg(long)]
        dice: DamageDice,
        /// RNG seed for determinism
        #[arg(long, default_value_t = 42)]
        seed: u64,
        #[arg(long, default_value_t = 1)]
        times: u32,
    },
}

#[derive(Parser)]
#[command(name = "skirmish-cli")]
#[command(about = "Skirmish battle simulator")]
struct Cli {
    #[command(subcommand)]
    cmd: Cmd,
}

fn side_label(side: Side) -> &'static str {
    match side {
        Side::Player => "hero",
        Side::Enemy => "enemy",
    }
}

fn main() -> anyhow::Result<()> {
    config::init_tracing();
    let cli = Cli::parse();
    match cli.cmd {
        Cmd::Battle {
            config: path,
            party,
            encounter,
            seed,
            paced,
            json,
        } => {
            let mut cfg = config::resolve_config(path.as_deref(), party, encounter, seed)?;
            if paced {
                cfg.pacing = PacingConfig::default();
            }
            if json {
                let report = simulate_battle(&cfg)?;
                println!("{}", serde_json::to_string_pretty(&report)?);
                return Ok(());
            }
            let mut printer = Observer(|e: &BattleEvent| println!("{}", e));
            let report = simulate_battle_observed(&cfg, Some(&mut printer))?;
            println!();
            println!(
                "{} win after {} rounds (seed {})",
                report.outcome.winner, report.outcome.rounds, report.seed
            );
            for s in &report.outcome.survivors {
                println!(
                    "  {:<16} {:<5} {}/{} HP",
                    s.name,
                    side_label(s.side),
                    s.hp,
                    s.max_hp
                );
            }
        }
        Cmd::List => {
            let catalog = Catalog::builtin()?;
            println!("parties:");
            for p in catalog.parties() {
                let members: Vec<String> = p
                    .heroes
                    .iter()
                    .map(|h| format!("{} ({} {})", h.name, h.class, h.level))
                    .collect();
                println!("  {:<22} {}", p.id, members.join(", "));
            }
            println!("encounters:");
            for e in catalog.encounters() {
                let members: Vec<&str> = e.enemies.iter().map(|t| t.name.as_str()).collect();
                println!("  {:<22} {}: {}", e.id, e.title, members.join(", "));
            }
        }
        Cmd::Spellbook { class, level } => {
            let class: ClassId = class.parse().map_err(anyhow::Error::msg)?;
            let tables = Catalog::builtin()?.tables();
            let profile = tables.class(class);
            let caps = allowed_at_level(profile.progression, level);
            let trimmed = trim_to_caps(&tables, profile.progression, level, &profile.spellbook);
            println!(
                "{} level {}: {:?} caster, casts with {}",
                class,
                level,
                profile.progression,
                profile.casting_ability.map_or("-", |a| a.label())
            );
            println!(
                "caps: cantrips={} L1={} L2={} L3={}",
                caps.cantrips, caps.level1, caps.level2, caps.level3
            );
            for ks in &trimmed.spells {
                let name = tables.spell(&ks.id).map_or(ks.id.as_str(), |s| s.name.as_str());
                println!("  L{} {} ({})", ks.level, ks.id, name);
            }
            for id in &trimmed.unknown {
                println!("  ?? {} (not in the spell table)", id);
            }
        }
        Cmd::Roll { dice, seed, times } => {
            let mut rng = Dice::from_seed(seed);
            for _ in 0..times {
                let pool = roll_pool(&mut rng, dice.count, dice.sides);
                println!("{} = {} [{}]", dice, pool.total, pool.csv());
            }
        }
    }
    Ok(())
}

