use std::path::PathBuf;

use clap::Parser;
use skirmish::simulate_battle_many;

#[path = "../config.rs"]
mod config;

#[derive(Parser)]
#[command(name = "simulate-many")]
#[command(about = "Monte Carlo sim: many battles, one party vs one encounter")]
struct Args {
    /// Number of trials
    #[arg(long, default_value_t = 1000)]
    trials: u32,

    /// RNG base seed (trial i uses seed+i)
    #[arg(long)]
    seed: Option<u64>,

    /// Party id (overrides the config)
    #[arg(long)]
    party: Option<String>,

    /// Encounter id (overrides the config)
    #[arg(long)]
    encounter: Option<String>,

    /// Optional YAML or JSON battle config
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    config::init_tracing();
    let args = Args::parse();
    let cfg = config::resolve_config(
        args.config.as_deref(),
        args.party,
        args.encounter,
        args.seed,
    )?;

    let summary = simulate_battle_many(&cfg, args.trials)?;

    println!("simulate-many results");
    println!("---------------------");
    println!("trials:             {}", summary.samples);
    println!("party:              {}", cfg.party_id);
    println!("encounter:          {}", cfg.encounter_id);
    println!("base seed:          {}", cfg.seed);
    println!();
    println!("player wins:        {}", summary.player_wins);
    println!("enemy wins:         {}", summary.enemy_wins);
    println!("stalemates:         {}", summary.stalemates);
    println!("player win rate:    {:.1}%", summary.player_win_rate * 100.0);
    println!("avg rounds:         {:.2}", summary.average_rounds);
    println!("median rounds:      {:.1}", summary.median_rounds);

    Ok(())
}
