use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::combatant::Side;
use crate::content::Catalog;
use crate::error::{BattleError, SetupError};
use crate::events::EventSink;
use crate::scheduler::{
    run_battle_with, NoPacer, Outcome, PacingConfig, ThreadPacer, TurnScheduler,
    DEFAULT_MAX_ROUNDS,
};
use crate::setup::{setup_battle, setup_from_catalog, Battle, BattleSelection, CombatantTemplate};
use crate::Dice;

fn default_party() -> String {
    BattleSelection::default().party_id
}

fn default_encounter() -> String {
    BattleSelection::default().encounter_id
}

fn default_pacing() -> PacingConfig {
    PacingConfig::instant()
}

fn default_max_rounds() -> u32 {
    DEFAULT_MAX_ROUNDS
}

/// Everything needed to run one battle. Inline `heroes` / `enemies`
/// replace the party / encounter looked up by id when non-empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct BattleConfig {
    #[serde(default)]
    pub seed: u64,
    #[serde(default = "default_party")]
    pub party_id: String,
    #[serde(default = "default_encounter")]
    pub encounter_id: String,
    #[serde(default)]
    pub heroes: Vec<CombatantTemplate>,
    #[serde(default)]
    pub enemies: Vec<CombatantTemplate>,
    #[serde(default = "default_pacing")]
    pub pacing: PacingConfig,
    #[serde(default = "default_max_rounds")]
    pub max_rounds: u32,
    /// Directory with custom content; the built-in catalog when absent.
    #[serde(default)]
    pub content_dir: Option<PathBuf>,
}

impl Default for BattleConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            party_id: default_party(),
            encounter_id: default_encounter(),
            heroes: Vec::new(),
            enemies: Vec::new(),
            pacing: default_pacing(),
            max_rounds: default_max_rounds(),
            content_dir: None,
        }
    }
}

impl BattleConfig {
    pub fn selection(&self) -> BattleSelection {
        BattleSelection {
            party_id: self.party_id.clone(),
            encounter_id: self.encounter_id.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct BattleReport {
    pub seed: u64,
    pub title: Option<String>,
    #[serde(flatten)]
    pub outcome: Outcome,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct BattleSummary {
    pub samples: u32,
    pub player_wins: u32,
    pub enemy_wins: u32,
    /// Battles stopped by the round limit.
    pub stalemates: u32,
    pub player_win_rate: f64,
    pub average_rounds: f64,
    pub median_rounds: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Yaml,
}

impl ConfigFormat {
    /// YAML for `.yaml` / `.yml`, JSON for everything else.
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref()
        {
            Some("yaml") | Some("yml") => ConfigFormat::Yaml,
            _ => ConfigFormat::Json,
        }
    }
}

pub fn parse_config(text: &str, format: ConfigFormat) -> Result<BattleConfig> {
    match format {
        ConfigFormat::Json => {
            serde_json::from_str(text).context("failed to parse battle config JSON")
        }
        ConfigFormat::Yaml => {
            serde_yaml::from_str(text).context("failed to parse battle config YAML")
        }
    }
}

pub fn load_config(path: impl AsRef<Path>) -> Result<BattleConfig> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read battle config: {}", path.display()))?;
    parse_config(&text, ConfigFormat::from_path(path))
        .with_context(|| format!("in {}", path.display()))
}

fn load_catalog(cfg: &BattleConfig) -> Result<Catalog> {
    match &cfg.content_dir {
        Some(dir) => Catalog::from_dir(dir)
            .with_context(|| format!("failed to load content from {}", dir.display())),
        None => Catalog::builtin(),
    }
}

fn build_battle(cfg: &BattleConfig, catalog: &Catalog) -> Result<Battle> {
    if cfg.heroes.is_empty() && cfg.enemies.is_empty() {
        return Ok(setup_from_catalog(catalog, &cfg.selection())?);
    }
    let heroes = if cfg.heroes.is_empty() {
        catalog
            .party(&cfg.party_id)
            .map(|p| p.heroes.clone())
            .ok_or_else(|| SetupError::UnknownParty(cfg.party_id.clone()))?
    } else {
        cfg.heroes.clone()
    };
    let enemies = if cfg.enemies.is_empty() {
        catalog
            .encounter(&cfg.encounter_id)
            .map(|e| e.enemies.clone())
            .ok_or_else(|| SetupError::UnknownEncounter(cfg.encounter_id.clone()))?
    } else {
        cfg.enemies.clone()
    };
    Ok(setup_battle(&heroes, &enemies, catalog.tables())?)
}

/// Run one battle, sleeping between actions as `cfg.pacing` says.
pub fn simulate_battle(cfg: &BattleConfig) -> Result<BattleReport> {
    simulate_battle_observed(cfg, None)
}

/// [`simulate_battle`], forwarding every event to `observer` as it happens.
pub fn simulate_battle_observed(
    cfg: &BattleConfig,
    observer: Option<&mut dyn EventSink>,
) -> Result<BattleReport> {
    let catalog = load_catalog(cfg)?;
    let battle = build_battle(cfg, &catalog)?;
    let title = battle.title.clone();
    let mut rng = Dice::from_seed(cfg.seed);
    let scheduler = TurnScheduler::new().with_round_limit(cfg.max_rounds);
    let outcome = run_battle_with(
        battle,
        &mut rng,
        &cfg.pacing,
        &mut ThreadPacer,
        observer,
        scheduler,
    )
    .with_context(|| format!("battle with seed {}", cfg.seed))?;
    Ok(BattleReport {
        seed: cfg.seed,
        title,
        outcome,
    })
}

/// Run `samples` battles without pacing; battle `i` uses seed `cfg.seed + i`.
pub fn simulate_battle_many(cfg: &BattleConfig, samples: u32) -> Result<BattleSummary> {
    let catalog = load_catalog(cfg)?;
    let mut player_wins = 0;
    let mut enemy_wins = 0;
    let mut stalemates = 0;
    let mut rounds = Vec::with_capacity(samples as usize);

    for i in 0..samples {
        let seed = cfg.seed.wrapping_add(u64::from(i));
        let battle = build_battle(cfg, &catalog)?;
        let mut rng = Dice::from_seed(seed);
        let scheduler = TurnScheduler::new().with_round_limit(cfg.max_rounds);
        match run_battle_with(
            battle,
            &mut rng,
            &PacingConfig::instant(),
            &mut NoPacer,
            None,
            scheduler,
        ) {
            Ok(outcome) => {
                match outcome.winner {
                    Side::Player => player_wins += 1,
                    Side::Enemy => enemy_wins += 1,
                }
                rounds.push(outcome.rounds);
            }
            Err(BattleError::RoundLimit(_)) => stalemates += 1,
        }
    }

    Ok(BattleSummary {
        samples,
        player_wins,
        enemy_wins,
        stalemates,
        player_win_rate: if samples == 0 {
            0.0
        } else {
            f64::from(player_wins) / f64::from(samples)
        },
        average_rounds: average(&rounds),
        median_rounds: median(&mut rounds),
    })
}

fn average(values: &[u32]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().map(|&v| f64::from(v)).sum::<f64>() / values.len() as f64
}

fn median(values: &mut [u32]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.sort_unstable();
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (f64::from(values[mid - 1]) + f64::from(values[mid])) / 2.0
    } else {
        f64::from(values[mid])
    }
}
