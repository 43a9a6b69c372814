use std::fmt;
use std::str::FromStr;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod ai;
pub mod api;
pub mod checks;
pub mod combat;
pub mod combatant;
pub mod content;
pub mod error;
pub mod events;
pub mod rules;
pub mod scheduler;
pub mod setup;
pub mod spellbook;
pub mod stats;

pub use ai::{take_action, ActionKind, Activation};
pub use api::{
    load_config, parse_config, simulate_battle, simulate_battle_many, simulate_battle_observed,
    BattleConfig, BattleReport, BattleSummary, ConfigFormat,
};
pub use combatant::{Combatant, CombatantId, Side};
pub use error::{BattleError, ConfigWarning, SetupError};
pub use events::{BattleEvent, EventKind, EventSink};
pub use rules::{
    CasterProgression, ClassId, ClassProfile, KnownSpell, RuleTables, SpellDef, WeaponDef,
};
pub use content::{Catalog, EncounterDef, PartyDef};
pub use scheduler::{
    run_battle, run_battle_with, NoPacer, Outcome, Pacer, PacingConfig, SurvivorReport,
    ThreadPacer, TurnScheduler, DEFAULT_MAX_ROUNDS,
};
pub use setup::{setup_battle, setup_from_catalog, Battle, BattleSelection, CombatantTemplate};
pub use stats::{HealConfig, StatBlock};

/// The single source of randomness for the engine.
///
/// Every die the engine rolls goes through `roll_die`, so swapping the source
/// (seeded, scripted, or anything else) makes a whole battle reproducible.
pub trait RollSource {
    /// Returns a value in `1..=sides`. `sides < 1` is treated as a one-sided die.
    fn roll_die(&mut self, sides: i32) -> i32;
}

enum DiceSource {
    Seeded(ChaCha8Rng),
    Scripted { rolls: Vec<i32>, next: usize },
}

pub struct Dice {
    source: DiceSource,
}

impl Dice {
    pub fn from_seed(seed: u64) -> Self {
        Self {
            source: DiceSource::Seeded(ChaCha8Rng::seed_from_u64(seed)),
        }
    }

    /// Replays `rolls` in order, cycling when exhausted. Each value is clamped
    /// into the range of the die being rolled.
    pub fn from_scripted(rolls: Vec<i32>) -> Self {
        Self {
            source: DiceSource::Scripted { rolls, next: 0 },
        }
    }
}

impl RollSource for Dice {
    fn roll_die(&mut self, sides: i32) -> i32 {
        let sides = sides.max(1);
        match &mut self.source {
            DiceSource::Seeded(rng) => rng.gen_range(1..=sides),
            DiceSource::Scripted { rolls, next } => {
                if rolls.is_empty() {
                    return 1;
                }
                let value = rolls[*next % rolls.len()];
                *next += 1;
                value.clamp(1, sides)
            }
        }
    }
}

/// Individual results of rolling a pool of identical dice.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DicePool {
    pub rolls: Vec<i32>,
    pub total: i32,
}

impl DicePool {
    pub fn csv(&self) -> String {
        self.rolls
            .iter()
            .map(|r| r.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Roll `count` dice of `sides` and keep every face for the log.
pub fn roll_pool(rng: &mut dyn RollSource, count: u32, sides: u32) -> DicePool {
    let mut pool = DicePool::default();
    for _ in 0..count {
        let r = rng.roll_die(sides as i32);
        pool.total += r;
        pool.rolls.push(r);
    }
    pool
}

/// Sum of `count` independent dice; `count == 0` rolls nothing and yields 0.
pub fn roll_dice(rng: &mut dyn RollSource, count: u32, sides: u32) -> i32 {
    roll_pool(rng, count, sides).total
}

pub fn roll_initiative(rng: &mut dyn RollSource, bonus: i32) -> i32 {
    rng.roll_die(20) + bonus
}

/// D&D ability modifier = floor((score - 10) / 2) for integer scores.
pub fn ability_mod(score: i32) -> i32 {
    // `div_euclid` with positive divisor matches mathematical floor division.
    (score - 10).div_euclid(2)
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DiceError {
    #[error("invalid dice notation (expected XdY): {0}")]
    InvalidNotation(String),
    #[error("dice must be at least 1d1, got {0}")]
    OutOfRange(String),
}

/// `count` dice with `sides` faces, written `XdY` in content files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DamageDice {
    pub count: u32,
    pub sides: u32,
}

impl DamageDice {
    pub const fn new(count: u32, sides: u32) -> Self {
        Self { count, sides }
    }

    /// Nominal strength of the pool, `count × sides`.
    pub fn weight(&self) -> i32 {
        i32::try_from(self.count.saturating_mul(self.sides)).unwrap_or(i32::MAX)
    }
}

impl fmt::Display for DamageDice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}d{}", self.count, self.sides)
    }
}

impl FromStr for DamageDice {
    type Err = DiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_lowercase();
        let (count, sides) = lowered
            .split_once('d')
            .ok_or_else(|| DiceError::InvalidNotation(s.to_string()))?;
        let count: u32 = count
            .parse()
            .map_err(|_| DiceError::InvalidNotation(s.to_string()))?;
        let sides: u32 = sides
            .parse()
            .map_err(|_| DiceError::InvalidNotation(s.to_string()))?;
        if sides == 0 {
            return Err(DiceError::OutOfRange(s.to_string()));
        }
        Ok(Self { count, sides })
    }
}

impl TryFrom<String> for DamageDice {
    type Error = DiceError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DamageDice> for String {
    fn from(value: DamageDice) -> Self {
        value.to_string()
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ability {
    Str,
    Dex,
    Con,
    Int,
    Wis,
    Cha,
}

impl Ability {
    pub fn label(&self) -> &'static str {
        match self {
            Ability::Str => "STR",
            Ability::Dex => "DEX",
            Ability::Con => "CON",
            Ability::Int => "INT",
            Ability::Wis => "WIS",
            Ability::Cha => "CHA",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbilityScores {
    #[serde(rename = "str")]
    pub str_: i32,
    pub dex: i32,
    pub con: i32,
    #[serde(rename = "int")]
    pub int_: i32,
    pub wis: i32,
    pub cha: i32,
}

impl Default for AbilityScores {
    fn default() -> Self {
        Self::uniform(10)
    }
}

impl AbilityScores {
    pub const fn uniform(score: i32) -> Self {
        Self {
            str_: score,
            dex: score,
            con: score,
            int_: score,
            wis: score,
            cha: score,
        }
    }

    pub fn score(&self, ability: Ability) -> i32 {
        match ability {
            Ability::Str => self.str_,
            Ability::Dex => self.dex,
            Ability::Con => self.con,
            Ability::Int => self.int_,
            Ability::Wis => self.wis,
            Ability::Cha => self.cha,
        }
    }

    pub fn mod_of(&self, ability: Ability) -> i32 {
        ability_mod(self.score(ability))
    }

    pub fn clamped(self, min: i32, max: i32) -> Self {
        Self {
            str_: self.str_.clamp(min, max),
            dex: self.dex.clamp(min, max),
            con: self.con.clamp(min, max),
            int_: self.int_.clamp(min, max),
            wis: self.wis.clamp(min, max),
            cha: self.cha.clamp(min, max),
        }
    }
}

/// A point in the abstract battle space.
#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "[f32; 3]", into = "[f32; 3]")]
pub struct Position {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Position {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn distance_to(&self, other: &Position) -> f32 {
        let (dx, dy, dz) = (other.x - self.x, other.y - self.y, other.z - self.z);
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    /// Unit vector towards `other`; zero when both points coincide.
    pub fn direction_to(&self, other: &Position) -> Position {
        let len = self.distance_to(other);
        if len <= f32::EPSILON {
            return Position::default();
        }
        Position::new(
            (other.x - self.x) / len,
            (other.y - self.y) / len,
            (other.z - self.z) / len,
        )
    }

    /// Step straight towards `target`, travelling at most `max_distance`.
    pub fn step_towards(&self, target: &Position, max_distance: f32) -> Position {
        let dist = self.distance_to(target);
        if dist <= max_distance || dist <= f32::EPSILON {
            return *target;
        }
        let dir = self.direction_to(target);
        Position::new(
            self.x + dir.x * max_distance,
            self.y + dir.y * max_distance,
            self.z + dir.z * max_distance,
        )
    }

    pub fn offset_back(&self, dir: &Position, amount: f32) -> Position {
        Position::new(
            self.x - dir.x * amount,
            self.y - dir.y * amount,
            self.z - dir.z * amount,
        )
    }
}

impl From<[f32; 3]> for Position {
    fn from(v: [f32; 3]) -> Self {
        Position::new(v[0], v[1], v[2])
    }
}

impl From<Position> for [f32; 3] {
    fn from(p: Position) -> Self {
        [p.x, p.y, p.z]
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.1}, {:.1}, {:.1})", self.x, self.y, self.z)
    }
}

pub(crate) fn format_modifier(modifier: i32) -> String {
    if modifier >= 0 {
        format!("+{}", modifier)
    } else {
        format!("-{}", modifier.abs())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scripted_dice_cycle_and_clamp() {
        let mut dice = Dice::from_scripted(vec![3, 25]);
        assert_eq!(dice.roll_die(6), 3);
        assert_eq!(dice.roll_die(20), 20);
        assert_eq!(dice.roll_die(6), 3);
    }

    #[test]
    fn huge_pools_cap_their_weight() {
        assert_eq!(DamageDice::new(2, 6).weight(), 12);
        assert_eq!(DamageDice::new(100_000, 100_000).weight(), i32::MAX);
    }

    #[test]
    fn zero_dice_roll_nothing() {
        let mut dice = Dice::from_seed(7);
        assert_eq!(roll_dice(&mut dice, 0, 8), 0);
    }

    #[test]
    fn dice_notation_parses() {
        assert_eq!("2d6".parse::<DamageDice>().unwrap(), DamageDice::new(2, 6));
        assert_eq!(" 1D10 ".parse::<DamageDice>().unwrap(), DamageDice::new(1, 10));
        assert!("d6".parse::<DamageDice>().is_err());
        assert!("3d0".parse::<DamageDice>().is_err());
    }

    #[test]
    fn step_towards_stops_at_target() {
        let a = Position::new(0.0, 0.0, 0.0);
        let b = Position::new(3.0, 0.0, 4.0);
        let mid = a.step_towards(&b, 2.5);
        assert!((a.distance_to(&mid) - 2.5).abs() < 1e-5);
        assert_eq!(a.step_towards(&b, 10.0), b);
    }
}
