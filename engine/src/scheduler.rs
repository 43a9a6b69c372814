//! Initiative and the round loop.
//!
//! Initiative is rolled once. The resulting order is a rotating queue: every
//! round each queued unit is taken from the front, acts until its actions run
//! out, and goes to the back. Units found dead when dequeued leave the
//! rotation for good.

use std::collections::VecDeque;
use std::thread;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::ai::{take_action, ActionKind, Activation};
use crate::combatant::{Combatant, Side};
use crate::error::BattleError;
use crate::events::{BattleEvent, EventKind, EventLog, EventSink};
use crate::setup::Battle;
use crate::{roll_initiative, RollSource};

pub const DEFAULT_MAX_ROUNDS: u32 = 500;

/// Presentation delay after each action, by category, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PacingConfig {
    pub move_ms: u64,
    pub attack_ms: u64,
    pub cast_ms: u64,
    pub heal_ms: u64,
    pub wait_ms: u64,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            move_ms: 300,
            attack_ms: 600,
            cast_ms: 600,
            heal_ms: 500,
            wait_ms: 200,
        }
    }
}

impl PacingConfig {
    pub const fn instant() -> Self {
        Self {
            move_ms: 0,
            attack_ms: 0,
            cast_ms: 0,
            heal_ms: 0,
            wait_ms: 0,
        }
    }

    pub fn delay_for(&self, kind: ActionKind) -> Duration {
        let ms = match kind {
            ActionKind::Move => self.move_ms,
            ActionKind::Attack => self.attack_ms,
            ActionKind::Cast => self.cast_ms,
            ActionKind::Heal => self.heal_ms,
            ActionKind::Wait => self.wait_ms,
        };
        Duration::from_millis(ms)
    }
}

/// Where pacing delays go. Never affects outcomes.
pub trait Pacer {
    fn pause(&mut self, delay: Duration);
}

/// Sleeps the current thread.
pub struct ThreadPacer;

impl Pacer for ThreadPacer {
    fn pause(&mut self, delay: Duration) {
        if !delay.is_zero() {
            thread::sleep(delay);
        }
    }
}

/// Ignores every delay.
pub struct NoPacer;

impl Pacer for NoPacer {
    fn pause(&mut self, _delay: Duration) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    RoundRunning,
    Terminal(Side),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitiativeRoll {
    pub unit: usize,
    pub name: String,
    pub total: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurvivorReport {
    pub name: String,
    pub side: Side,
    pub hp: i32,
    pub max_hp: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outcome {
    pub winner: Side,
    pub rounds: u32,
    pub log: Vec<BattleEvent>,
    pub survivors: Vec<SurvivorReport>,
}

/// Terminal check. The player side is checked first, so a simultaneous wipe
/// counts as an enemy win.
pub fn battle_winner(units: &[Combatant]) -> Option<Side> {
    let alive = |side: Side| units.iter().any(|u| u.side() == side && u.is_alive());
    if !alive(Side::Player) {
        Some(Side::Enemy)
    } else if !alive(Side::Enemy) {
        Some(Side::Player)
    } else {
        None
    }
}

#[derive(Debug)]
pub struct TurnScheduler {
    order: VecDeque<usize>,
    state: SchedulerState,
    round: u32,
    max_rounds: u32,
}

impl Default for TurnScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl TurnScheduler {
    pub fn new() -> Self {
        Self {
            order: VecDeque::new(),
            state: SchedulerState::Idle,
            round: 0,
            max_rounds: DEFAULT_MAX_ROUNDS,
        }
    }

    pub fn with_round_limit(mut self, max_rounds: u32) -> Self {
        self.max_rounds = max_rounds.max(1);
        self
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    /// Unit indices in current turn order.
    pub fn order(&self) -> impl Iterator<Item = usize> + '_ {
        self.order.iter().copied()
    }

    /// Roll d20 + bonus for every unit and sort descending. Ties keep
    /// registration order.
    pub fn build_initiative(
        &mut self,
        units: &[Combatant],
        rng: &mut dyn RollSource,
        sink: &mut dyn EventSink,
    ) -> Vec<InitiativeRoll> {
        let mut rolls: Vec<InitiativeRoll> = units
            .iter()
            .enumerate()
            .map(|(i, u)| InitiativeRoll {
                unit: i,
                name: u.name().to_string(),
                total: roll_initiative(rng, u.stats.initiative_bonus),
            })
            .collect();
        rolls.sort_by(|a, b| b.total.cmp(&a.total));

        self.order = rolls.iter().map(|r| r.unit).collect();
        for r in &rolls {
            debug!(unit = %r.name, total = r.total, "initiative");
            sink.emit(
                BattleEvent::new(
                    EventKind::Initiative,
                    &r.name,
                    format!("Initiative: {} = {}", r.name, r.total),
                )
                .with_amount(r.total),
            );
        }
        rolls
    }

    /// Run rounds until one side is gone. Expects [`build_initiative`] to
    /// have been called.
    ///
    /// [`build_initiative`]: TurnScheduler::build_initiative
    pub fn run(
        &mut self,
        battle: &mut Battle,
        rng: &mut dyn RollSource,
        pacing: &PacingConfig,
        pacer: &mut dyn Pacer,
        log: &mut EventLog<'_>,
    ) -> Result<Side, BattleError> {
        let units = &mut battle.units;
        loop {
            if let Some(winner) = self.finish_if_over(units, log) {
                return Ok(winner);
            }
            if self.round >= self.max_rounds {
                return Err(BattleError::RoundLimit(self.max_rounds));
            }

            self.round += 1;
            self.state = SchedulerState::RoundRunning;
            log.set_round(self.round);
            log.emit(BattleEvent::new(
                EventKind::Round,
                "",
                format!("Round {}", self.round),
            ));
            for u in units.iter_mut() {
                u.begin_turn();
            }

            for _ in 0..self.order.len() {
                let Some(current) = self.order.pop_front() else {
                    break;
                };
                if !units[current].is_alive() {
                    continue;
                }

                log.emit(BattleEvent::new(
                    EventKind::Turn,
                    units[current].name(),
                    format!("== {}'s turn ==", units[current].name()),
                ));
                while units[current].is_alive() && units[current].remaining_actions() > 0 {
                    let activation = Activation::new(units, current);
                    let kind = take_action(units, &activation, &battle.tables, rng, log);
                    pacer.pause(pacing.delay_for(kind));
                    if let Some(winner) = self.finish_if_over(units, log) {
                        return Ok(winner);
                    }
                }

                self.order.push_back(current);
                if let Some(winner) = self.finish_if_over(units, log) {
                    return Ok(winner);
                }
            }
        }
    }

    fn finish_if_over(&mut self, units: &[Combatant], log: &mut EventLog<'_>) -> Option<Side> {
        if let SchedulerState::Terminal(winner) = self.state {
            return Some(winner);
        }
        let winner = battle_winner(units)?;
        self.state = SchedulerState::Terminal(winner);
        log.emit(BattleEvent::new(
            EventKind::Victory,
            "",
            format!("*** {} win! ***", winner),
        ));
        Some(winner)
    }
}

/// Run a battle to the end with the default round limit, sleeping between
/// actions as `pacing` says.
pub fn run_battle(
    battle: Battle,
    rng: &mut dyn RollSource,
    pacing: &PacingConfig,
) -> Result<Outcome, BattleError> {
    run_battle_with(
        battle,
        rng,
        pacing,
        &mut ThreadPacer,
        None,
        TurnScheduler::new(),
    )
}

/// [`run_battle`] with an explicit pacer, live observer and scheduler.
pub fn run_battle_with(
    mut battle: Battle,
    rng: &mut dyn RollSource,
    pacing: &PacingConfig,
    pacer: &mut dyn Pacer,
    observer: Option<&mut dyn EventSink>,
    mut scheduler: TurnScheduler,
) -> Result<Outcome, BattleError> {
    let mut log = EventLog::new(observer);

    let intro = match &battle.title {
        Some(title) => format!("Battle start: Loaded '{}'.", title),
        None => format!(
            "Battle start: {} heroes vs {} enemies.",
            battle.units.iter().filter(|u| u.side() == Side::Player).count(),
            battle.units.iter().filter(|u| u.side() == Side::Enemy).count()
        ),
    };
    for w in &battle.warnings {
        log.emit(BattleEvent::new(EventKind::Warning, w.unit(), w.to_string()));
    }
    log.emit(BattleEvent::new(EventKind::Setup, "", intro));

    scheduler.build_initiative(&battle.units, rng, &mut log);
    let winner = scheduler.run(&mut battle, rng, pacing, pacer, &mut log)?;
    info!(winner = %winner, rounds = scheduler.round(), "battle finished");

    let survivors = battle
        .units
        .iter()
        .filter(|u| u.is_alive())
        .map(|u| SurvivorReport {
            name: u.name().to_string(),
            side: u.side(),
            hp: u.current_hp(),
            max_hp: u.stats.max_hp,
        })
        .collect();

    Ok(Outcome {
        winner,
        rounds: scheduler.round(),
        log: log.into_events(),
        survivors,
    })
}
