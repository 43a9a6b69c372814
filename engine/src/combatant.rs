use std::fmt;

use serde::{Deserialize, Serialize};

use crate::events::{BattleEvent, EventKind, EventSink};
use crate::stats::StatBlock;
use crate::Position;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Player,
    Enemy,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Player => f.write_str("Players"),
            Side::Enemy => f.write_str("Enemies"),
        }
    }
}

/// Index of a combatant in registration order (heroes first, then enemies).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CombatantId(pub usize);

#[derive(Debug, Clone, PartialEq)]
pub struct Combatant {
    pub id: CombatantId,
    pub stats: StatBlock,
    current_hp: i32,
    remaining_actions: u32,
    side: Side,
    pub position: Position,
}

impl Combatant {
    /// A freshly spawned unit; it holds no HP or actions until [`Combatant::init`].
    pub fn new(id: CombatantId, stats: StatBlock, side: Side, position: Position) -> Self {
        Self {
            id,
            stats,
            current_hp: 0,
            remaining_actions: 0,
            side,
            position,
        }
    }

    pub fn init(&mut self) {
        self.stats.clamp_for(self.side == Side::Player);
        self.current_hp = self.stats.max_hp.max(0);
        self.remaining_actions = self.stats.actions_per_turn;
    }

    pub fn name(&self) -> &str {
        &self.stats.display_name
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn current_hp(&self) -> i32 {
        self.current_hp
    }

    pub fn remaining_actions(&self) -> u32 {
        self.remaining_actions
    }

    pub fn is_alive(&self) -> bool {
        self.current_hp > 0
    }

    pub fn begin_turn(&mut self) {
        self.remaining_actions = self.stats.actions_per_turn;
    }

    pub fn consume_action(&mut self) {
        debug_assert!(self.remaining_actions > 0, "{} has no action to spend", self.name());
        self.remaining_actions = self.remaining_actions.saturating_sub(1);
    }

    /// Fraction of max HP left, in `0.0..=1.0`.
    pub fn health_pct(&self) -> f32 {
        (self.current_hp as f32 / self.stats.max_hp.max(1) as f32).clamp(0.0, 1.0)
    }

    pub fn distance_to(&self, other: &Combatant) -> f32 {
        self.position.distance_to(&other.position)
    }

    /// Apply damage, clamping at 0. Returns true if the unit dropped to 0 on this call.
    pub fn receive_damage(&mut self, amount: i32, sink: &mut dyn EventSink) -> bool {
        debug_assert!(amount >= 0, "negative damage {}", amount);
        if !self.is_alive() {
            return false;
        }
        self.current_hp = (self.current_hp - amount.max(0)).max(0);
        sink.emit(
            BattleEvent::new(
                EventKind::Damage,
                self.name(),
                format!(
                    "{} takes {} dmg ({}/{})",
                    self.name(),
                    amount,
                    self.current_hp,
                    self.stats.max_hp
                ),
            )
            .with_amount(amount),
        );
        if self.current_hp == 0 {
            sink.emit(BattleEvent::new(
                EventKind::Slain,
                self.name(),
                format!("*** {} has been slain! ***", self.name()),
            ));
            return true;
        }
        false
    }

    /// Heal up to max HP. The fallen stay down.
    pub fn receive_heal(&mut self, amount: i32, sink: &mut dyn EventSink) {
        debug_assert!(amount >= 0, "negative heal {}", amount);
        if !self.is_alive() {
            return;
        }
        self.current_hp = (self.current_hp + amount.max(0)).min(self.stats.max_hp);
        sink.emit(
            BattleEvent::new(
                EventKind::Heal,
                self.name(),
                format!(
                    "{} heals {} ({}/{})",
                    self.name(),
                    amount,
                    self.current_hp,
                    self.stats.max_hp
                ),
            )
            .with_amount(amount),
        );
    }

    /// Move straight towards `destination`, at most `max_distance`.
    /// Returns the distance actually travelled.
    pub fn move_towards(&mut self, destination: &Position, max_distance: f32) -> f32 {
        let next = self.position.step_towards(destination, max_distance.max(0.0));
        let travelled = self.position.distance_to(&next);
        self.position = next;
        travelled
    }
}
