//! Battle log records and the sink they are written to.
//!
//! The engine never prints. Every resolved step becomes a [`BattleEvent`] handed
//! to an [`EventSink`]; how (or whether) it is displayed is up to the caller.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Setup,
    Warning,
    Initiative,
    Round,
    Turn,
    Attack,
    Critical,
    Damage,
    Spell,
    Save,
    Heal,
    Move,
    Wait,
    Slain,
    Victory,
}

impl EventKind {
    pub fn tag(&self) -> &'static str {
        match self {
            EventKind::Setup => "SETUP",
            EventKind::Warning => "WARN",
            EventKind::Initiative => "INIT",
            EventKind::Round => "ROUND",
            EventKind::Turn => "TURN",
            EventKind::Attack => "ATTACK",
            EventKind::Critical => "CRIT",
            EventKind::Damage => "DMG",
            EventKind::Spell => "SPELL",
            EventKind::Save => "SAVE",
            EventKind::Heal => "HEAL",
            EventKind::Move => "MOVE",
            EventKind::Wait => "WAIT",
            EventKind::Slain => "SLAIN",
            EventKind::Victory => "END",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattleEvent {
    pub round: u32,
    pub kind: EventKind,
    pub actor: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    /// Headline number of the event: damage, healing, a roll total...
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<i32>,
    pub text: String,
}

impl BattleEvent {
    pub fn new(kind: EventKind, actor: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            round: 0,
            kind,
            actor: actor.into(),
            target: None,
            amount: None,
            text: text.into(),
        }
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn with_amount(mut self, amount: i32) -> Self {
        self.amount = Some(amount);
        self
    }

    pub fn in_round(mut self, round: u32) -> Self {
        self.round = round;
        self
    }
}

impl fmt::Display for BattleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind.tag(), self.text)
    }
}

pub trait EventSink {
    fn emit(&mut self, event: BattleEvent);
}

impl EventSink for Vec<BattleEvent> {
    fn emit(&mut self, event: BattleEvent) {
        self.push(event);
    }
}

/// Forwards every event to a callback, e.g. a live UI log.
pub struct Observer<F>(pub F);

impl<F: FnMut(&BattleEvent)> EventSink for Observer<F> {
    fn emit(&mut self, event: BattleEvent) {
        (self.0)(&event);
    }
}

/// Records events while stamping the current round and forwarding them to an
/// optional observer.
pub struct EventLog<'a> {
    round: u32,
    events: Vec<BattleEvent>,
    observer: Option<&'a mut dyn EventSink>,
}

impl<'a> EventLog<'a> {
    pub fn new(observer: Option<&'a mut dyn EventSink>) -> Self {
        Self {
            round: 0,
            events: Vec::new(),
            observer,
        }
    }

    pub fn set_round(&mut self, round: u32) {
        self.round = round;
    }

    pub fn events(&self) -> &[BattleEvent] {
        &self.events
    }

    pub fn into_events(self) -> Vec<BattleEvent> {
        self.events
    }
}

impl EventSink for EventLog<'_> {
    fn emit(&mut self, event: BattleEvent) {
        let event = event.in_round(self.round);
        if let Some(observer) = self.observer.as_deref_mut() {
            observer.emit(event.clone());
        }
        self.events.push(event);
    }
}
