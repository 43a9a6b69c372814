//! Per-activation decision policy.
//!
//! One call to [`take_action`] spends exactly one action of the acting unit.
//! Branches are tried in priority order: wait, spell heal, damage spells
//! (auto-hit, attack roll, save), non-spell heal, weapon attack, move.
//! Every "nearest" or "lowest" pick keeps the first unit in scan order on ties.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::combat::{
    resolve_auto_hit, resolve_save_spell, roll_heal, roll_spell_heal, try_attack,
    try_spell_attack,
};
use crate::combatant::Combatant;
use crate::events::{BattleEvent, EventKind, EventSink};
use crate::rules::{RuleTables, SpellDef};
use crate::RollSource;

/// Allies at or below this HP fraction are worth a healing spell.
pub const SPELL_HEAL_THRESHOLD: f32 = 0.45;
/// Closest a mover will try to stand to its target.
const MIN_STOP_DISTANCE: f32 = 0.1;

/// Category of the action taken, used for pacing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Move,
    Attack,
    Cast,
    Heal,
    Wait,
}

/// The acting unit and the living units on each side, as indices into the
/// battle's unit list in registration order. `allies` includes the actor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Activation {
    pub actor: usize,
    pub allies: Vec<usize>,
    pub enemies: Vec<usize>,
}

impl Activation {
    pub fn new(units: &[Combatant], actor: usize) -> Self {
        let side = units[actor].side();
        let mut allies = Vec::new();
        let mut enemies = Vec::new();
        for (i, u) in units.iter().enumerate() {
            if !u.is_alive() {
                continue;
            }
            if u.side() == side {
                allies.push(i);
            } else {
                enemies.push(i);
            }
        }
        Self {
            actor,
            allies,
            enemies,
        }
    }
}

fn by_f32(a: f32, b: f32) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

fn nearest(units: &[Combatant], from: usize, candidates: &[usize]) -> Option<usize> {
    candidates
        .iter()
        .copied()
        .min_by(|&a, &b| {
            by_f32(
                units[from].distance_to(&units[a]),
                units[from].distance_to(&units[b]),
            )
        })
}

fn most_wounded(units: &[Combatant], candidates: &[usize]) -> Option<usize> {
    candidates
        .iter()
        .copied()
        .min_by(|&a, &b| by_f32(units[a].health_pct(), units[b].health_pct()))
}

/// Lowest-level spell matching `pred`; first in the known list on ties.
fn lowest_level<'a>(
    spells: &[&'a SpellDef],
    pred: impl Fn(&SpellDef) -> bool,
) -> Option<&'a SpellDef> {
    spells
        .iter()
        .copied()
        .filter(|s| pred(s))
        .min_by_key(|s| s.level)
}

fn apply_damage(
    units: &mut [Combatant],
    target: usize,
    damage: i32,
    events: Vec<BattleEvent>,
    sink: &mut dyn EventSink,
) {
    for e in events {
        sink.emit(e);
    }
    if damage > 0 {
        units[target].receive_damage(damage, sink);
    }
}

/// Choose and resolve one action for `activation.actor`.
pub fn take_action(
    units: &mut [Combatant],
    activation: &Activation,
    tables: &RuleTables,
    rng: &mut dyn RollSource,
    sink: &mut dyn EventSink,
) -> ActionKind {
    let actor = activation.actor;
    units[actor].consume_action();
    let kind = decide_and_resolve(units, activation, tables, rng, sink);
    debug!(actor = units[actor].name(), action = ?kind, "action resolved");
    kind
}

fn decide_and_resolve(
    units: &mut [Combatant],
    activation: &Activation,
    tables: &RuleTables,
    rng: &mut dyn RollSource,
    sink: &mut dyn EventSink,
) -> ActionKind {
    let actor = activation.actor;

    if activation.enemies.is_empty() {
        sink.emit(BattleEvent::new(
            EventKind::Wait,
            units[actor].name(),
            format!("{} waits.", units[actor].name()),
        ));
        return ActionKind::Wait;
    }

    if let Some(kind) = try_spells(units, activation, tables, rng, sink) {
        return kind;
    }

    if let Some(heal) = units[actor].stats.heal {
        if let Some(ally) = most_wounded(units, &activation.allies) {
            if units[ally].health_pct() <= heal.threshold {
                if let Some(out) = roll_heal(&units[actor].stats, &units[ally].stats, rng) {
                    for e in out.events {
                        sink.emit(e);
                    }
                    units[ally].receive_heal(out.amount, sink);
                    return ActionKind::Heal;
                }
            }
        }
    }

    if let Some(target) = pick_weapon_target(units, activation) {
        let out = try_attack(&units[actor].stats, &units[target].stats, rng);
        apply_damage(units, target, out.damage, out.events, sink);
        return ActionKind::Attack;
    }

    advance(units, activation, sink);
    ActionKind::Move
}

fn try_spells(
    units: &mut [Combatant],
    activation: &Activation,
    tables: &RuleTables,
    rng: &mut dyn RollSource,
    sink: &mut dyn EventSink,
) -> Option<ActionKind> {
    let actor = activation.actor;
    let stats = &units[actor].stats;
    if !stats.is_caster || stats.known_spells.is_empty() {
        return None;
    }
    let spells: Vec<&SpellDef> = stats
        .known_spells
        .iter()
        .filter_map(|ks| tables.spell(&ks.id))
        .collect();

    if let Some(ally) = most_wounded(units, &activation.allies) {
        if units[ally].health_pct() <= SPELL_HEAL_THRESHOLD {
            let dist = units[actor].distance_to(&units[ally]);
            let heal = spells
                .iter()
                .copied()
                .filter(|s| s.is_heal && s.range >= dist)
                .min_by_key(|s| s.cost());
            if let Some(spell) = heal {
                let out = roll_spell_heal(&units[actor].stats, &units[ally].stats, spell, rng);
                for e in out.events {
                    sink.emit(e);
                }
                units[ally].receive_heal(out.amount, sink);
                return Some(ActionKind::Heal);
            }
        }
    }

    let target = nearest(units, actor, &activation.enemies)?;
    let dist = units[actor].distance_to(&units[target]);

    if let Some(spell) = lowest_level(&spells, |s| s.auto_hit && !s.is_heal) {
        if spell.range >= dist {
            let out = resolve_auto_hit(&units[actor].stats, &units[target].stats, spell, rng);
            apply_damage(units, target, out.damage, out.events, sink);
            return Some(ActionKind::Cast);
        }
    }

    if let Some(spell) = lowest_level(&spells, |s| s.uses_attack_roll && !s.is_heal) {
        if spell.range >= dist {
            let out = try_spell_attack(&units[actor].stats, &units[target].stats, spell, rng);
            apply_damage(units, target, out.damage, out.events, sink);
            return Some(ActionKind::Cast);
        }
    }

    if let Some(spell) = lowest_level(&spells, |s| s.is_save_based() && !s.is_heal) {
        if let (Some(ability), true) = (spell.save, spell.range >= dist) {
            let out = resolve_save_spell(
                &units[actor].stats,
                &units[target].stats,
                spell,
                ability,
                rng,
            );
            apply_damage(units, target, out.damage, out.events, sink);
            return Some(ActionKind::Cast);
        }
    }

    None
}

/// Enemies in weapon range, most wounded first; among equally wounded, the
/// one that nominally hits hardest.
fn pick_weapon_target(units: &[Combatant], activation: &Activation) -> Option<usize> {
    let actor = &units[activation.actor];
    let mut in_range: Vec<usize> = activation
        .enemies
        .iter()
        .copied()
        .filter(|&e| actor.distance_to(&units[e]) <= actor.stats.attack_range)
        .collect();
    in_range.sort_by(|&a, &b| {
        by_f32(units[a].health_pct(), units[b].health_pct()).then_with(|| {
            units[b]
                .stats
                .expected_weapon_damage()
                .cmp(&units[a].stats.expected_weapon_damage())
        })
    });
    in_range.first().copied()
}

fn advance(units: &mut [Combatant], activation: &Activation, sink: &mut dyn EventSink) {
    let actor = activation.actor;
    let Some(target) = nearest(units, actor, &activation.enemies) else {
        return;
    };
    let goal = units[target].position;
    let dir = units[actor].position.direction_to(&goal);
    let stop_at = units[actor].stats.desired_range.max(MIN_STOP_DISTANCE);
    let destination = goal.offset_back(&dir, stop_at);
    let step = units[actor].stats.move_per_action;
    let travelled = units[actor].move_towards(&destination, step);

    let mover = &units[actor];
    sink.emit(
        BattleEvent::new(
            EventKind::Move,
            mover.name(),
            format!(
                "{} moves {:.1} towards {} to {}.",
                mover.name(),
                travelled,
                units[target].name(),
                mover.position
            ),
        )
        .with_target(units[target].name()),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combatant::{CombatantId, Side};
    use crate::rules::KnownSpell;
    use crate::stats::{HealConfig, StatBlock};
    use crate::{Ability, AbilityScores, DamageDice, Dice, Position};

    fn unit(id: usize, name: &str, side: Side, x: f32, stats: StatBlock) -> Combatant {
        let stats = StatBlock {
            display_name: name.into(),
            ..stats
        };
        let mut c = Combatant::new(CombatantId(id), stats, side, Position::new(x, 0.0, 0.0));
        c.init();
        c
    }

    fn spell_tables() -> RuleTables {
        let mut t = RuleTables::new();
        for json in [
            r#"{"id":"cure-wounds","name":"Cure Wounds","level":1,"dice":"1d8","is_heal":true,"range":2}"#,
            r#"{"id":"healing-word","name":"Healing Word","level":1,"dice":"1d4","is_heal":true,"add_ability_to_damage":true,"range":18}"#,
            r#"{"id":"sacred-flame","name":"Sacred Flame","dice":"1d8","save":"dex","range":18}"#,
            r#"{"id":"fire-bolt","name":"Fire Bolt","dice":"1d10","uses_attack_roll":true,"range":36}"#,
            r#"{"id":"magic-missile","name":"Magic Missile","level":1,"dice":"1d4","flat_bonus":1,"darts":3,"auto_hit":true,"range":36}"#,
            r#"{"id":"shocking-grasp","name":"Shocking Grasp","dice":"1d8","uses_attack_roll":true,"range":2}"#,
            r#"{"id":"storm-lance","name":"Storm Lance","level":1,"dice":"2d6","uses_attack_roll":true,"save":"dex","range":36}"#,
        ] {
            t.insert_spell(serde_json::from_str(json).unwrap());
        }
        t
    }

    fn caster(spells: &[&str]) -> StatBlock {
        StatBlock {
            max_hp: 30,
            is_caster: true,
            casting_ability: Some(Ability::Wis),
            abilities: AbilityScores {
                wis: 16,
                ..AbilityScores::default()
            },
            known_spells: spells.iter().map(|s| KnownSpell::new(*s, 0)).collect(),
            ..StatBlock::default()
        }
    }

    #[test]
    fn no_enemies_means_wait() {
        let mut units = vec![unit(0, "Hero", Side::Player, 0.0, StatBlock::default())];
        let act = Activation::new(&units, 0);
        let mut log: Vec<BattleEvent> = Vec::new();
        let kind = take_action(
            &mut units,
            &act,
            &RuleTables::new(),
            &mut Dice::from_seed(1),
            &mut log,
        );
        assert_eq!(kind, ActionKind::Wait);
        assert_eq!(units[0].remaining_actions(), 0);
    }

    #[test]
    fn far_enemy_is_approached_not_attacked() {
        let mut units = vec![
            unit(0, "Hero", Side::Player, 0.0, StatBlock::default()),
            unit(1, "Orc", Side::Enemy, 10.0, StatBlock::default()),
        ];
        let act = Activation::new(&units, 0);
        let mut log: Vec<BattleEvent> = Vec::new();
        let kind = take_action(
            &mut units,
            &act,
            &RuleTables::new(),
            &mut Dice::from_seed(1),
            &mut log,
        );
        assert_eq!(kind, ActionKind::Move);
        assert!((units[0].position.x - 2.5).abs() < 1e-5);
    }

    #[test]
    fn mover_stops_short_of_target() {
        let mut units = vec![
            unit(0, "Hero", Side::Player, 0.0, StatBlock::default()),
            unit(1, "Orc", Side::Enemy, 3.0, StatBlock::default()),
        ];
        // Out of melee range (2.2) but within one step of the standoff point.
        let act = Activation::new(&units, 0);
        take_action(
            &mut units,
            &act,
            &RuleTables::new(),
            &mut Dice::from_seed(1),
            &mut Vec::<BattleEvent>::new(),
        );
        assert!((units[0].position.x - 1.0).abs() < 1e-5);
    }

    #[test]
    fn weapon_attack_prefers_the_most_wounded() {
        let mut units = vec![
            unit(0, "Hero", Side::Player, 0.0, StatBlock::default()),
            unit(1, "Orc A", Side::Enemy, 1.0, StatBlock::default()),
            unit(2, "Orc B", Side::Enemy, 2.0, StatBlock::default()),
        ];
        units[2].receive_damage(5, &mut Vec::<BattleEvent>::new());
        let act = Activation::new(&units, 0);
        let mut log: Vec<BattleEvent> = Vec::new();
        let kind = take_action(
            &mut units,
            &act,
            &RuleTables::new(),
            &mut Dice::from_scripted(vec![20, 6, 6]),
            &mut log,
        );
        assert_eq!(kind, ActionKind::Attack);
        assert_eq!(log[0].target.as_deref(), Some("Orc B"));
        assert!(!units[2].is_alive());
    }

    #[test]
    fn cheapest_heal_in_range_goes_to_the_most_wounded() {
        let mut units = vec![
            unit(0, "Cleric", Side::Player, 0.0, caster(&["cure-wounds", "healing-word"])),
            unit(1, "Fighter", Side::Player, 5.0, StatBlock { max_hp: 20, ..StatBlock::default() }),
            unit(2, "Orc", Side::Enemy, 30.0, StatBlock::default()),
        ];
        units[1].receive_damage(15, &mut Vec::<BattleEvent>::new());
        let act = Activation::new(&units, 0);
        let mut log: Vec<BattleEvent> = Vec::new();
        let kind = take_action(
            &mut units,
            &act,
            &spell_tables(),
            &mut Dice::from_scripted(vec![3]),
            &mut log,
        );
        // Cure Wounds is cheaper by dice but cannot reach 5 units away.
        assert_eq!(kind, ActionKind::Heal);
        assert!(log[0].text.contains("Healing Word"));
        assert_eq!(units[1].current_hp(), 5 + 3 + 3);
    }

    #[test]
    fn attack_roll_spells_come_before_save_spells() {
        let mut units = vec![
            unit(0, "Cleric", Side::Player, 0.0, caster(&["sacred-flame", "fire-bolt"])),
            unit(1, "Orc", Side::Enemy, 10.0, StatBlock::default()),
        ];
        let act = Activation::new(&units, 0);
        let mut log: Vec<BattleEvent> = Vec::new();
        let kind = take_action(
            &mut units,
            &act,
            &spell_tables(),
            &mut Dice::from_scripted(vec![1]),
            &mut log,
        );
        assert_eq!(kind, ActionKind::Cast);
        assert!(log[0].text.contains("Fire Bolt"));
    }

    #[test]
    fn auto_hit_spells_come_first() {
        let mut units = vec![
            unit(
                0,
                "Wizard",
                Side::Player,
                0.0,
                caster(&["fire-bolt", "sacred-flame", "magic-missile"]),
            ),
            unit(1, "Orc", Side::Enemy, 10.0, StatBlock::default()),
        ];
        let act = Activation::new(&units, 0);
        let mut log: Vec<BattleEvent> = Vec::new();
        let kind = take_action(
            &mut units,
            &act,
            &spell_tables(),
            &mut Dice::from_scripted(vec![1]),
            &mut log,
        );
        assert_eq!(kind, ActionKind::Cast);
        assert!(log[0].text.contains("Magic Missile"));
        // Three darts of 1d4+1, each rolling a 1.
        assert_eq!(units[1].current_hp(), units[1].stats.max_hp - 6);
    }

    #[test]
    fn save_tier_includes_spells_that_also_roll_to_hit() {
        let mut units = vec![
            unit(0, "Druid", Side::Player, 0.0, caster(&["shocking-grasp", "storm-lance"])),
            unit(1, "Orc", Side::Enemy, 10.0, StatBlock::default()),
        ];
        let act = Activation::new(&units, 0);
        let mut log: Vec<BattleEvent> = Vec::new();
        // Shocking Grasp is the lowest attack-roll spell but cannot reach.
        let kind = take_action(
            &mut units,
            &act,
            &spell_tables(),
            &mut Dice::from_scripted(vec![1]),
            &mut log,
        );
        assert_eq!(kind, ActionKind::Cast);
        assert!(log.iter().any(|e| e.text.contains("Storm Lance")));
    }

    #[test]
    fn non_spell_heal_respects_threshold() {
        let medic = StatBlock {
            max_hp: 20,
            heal: Some(HealConfig {
                dice: DamageDice::new(1, 4),
                threshold: 0.5,
            }),
            ..StatBlock::default()
        };
        let mut units = vec![
            unit(0, "Medic", Side::Player, 0.0, medic),
            unit(1, "Orc", Side::Enemy, 10.0, StatBlock::default()),
        ];
        units[0].receive_damage(9, &mut Vec::<BattleEvent>::new());
        let act = Activation::new(&units, 0);
        let kind = take_action(
            &mut units,
            &act,
            &RuleTables::new(),
            &mut Dice::from_seed(3),
            &mut Vec::<BattleEvent>::new(),
        );
        assert_eq!(kind, ActionKind::Move);

        units[0].begin_turn();
        units[0].receive_damage(1, &mut Vec::<BattleEvent>::new());
        let act = Activation::new(&units, 0);
        let kind = take_action(
            &mut units,
            &act,
            &RuleTables::new(),
            &mut Dice::from_scripted(vec![4]),
            &mut Vec::<BattleEvent>::new(),
        );
        assert_eq!(kind, ActionKind::Heal);
        assert_eq!(units[0].current_hp(), 14);
    }
}
