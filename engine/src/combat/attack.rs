use crate::combat::spells::{scaled_params, ScaledSpell};
use crate::events::{BattleEvent, EventKind};
use crate::rules::SpellDef;
use crate::stats::StatBlock;
use crate::{format_modifier, roll_pool, DicePool, RollSource};

/// Result of a d20 attack (weapon or spell) and the damage it dealt.
#[derive(Debug, Clone, PartialEq)]
pub struct AttackOutcome {
    pub roll: i32,
    pub bonus: i32,
    pub total: i32,
    pub ac: i32,
    pub hit: bool,
    pub critical: bool,
    /// 0 on a miss, otherwise at least 1.
    pub damage: i32,
    /// Log lines describing the roll, in the order they happened.
    pub events: Vec<BattleEvent>,
}

struct AttackRoll {
    roll: i32,
    total: i32,
    hit: bool,
    critical: bool,
}

/// Natural 20 always hits and crits; otherwise `d20 + bonus >= ac`.
fn roll_to_hit(rng: &mut dyn RollSource, bonus: i32, ac: i32) -> AttackRoll {
    let roll = rng.roll_die(20);
    let total = roll + bonus;
    let critical = roll == 20;
    AttackRoll {
        roll,
        total,
        hit: critical || total >= ac,
        critical,
    }
}

fn verdict(hit: bool, critical: bool) -> &'static str {
    match (hit, critical) {
        (true, true) => "HIT (CRIT!)",
        (true, false) => "HIT",
        _ => "MISS",
    }
}

/// Roll `count`d`sides`, and on a crit roll the same pool a second time.
fn roll_damage_dice(
    rng: &mut dyn RollSource,
    count: u32,
    sides: u32,
    critical: bool,
) -> (DicePool, Option<DicePool>) {
    let base = roll_pool(rng, count, sides);
    let extra = critical.then(|| roll_pool(rng, count, sides));
    (base, extra)
}

/// Weapon attack of `attacker` against `defender`.
///
/// Critical hits double the dice rolled, never the flat damage bonus.
pub fn try_attack(
    attacker: &StatBlock,
    defender: &StatBlock,
    rng: &mut dyn RollSource,
) -> AttackOutcome {
    let ability = attacker.weapon_ability();
    let ability_mod = attacker.weapon_ability_mod();
    let prof = attacker.proficiency_bonus;
    let bonus = ability_mod + prof;
    let ac = defender.armour_class;
    let atk = roll_to_hit(rng, bonus, ac);
    let weapon = attacker.weapon_label();

    let mut events = vec![BattleEvent::new(
        EventKind::Attack,
        &attacker.display_name,
        format!(
            "{} attacks {} with {}: d20={} + ({} mod {} + prof {}) = total {} vs AC {} => {}",
            attacker.display_name,
            defender.display_name,
            weapon,
            atk.roll,
            ability.label(),
            format_modifier(ability_mod),
            prof,
            atk.total,
            ac,
            verdict(atk.hit, atk.critical)
        ),
    )
    .with_target(&defender.display_name)
    .with_amount(atk.total)];

    let mut outcome = AttackOutcome {
        roll: atk.roll,
        bonus,
        total: atk.total,
        ac,
        hit: atk.hit,
        critical: atk.critical,
        damage: 0,
        events: Vec::new(),
    };
    if !atk.hit {
        outcome.events = events;
        return outcome;
    }

    let dice = attacker.damage;
    let (base, extra) = roll_damage_dice(rng, dice.count, dice.sides, atk.critical);
    if let Some(extra) = &extra {
        events.push(BattleEvent::new(
            EventKind::Critical,
            &attacker.display_name,
            format!(
                "Critical! Extra {} dice: [{}] = {}",
                dice,
                extra.csv(),
                extra.total
            ),
        ));
    }
    let crit_total = extra.as_ref().map_or(0, |p| p.total);
    let damage = (base.total + crit_total + attacker.damage_bonus).max(1);

    let notation = if attacker.damage_bonus != 0 {
        format!("{}{}", dice, format_modifier(attacker.damage_bonus))
    } else {
        dice.to_string()
    };
    let crit_note = if atk.critical {
        format!(" + crit [{}]", crit_total)
    } else {
        String::new()
    };
    events.push(
        BattleEvent::new(
            EventKind::Attack,
            &attacker.display_name,
            format!(
                "{} hits {} with {} for {} {} dmg ({}; rolls [{}]{}).",
                attacker.display_name,
                defender.display_name,
                weapon,
                damage,
                attacker.damage_type,
                notation,
                base.csv(),
                crit_note
            ),
        )
        .with_target(&defender.display_name)
        .with_amount(damage),
    );

    outcome.damage = damage;
    outcome.events = events;
    outcome
}

/// Spell attack roll (Fire Bolt, Guiding Bolt...) against the target's AC.
///
/// Multi-ray spells share one attack roll; every ray rolls the scaled dice
/// pool, and a crit doubles each pool.
pub fn try_spell_attack(
    caster: &StatBlock,
    target: &StatBlock,
    spell: &SpellDef,
    rng: &mut dyn RollSource,
) -> AttackOutcome {
    let bonus = caster.spell_attack_bonus();
    let ac = target.armour_class;
    let atk = roll_to_hit(rng, bonus, ac);

    let mut events = vec![BattleEvent::new(
        EventKind::Spell,
        &caster.display_name,
        format!(
            "{} casts {} at {}: d20={} + spell atk {} = {} vs AC {} => {}",
            caster.display_name,
            spell.name,
            target.display_name,
            atk.roll,
            bonus,
            atk.total,
            ac,
            verdict(atk.hit, atk.critical)
        ),
    )
    .with_target(&target.display_name)
    .with_amount(atk.total)];

    let mut outcome = AttackOutcome {
        roll: atk.roll,
        bonus,
        total: atk.total,
        ac,
        hit: atk.hit,
        critical: atk.critical,
        damage: 0,
        events: Vec::new(),
    };
    if !atk.hit {
        outcome.events = events;
        return outcome;
    }

    let ScaledSpell { dice, flat, darts } = scaled_params(caster, spell);
    let darts = darts.max(1);
    let mut rolled = Vec::new();
    let mut dice_total = 0;
    let mut crit_total = 0;
    for _ in 0..darts {
        let (base, extra) = roll_damage_dice(rng, dice.count, dice.sides, atk.critical);
        dice_total += base.total;
        rolled.push(base.csv());
        if let Some(extra) = extra {
            crit_total += extra.total;
        }
    }
    if atk.critical {
        events.push(BattleEvent::new(
            EventKind::Critical,
            &caster.display_name,
            format!("Critical! Extra {} x{} = {}", dice, darts, crit_total),
        ));
    }

    let ability_bonus = if spell.add_ability_to_damage {
        caster.casting_mod()
    } else {
        0
    };
    let damage = (dice_total + crit_total + ability_bonus + flat * darts as i32).max(1);

    let mut notation = dice.to_string();
    if ability_bonus != 0 {
        notation.push_str(&format_modifier(ability_bonus));
    }
    if flat != 0 {
        notation.push_str(&format_modifier(flat));
    }
    if darts > 1 {
        notation.push_str(&format!(" x{}", darts));
    }
    events.push(
        BattleEvent::new(
            EventKind::Spell,
            &caster.display_name,
            format!(
                "{} hits {} with {} for {} {} dmg ({}; rolls [{}]{}).",
                caster.display_name,
                target.display_name,
                spell.name,
                damage,
                spell.damage_type,
                notation,
                rolled.join(" | "),
                if atk.critical {
                    format!(" + crit [{}]", crit_total)
                } else {
                    String::new()
                }
            ),
        )
        .with_target(&target.display_name)
        .with_amount(damage),
    );

    outcome.damage = damage;
    outcome.events = events;
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AbilityScores, DamageDice, Dice};

    fn fighter() -> StatBlock {
        StatBlock {
            display_name: "Fighter".into(),
            abilities: AbilityScores {
                str_: 16,
                ..AbilityScores::default()
            },
            damage: DamageDice::new(1, 8),
            damage_bonus: 3,
            ..StatBlock::default()
        }
    }

    fn target(ac: i32) -> StatBlock {
        StatBlock {
            display_name: "Dummy".into(),
            armour_class: ac,
            ..StatBlock::default()
        }
    }

    #[test]
    fn miss_deals_nothing_and_rolls_no_damage() {
        let mut dice = Dice::from_scripted(vec![2, 8]);
        let out = try_attack(&fighter(), &target(18), &mut dice);
        assert!(!out.hit);
        assert_eq!(out.damage, 0);
        assert_eq!(out.events.len(), 1);
        // Next roll is still the unused 8.
        assert_eq!(dice.roll_die(8), 8);
    }

    #[test]
    fn natural_twenty_hits_any_armour() {
        let mut dice = Dice::from_scripted(vec![20, 4, 5]);
        let out = try_attack(&fighter(), &target(40), &mut dice);
        assert!(out.hit && out.critical);
        assert_eq!(out.damage, 4 + 5 + 3);
    }

    #[test]
    fn negative_bonus_still_deals_one() {
        let mut weak = fighter();
        weak.damage_bonus = -4;
        let mut dice = Dice::from_scripted(vec![19, 1]);
        let out = try_attack(&weak, &target(10), &mut dice);
        assert!(out.hit);
        assert_eq!(out.damage, 1);
    }

    #[test]
    fn spell_crit_doubles_dice_but_not_the_ability_bonus() {
        let spell: SpellDef = serde_json::from_str(
            r#"{"id":"divine-bolt","name":"Divine Bolt","dice":"1d10","uses_attack_roll":true,"add_ability_to_damage":true,"range":18}"#,
        )
        .unwrap();
        let caster = StatBlock {
            display_name: "Cleric".into(),
            is_caster: true,
            casting_ability: Some(crate::Ability::Wis),
            abilities: AbilityScores {
                wis: 16,
                ..AbilityScores::default()
            },
            ..StatBlock::default()
        };
        let mut dice = Dice::from_scripted(vec![20, 3, 7]);
        let out = try_spell_attack(&caster, &target(40), &spell, &mut dice);
        assert!(out.hit && out.critical);
        assert_eq!(out.damage, 3 + 7 + 3);
        assert!(out.events.iter().any(|e| e.kind == EventKind::Critical));
    }
}
