use crate::checks::{saving_throw, CheckResult};
use crate::events::{BattleEvent, EventKind};
use crate::rules::SpellDef;
use crate::spellbook::{cantrip_tier, estimated_slot_level};
use crate::stats::StatBlock;
use crate::{format_modifier, roll_pool, Ability, DamageDice, RollSource};

/// Spell numbers after level scaling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScaledSpell {
    pub dice: DamageDice,
    pub flat: i32,
    pub darts: u32,
}

/// Scale `spell` for `caster`.
///
/// Cantrips multiply their dice count by the character-level tier. Leveled
/// spells flagged `scales_with_slot` gain their per-slot extras for every
/// estimated slot level above the spell's own level.
pub fn scaled_params(caster: &StatBlock, spell: &SpellDef) -> ScaledSpell {
    let mut scaled = ScaledSpell {
        dice: spell.dice,
        flat: spell.flat_bonus,
        darts: spell.darts,
    };

    if spell.level == 0 {
        if spell.cantrip_scales_dice {
            scaled.dice.count = scaled.dice.count.saturating_mul(cantrip_tier(caster.level));
        }
    } else if spell.scales_with_slot {
        let slot = estimated_slot_level(caster.progression, caster.level);
        let above = slot.saturating_sub(u32::from(spell.level));
        scaled.darts = scaled
            .darts
            .saturating_add(spell.extra_darts_per_slot.saturating_mul(above));
        scaled.dice.count = scaled
            .dice
            .count
            .saturating_add(spell.extra_dice_per_slot.saturating_mul(above));
        scaled.flat += spell.extra_flat_per_slot * above as i32;
    }
    scaled
}

/// Damage of a spell that landed without an attack roll.
#[derive(Debug, Clone, PartialEq)]
pub struct SpellHit {
    pub damage: i32,
    pub events: Vec<BattleEvent>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SaveOutcome {
    pub save: CheckResult,
    /// Damage before any halving.
    pub rolled: i32,
    pub damage: i32,
    pub events: Vec<BattleEvent>,
}

struct DartRolls {
    total: i32,
    faces: Vec<String>,
}

/// Roll the scaled dice pool once per dart, adding the flat bonus per dart.
fn roll_darts(rng: &mut dyn RollSource, scaled: &ScaledSpell) -> DartRolls {
    let mut out = DartRolls {
        total: 0,
        faces: Vec::new(),
    };
    for _ in 0..scaled.darts.max(1) {
        let pool = roll_pool(rng, scaled.dice.count, scaled.dice.sides);
        out.total += pool.total + scaled.flat;
        out.faces.push(pool.csv());
    }
    out
}

fn ability_bonus(caster: &StatBlock, spell: &SpellDef) -> i32 {
    if spell.add_ability_to_damage {
        caster.casting_mod()
    } else {
        0
    }
}

fn notation(scaled: &ScaledSpell, ability_bonus: i32) -> String {
    let mut s = scaled.dice.to_string();
    if scaled.flat != 0 {
        s.push_str(&format_modifier(scaled.flat));
    }
    if scaled.darts > 1 {
        s = format!("{} x{}", s, scaled.darts);
    }
    if ability_bonus != 0 {
        s.push_str(&format!(" {}", format_modifier(ability_bonus)));
    }
    s
}

/// Auto-hit spells (Magic Missile and kin) always land; every dart rolls
/// separately.
pub fn resolve_auto_hit(
    caster: &StatBlock,
    target: &StatBlock,
    spell: &SpellDef,
    rng: &mut dyn RollSource,
) -> SpellHit {
    let scaled = scaled_params(caster, spell);
    let rolls = roll_darts(rng, &scaled);
    let bonus = ability_bonus(caster, spell);
    let damage = (rolls.total + bonus).max(1);

    let event = BattleEvent::new(
        EventKind::Spell,
        &caster.display_name,
        format!(
            "{} casts {} at {}: {} {} dmg ({}; rolls [{}]).",
            caster.display_name,
            spell.name,
            target.display_name,
            damage,
            spell.damage_type,
            notation(&scaled, bonus),
            rolls.faces.join(" | ")
        ),
    )
    .with_target(&target.display_name)
    .with_amount(damage);

    SpellHit {
        damage,
        events: vec![event],
    }
}

/// The target saves first; the damage dice are rolled either way.
pub fn resolve_save_spell(
    caster: &StatBlock,
    target: &StatBlock,
    spell: &SpellDef,
    save_ability: Ability,
    rng: &mut dyn RollSource,
) -> SaveOutcome {
    let dc = caster.spell_save_dc();
    let save = saving_throw(rng, target, save_ability, dc);
    let scaled = scaled_params(caster, spell);
    let rolls = roll_darts(rng, &scaled);
    let bonus = ability_bonus(caster, spell);
    let rolled = rolls.total + bonus;

    let damage = match (save.passed, spell.half_on_save) {
        (false, _) => rolled.max(1),
        (true, true) => (rolled / 2).max(1),
        (true, false) => 0,
    };

    let mut events = vec![BattleEvent::new(
        EventKind::Save,
        &target.display_name,
        format!(
            "{} casts {} on {}: {} save d20={} {} = {} vs DC {} => {}",
            caster.display_name,
            spell.name,
            target.display_name,
            save_ability.label(),
            save.roll,
            format_modifier(target.ability_mod(save_ability)),
            save.total,
            dc,
            if save.passed { "SAVED" } else { "FAILED" }
        ),
    )
    .with_target(&target.display_name)
    .with_amount(save.total)];

    let effect = if damage == 0 {
        format!("{} shrugs off {}.", target.display_name, spell.name)
    } else {
        format!(
            "{} takes {} {} dmg from {} ({}; rolls [{}]{}).",
            target.display_name,
            damage,
            spell.damage_type,
            spell.name,
            notation(&scaled, bonus),
            rolls.faces.join(" | "),
            if save.passed { ", halved" } else { "" }
        )
    };
    events.push(
        BattleEvent::new(EventKind::Spell, &caster.display_name, effect)
            .with_target(&target.display_name)
            .with_amount(damage),
    );

    SaveOutcome {
        save,
        rolled,
        damage,
        events,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::CasterProgression;
    use crate::{AbilityScores, Dice};

    fn spell(json: &str) -> SpellDef {
        serde_json::from_str(json).unwrap()
    }

    fn caster(level: u32, progression: CasterProgression) -> StatBlock {
        StatBlock {
            display_name: "Mage".into(),
            level,
            progression,
            is_caster: true,
            casting_ability: Some(Ability::Int),
            proficiency_bonus: 3,
            abilities: AbilityScores {
                int_: 16,
                ..AbilityScores::default()
            },
            ..StatBlock::default()
        }
    }

    #[test]
    fn cantrip_dice_follow_level_tier() {
        let bolt = spell(r#"{"id":"fire-bolt","name":"Fire Bolt","dice":"1d10"}"#);
        let s = scaled_params(&caster(5, CasterProgression::Full), &bolt);
        assert_eq!(s.dice, DamageDice::new(2, 10));
        let s = scaled_params(&caster(17, CasterProgression::Full), &bolt);
        assert_eq!(s.dice, DamageDice::new(4, 10));
    }

    #[test]
    fn oversized_dice_saturate_when_scaled() {
        let mut bolt = spell(r#"{"id":"fire-bolt","name":"Fire Bolt","dice":"1d10"}"#);
        bolt.dice = DamageDice::new(u32::MAX / 2, 10);
        let s = scaled_params(&caster(17, CasterProgression::Full), &bolt);
        assert_eq!(s.dice.count, u32::MAX);
    }

    #[test]
    fn leveled_spells_scale_only_when_flagged() {
        let missile = spell(
            r#"{"id":"magic-missile","name":"Magic Missile","level":1,"dice":"1d4",
                "flat_bonus":1,"darts":3,"auto_hit":true,
                "scales_with_slot":true,"extra_darts_per_slot":1}"#,
        );
        // Full caster at level 5 estimates 3rd-level slots: two above.
        let s = scaled_params(&caster(5, CasterProgression::Full), &missile);
        assert_eq!(s.darts, 5);
        // Half caster at 5 trails to 1st-level slots.
        let s = scaled_params(&caster(5, CasterProgression::Half), &missile);
        assert_eq!(s.darts, 3);

        let mut fixed = missile.clone();
        fixed.scales_with_slot = false;
        let s = scaled_params(&caster(9, CasterProgression::Full), &fixed);
        assert_eq!(s.darts, 3);
    }

    #[test]
    fn auto_hit_adds_flat_per_dart() {
        let missile = spell(
            r#"{"id":"magic-missile","name":"Magic Missile","level":1,"dice":"1d4",
                "flat_bonus":1,"darts":3,"auto_hit":true}"#,
        );
        let mut dice = Dice::from_scripted(vec![2, 3, 4]);
        let hit = resolve_auto_hit(
            &caster(1, CasterProgression::Full),
            &StatBlock::default(),
            &missile,
            &mut dice,
        );
        assert_eq!(hit.damage, (2 + 1) + (3 + 1) + (4 + 1));
    }

    #[test]
    fn successful_save_halves_or_negates() {
        let fireball = spell(
            r#"{"id":"fireball","name":"Fireball","level":3,"dice":"8d6",
                "save":"dex","half_on_save":true,"damage_type":"fire"}"#,
        );
        let target = StatBlock::default();
        // d20 = 20 saves, then eight dice of 3.
        let mut dice = Dice::from_scripted(vec![20, 3, 3, 3, 3, 3, 3, 3, 3]);
        let out = resolve_save_spell(
            &caster(5, CasterProgression::Full),
            &target,
            &fireball,
            Ability::Dex,
            &mut dice,
        );
        assert!(out.save.passed);
        assert_eq!(out.rolled, 24);
        assert_eq!(out.damage, 12);

        let mut no_half = fireball.clone();
        no_half.half_on_save = false;
        let mut dice = Dice::from_scripted(vec![20, 3]);
        let out = resolve_save_spell(
            &caster(5, CasterProgression::Full),
            &target,
            &no_half,
            Ability::Dex,
            &mut dice,
        );
        assert_eq!(out.damage, 0);
    }

    #[test]
    fn failed_save_takes_everything() {
        let sacred = spell(
            r#"{"id":"sacred-flame","name":"Sacred Flame","dice":"1d8",
                "save":"dex","damage_type":"radiant"}"#,
        );
        let mut dice = Dice::from_scripted(vec![1, 6]);
        let out = resolve_save_spell(
            &caster(1, CasterProgression::Full),
            &StatBlock::default(),
            &sacred,
            Ability::Dex,
            &mut dice,
        );
        assert!(!out.save.passed);
        assert_eq!(out.damage, 6);
    }
}
