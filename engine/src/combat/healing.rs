use crate::combat::spells::scaled_params;
use crate::events::{BattleEvent, EventKind};
use crate::rules::SpellDef;
use crate::stats::StatBlock;
use crate::{format_modifier, roll_pool, RollSource};

#[derive(Debug, Clone, PartialEq)]
pub struct HealOutcome {
    /// Always at least 1.
    pub amount: i32,
    pub events: Vec<BattleEvent>,
}

/// Non-spell healing with the healer's own heal dice. `None` when the
/// healer has no heal configured.
pub fn roll_heal(
    healer: &StatBlock,
    target: &StatBlock,
    rng: &mut dyn RollSource,
) -> Option<HealOutcome> {
    let heal = healer.heal?;
    let pool = roll_pool(rng, heal.dice.count, heal.dice.sides);
    let amount = pool.total.max(1);
    let event = BattleEvent::new(
        EventKind::Heal,
        &healer.display_name,
        format!(
            "{} heals {} for {} ({}; rolls [{}]).",
            healer.display_name,
            target.display_name,
            amount,
            heal.dice,
            pool.csv()
        ),
    )
    .with_target(&target.display_name)
    .with_amount(amount);
    Some(HealOutcome {
        amount,
        events: vec![event],
    })
}

/// Healing spell: scaled dice plus flat bonus, plus the casting modifier
/// (never proficiency) when the spell asks for it.
pub fn roll_spell_heal(
    caster: &StatBlock,
    target: &StatBlock,
    spell: &SpellDef,
    rng: &mut dyn RollSource,
) -> HealOutcome {
    let scaled = scaled_params(caster, spell);
    let mut total = 0;
    let mut faces = Vec::new();
    for _ in 0..scaled.darts.max(1) {
        let pool = roll_pool(rng, scaled.dice.count, scaled.dice.sides);
        total += pool.total + scaled.flat;
        faces.push(pool.csv());
    }
    let ability = if spell.add_ability_to_damage {
        caster.casting_mod()
    } else {
        0
    };
    let amount = (total + ability).max(1);

    let mut notation = scaled.dice.to_string();
    if scaled.flat != 0 {
        notation.push_str(&format_modifier(scaled.flat));
    }
    if ability != 0 {
        notation.push_str(&format_modifier(ability));
    }
    let event = BattleEvent::new(
        EventKind::Heal,
        &caster.display_name,
        format!(
            "{} casts {} on {}: heals {} ({}; rolls [{}]).",
            caster.display_name,
            spell.name,
            target.display_name,
            amount,
            notation,
            faces.join(" | ")
        ),
    )
    .with_target(&target.display_name)
    .with_amount(amount);

    HealOutcome {
        amount,
        events: vec![event],
    }
}
