use crate::stats::StatBlock;
use crate::{Ability, RollSource};

/// A d20 check against a fixed difficulty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckInput {
    pub dc: i32,
    pub modifier: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckResult {
    pub roll: i32,
    pub total: i32,
    pub dc: i32,
    pub passed: bool,
}

/// Roll d20 + modifier; meeting the DC passes.
pub fn check(rng: &mut dyn RollSource, input: CheckInput) -> CheckResult {
    let roll = rng.roll_die(20);
    let total = roll + input.modifier;
    CheckResult {
        roll,
        total,
        dc: input.dc,
        passed: total >= input.dc,
    }
}

/// Saving throw of `target` with `ability` against `dc`. No save proficiencies
/// are modelled; the bare ability modifier applies.
pub fn saving_throw(
    rng: &mut dyn RollSource,
    target: &StatBlock,
    ability: Ability,
    dc: i32,
) -> CheckResult {
    check(
        rng,
        CheckInput {
            dc,
            modifier: target.ability_mod(ability),
        },
    )
}
