//! Level-based spell caps, proficiency and spell-power estimates.

use serde::Serialize;

use crate::rules::{CasterProgression, KnownSpell, RuleTables};

/// How many spells of each tier a caster may know.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct SpellCaps {
    pub cantrips: usize,
    pub level1: usize,
    pub level2: usize,
    pub level3: usize,
}

impl SpellCaps {
    const fn new(cantrips: usize, level1: usize, level2: usize, level3: usize) -> Self {
        Self {
            cantrips,
            level1,
            level2,
            level3,
        }
    }

    pub fn for_tier(&self, tier: u8) -> usize {
        match tier {
            0 => self.cantrips,
            1 => self.level1,
            2 => self.level2,
            3 => self.level3,
            _ => 0,
        }
    }
}

const MAX_TABLE_LEVEL: u32 = 10;

// Rows are character levels 1..=10.
const FULL_CAPS: [SpellCaps; 10] = [
    SpellCaps::new(3, 2, 0, 0),
    SpellCaps::new(3, 3, 0, 0),
    SpellCaps::new(3, 4, 2, 0),
    SpellCaps::new(4, 4, 3, 0),
    SpellCaps::new(4, 4, 3, 2),
    SpellCaps::new(4, 4, 3, 3),
    SpellCaps::new(4, 4, 3, 3),
    SpellCaps::new(4, 4, 3, 3),
    SpellCaps::new(4, 4, 3, 3),
    SpellCaps::new(5, 4, 3, 3),
];

const HALF_CAPS: [SpellCaps; 10] = [
    SpellCaps::new(0, 0, 0, 0),
    SpellCaps::new(0, 2, 0, 0),
    SpellCaps::new(0, 3, 0, 0),
    SpellCaps::new(0, 3, 2, 0),
    SpellCaps::new(0, 4, 2, 0),
    SpellCaps::new(0, 4, 3, 0),
    SpellCaps::new(0, 4, 3, 0),
    SpellCaps::new(0, 4, 3, 2),
    SpellCaps::new(0, 4, 3, 2),
    SpellCaps::new(0, 4, 3, 2),
];

const THIRD_CAPS: [SpellCaps; 10] = [
    SpellCaps::new(0, 0, 0, 0),
    SpellCaps::new(0, 0, 0, 0),
    SpellCaps::new(0, 2, 0, 0),
    SpellCaps::new(0, 2, 0, 0),
    SpellCaps::new(0, 3, 0, 0),
    SpellCaps::new(0, 3, 2, 0),
    SpellCaps::new(0, 3, 2, 0),
    SpellCaps::new(0, 4, 2, 0),
    SpellCaps::new(0, 4, 2, 0),
    SpellCaps::new(0, 4, 3, 0),
];

/// Caps for `progression` at `level`; levels outside 1..=10 clamp to the table.
pub fn allowed_at_level(progression: CasterProgression, level: u32) -> SpellCaps {
    let row = (level.clamp(1, MAX_TABLE_LEVEL) - 1) as usize;
    match progression {
        CasterProgression::Full => FULL_CAPS[row],
        CasterProgression::Half => HALF_CAPS[row],
        CasterProgression::Third => THIRD_CAPS[row],
        CasterProgression::None => SpellCaps::default(),
    }
}

/// Result of trimming a candidate list to its caps.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TrimmedSpellbook {
    pub spells: Vec<KnownSpell>,
    /// Candidate ids with no entry in the spell table.
    pub unknown: Vec<String>,
}

/// Keep at most `cap(tier)` spells per tier, in candidate order, grouped
/// cantrips first. The tier comes from the spell table, not the candidate
/// entry. Spells above 3rd level are never kept.
pub fn trim_to_caps(
    tables: &RuleTables,
    progression: CasterProgression,
    level: u32,
    candidates: &[KnownSpell],
) -> TrimmedSpellbook {
    let caps = allowed_at_level(progression, level);
    let mut tiers: [Vec<KnownSpell>; 4] = Default::default();
    let mut unknown = Vec::new();

    for ks in candidates {
        let Some(def) = tables.spell(&ks.id) else {
            unknown.push(ks.id.clone());
            continue;
        };
        let tier = def.level as usize;
        if tier > 3 {
            continue;
        }
        if tiers[tier].len() < caps.for_tier(def.level) {
            tiers[tier].push(KnownSpell::new(def.id.clone(), def.level));
        }
    }

    TrimmedSpellbook {
        spells: tiers.into_iter().flatten().collect(),
        unknown,
    }
}

/// 5e proficiency bonus by character level.
pub fn proficiency_for_level(level: u32) -> i32 {
    (2 + (level.max(1) as i32 - 1) / 4).clamp(2, 6)
}

/// Cantrip dice multiplier: 1–4 → ×1, 5–10 → ×2, 11–16 → ×3, 17+ → ×4.
pub fn cantrip_tier(level: u32) -> u32 {
    match level {
        17.. => 4,
        11.. => 3,
        5.. => 2,
        _ => 1,
    }
}

/// Rough slot level available to a caster; half and third casters trail.
pub fn estimated_slot_level(progression: CasterProgression, level: u32) -> u32 {
    let base = match level {
        17.. => 9,
        15.. => 8,
        13.. => 7,
        11.. => 6,
        9.. => 5,
        7.. => 4,
        5.. => 3,
        3.. => 2,
        _ => 1,
    };
    match progression {
        CasterProgression::Full => base,
        CasterProgression::Half => base.saturating_sub(2).clamp(1, 9),
        CasterProgression::Third => base.saturating_sub(3).clamp(1, 9),
        CasterProgression::None => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels_clamp_into_table() {
        assert_eq!(
            allowed_at_level(CasterProgression::Full, 0),
            allowed_at_level(CasterProgression::Full, 1)
        );
        assert_eq!(
            allowed_at_level(CasterProgression::Full, 20),
            SpellCaps::new(5, 4, 3, 3)
        );
        assert_eq!(
            allowed_at_level(CasterProgression::None, 9),
            SpellCaps::default()
        );
    }

    #[test]
    fn proficiency_steps_every_four_levels() {
        assert_eq!(proficiency_for_level(0), 2);
        assert_eq!(proficiency_for_level(4), 2);
        assert_eq!(proficiency_for_level(5), 3);
        assert_eq!(proficiency_for_level(9), 4);
        assert_eq!(proficiency_for_level(17), 6);
        assert_eq!(proficiency_for_level(30), 6);
    }

    #[test]
    fn cantrip_tiers() {
        assert_eq!(cantrip_tier(1), 1);
        assert_eq!(cantrip_tier(4), 1);
        assert_eq!(cantrip_tier(5), 2);
        assert_eq!(cantrip_tier(11), 3);
        assert_eq!(cantrip_tier(17), 4);
    }

    #[test]
    fn slot_estimates_lag_for_partial_casters() {
        assert_eq!(estimated_slot_level(CasterProgression::Full, 5), 3);
        assert_eq!(estimated_slot_level(CasterProgression::Half, 5), 1);
        assert_eq!(estimated_slot_level(CasterProgression::Half, 9), 3);
        assert_eq!(estimated_slot_level(CasterProgression::Third, 9), 2);
        assert_eq!(estimated_slot_level(CasterProgression::Third, 1), 1);
        assert_eq!(estimated_slot_level(CasterProgression::None, 17), 1);
    }
}
