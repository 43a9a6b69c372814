use crate::error::ConfigWarning;
use crate::rules::RuleTables;
use crate::stats::{StatBlock, MELEE_RANGE, RANGED_RANGE, REACH_RANGE};

const SHIELD_AC: i32 = 2;

/// Equip `weapon_id` on `stats`.
///
/// A shield forces one-handed use and, when the resulting weapon is melee,
/// adds +2 AC. An unknown weapon leaves the weapon stats untouched and yields
/// a warning. An empty id means the unit fights with its base dice.
pub fn equip_weapon(
    mut stats: StatBlock,
    tables: &RuleTables,
    weapon_id: &str,
    two_hands: bool,
    shield: bool,
) -> (StatBlock, Option<ConfigWarning>) {
    let two_hands = two_hands && !shield;
    let mut warning = None;

    if !weapon_id.trim().is_empty() {
        match tables.weapon(weapon_id) {
            Some(w) => {
                let versatile = w.versatile.filter(|_| two_hands);
                stats.damage = versatile.unwrap_or(w.dice);
                stats.weapon_id = w.id.clone();
                stats.weapon_name = w.name.clone();
                stats.damage_type = w.damage_type.to_string();
                stats.is_ranged = w.ranged;
                stats.finesse = w.finesse;
                stats.using_two_hands = w.two_handed || versatile.is_some();
                stats.attack_range = if w.ranged {
                    RANGED_RANGE
                } else if w.reach {
                    REACH_RANGE
                } else {
                    MELEE_RANGE
                };
            }
            None => {
                warning = Some(ConfigWarning::UnknownWeapon {
                    unit: stats.display_name.clone(),
                    weapon_id: weapon_id.to_string(),
                });
            }
        }
    }

    if shield && !stats.is_ranged {
        stats.armour_class += SHIELD_AC;
    }
    (stats, warning)
}

/// Damage bonus follows the attack ability: DEX for ranged, the better of
/// STR/DEX for finesse, STR otherwise.
pub fn derive_damage_bonus(mut stats: StatBlock) -> StatBlock {
    stats.damage_bonus = stats.weapon_ability_mod();
    stats
}
