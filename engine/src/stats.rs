use serde::{Deserialize, Serialize};

use crate::rules::{CasterProgression, ClassId, KnownSpell};
use crate::{Ability, AbilityScores, DamageDice};

pub const MELEE_RANGE: f32 = 2.2;
pub const REACH_RANGE: f32 = 3.5;
pub const RANGED_RANGE: f32 = 7.0;
/// Attack range of a ranged template before any weapon is equipped.
pub const UNEQUIPPED_RANGED_RANGE: f32 = 6.5;

/// Non-spell healing: roll `dice` on an ally at or below `threshold` HP.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HealConfig {
    pub dice: DamageDice,
    #[serde(default = "default_heal_threshold")]
    pub threshold: f32,
}

fn default_heal_threshold() -> f32 {
    0.4
}

/// Static combat profile of a combatant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatBlock {
    pub display_name: String,
    pub max_hp: i32,
    pub armour_class: i32,

    pub damage: DamageDice,
    pub damage_bonus: i32,
    pub attack_range: f32,
    pub actions_per_turn: u32,
    pub initiative_bonus: i32,

    pub heal: Option<HealConfig>,

    pub move_per_action: f32,
    pub desired_range: f32,

    pub abilities: AbilityScores,
    pub proficiency_bonus: i32,
    pub level: u32,

    pub weapon_id: String,
    pub weapon_name: String,
    /// Damage type named in attack logs.
    pub damage_type: String,
    pub is_ranged: bool,
    pub finesse: bool,
    pub using_two_hands: bool,

    pub is_caster: bool,
    pub casting_ability: Option<Ability>,
    pub class_id: ClassId,
    pub progression: CasterProgression,
    pub known_spells: Vec<KnownSpell>,
}

impl Default for StatBlock {
    fn default() -> Self {
        Self {
            display_name: "Unit".to_string(),
            max_hp: 10,
            armour_class: 12,
            damage: DamageDice::new(1, 6),
            damage_bonus: 0,
            attack_range: MELEE_RANGE,
            actions_per_turn: 1,
            initiative_bonus: 2,
            heal: None,
            move_per_action: 2.5,
            desired_range: 2.0,
            abilities: AbilityScores::default(),
            proficiency_bonus: 2,
            level: 1,
            weapon_id: String::new(),
            weapon_name: String::new(),
            damage_type: "damage".to_string(),
            is_ranged: false,
            finesse: false,
            using_two_hands: false,
            is_caster: false,
            casting_ability: None,
            class_id: ClassId::Fighter,
            progression: CasterProgression::None,
            known_spells: Vec::new(),
        }
    }
}

impl StatBlock {
    pub fn ability_mod(&self, ability: Ability) -> i32 {
        self.abilities.mod_of(ability)
    }

    /// Ability used for weapon attacks: ranged → DEX, finesse → better of
    /// STR/DEX (DEX on ties), otherwise STR.
    pub fn weapon_ability(&self) -> Ability {
        if self.is_ranged {
            Ability::Dex
        } else if self.finesse {
            if self.ability_mod(Ability::Dex) >= self.ability_mod(Ability::Str) {
                Ability::Dex
            } else {
                Ability::Str
            }
        } else {
            Ability::Str
        }
    }

    pub fn weapon_ability_mod(&self) -> i32 {
        self.ability_mod(self.weapon_ability())
    }

    pub fn attack_bonus(&self) -> i32 {
        self.weapon_ability_mod() + self.proficiency_bonus
    }

    /// Casting-ability modifier; 0 for non-casters.
    pub fn casting_mod(&self) -> i32 {
        match (self.is_caster, self.casting_ability) {
            (true, Some(ability)) => self.ability_mod(ability),
            _ => 0,
        }
    }

    pub fn spell_attack_bonus(&self) -> i32 {
        match (self.is_caster, self.casting_ability) {
            (true, Some(_)) => self.casting_mod() + self.proficiency_bonus,
            _ => 0,
        }
    }

    pub fn spell_save_dc(&self) -> i32 {
        match (self.is_caster, self.casting_ability) {
            (true, Some(_)) => 8 + self.proficiency_bonus + self.casting_mod(),
            _ => 10,
        }
    }

    /// Nominal hardest weapon hit: `count × sides + damage bonus`.
    pub fn expected_weapon_damage(&self) -> i32 {
        self.damage.weight().saturating_add(self.damage_bonus)
    }

    pub fn weapon_label(&self) -> &str {
        if !self.weapon_name.is_empty() {
            &self.weapon_name
        } else if !self.weapon_id.is_empty() {
            &self.weapon_id
        } else {
            "unarmed"
        }
    }

    /// Player characters live in 8..=20, everything else in 1..=30.
    pub fn clamp_for(&mut self, player_controlled: bool) {
        let (min, max) = if player_controlled { (8, 20) } else { (1, 30) };
        self.abilities = self.abilities.clamped(min, max);
        self.proficiency_bonus = self.proficiency_bonus.clamp(1, 6);
    }
}
