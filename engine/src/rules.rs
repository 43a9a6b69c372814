//! Read-only rule tables: weapons, spells and per-class capabilities.
//!
//! The engine never mutates these; setup and the decision policy look entries
//! up by identifier. Identifiers are matched case-insensitively.

use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::{Ability, DamageDice};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeaponDamage {
    Slashing,
    Piercing,
    Bludgeoning,
}

impl fmt::Display for WeaponDamage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            WeaponDamage::Slashing => "slashing",
            WeaponDamage::Piercing => "piercing",
            WeaponDamage::Bludgeoning => "bludgeoning",
        };
        f.write_str(s)
    }
}

/// Normal / long range of a ranged weapon, in feet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeBand {
    pub normal: u32,
    pub long: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeaponDef {
    pub id: String,
    pub name: String,
    pub dice: DamageDice,
    pub damage_type: WeaponDamage,
    #[serde(default)]
    pub ranged: bool,
    #[serde(default)]
    pub finesse: bool,
    #[serde(default)]
    pub two_handed: bool,
    #[serde(default)]
    pub heavy: bool,
    #[serde(default)]
    pub reach: bool,
    /// Larger dice used when a versatile weapon is wielded two-handed.
    #[serde(default)]
    pub versatile: Option<DamageDice>,
    #[serde(default)]
    pub range: Option<RangeBand>,
}

fn default_spell_dice() -> DamageDice {
    DamageDice::new(1, 6)
}

fn default_darts() -> u32 {
    1
}

fn default_damage_type() -> String {
    "force".to_string()
}

fn default_spell_range() -> f32 {
    18.0
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpellDef {
    pub id: String,
    pub name: String,
    /// 0 = cantrip, 1..=9 = leveled spell.
    #[serde(default)]
    pub level: u8,
    #[serde(default = "default_spell_dice")]
    pub dice: DamageDice,
    #[serde(default)]
    pub flat_bonus: i32,
    #[serde(default = "default_darts")]
    pub darts: u32,

    #[serde(default)]
    pub is_heal: bool,
    #[serde(default)]
    pub auto_hit: bool,
    #[serde(default)]
    pub uses_attack_roll: bool,
    /// Ability the target saves with, if this is a save spell.
    #[serde(default)]
    pub save: Option<Ability>,
    #[serde(default)]
    pub half_on_save: bool,

    #[serde(default = "default_damage_type")]
    pub damage_type: String,
    /// Add the caster's casting-ability modifier once to damage or healing.
    #[serde(default)]
    pub add_ability_to_damage: bool,
    #[serde(default = "default_spell_range")]
    pub range: f32,

    #[serde(default = "default_true")]
    pub cantrip_scales_dice: bool,
    #[serde(default)]
    pub scales_with_slot: bool,
    #[serde(default)]
    pub extra_darts_per_slot: u32,
    #[serde(default)]
    pub extra_dice_per_slot: u32,
    #[serde(default)]
    pub extra_flat_per_slot: i32,
}

impl SpellDef {
    pub fn is_save_based(&self) -> bool {
        self.save.is_some()
    }

    /// Policy cost used to pick the cheapest heal.
    pub fn cost(&self) -> i32 {
        self.dice.weight()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KnownSpell {
    pub id: String,
    pub level: u8,
}

impl KnownSpell {
    pub fn new(id: impl Into<String>, level: u8) -> Self {
        Self {
            id: id.into(),
            level,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassId {
    Barbarian,
    Bard,
    Cleric,
    Druid,
    Fighter,
    Monk,
    Paladin,
    Ranger,
    Rogue,
    Sorcerer,
    Warlock,
    Wizard,
    Artificer,
}

impl ClassId {
    pub const ALL: [ClassId; 13] = [
        ClassId::Barbarian,
        ClassId::Bard,
        ClassId::Cleric,
        ClassId::Druid,
        ClassId::Fighter,
        ClassId::Monk,
        ClassId::Paladin,
        ClassId::Ranger,
        ClassId::Rogue,
        ClassId::Sorcerer,
        ClassId::Warlock,
        ClassId::Wizard,
        ClassId::Artificer,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ClassId::Barbarian => "barbarian",
            ClassId::Bard => "bard",
            ClassId::Cleric => "cleric",
            ClassId::Druid => "druid",
            ClassId::Fighter => "fighter",
            ClassId::Monk => "monk",
            ClassId::Paladin => "paladin",
            ClassId::Ranger => "ranger",
            ClassId::Rogue => "rogue",
            ClassId::Sorcerer => "sorcerer",
            ClassId::Warlock => "warlock",
            ClassId::Wizard => "wizard",
            ClassId::Artificer => "artificer",
        }
    }
}

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ClassId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        ClassId::ALL
            .iter()
            .copied()
            .find(|c| c.name() == wanted)
            .ok_or_else(|| format!("unknown class '{}'", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CasterProgression {
    #[default]
    None,
    Third,
    Half,
    Full,
}

/// What a class brings to battle setup: its candidate spells, the ability it
/// casts with, and how fast its spellcasting progresses.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ClassProfile {
    #[serde(default)]
    pub spellbook: Vec<KnownSpell>,
    #[serde(default)]
    pub casting_ability: Option<Ability>,
    #[serde(default)]
    pub progression: CasterProgression,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuleTables {
    #[serde(default)]
    weapons: IndexMap<String, WeaponDef>,
    #[serde(default)]
    spells: IndexMap<String, SpellDef>,
    #[serde(default)]
    classes: IndexMap<ClassId, ClassProfile>,
}

fn key(id: &str) -> String {
    id.trim().to_lowercase()
}

impl RuleTables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_parts(
        weapons: Vec<WeaponDef>,
        spells: Vec<SpellDef>,
        classes: IndexMap<ClassId, ClassProfile>,
    ) -> Self {
        let mut tables = Self {
            classes,
            ..Self::default()
        };
        for w in weapons {
            tables.insert_weapon(w);
        }
        for s in spells {
            tables.insert_spell(s);
        }
        tables
    }

    pub fn insert_weapon(&mut self, def: WeaponDef) {
        self.weapons.insert(key(&def.id), def);
    }

    pub fn insert_spell(&mut self, def: SpellDef) {
        self.spells.insert(key(&def.id), def);
    }

    pub fn insert_class(&mut self, class: ClassId, profile: ClassProfile) {
        self.classes.insert(class, profile);
    }

    pub fn weapon(&self, id: &str) -> Option<&WeaponDef> {
        self.weapons.get(&key(id))
    }

    pub fn spell(&self, id: &str) -> Option<&SpellDef> {
        self.spells.get(&key(id))
    }

    /// Profile for `class`; classes missing from the table cannot cast.
    pub fn class(&self, class: ClassId) -> ClassProfile {
        self.classes.get(&class).cloned().unwrap_or_default()
    }

    pub fn weapons(&self) -> impl Iterator<Item = &WeaponDef> {
        self.weapons.values()
    }

    pub fn spells(&self) -> impl Iterator<Item = &SpellDef> {
        self.spells.values()
    }

    pub fn classes(&self) -> impl Iterator<Item = (&ClassId, &ClassProfile)> {
        self.classes.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookups_ignore_case() {
        let mut tables = RuleTables::new();
        tables.insert_weapon(WeaponDef {
            id: "Longsword".into(),
            name: "Longsword".into(),
            dice: DamageDice::new(1, 8),
            damage_type: WeaponDamage::Slashing,
            ranged: false,
            finesse: false,
            two_handed: false,
            heavy: false,
            reach: false,
            versatile: Some(DamageDice::new(1, 10)),
            range: None,
        });
        assert!(tables.weapon("LONGSWORD").is_some());
        assert!(tables.weapon("longsword").is_some());
        assert!(tables.weapon("rapier").is_none());
    }

    #[test]
    fn spell_defaults_fill_in() {
        let def: SpellDef =
            serde_json::from_str(r#"{"id":"bless","name":"Bless","level":1}"#).unwrap();
        assert_eq!(def.dice, DamageDice::new(1, 6));
        assert_eq!(def.darts, 1);
        assert_eq!(def.range, 18.0);
        assert!(def.cantrip_scales_dice);
        assert!(!def.is_heal && !def.auto_hit && !def.uses_attack_roll);
    }

    #[test]
    fn class_ids_parse() {
        assert_eq!("Wizard".parse::<ClassId>(), Ok(ClassId::Wizard));
        assert!("necromancer".parse::<ClassId>().is_err());
    }
}
