//! Battle setup: templates in, initialised combatants out.
//!
//! Each template goes through the same chain of steps, every one taking and
//! returning a [`StatBlock`]:
//!
//! `base_stats → clamp_abilities → equip_weapon → derive_damage_bonus → assign_spellbook`
//!
//! after which [`Combatant::init`] fills HP and actions.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::combat::{derive_damage_bonus, equip_weapon};
use crate::combatant::{Combatant, CombatantId, Side};
use crate::content::Catalog;
use crate::error::{ConfigWarning, SetupError};
use crate::rules::{ClassId, RuleTables};
use crate::spellbook::{proficiency_for_level, trim_to_caps};
use crate::stats::{HealConfig, StatBlock, MELEE_RANGE, UNEQUIPPED_RANGED_RANGE};
use crate::{Ability, AbilityScores, Position};

fn default_class() -> ClassId {
    ClassId::Fighter
}

fn default_level() -> u32 {
    1
}

fn default_actions() -> u32 {
    1
}

/// A hero or enemy as written in party / encounter definitions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombatantTemplate {
    pub name: String,
    #[serde(default = "default_class")]
    pub class: ClassId,
    #[serde(default = "default_level")]
    pub level: u32,
    pub max_hp: i32,
    pub armour_class: i32,
    #[serde(default)]
    pub abilities: AbilityScores,
    #[serde(default)]
    pub weapon_id: String,
    #[serde(default)]
    pub two_hands: bool,
    #[serde(default)]
    pub shield: bool,
    #[serde(default)]
    pub ranged: bool,
    #[serde(default)]
    pub heal: Option<HealConfig>,
    #[serde(default)]
    pub spawn: Position,
    #[serde(default = "default_actions")]
    pub actions_per_turn: u32,
    /// Overrides the DEX-derived initiative bonus.
    #[serde(default)]
    pub initiative_bonus: Option<i32>,
}

impl CombatantTemplate {
    pub fn new(name: impl Into<String>, class: ClassId, level: u32, max_hp: i32, ac: i32) -> Self {
        Self {
            name: name.into(),
            class,
            level,
            max_hp,
            armour_class: ac,
            abilities: AbilityScores::default(),
            weapon_id: String::new(),
            two_hands: false,
            shield: false,
            ranged: false,
            heal: None,
            spawn: Position::default(),
            actions_per_turn: 1,
            initiative_bonus: None,
        }
    }

    fn validate(&self) -> Result<(), SetupError> {
        let reason = if self.max_hp <= 0 {
            Some(format!("max HP must be positive, got {}", self.max_hp))
        } else if self.actions_per_turn == 0 {
            Some("needs at least one action per turn".to_string())
        } else {
            None
        };
        match reason {
            Some(reason) => Err(SetupError::InvalidTemplate {
                name: self.name.clone(),
                reason,
            }),
            None => Ok(()),
        }
    }
}

/// Which party fights which encounter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleSelection {
    pub party_id: String,
    pub encounter_id: String,
}

impl Default for BattleSelection {
    fn default() -> Self {
        Self {
            party_id: "default-party".to_string(),
            encounter_id: "undead-army-1".to_string(),
        }
    }
}

/// A battle ready to run: initialised units in registration order (heroes
/// first) and the tables their spells refer to.
#[derive(Debug, Clone)]
pub struct Battle {
    pub units: Vec<Combatant>,
    pub tables: Arc<RuleTables>,
    pub warnings: Vec<ConfigWarning>,
    pub title: Option<String>,
}

/// Template fields copied straight onto a fresh stat block.
pub fn base_stats(t: &CombatantTemplate) -> StatBlock {
    StatBlock {
        display_name: t.name.clone(),
        max_hp: t.max_hp,
        armour_class: t.armour_class,
        attack_range: if t.ranged {
            UNEQUIPPED_RANGED_RANGE
        } else {
            MELEE_RANGE
        },
        actions_per_turn: t.actions_per_turn,
        initiative_bonus: t
            .initiative_bonus
            .unwrap_or_else(|| t.abilities.mod_of(Ability::Dex)),
        heal: t.heal,
        abilities: t.abilities,
        proficiency_bonus: proficiency_for_level(t.level),
        level: t.level.max(1),
        is_ranged: t.ranged,
        class_id: t.class,
        ..StatBlock::default()
    }
}

pub fn clamp_abilities(mut stats: StatBlock, side: Side) -> StatBlock {
    stats.clamp_for(side == Side::Player);
    stats
}

/// Class capabilities: candidate spells trimmed to the level caps.
///
/// A class counts as a caster when its untrimmed list is non-empty, even if
/// nothing survives the trim at this level.
pub fn assign_spellbook(
    mut stats: StatBlock,
    tables: &RuleTables,
) -> (StatBlock, Vec<ConfigWarning>) {
    let profile = tables.class(stats.class_id);
    stats.is_caster = !profile.spellbook.is_empty();
    stats.casting_ability = profile.casting_ability;
    stats.progression = profile.progression;

    let trimmed = trim_to_caps(tables, profile.progression, stats.level, &profile.spellbook);
    stats.known_spells = trimmed.spells;
    let warnings = trimmed
        .unknown
        .into_iter()
        .map(|spell_id| ConfigWarning::UnknownSpell {
            unit: stats.display_name.clone(),
            spell_id,
        })
        .collect();
    (stats, warnings)
}

fn build_stats(
    t: &CombatantTemplate,
    side: Side,
    tables: &RuleTables,
    warnings: &mut Vec<ConfigWarning>,
) -> StatBlock {
    let stats = clamp_abilities(base_stats(t), side);
    let (stats, warning) = equip_weapon(stats, tables, &t.weapon_id, t.two_hands, t.shield);
    warnings.extend(warning);
    let stats = derive_damage_bonus(stats);
    let (stats, spell_warnings) = assign_spellbook(stats, tables);
    warnings.extend(spell_warnings);
    stats
}

/// Build a battle from hero and enemy templates.
pub fn setup_battle(
    heroes: &[CombatantTemplate],
    enemies: &[CombatantTemplate],
    tables: Arc<RuleTables>,
) -> Result<Battle, SetupError> {
    if heroes.is_empty() {
        return Err(SetupError::EmptyParty);
    }
    if enemies.is_empty() {
        return Err(SetupError::EmptyEncounter);
    }
    for t in heroes.iter().chain(enemies) {
        t.validate()?;
    }

    let mut warnings = Vec::new();
    let mut units = Vec::with_capacity(heroes.len() + enemies.len());
    let sides = heroes
        .iter()
        .map(|t| (t, Side::Player))
        .chain(enemies.iter().map(|t| (t, Side::Enemy)));
    for (i, (t, side)) in sides.enumerate() {
        let stats = build_stats(t, side, &tables, &mut warnings);
        let mut unit = Combatant::new(CombatantId(i), stats, side, t.spawn);
        unit.init();
        units.push(unit);
    }

    for w in &warnings {
        warn!("{}", w);
    }
    info!(
        heroes = heroes.len(),
        enemies = enemies.len(),
        warnings = warnings.len(),
        "battle set up"
    );

    Ok(Battle {
        units,
        tables,
        warnings,
        title: None,
    })
}

/// Resolve `selection` against `catalog` and set the battle up.
pub fn setup_from_catalog(
    catalog: &Catalog,
    selection: &BattleSelection,
) -> Result<Battle, SetupError> {
    let party = catalog
        .party(&selection.party_id)
        .ok_or_else(|| SetupError::UnknownParty(selection.party_id.clone()))?;
    let encounter = catalog
        .encounter(&selection.encounter_id)
        .ok_or_else(|| SetupError::UnknownEncounter(selection.encounter_id.clone()))?;
    let mut battle = setup_battle(&party.heroes, &encounter.enemies, catalog.tables())?;
    battle.title = Some(encounter.title.clone());
    Ok(battle)
}
