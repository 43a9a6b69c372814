use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::rules::{ClassId, ClassProfile, RuleTables, SpellDef, WeaponDef};
use crate::setup::CombatantTemplate;

const WEAPONS: &str = include_str!("../content/weapons.json");
const SPELLS: &str = include_str!("../content/spells.json");
const CLASSES: &str = include_str!("../content/classes.json");
const PARTIES: &str = include_str!("../content/parties.json");
const ENCOUNTERS: &str = include_str!("../content/encounters.json");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartyDef {
    pub id: String,
    #[serde(default)]
    pub title: String,
    pub heroes: Vec<CombatantTemplate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncounterDef {
    pub id: String,
    #[serde(default)]
    pub title: String,
    pub enemies: Vec<CombatantTemplate>,
}

#[derive(Debug, Clone, Deserialize)]
struct ClassEntry {
    class: ClassId,
    #[serde(flatten)]
    profile: ClassProfile,
}

/// Everything a battle can be assembled from: rule tables plus the named
/// parties and encounters.
#[derive(Debug, Clone)]
pub struct Catalog {
    tables: Arc<RuleTables>,
    parties: IndexMap<String, PartyDef>,
    encounters: IndexMap<String, EncounterDef>,
}

fn parse<T: serde::de::DeserializeOwned>(what: &str, text: &str) -> Result<T> {
    serde_json::from_str(text).with_context(|| format!("failed to parse {} JSON", what))
}

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

pub fn parse_tables(weapons: &str, spells: &str, classes: &str) -> Result<RuleTables> {
    let weapons: Vec<WeaponDef> = parse("weapons", weapons)?;
    let spells: Vec<SpellDef> = parse("spells", spells)?;
    let classes: Vec<ClassEntry> = parse("classes", classes)?;
    let classes = classes.into_iter().map(|c| (c.class, c.profile)).collect();
    Ok(RuleTables::from_parts(weapons, spells, classes))
}

impl Catalog {
    pub fn new(
        tables: RuleTables,
        parties: Vec<PartyDef>,
        encounters: Vec<EncounterDef>,
    ) -> Self {
        Self {
            tables: Arc::new(tables),
            parties: parties
                .into_iter()
                .map(|p| (p.id.to_lowercase(), p))
                .collect(),
            encounters: encounters
                .into_iter()
                .map(|e| (e.id.to_lowercase(), e))
                .collect(),
        }
    }

    /// The content shipped with the engine.
    pub fn builtin() -> Result<Self> {
        let tables = parse_tables(WEAPONS, SPELLS, CLASSES)?;
        Ok(Self::new(
            tables,
            parse("parties", PARTIES)?,
            parse("encounters", ENCOUNTERS)?,
        ))
    }

    /// Load a catalog from a directory laid out like the built-in one
    /// (`weapons.json`, `spells.json`, `classes.json`, `parties.json`,
    /// `encounters.json`).
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let tables = parse_tables(
            &read(&dir.join("weapons.json"))?,
            &read(&dir.join("spells.json"))?,
            &read(&dir.join("classes.json"))?,
        )?;
        Ok(Self::new(
            tables,
            parse("parties", &read(&dir.join("parties.json"))?)?,
            parse("encounters", &read(&dir.join("encounters.json"))?)?,
        ))
    }

    pub fn tables(&self) -> Arc<RuleTables> {
        Arc::clone(&self.tables)
    }

    pub fn party(&self, id: &str) -> Option<&PartyDef> {
        self.parties.get(&id.trim().to_lowercase())
    }

    pub fn encounter(&self, id: &str) -> Option<&EncounterDef> {
        self.encounters.get(&id.trim().to_lowercase())
    }

    pub fn parties(&self) -> impl Iterator<Item = &PartyDef> {
        self.parties.values()
    }

    pub fn encounters(&self) -> impl Iterator<Item = &EncounterDef> {
        self.encounters.values()
    }
}
