use std::fmt;

use thiserror::Error;

/// Setup failures. No battle is produced when one of these is returned.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SetupError {
    #[error("party is empty")]
    EmptyParty,
    #[error("encounter is empty")]
    EmptyEncounter,
    #[error("party '{0}' not found")]
    UnknownParty(String),
    #[error("encounter '{0}' not found")]
    UnknownEncounter(String),
    #[error("template '{name}' is invalid: {reason}")]
    InvalidTemplate { name: String, reason: String },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BattleError {
    #[error("battle did not finish within {0} rounds")]
    RoundLimit(u32),
}

/// Recoverable content problems: the affected stat keeps its previous value
/// and the battle goes on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigWarning {
    UnknownWeapon { unit: String, weapon_id: String },
    UnknownSpell { unit: String, spell_id: String },
}

impl ConfigWarning {
    pub fn unit(&self) -> &str {
        match self {
            ConfigWarning::UnknownWeapon { unit, .. } | ConfigWarning::UnknownSpell { unit, .. } => {
                unit
            }
        }
    }
}

impl fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigWarning::UnknownWeapon { unit, weapon_id } => write!(
                f,
                "{}: weapon '{}' not found, keeping existing stats",
                unit, weapon_id
            ),
            ConfigWarning::UnknownSpell { unit, spell_id } => {
                write!(f, "{}: spell '{}' not found, skipping", unit, spell_id)
            }
        }
    }
}
