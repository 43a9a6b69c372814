//! Resolution of everything a combatant can do: weapon and spell attacks,
//! auto-hit and save spells, healing, and weapon equipping.
//!
//! Functions here are pure over [`StatBlock`](crate::StatBlock)s: they roll
//! dice, describe what happened as events, and return the numbers. Applying
//! the damage or healing to a combatant is the caller's job.

pub mod attack;
pub mod equip;
pub mod healing;
pub mod spells;

pub use attack::{try_attack, try_spell_attack, AttackOutcome};
pub use equip::{derive_damage_bonus, equip_weapon};
pub use healing::{roll_heal, roll_spell_heal, HealOutcome};
pub use spells::{
    resolve_auto_hit, resolve_save_spell, scaled_params, SaveOutcome, ScaledSpell, SpellHit,
};
