use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use encoding_rs::Encoding;
use skirmish::{parse_config, BattleConfig, ConfigFormat};
use tracing_subscriber::EnvFilter;

/// Diagnostics go to stderr so stdout stays the battle log. `RUST_LOG`
/// overrides the default `warn` filter.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Read a text file, honouring a UTF-8 or UTF-16 byte order mark.
pub fn read_text_auto(path: &Path) -> Result<String> {
    let bytes = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    if let Some((enc, bom_len)) = Encoding::for_bom(&bytes) {
        let (cow, _, _) = enc.decode(&bytes[bom_len..]);
        Ok(cow.into_owned())
    } else {
        String::from_utf8(bytes).with_context(|| format!("{} is not valid UTF-8", path.display()))
    }
}

pub fn load_battle_config(path: &Path) -> Result<BattleConfig> {
    let text = read_text_auto(path)?;
    parse_config(&text, ConfigFormat::from_path(path))
        .with_context(|| format!("in {}", path.display()))
}

/// Config file if given, defaults otherwise, then command-line overrides.
pub fn resolve_config(
    path: Option<&Path>,
    party: Option<String>,
    encounter: Option<String>,
    seed: Option<u64>,
) -> Result<BattleConfig> {
    let mut cfg = match path {
        Some(p) => load_battle_config(p)?,
        None => BattleConfig::default(),
    };
    if let Some(party) = party {
        cfg.party_id = party;
    }
    if let Some(encounter) = encounter {
        cfg.encounter_id = encounter;
    }
    if let Some(seed) = seed {
        cfg.seed = seed;
    }
    Ok(cfg)
}
