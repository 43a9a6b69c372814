use jni::objects::{JClass, JString};
use jni::sys::{jint, jlong, jstring};
use jni::JNIEnv;
use serde::Serialize;
use serde_json::{json, Value};
use skirmish::{
    parse_config, roll_dice, simulate_battle, simulate_battle_many, BattleConfig, ConfigFormat,
    Dice,
};

const DEFAULT_SAMPLES: u32 = 100;

fn envelope_ok(value: Value) -> String {
    json!({ "ok": true, "result": value }).to_string()
}

/// Error chain rendered with `{:#}` so anyhow context is kept.
fn envelope_err(e: impl std::fmt::Display) -> String {
    json!({ "ok": false, "error": format!("{:#}", e) }).to_string()
}

fn to_envelope<T: Serialize>(result: anyhow::Result<T>) -> String {
    match result.and_then(|v| serde_json::to_value(v).map_err(anyhow::Error::from)) {
        Ok(v) => envelope_ok(v),
        Err(e) => envelope_err(e),
    }
}

fn into_jstring(env: &JNIEnv, payload: String) -> jstring {
    match env.new_string(payload) {
        Ok(s) => s.into_raw(),
        Err(_) => std::ptr::null_mut(),
    }
}

/// Run one battle described by a JSON `BattleConfig`.
pub fn run_battle_json(input: &str) -> String {
    let report = parse_config(input, ConfigFormat::Json)
        .map_err(|e| e.context("invalid_config"))
        .and_then(|cfg| simulate_battle(&cfg));
    to_envelope(report)
}

/// Like [`run_battle_json`] but for many seeds. The config object may carry a
/// `samples` field (default 100).
pub fn simulate_many_json(input: &str) -> String {
    let mut root: Value = match serde_json::from_str(input) {
        Ok(v) => v,
        Err(e) => return envelope_err(format!("invalid_config: {}", e)),
    };
    let samples = root
        .get("samples")
        .and_then(|v| v.as_u64())
        .map_or(DEFAULT_SAMPLES, |n| n.min(u64::from(u32::MAX)) as u32);
    if let Some(obj) = root.as_object_mut() {
        obj.remove("samples");
    }
    let cfg: BattleConfig = match serde_json::from_value(root) {
        Ok(c) => c,
        Err(e) => return envelope_err(format!("invalid_config: {}", e)),
    };
    to_envelope(simulate_battle_many(&cfg, samples))
}

/// Sum of `n` rolls of `1..=sides` from the engine's seeded dice.
/// `n <= 0` gives 0; `sides <= 1` rolls ones.
pub fn roll_internal(seed: i64, n: i32, sides: i32) -> i32 {
    let mut dice = Dice::from_seed(seed as u64);
    roll_dice(&mut dice, n.max(0) as u32, sides.max(1) as u32)
}

#[no_mangle]
pub extern "system" fn Java_com_skirmish_Ffi_version<'local>(
    env: JNIEnv<'local>,
    _class: JClass<'local>,
) -> jstring {
    into_jstring(&env, format!("skirmish-ffi {}", env!("CARGO_PKG_VERSION")))
}

#[no_mangle]
pub extern "system" fn Java_com_skirmish_Ffi_roll(
    _env: JNIEnv<'_>,
    _class: JClass<'_>,
    seed: jlong,
    n: jint,
    sides: jint,
) -> jint {
    roll_internal(seed, n, sides)
}

#[no_mangle]
pub extern "system" fn Java_com_skirmish_Ffi_runBattleJson(
    mut env: JNIEnv,
    _class: JClass,
    json: JString,
) -> jstring {
    let payload = match env.get_string(&json) {
        Ok(s) => run_battle_json(&String::from(s)),
        Err(e) => envelope_err(e),
    };
    into_jstring(&env, payload)
}

#[no_mangle]
pub extern "system" fn Java_com_skirmish_Ffi_simulateManyJson(
    mut env: JNIEnv,
    _class: JClass,
    json: JString,
) -> jstring {
    let payload = match env.get_string(&json) {
        Ok(s) => simulate_many_json(&String::from(s)),
        Err(e) => envelope_err(e),
    };
    into_jstring(&env, payload)
}
