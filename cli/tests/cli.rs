use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;

fn cli() -> Command {
    Command::cargo_bin("skirmish-cli").unwrap()
}

#[test]
fn roll_prints_one_line_per_time() {
    let out = cli()
        .args(["roll", "--dice", "2d6", "--seed", "3", "--times", "4"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let text = String::from_utf8(out).unwrap();
    assert_eq!(text.lines().count(), 4);
    assert!(text.lines().all(|l| l.starts_with("2d6 = ")));
}

#[test]
fn roll_rejects_bad_notation() {
    cli()
        .args(["roll", "--dice", "d6"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid dice notation"));
}

#[test]
fn list_shows_builtin_content() {
    cli()
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("default-party"))
        .stdout(predicate::str::contains("hill-giant-ambush-1"));
}

#[test]
fn spellbook_trims_to_level_caps() {
    cli()
        .args(["spellbook", "--class", "Wizard", "--level", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("fire-bolt"))
        .stdout(predicate::str::contains("scorching-ray").not());
}

#[test]
fn battle_json_reports_a_winner() {
    cli()
        .args(["battle", "--seed", "11", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"winner\""))
        .stdout(predicate::str::contains("Battle start: Loaded 'Undead Army #1'."));
}

#[test]
fn battle_with_unknown_encounter_fails() {
    cli()
        .args(["battle", "--encounter", "dragon-lair"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("encounter 'dragon-lair' not found"));
}

#[test]
fn battle_config_with_bom_is_read() {
    let path = std::env::temp_dir().join(format!("skirmish-bom-{}.yaml", std::process::id()));
    let mut bytes = vec![0xEF, 0xBB, 0xBF];
    bytes.extend_from_slice(b"seed: 5\nencounter_id: orc-warband-1\n");
    fs::write(&path, bytes).unwrap();

    cli()
        .args(["battle", "--json", "--config"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Orc Warband #1"))
        .stdout(predicate::str::contains("\"seed\": 5"));

    let _ = fs::remove_file(&path);
}

#[test]
fn simulate_many_prints_summary() {
    Command::cargo_bin("simulate-many")
        .unwrap()
        .args(["--trials", "5", "--seed", "100"])
        .assert()
        .success()
        .stdout(predicate::str::contains("trials:             5"))
        .stdout(predicate::str::contains("player win rate:"));
}
