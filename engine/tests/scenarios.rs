use skirmish::combat::{resolve_save_spell, scaled_params, try_attack, try_spell_attack};
use skirmish::rules::CasterProgression;
use skirmish::{
    Ability, AbilityScores, DamageDice, Dice, EventKind, SpellDef, StatBlock,
};

fn named(name: &str) -> StatBlock {
    StatBlock {
        display_name: name.into(),
        ..StatBlock::default()
    }
}

fn spell(json: &str) -> SpellDef {
    serde_json::from_str(json).unwrap()
}

fn cleric_caster(level: u32) -> StatBlock {
    StatBlock {
        is_caster: true,
        casting_ability: Some(Ability::Wis),
        progression: CasterProgression::Full,
        level,
        abilities: AbilityScores {
            wis: 16,
            ..AbilityScores::default()
        },
        ..named("Cleric")
    }
}

#[test]
fn longsword_hit_adds_strength() {
    let attacker = StatBlock {
        abilities: AbilityScores {
            str_: 16,
            ..AbilityScores::default()
        },
        proficiency_bonus: 2,
        damage: DamageDice::new(1, 8),
        damage_bonus: 3,
        weapon_name: "Longsword".into(),
        ..named("Warrior")
    };
    let defender = StatBlock {
        armour_class: 10,
        ..named("Skeleton")
    };
    let mut dice = Dice::from_scripted(vec![15, 6]);

    let out = try_attack(&attacker, &defender, &mut dice);
    assert!(out.hit);
    assert!(!out.critical);
    assert_eq!(out.total, 20);
    assert_eq!(out.damage, 9);
    assert_eq!(out.events[0].kind, EventKind::Attack);
    assert_eq!(
        out.events[0].text,
        "Warrior attacks Skeleton with Longsword: d20=15 + (STR mod +3 + prof 2) = total 20 vs AC 10 => HIT"
    );
}

#[test]
fn successful_dex_save_halves_damage() {
    let caster = cleric_caster(1);
    assert_eq!(caster.spell_save_dc(), 13);
    let target = StatBlock {
        abilities: AbilityScores {
            dex: 14,
            ..AbilityScores::default()
        },
        ..named("Orc")
    };
    let wave = spell(
        r#"{"id":"flame-wave","name":"Flame Wave","level":1,"dice":"3d6","save":"dex","half_on_save":true}"#,
    );
    let mut dice = Dice::from_scripted(vec![18, 4, 5, 6]);

    let out = resolve_save_spell(&caster, &target, &wave, Ability::Dex, &mut dice);
    assert!(out.save.passed);
    assert_eq!(out.save.total, 20);
    assert_eq!(out.rolled, 15);
    assert_eq!(out.damage, 7);
}

#[test]
fn cantrip_doubles_its_dice_at_fifth_level() {
    let caster = cleric_caster(5);
    let bolt = spell(
        r#"{"id":"fire-bolt","name":"Fire Bolt","dice":"1d10","uses_attack_roll":true}"#,
    );
    assert_eq!(scaled_params(&caster, &bolt).dice, DamageDice::new(2, 10));

    let target = StatBlock {
        armour_class: 10,
        ..named("Orc")
    };
    // d20, then two d10s.
    let mut dice = Dice::from_scripted(vec![15, 3, 4]);
    let out = try_spell_attack(&caster, &target, &bolt, &mut dice);
    assert!(out.hit);
    assert_eq!(out.damage, 7);
}

#[test]
fn cantrip_without_scaling_flag_stays_put() {
    let caster = cleric_caster(11);
    let flat = spell(
        r#"{"id":"spark","name":"Spark","dice":"1d6","auto_hit":true,"cantrip_scales_dice":false}"#,
    );
    assert_eq!(scaled_params(&caster, &flat).dice, DamageDice::new(1, 6));
}

#[test]
fn natural_twenty_doubles_dice_not_bonus() {
    let attacker = StatBlock {
        damage: DamageDice::new(1, 8),
        damage_bonus: 3,
        ..named("Warrior")
    };
    let defender = StatBlock {
        armour_class: 99,
        ..named("Golem")
    };
    let mut dice = Dice::from_scripted(vec![20, 5, 7]);
    let out = try_attack(&attacker, &defender, &mut dice);
    assert!(out.hit && out.critical);
    assert_eq!(out.damage, 5 + 7 + 3);
    assert!(out.events.iter().any(|e| e.kind == EventKind::Critical));
}
