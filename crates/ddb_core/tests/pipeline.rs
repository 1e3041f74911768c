use std::fs;
use std::path::PathBuf;

use ddb_core::ability::Ability;
use ddb_core::attacks::{AttackMode, AttackSource, WeaponRange};
use ddb_core::core_api::{Engine, Session};
use ddb_core::damage::DamageType;
use ddb_core::diagnostics::{Diagnostic, RecordingDiagnostics};
use ddb_core::skills::{ProficiencyLevel, Skill};
use ddb_core::spells::{SpellKind, SpellOrigin};
use serde_json::json;

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn open_fixture(name: &str) -> Session {
    let bytes = fs::read(fixture_path(name)).expect("failed to read fixture");
    Engine::new()
        .open_bytes(bytes)
        .expect("failed to open fixture")
}

fn names<'a>(items: impl IntoIterator<Item = &'a str>) -> Vec<&'a str> {
    items.into_iter().collect()
}

#[test]
fn minimal_fighter_round_trip() {
    let doc = json!({
        "name": "Minimal",
        "stats": [{ "value": 16 }],
        "classes": [{ "definition": { "name": "Fighter" }, "level": 5 }],
        "inventory": [{
            "equipped": true,
            "definition": {
                "name": "Longsword",
                "damage": { "diceCount": 1, "diceValue": 8 },
                "type": "Martial Weapon"
            }
        }]
    });
    let session = Engine::new().open_value(doc).expect("failed to open document");
    let sb = session.statblock();
    assert_eq!(sb.ability_modifiers.str, 3);
    assert_eq!(sb.proficiency_bonus, 3);

    let attacks = session.attacks();
    let longsword = attacks
        .iter()
        .find(|a| a.name == "Longsword")
        .expect("longsword attack");
    assert_eq!(longsword.attack_bonus, 6);
    assert_eq!(longsword.damage, "1d8+3");
    assert!(attacks.iter().any(|a| a.name == "Unarmed Strike"));
}

#[test]
fn battle_master_statblock() {
    let session = open_fixture("battle_master.json");
    let sb = session.statblock();

    assert_eq!(sb.name, "Brannoc Vell");
    assert_eq!(sb.level, 5);
    assert_eq!(sb.proficiency_bonus, 3);
    assert_eq!(sb.ability_scores.con, 16);
    assert_eq!((sb.hp_max, sb.hp_current), (59, 52));
    assert_eq!(sb.ac, 18);
    assert_eq!(sb.ac_source, "computed");
    assert_eq!(sb.speed_feet, 25);
    assert_eq!(sb.initiative, 2);
    assert_eq!(sb.save_proficiencies, [Ability::Strength, Ability::Constitution]);
    assert_eq!(sb.save_modifiers.str, 6);
    assert_eq!(sb.save_modifiers.dex, 2);
    assert_eq!(sb.skill_modifier(Skill::Athletics), 6);
    assert_eq!(sb.skill_modifier(Skill::Perception), 4);
    assert_eq!(sb.skill_modifier(Skill::Intimidation), 2);
    assert_eq!(sb.skill_modifier(Skill::Stealth), 2);
    assert_eq!(sb.class_summary(), "Fighter 5");
}

#[test]
fn battle_master_attacks_come_from_equipped_weapons() {
    let session = open_fixture("battle_master.json");
    let sink = RecordingDiagnostics::new();
    let attacks = session.attacks_with(&sink);

    assert_eq!(
        names(attacks.iter().map(|a| a.name.as_str())),
        ["Longsword", "Javelin", "Unarmed Strike"]
    );
    let javelin = &attacks[1];
    assert_eq!(javelin.attack_bonus, 6);
    assert_eq!(javelin.damage, "1d6+3");
    assert_eq!(javelin.damage_type, Some(DamageType::Piercing));
    assert_eq!(javelin.mode, Some(AttackMode::Thrown));
    assert_eq!(javelin.range, Some(WeaponRange { normal: 30, long: Some(120) }));
    assert_eq!(attacks[2].source, AttackSource::Synthesized);
    assert_eq!(attacks[2].damage, "1+3");

    let events = sink.take();
    assert!(events.contains(&Diagnostic::AttackStrategy { strategy: "inventory", count: 2 }));
    assert!(events.contains(&Diagnostic::UnarmedStrikeSynthesized {
        attack_bonus: 6,
        damage: "1+3".to_string(),
    }));
}

#[test]
fn attack_extraction_is_idempotent() {
    let session = open_fixture("battle_master.json");
    assert_eq!(session.attacks(), session.attacks());
    let unarmed = session
        .attacks()
        .into_iter()
        .filter(|a| a.name == "Unarmed Strike")
        .count();
    assert_eq!(unarmed, 1);
}

#[test]
fn battle_master_features_and_inventory() {
    let session = open_fixture("battle_master.json");
    let features = session.feature_lists();
    assert_eq!(features.background.as_deref(), Some("Soldier"));
    assert_eq!(features.classes, ["Fighter 5"]);
    assert_eq!(features.feats, ["Sentinel"]);
    assert_eq!(
        features.class_features,
        [
            "Action Surge",
            "Combat Superiority",
            "Extra Attack",
            "Fighting Style",
            "Second Wind",
            "Student of War"
        ]
    );
    assert_eq!(features.maneuvers, ["Precision Attack", "Riposte", "Trip Attack"]);

    let inventory = session.inventory_summary();
    assert_eq!(inventory.currency.gp, 47);
    assert_eq!(inventory.currency.sp, 12);
    assert_eq!(
        names(inventory.equipped().map(|i| i.name.as_str())),
        ["Chain Mail", "Javelin", "Longsword", "Shield"]
    );
    let carried: Vec<_> = inventory
        .carried()
        .map(|i| (i.name.as_str(), i.total_quantity))
        .collect();
    assert_eq!(carried, [("Potion of Healing", 3), ("Torch", 10)]);
}

#[test]
fn cleric_set_effects_and_expertise() {
    let session = open_fixture("life_cleric.json");
    let sb = session.statblock();

    assert_eq!(sb.ability_scores.str, 21);
    assert_eq!(sb.ability_modifiers.str, 5);
    assert_eq!(sb.ac, 17);
    assert_eq!((sb.hp_max, sb.hp_current), (48, 53));
    assert_eq!(sb.spell_attack_bonus_bonus, 1);
    let religion = sb.skill(Skill::Religion).expect("religion skill");
    assert_eq!(religion.proficiency, ProficiencyLevel::Expertise);
    assert_eq!(religion.modifier, 6);
}

#[test]
fn cleric_spell_book() {
    let session = open_fixture("life_cleric.json");
    let sink = RecordingDiagnostics::new();
    let book = session.spell_book_with(&sink);

    assert_eq!(book.spellcasting.len(), 1);
    let casting = &book.spellcasting[0];
    assert_eq!(casting.ability, Ability::Wisdom);
    assert_eq!((casting.attack_bonus, casting.save_dc), (7, 14));

    assert_eq!(
        names(book.prepared.iter().map(|s| s.name.as_str())),
        ["Light", "Sacred Flame", "Bless", "Cure Wounds", "Guiding Bolt", "Spiritual Weapon"]
    );
    assert_eq!(names(book.unprepared.iter().map(|s| s.name.as_str())), ["Detect Magic"]);

    let light = &book.prepared[0];
    assert_eq!(light.origin, SpellOrigin::Race);
    let flame = &book.prepared[1];
    assert_eq!(
        flame.kind,
        SpellKind::SpellSave {
            dc: 14,
            save_ability: Some(Ability::Dexterity),
            damage: Some("2d8".to_string()),
            damage_type: Some(DamageType::Radiant),
        }
    );
    let weapon = &book.prepared[5];
    assert_eq!(weapon.kind.damage(), Some(("1d8", Some(&DamageType::Force))));

    let bless = &book.prepared[2];
    assert!(bless.details.concentration);
    assert_eq!(bless.details.components.len(), 3);

    let events = sink.take();
    assert!(events.contains(&Diagnostic::SpellMerged {
        name: "Bless".to_string(),
        path: "class_features",
    }));
    assert!(events.contains(&Diagnostic::SpellUnprepared {
        name: "Detect Magic".to_string(),
    }));
}

#[test]
fn cleric_inventory_hides_empty_currency() {
    let session = open_fixture("life_cleric.json");
    let inventory = session.inventory_summary();
    assert!(inventory.currency.is_empty());
    let belt = inventory
        .items
        .iter()
        .find(|i| i.name == "Belt of Fire Giant Strength")
        .expect("belt");
    assert!(belt.any_attuned && belt.any_equipped);
}

#[test]
fn conversion_serializes_every_result() {
    let session = open_fixture("life_cleric.json");
    let conversion = session.conversion(&RecordingDiagnostics::new());
    let value = serde_json::to_value(&conversion).expect("serialize conversion");
    assert_eq!(value["statblock"]["abilityScores"]["str"], 21);
    assert_eq!(value["spells"]["prepared"][1]["kind"], "spell_save");
    assert_eq!(value["spells"]["prepared"][1]["saveAbility"], "dexterity");
    assert_eq!(value["attacks"][0]["damageType"], "bludgeoning");
    assert_eq!(value["features"]["background"], "Acolyte");
}
