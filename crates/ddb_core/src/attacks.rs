//! Weapon attack extraction.
//!
//! Attacks come from the document's action lists when it has any; otherwise
//! they are built from equipped weapons. An unarmed strike is appended when
//! neither source supplied one.

use std::collections::HashSet;

use serde::Serialize;
use serde_json::Value;

use crate::ability::Ability;
use crate::damage::DamageType;
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::dice;
use crate::document::{self, compact_key};
use crate::heuristics;
use crate::stats::{self, Statblock};

const UNARMED_STRIKE: &str = "Unarmed Strike";
const NOTE_MAX_CHARS: usize = 240;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttackSource {
    Action,
    Inventory,
    Synthesized,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttackMode {
    Melee,
    Ranged,
    Thrown,
    Reach,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WeaponProperty {
    Ammunition,
    Finesse,
    Heavy,
    Light,
    Loading,
    Reach,
    Special,
    Thrown,
    TwoHanded,
    Versatile,
}

impl WeaponProperty {
    pub fn from_label(raw: &str) -> Option<Self> {
        let key: String = compact_key(raw).chars().filter(|c| *c != '-').collect();
        let property = match key.as_str() {
            "ammunition" => WeaponProperty::Ammunition,
            "finesse" => WeaponProperty::Finesse,
            "heavy" => WeaponProperty::Heavy,
            "light" => WeaponProperty::Light,
            "loading" => WeaponProperty::Loading,
            "reach" => WeaponProperty::Reach,
            "special" => WeaponProperty::Special,
            "thrown" => WeaponProperty::Thrown,
            "twohanded" => WeaponProperty::TwoHanded,
            "versatile" => WeaponProperty::Versatile,
            _ => return None,
        };
        Some(property)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeaponRange {
    pub normal: i32,
    pub long: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedAttack {
    pub name: String,
    pub attack_bonus: i32,
    pub damage: String,
    pub damage_type: Option<DamageType>,
    pub source: AttackSource,
    pub mode: Option<AttackMode>,
    pub range: Option<WeaponRange>,
    pub reach_feet: Option<i32>,
    pub properties: Vec<WeaponProperty>,
    pub is_magic: bool,
    pub notes: Option<String>,
}

impl NormalizedAttack {
    fn new(name: String, attack_bonus: i32, damage: String, source: AttackSource) -> Self {
        Self {
            name,
            attack_bonus,
            damage,
            damage_type: None,
            source,
            mode: None,
            range: None,
            reach_feet: None,
            properties: Vec::new(),
            is_magic: false,
            notes: None,
        }
    }

    fn dedupe_key(&self) -> (String, i32, String, String) {
        (
            self.name.clone(),
            self.attack_bonus,
            self.damage.clone(),
            self.damage_type
                .as_ref()
                .map(|t| t.name().to_string())
                .unwrap_or_default(),
        )
    }
}

/// What an unarmed strike rolls with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnarmedProfile {
    pub proficiency_bonus: i32,
    pub strength_mod: i32,
    pub dexterity_mod: i32,
    /// Level of the class granting martial arts, if any.
    pub martial_arts_level: Option<i32>,
}

impl UnarmedProfile {
    pub fn from_document(doc: &Value, statblock: &Statblock) -> Self {
        Self {
            proficiency_bonus: statblock.proficiency_bonus,
            strength_mod: statblock.ability_modifier(Ability::Strength),
            dexterity_mod: statblock.ability_modifier(Ability::Dexterity),
            martial_arts_level: martial_arts_level(doc),
        }
    }

    fn ability_mod(&self) -> i32 {
        if self.martial_arts_level.is_some() {
            self.dexterity_mod
        } else {
            self.strength_mod
        }
    }
}

pub fn martial_arts_die(level: i32) -> &'static str {
    match level {
        l if l >= 17 => "1d10",
        l if l >= 11 => "1d8",
        l if l >= 5 => "1d6",
        _ => "1d4",
    }
}

/// All attacks for a character, unarmed strike included.
pub fn extract_attacks(
    doc: &Value,
    statblock: &Statblock,
    diag: &dyn Diagnostics,
) -> Vec<NormalizedAttack> {
    let from_actions = attacks_from_actions(doc);
    let (strategy, found) = if from_actions.is_empty() {
        ("inventory", attacks_from_inventory(doc, statblock))
    } else {
        ("actions", from_actions)
    };
    diag.record(Diagnostic::AttackStrategy {
        strategy,
        count: found.len(),
    });
    tracing::debug!(strategy, count = found.len(), "extracted attacks");

    let mut attacks = dedupe(found);
    ensure_unarmed_strike(&mut attacks, &UnarmedProfile::from_document(doc, statblock), diag);
    attacks
}

/// Appends an unarmed strike unless an entry with an unarmed-looking name
/// is already present.
pub fn ensure_unarmed_strike(
    attacks: &mut Vec<NormalizedAttack>,
    profile: &UnarmedProfile,
    diag: &dyn Diagnostics,
) {
    if attacks.iter().any(|a| heuristics::is_unarmed_name(&a.name)) {
        return;
    }
    let ability_mod = profile.ability_mod();
    let die = profile.martial_arts_level.map_or("1", martial_arts_die);
    let damage = format!("{die}{}", dice::signed_suffix(ability_mod));
    let attack_bonus = profile.proficiency_bonus + ability_mod;

    diag.record(Diagnostic::UnarmedStrikeSynthesized {
        attack_bonus,
        damage: damage.clone(),
    });
    let mut strike = NormalizedAttack::new(
        UNARMED_STRIKE.to_string(),
        attack_bonus,
        damage,
        AttackSource::Synthesized,
    );
    strike.damage_type = Some(DamageType::Bludgeoning);
    strike.mode = Some(AttackMode::Melee);
    attacks.push(strike);
}

fn dedupe(attacks: Vec<NormalizedAttack>) -> Vec<NormalizedAttack> {
    let mut seen = HashSet::new();
    attacks
        .into_iter()
        .filter(|a| seen.insert(a.dedupe_key()))
        .collect()
}

fn attacks_from_actions(doc: &Value) -> Vec<NormalizedAttack> {
    let mut found = Vec::new();
    for root in ["actions", "customActions"] {
        let Some(tree) = document::at(doc, &[root]) else {
            continue;
        };
        document::walk_objects(tree, &mut |node, _key| {
            if heuristics::looks_like_attack_action(node) {
                found.push(attack_from_action(node));
            }
        });
    }
    found
}

fn attack_from_action(node: &Value) -> NormalizedAttack {
    let name = document::text_at(node, &["name"])
        .unwrap_or_default()
        .to_string();
    let attack_bonus = document::int_at(node, &["toHit"])
        .or_else(|| document::int_at(node, &["fixedToHit"]))
        .unwrap_or(0) as i32;

    let dice_record = document::array_at(node, &["damage"])
        .first()
        .filter(|d| d.is_object())
        .or_else(|| document::at(node, &["dice"]).filter(|d| d.is_object()));
    let damage = dice_record.map(dice::damage_from_record).unwrap_or_default();
    let damage_type = dice_record
        .and_then(|d| document::at(d, &["damageType"]))
        .and_then(DamageType::from_value)
        .or_else(|| document::at(node, &["damageTypeId"]).and_then(DamageType::from_value));

    let notes = ["notes", "snippet", "description"]
        .iter()
        .find_map(|key| document::text_at(node, &[*key]))
        .map(|raw| document::truncate_chars(&document::strip_html(raw), NOTE_MAX_CHARS))
        .filter(|text| !text.is_empty());

    let mut attack = NormalizedAttack::new(name, attack_bonus, damage, AttackSource::Action);
    attack.damage_type = damage_type;
    attack.notes = notes;
    attack.range = document::at(node, &["range"]).and_then(range_from_value);
    attack
}

fn attacks_from_inventory(doc: &Value, statblock: &Statblock) -> Vec<NormalizedAttack> {
    document::array_at(doc, &["inventory"])
        .iter()
        .filter(|item| document::is_equipped(item))
        .filter_map(|item| attack_from_weapon(item, statblock))
        .collect()
}

fn attack_from_weapon(item: &Value, statblock: &Statblock) -> Option<NormalizedAttack> {
    let def = document::item_definition(item)?;
    if !heuristics::is_weapon_definition(def) {
        return None;
    }
    let name = document::text_at(item, &["name"])
        .or_else(|| document::text_at(def, &["name"]))?
        .to_string();

    let behavior = document::array_at(def, &["weaponBehaviors"]).first();
    let damage_record = document::at(def, &["damage"])
        .or_else(|| behavior.and_then(|b| document::at(b, &["damage"])))?;
    let count = document::int_at(damage_record, &["diceCount"]).unwrap_or(0);
    let faces = document::int_at(damage_record, &["diceValue"]).unwrap_or(0);
    if count <= 0 || faces <= 0 {
        return None;
    }

    let properties = weapon_properties(def);
    let ability_mod = governing_modifier(&properties, statblock);
    let proficient = document::bool_at(item, &["isProficient"]).unwrap_or(true);
    let magic = magic_bonus(item, def);
    let attack_bonus =
        ability_mod + if proficient { statblock.proficiency_bonus } else { 0 } + magic;
    let damage = dice::format_damage(count, faces, i64::from(ability_mod + magic));

    let damage_type = document::at(def, &["damageType"])
        .or_else(|| document::at(damage_record, &["damageType"]))
        .or_else(|| behavior.and_then(|b| document::at(b, &["damageType"])))
        .and_then(DamageType::from_value);

    let mode = attack_mode(&properties);
    let mut attack = NormalizedAttack::new(name, attack_bonus, damage, AttackSource::Inventory);
    attack.damage_type = damage_type;
    attack.mode = Some(mode);
    if matches!(mode, AttackMode::Ranged | AttackMode::Thrown) {
        attack.range = weapon_range(def);
    }
    attack.reach_feet = document::int_at(def, &["reach"])
        .or_else(|| document::int_at(def, &["range", "reach"]))
        .or_else(|| document::int_at(def, &["weaponRange", "reach"]))
        .filter(|r| *r > 0)
        .map(|r| r as i32);
    attack.is_magic = magic != 0 || document::flag(def, &["magic"]);
    attack.properties = properties;
    Some(attack)
}

/// Ammunition weapons use dexterity, finesse weapons the better of strength
/// and dexterity, everything else strength.
fn governing_modifier(properties: &[WeaponProperty], statblock: &Statblock) -> i32 {
    let str_mod = statblock.ability_modifier(Ability::Strength);
    let dex_mod = statblock.ability_modifier(Ability::Dexterity);
    if properties.contains(&WeaponProperty::Ammunition) {
        dex_mod
    } else if properties.contains(&WeaponProperty::Finesse) {
        str_mod.max(dex_mod)
    } else {
        str_mod
    }
}

fn attack_mode(properties: &[WeaponProperty]) -> AttackMode {
    if properties.contains(&WeaponProperty::Ammunition) {
        AttackMode::Ranged
    } else if properties.contains(&WeaponProperty::Thrown) {
        AttackMode::Thrown
    } else if properties.contains(&WeaponProperty::Reach) {
        AttackMode::Reach
    } else {
        AttackMode::Melee
    }
}

fn magic_bonus(item: &Value, def: &Value) -> i32 {
    let explicit = [
        document::int_at(item, &["magicBonus"]),
        document::int_at(def, &["magicBonus"]),
    ]
    .into_iter()
    .flatten()
    .find(|b| *b != 0);
    if let Some(bonus) = explicit {
        return bonus as i32;
    }
    document::array_at(def, &["grantedModifiers"])
        .iter()
        .filter(|m| {
            compact_key(&document::scalar_text(m.get("type"))) == "bonus"
                && compact_key(&document::scalar_text(m.get("subType"))) == "magic"
        })
        .filter_map(|m| document::int_at(m, &["value"]))
        .sum::<i64>() as i32
}

fn weapon_properties(def: &Value) -> Vec<WeaponProperty> {
    let behavior_props = document::array_at(def, &["weaponBehaviors"])
        .first()
        .map(|b| document::array_at(b, &["properties"]))
        .unwrap_or(&[]);
    let listed = document::at(def, &["properties"])
        .or_else(|| document::at(def, &["weaponProperties"]))
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[]);

    let mut out = Vec::new();
    for raw in listed.iter().chain(behavior_props) {
        let label = match raw {
            Value::String(s) => Some(s.as_str()),
            other => document::text_at(other, &["name"]).or_else(|| document::text_at(other, &["type"])),
        };
        if let Some(property) = label.and_then(WeaponProperty::from_label)
            && !out.contains(&property)
        {
            out.push(property);
        }
    }
    out
}

fn weapon_range(def: &Value) -> Option<WeaponRange> {
    if let Some(normal) = document::int_at(def, &["range"]).filter(|r| *r > 0) {
        let long = document::int_at(def, &["longRange"])
            .filter(|l| *l > normal)
            .map(|l| l as i32);
        return Some(WeaponRange {
            normal: normal as i32,
            long,
        });
    }
    document::at(def, &["range"])
        .or_else(|| document::at(def, &["weaponRange"]))
        .and_then(range_from_value)
}

fn range_from_value(value: &Value) -> Option<WeaponRange> {
    if let Some(n) = document::int(value) {
        return (n > 0).then_some(WeaponRange {
            normal: n as i32,
            long: None,
        });
    }
    let normal = ["normal", "range", "value"]
        .iter()
        .find_map(|key| document::int_at(value, &[*key]))
        .filter(|n| *n > 0)?;
    let long = ["long", "longRange"]
        .iter()
        .find_map(|key| document::int_at(value, &[*key]))
        .filter(|l| *l > normal)
        .map(|l| l as i32);
    Some(WeaponRange {
        normal: normal as i32,
        long,
    })
}

/// Level of the first class that grants martial arts: a monk, or a class
/// whose unlocked features include "Martial Arts".
fn martial_arts_level(doc: &Value) -> Option<i32> {
    document::array_at(doc, &["classes"]).iter().find_map(|entry| {
        let level = document::int_at(entry, &["level"]).unwrap_or(0) as i32;
        let is_monk = stats::class_name(entry).is_some_and(heuristics::is_monk_class);
        let has_feature = class_feature_records(entry).into_iter().any(|feature| {
            let required = feature_required_level(feature);
            required <= i64::from(level)
                && document::record_name(feature).is_some_and(heuristics::is_martial_arts_feature)
        });
        (is_monk || has_feature).then_some(level.max(1))
    })
}

/// Feature records of a class entry: its own list plus the class and
/// subclass definitions' lists.
pub fn class_feature_records(entry: &Value) -> Vec<&Value> {
    [
        &["classFeatures"][..],
        &["definition", "classFeatures"][..],
        &["subclassDefinition", "classFeatures"][..],
    ]
    .into_iter()
    .flat_map(|path| document::array_at(entry, path))
    .collect()
}

pub fn feature_required_level(feature: &Value) -> i64 {
    document::int_at(feature, &["definition", "requiredLevel"])
        .or_else(|| document::int_at(feature, &["requiredLevel"]))
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::diagnostics::{NoDiagnostics, RecordingDiagnostics};
    use crate::modifiers::ModifierIndex;
    use crate::stats::normalize_statblock;

    fn run(doc: &Value) -> Vec<NormalizedAttack> {
        let sb = normalize_statblock(doc, &ModifierIndex::from_document(doc), &NoDiagnostics);
        extract_attacks(doc, &sb, &NoDiagnostics)
    }

    fn stats(str_score: i32, dex_score: i32) -> Value {
        json!([{ "id": 1, "value": str_score }, { "id": 2, "value": dex_score }])
    }

    #[test]
    fn longsword_from_inventory() {
        let doc = json!({
            "stats": [{ "value": 16 }],
            "classes": [{ "definition": { "name": "Fighter" }, "level": 5 }],
            "inventory": [{
                "equipped": true,
                "definition": { "name": "Longsword", "damage": { "diceCount": 1, "diceValue": 8 }, "type": "Martial Weapon" }
            }]
        });
        let attacks = run(&doc);
        assert_eq!(attacks.len(), 2);
        assert_eq!(attacks[0].name, "Longsword");
        assert_eq!(attacks[0].attack_bonus, 6);
        assert_eq!(attacks[0].damage, "1d8+3");
        assert_eq!(attacks[0].source, AttackSource::Inventory);
        assert_eq!(attacks[1].name, "Unarmed Strike");
        assert_eq!(attacks[1].attack_bonus, 6);
        assert_eq!(attacks[1].damage, "1+3");
        assert_eq!(attacks[1].damage_type, Some(DamageType::Bludgeoning));
    }

    #[test]
    fn finesse_uses_the_better_modifier_and_ammunition_uses_dexterity() {
        let doc = json!({
            "stats": stats(10, 16),
            "inventory": [
                { "definition": { "name": "Rapier", "filterType": "Weapon",
                    "damage": { "diceCount": 1, "diceValue": 8 }, "damageType": "Piercing",
                    "properties": [{ "name": "Finesse" }] } },
                { "definition": { "name": "Longbow", "filterType": "Weapon",
                    "damage": { "diceCount": 1, "diceValue": 8 },
                    "properties": ["Ammunition", "Heavy", "Two-Handed"], "range": 150, "longRange": 600 } },
                { "definition": { "name": "Handaxe", "filterType": "Weapon",
                    "damage": { "diceCount": 1, "diceValue": 6 },
                    "properties": [{ "name": "Light" }, { "name": "Thrown" }], "range": 20, "longRange": 60 } }
            ]
        });
        let attacks = run(&doc);
        let rapier = &attacks[0];
        assert_eq!((rapier.attack_bonus, rapier.damage.as_str()), (5, "1d8+3"));
        assert_eq!(rapier.damage_type, Some(DamageType::Piercing));

        let bow = &attacks[1];
        assert_eq!(bow.mode, Some(AttackMode::Ranged));
        assert_eq!(bow.range, Some(WeaponRange { normal: 150, long: Some(600) }));
        assert!(bow.properties.contains(&WeaponProperty::TwoHanded));

        let axe = &attacks[2];
        assert_eq!(axe.mode, Some(AttackMode::Thrown));
        assert_eq!((axe.attack_bonus, axe.damage.as_str()), (2, "1d6"));
    }

    #[test]
    fn magic_bonus_and_proficiency_flag() {
        let doc = json!({
            "stats": stats(14, 10),
            "inventory": [{
                "isProficient": false,
                "definition": { "name": "Flame Tongue", "filterType": "Weapon",
                    "damage": { "diceCount": 2, "diceValue": 6 },
                    "grantedModifiers": [{ "type": "bonus", "subType": "magic", "value": 1 }] }
            }]
        });
        let attacks = run(&doc);
        assert_eq!(attacks[0].attack_bonus, 3);
        assert_eq!(attacks[0].damage, "2d6+3");
        assert!(attacks[0].is_magic);
    }

    #[test]
    fn weapons_without_dice_and_unequipped_weapons_are_skipped() {
        let doc = json!({ "inventory": [
            { "definition": { "name": "Net", "filterType": "Weapon", "damage": null } },
            { "equipped": false, "definition": { "name": "Dagger", "filterType": "Weapon",
                "damage": { "diceCount": 1, "diceValue": 4 } } }
        ] });
        let attacks = run(&doc);
        assert_eq!(attacks.len(), 1);
        assert_eq!(attacks[0].source, AttackSource::Synthesized);
    }

    #[test]
    fn actions_take_precedence_and_are_deduplicated() {
        let doc = json!({
            "actions": {
                "race": [{ "name": "Bite", "toHit": 4, "damage": [{ "diceCount": 1, "diceValue": 6, "fixedValue": 2, "damageType": "piercing" }] }],
                "class": [
                    { "name": "Bite", "toHit": 4, "damage": [{ "diceCount": 1, "diceValue": 6, "fixedValue": 2, "damageType": "piercing" }] },
                    { "name": "Unarmed Strike", "actionType": "attack", "toHit": 5, "dice": { "fixedValue": 3 } }
                ]
            },
            "inventory": [{ "definition": { "name": "Club", "filterType": "Weapon", "damage": { "diceCount": 1, "diceValue": 4 } } }]
        });
        let sink = RecordingDiagnostics::new();
        let sb = normalize_statblock(&doc, &ModifierIndex::from_document(&doc), &NoDiagnostics);
        let attacks = extract_attacks(&doc, &sb, &sink);
        let names: Vec<_> = attacks.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, ["Bite", "Unarmed Strike"]);
        assert_eq!(attacks[0].damage, "1d6+2");
        assert_eq!(attacks[1].damage, "3");
        assert!(sink.take().contains(&Diagnostic::AttackStrategy { strategy: "actions", count: 3 }));
    }

    #[test]
    fn monks_get_martial_arts_dice_with_dexterity() {
        let doc = json!({
            "stats": stats(10, 16),
            "classes": [{ "definition": { "name": "Monk" }, "level": 11 }]
        });
        let attacks = run(&doc);
        assert_eq!(attacks.len(), 1);
        assert_eq!(attacks[0].attack_bonus, 4 + 3);
        assert_eq!(attacks[0].damage, "1d8+3");
    }

    #[test]
    fn martial_arts_feature_counts_only_once_unlocked() {
        let feature = json!({ "definition": { "name": "Martial Arts", "requiredLevel": 3 } });
        let locked = json!({ "classes": [{ "definition": { "name": "Fighter" }, "level": 2, "classFeatures": [feature.clone()] }] });
        let unlocked = json!({ "classes": [{ "definition": { "name": "Fighter" }, "level": 3, "classFeatures": [feature] }] });
        assert_eq!(martial_arts_level(&locked), None);
        assert_eq!(martial_arts_level(&unlocked), Some(3));
    }

    #[test]
    fn unarmed_synthesis_is_idempotent() {
        let profile = UnarmedProfile {
            proficiency_bonus: 2,
            strength_mod: 1,
            dexterity_mod: 3,
            martial_arts_level: None,
        };
        let mut attacks = Vec::new();
        ensure_unarmed_strike(&mut attacks, &profile, &NoDiagnostics);
        ensure_unarmed_strike(&mut attacks, &profile, &NoDiagnostics);
        assert_eq!(attacks.len(), 1);
        assert_eq!(attacks[0].damage, "1+1");
    }

    #[test]
    fn korean_unarmed_names_suppress_synthesis() {
        let doc = json!({ "actions": [{ "name": "비무장 타격", "actionType": "attack", "toHit": 3 }] });
        let attacks = run(&doc);
        assert_eq!(attacks.len(), 1);
        assert_eq!(attacks[0].name, "비무장 타격");
    }

    #[test]
    fn property_labels() {
        assert_eq!(WeaponProperty::from_label("Two-Handed"), Some(WeaponProperty::TwoHanded));
        assert_eq!(WeaponProperty::from_label("two handed"), Some(WeaponProperty::TwoHanded));
        assert_eq!(WeaponProperty::from_label("Silvered"), None);
    }
}
