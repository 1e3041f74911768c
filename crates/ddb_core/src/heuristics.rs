//! Keyword classifiers over loosely typed source records.
//!
//! Every predicate here is pure and looks at a single record, so new source
//! variants can be covered by adding a test case.

use serde::Serialize;
use serde_json::Value;

use crate::ability::Ability;
use crate::document::{self, normalize_text};

fn lower_text(value: &Value, path: &[&str]) -> String {
    document::scalar_text(document::at(value, path)).to_lowercase()
}

/// A weapon is anything typed as one, or anything carrying damage data.
pub fn is_weapon_definition(def: &Value) -> bool {
    let typed = ["filterType", "type", "subType"]
        .iter()
        .any(|key| lower_text(def, &[*key]).contains("weapon"));
    let has_damage = document::at(def, &["damage"]).is_some()
        || !document::array_at(def, &["weaponBehaviors"]).is_empty();
    typed || has_damage
}

/// Numeric base armor class of an armor-like definition.
pub fn armor_base(def: &Value) -> Option<i32> {
    ["armorClass", "armorClassValue", "baseArmorClass"]
        .iter()
        .find_map(|key| document::int_at(def, &[*key]))
        .map(|v| v as i32)
}

pub fn is_armor_like(def: &Value) -> bool {
    armor_base(def).is_some()
}

pub fn is_shield_like(def: &Value) -> bool {
    if document::int_at(def, &["armorTypeId"]) == Some(4) {
        return true;
    }
    let typed = ["armorType", "armorCategory", "subType", "type"]
        .iter()
        .any(|key| lower_text(def, &[*key]).contains("shield"));
    let name = lower_text(def, &["name"]);
    typed || name.contains("shield") || name.contains("방패")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArmorCategory {
    Light,
    Medium,
    Heavy,
    Shield,
    Unclassified,
}

pub fn armor_category(def: &Value) -> ArmorCategory {
    if is_shield_like(def) {
        return ArmorCategory::Shield;
    }
    match document::int_at(def, &["armorTypeId"]) {
        Some(1) => return ArmorCategory::Light,
        Some(2) => return ArmorCategory::Medium,
        Some(3) => return ArmorCategory::Heavy,
        _ => {}
    }
    let hay = format!("{} {}", lower_text(def, &["type"]), lower_text(def, &["subType"]));
    if hay.contains("heavy") {
        ArmorCategory::Heavy
    } else if hay.contains("medium") {
        ArmorCategory::Medium
    } else if hay.contains("light") {
        ArmorCategory::Light
    } else {
        ArmorCategory::Unclassified
    }
}

/// An action entry that represents an attack: it has a name and either an
/// attack-ish `actionType`, or a to-hit value together with damage data.
pub fn looks_like_attack_action(node: &Value) -> bool {
    if document::text_at(node, &["name"]).is_none() {
        return false;
    }
    let action_type = lower_text(node, &["actionType"]);
    let typed = matches!(action_type.as_str(), "attack" | "weapon" | "melee" | "ranged");
    let has_to_hit = document::at(node, &["toHit"]).is_some()
        || document::at(node, &["fixedToHit"]).is_some();
    let has_damage = !document::array_at(node, &["damage"]).is_empty()
        || document::at(node, &["dice"]).is_some_and(Value::is_object);
    typed || (has_to_hit && has_damage)
}

pub fn is_unarmed_name(name: &str) -> bool {
    let n = normalize_text(name);
    n == "unarmed strike" || n.contains("unarmed") || n == "비무장 타격" || n.contains("비무장")
}

pub fn is_monk_class(class_name: &str) -> bool {
    normalize_text(class_name) == "monk"
}

pub fn is_martial_arts_feature(name: &str) -> bool {
    normalize_text(name) == "martial arts"
}

/// Spellcasting ability guessed from a class name.
pub fn class_spell_ability(class_name: &str) -> Option<Ability> {
    let name = class_name.to_lowercase();
    let has_any = |words: &[&str]| words.iter().any(|w| name.contains(w));
    if has_any(&["wizard", "artificer", "rogue", "fighter"]) {
        Some(Ability::Intelligence)
    } else if has_any(&["cleric", "druid", "ranger", "monk"]) {
        Some(Ability::Wisdom)
    } else if has_any(&["warlock", "sorcerer", "bard", "paladin"]) {
        Some(Ability::Charisma)
    } else {
        None
    }
}

const MANEUVER_NOISE: [&str; 8] = [
    "Combat Superiority",
    "Maneuvers",
    "Superiority Dice",
    "Combat Superiority (Fighter)",
    "Improved Combat Superiority",
    "Relentless",
    "Martial Adept",
    "Superior Technique",
];

/// True for names written as `"Maneuvers: Trip Attack"` or `"Maneuver: ..."`.
pub fn has_maneuver_prefix(name: &str) -> bool {
    let lower = name.trim_start().to_lowercase();
    lower.starts_with("maneuvers:") || lower.starts_with("maneuver:")
}

/// Whether a feature record's text mentions superiority dice.
pub fn mentions_superiority_die(node: &Value) -> bool {
    let def = document::at(node, &["definition"]).unwrap_or(node);
    ["snippet", "description"].iter().any(|key| {
        normalize_text(&document::scalar_text(document::at(def, &[*key])))
            .contains("superiority di")
    })
}

/// Whether a record's name, type fields or text mention maneuvers.
pub fn mentions_maneuvers(node: &Value) -> bool {
    let def = document::at(node, &["definition"]).unwrap_or(node);
    if document::record_name(node).is_some_and(|name| {
        has_maneuver_prefix(name) || name.trim().eq_ignore_ascii_case("maneuvers")
    }) {
        return true;
    }
    [
        "featureType",
        "type",
        "subType",
        "category",
        "entityType",
        "friendlySubtypeName",
        "snippet",
        "description",
    ]
    .iter()
    .any(|key| {
        normalize_text(&document::scalar_text(document::at(def, &[*key]))).contains("maneuver")
    })
}

/// Display name of a maneuver with any prefix removed, or `None` for
/// header entries and fragments.
pub fn maneuver_display_name(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let lower = trimmed.to_lowercase();
    let stripped = ["maneuvers:", "maneuver:"]
        .iter()
        .find(|prefix| lower.starts_with(*prefix))
        .map_or(trimmed, |prefix| trimmed.get(prefix.len()..).unwrap_or("").trim());
    if stripped.chars().count() < 3 || MANEUVER_NOISE.contains(&stripped) {
        return None;
    }
    Some(stripped.to_string())
}

/// Spell-shaped record: a name, a level and at least one piece of spell
/// metadata, either inline or under `definition`.
pub fn looks_like_spell_record(node: &Value) -> bool {
    let def = document::at(node, &["definition"]).unwrap_or(node);
    if document::text_at(def, &["name"]).is_none() {
        return false;
    }
    let has_level = document::at(def, &["level"]).is_some()
        || document::at(def, &["spellLevel"]).is_some();
    let has_meta = ["school", "components", "castingTime", "activation", "duration"]
        .iter()
        .any(|key| document::at(def, &[*key]).is_some());
    has_level && has_meta
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SpellRoll {
    Attack,
    Save,
    Other,
}

/// Which roll a spell definition asks for.
pub fn classify_spell(def: &Value) -> SpellRoll {
    if document::flag(def, &["requiresAttackRoll"]) || document::at(def, &["attackType"]).is_some()
    {
        SpellRoll::Attack
    } else if document::flag(def, &["requiresSavingThrow"]) {
        SpellRoll::Save
    } else {
        SpellRoll::Other
    }
}
