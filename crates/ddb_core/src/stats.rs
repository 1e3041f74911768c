//! Derived statistics: the normalized statblock every extractor reads.

use serde::Serialize;
use serde_json::Value;

use crate::ability::{self, Ability, AbilityValues};
use crate::armor;
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::document::{self, Probe};
use crate::modifiers::{Modifier, ModifierIndex};
use crate::skills::{ProficiencyLevel, Skill};

const DEFAULT_SPEED: i32 = 30;
const UNNAMED: &str = "Unnamed";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassLevel {
    pub class_id: Option<i64>,
    pub class_name: String,
    pub subclass_name: Option<String>,
    pub level: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillModifier {
    pub skill: Skill,
    pub proficiency: ProficiencyLevel,
    pub modifier: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Statblock {
    pub name: String,
    pub classes: Vec<ClassLevel>,
    pub level: i32,
    pub proficiency_bonus: i32,
    pub hp_max: i32,
    pub hp_current: i32,
    pub ac: i32,
    pub ac_source: &'static str,
    pub speed_feet: i32,
    pub initiative: i32,
    pub ability_scores: AbilityValues,
    pub ability_modifiers: AbilityValues,
    pub save_modifiers: AbilityValues,
    pub save_proficiencies: Vec<Ability>,
    pub skills: Vec<SkillModifier>,
    pub spell_attack_bonus_bonus: i32,
    pub spell_save_dc_bonus: i32,
}

impl Statblock {
    pub fn ability_modifier(&self, ability: Ability) -> i32 {
        self.ability_modifiers.get(ability)
    }

    pub fn skill(&self, skill: Skill) -> Option<&SkillModifier> {
        self.skills.iter().find(|s| s.skill == skill)
    }

    pub fn skill_modifier(&self, skill: Skill) -> i32 {
        self.skill(skill)
            .map_or_else(|| self.ability_modifier(skill.ability()), |s| s.modifier)
    }

    /// Level in the first class whose name satisfies `predicate`.
    pub fn class_level(&self, predicate: impl Fn(&str) -> bool) -> Option<i32> {
        self.classes
            .iter()
            .find(|c| predicate(&c.class_name))
            .map(|c| c.level)
    }

    /// `"Fighter 5 / Wizard 2"`.
    pub fn class_summary(&self) -> String {
        self.classes
            .iter()
            .map(|c| format!("{} {}", c.class_name, c.level))
            .collect::<Vec<_>>()
            .join(" / ")
    }
}

pub fn proficiency_bonus_for_level(level: i32) -> i32 {
    match level {
        l if l >= 17 => 6,
        l if l >= 13 => 5,
        l if l >= 9 => 4,
        l if l >= 5 => 3,
        _ => 2,
    }
}

pub fn normalize_statblock(
    doc: &Value,
    modifiers: &ModifierIndex,
    diag: &dyn Diagnostics,
) -> Statblock {
    let name = document::text_at(doc, &["name"])
        .unwrap_or(UNNAMED)
        .to_string();
    let classes = class_levels(doc);
    let level = match classes.iter().map(|c| c.level).sum::<i32>() {
        total if total > 0 => total,
        _ => 1,
    };

    let proficiency_bonus = match modifiers.sum_bonus(|m| m.kind_is("proficiency-bonus")) {
        0 => proficiency_bonus_for_level(level),
        explicit => {
            resolved(diag, "proficiency_bonus", "modifier", explicit);
            explicit
        }
    };

    let ability_scores = ability::resolve_scores(doc, modifiers);
    let ability_modifiers = ability_scores.map(ability::modifier);
    let dex_mod = ability_modifiers.dex;

    let (hp_max, hp_current) =
        hit_points(doc, modifiers, ability_modifiers.con, level, diag);
    let (ac, ac_source) = armor_class(doc, modifiers, dex_mod);
    resolved(diag, "ac", ac_source, ac);

    let speed_feet = match document::first_present(doc, SPEED_PROBES) {
        Some((source, speed)) => {
            resolved(diag, "speed", source, speed);
            speed
        }
        None => DEFAULT_SPEED,
    };

    let save_proficiencies: Vec<Ability> = Ability::ALL
        .into_iter()
        .filter(|a| {
            let key = saving_throw_key(*a);
            modifiers.has_flag(|m| m.sub_type_is(&key), "proficiency")
        })
        .collect();
    let save_modifiers = AbilityValues::from_fn(|a| {
        let key = saving_throw_key(a);
        let proficiency = if save_proficiencies.contains(&a) {
            proficiency_bonus
        } else {
            0
        };
        let bonus = modifiers.sum_bonus(|m| {
            m.kind_is("bonus") && (m.sub_type_is(&key) || m.sub_type_is("saving-throws"))
        });
        ability_modifiers.get(a) + proficiency + bonus
    });

    let skills = Skill::ALL
        .into_iter()
        .map(|skill| {
            let proficiency = skill_proficiency(modifiers, skill);
            let modifier = ability_modifiers.get(skill.ability())
                + proficiency.contribution(proficiency_bonus)
                + skill_bonus(modifiers, skill);
            SkillModifier {
                skill,
                proficiency,
                modifier,
            }
        })
        .collect();

    let spell_attack_bonus_bonus = modifiers.sum_bonus(|m| is_spell_bonus(m) && is_spell_attack(m));
    let spell_save_dc_bonus = modifiers.sum_bonus(|m| is_spell_bonus(m) && is_spell_save_dc(m));

    tracing::debug!(
        %name,
        level,
        proficiency_bonus,
        hp_max,
        ac,
        ac_source,
        speed_feet,
        "normalized statblock"
    );

    Statblock {
        name,
        classes,
        level,
        proficiency_bonus,
        hp_max,
        hp_current,
        ac,
        ac_source,
        speed_feet,
        initiative: dex_mod,
        ability_scores,
        ability_modifiers,
        save_modifiers,
        save_proficiencies,
        skills,
        spell_attack_bonus_bonus,
        spell_save_dc_bonus,
    }
}

fn resolved(diag: &dyn Diagnostics, field: &'static str, source: &'static str, value: i32) {
    diag.record(Diagnostic::ValueResolved {
        field,
        source,
        value: i64::from(value),
    });
}

/// Display name of a class entry, trying the shapes seen in the wild.
pub fn class_name(entry: &Value) -> Option<&str> {
    document::text_at(entry, &["definition", "name"])
        .or_else(|| document::text_at(entry, &["class", "definition", "name"]))
        .or_else(|| document::text_at(entry, &["class", "name"]))
        .or_else(|| document::text_at(entry, &["name"]))
}

fn class_levels(doc: &Value) -> Vec<ClassLevel> {
    document::array_at(doc, &["classes"])
        .iter()
        .filter_map(|entry| {
            let class_name = class_name(entry)?.to_string();
            Some(ClassLevel {
                class_id: document::int_at(entry, &["id"]),
                class_name,
                subclass_name: document::text_at(entry, &["subclassDefinition", "name"])
                    .map(str::to_string),
                level: document::int_at(entry, &["level"]).unwrap_or(0).max(0) as i32,
            })
        })
        .collect()
}

fn hit_points(
    doc: &Value,
    modifiers: &ModifierIndex,
    con_mod: i32,
    level: i32,
    diag: &dyn Diagnostics,
) -> (i32, i32) {
    let max = match document::int_at(doc, &["overrideHitPoints"]).filter(|hp| *hp > 0) {
        Some(overridden) => {
            resolved(diag, "hp_max", "override", overridden as i32);
            overridden as i32
        }
        None => {
            let base = document::int_at(doc, &["baseHitPoints"]).unwrap_or(0) as i32;
            let bonus = document::int_at(doc, &["bonusHitPoints"]).unwrap_or(0) as i32;
            let per_level = modifiers
                .sum_bonus(|m| m.kind_is("bonus") && m.sub_type_is("hit-points-per-level"));
            base + bonus + con_mod * level + per_level * level
        }
    };
    let removed = document::int_at(doc, &["removedHitPoints"]).unwrap_or(0) as i32;
    let temporary = document::int_at(doc, &["temporaryHitPoints"]).unwrap_or(0) as i32;
    (max, (max - removed + temporary).max(0))
}

fn positive(value: Option<i64>) -> Option<i32> {
    value.filter(|v| *v > 0).map(|v| v as i32)
}

fn walk_speed_normal(doc: &Value) -> Option<i32> {
    positive(document::int_at(doc, &["race", "weightSpeeds", "normal", "walk"]))
}

fn walk_speed_flat(doc: &Value) -> Option<i32> {
    positive(document::int_at(doc, &["race", "weightSpeeds", "walk"]))
}

fn custom_walk(doc: &Value) -> Option<i32> {
    positive(document::int_at(doc, &["customSpeeds", "walk"]))
}

fn custom_walk_speed(doc: &Value) -> Option<i32> {
    positive(document::int_at(doc, &["customSpeeds", "walkSpeed"]))
}

fn top_level_speed(doc: &Value) -> Option<i32> {
    positive(document::int_at(doc, &["speed"]))
}

const SPEED_PROBES: &[Probe<i32>] = &[
    ("race.weightSpeeds.normal.walk", walk_speed_normal),
    ("race.weightSpeeds.walk", walk_speed_flat),
    ("customSpeeds.walk", custom_walk),
    ("customSpeeds.walkSpeed", custom_walk_speed),
    ("speed", top_level_speed),
];

fn direct_armor_class(doc: &Value) -> Option<i32> {
    positive(document::int_at(doc, &["armorClass"]))
}

fn short_armor_class(doc: &Value) -> Option<i32> {
    positive(document::int_at(doc, &["ac"]))
}

fn override_armor_class(doc: &Value) -> Option<i32> {
    positive(document::int_at(doc, &["overrideArmorClass"]))
}

const ARMOR_CLASS_PROBES: &[Probe<i32>] = &[
    ("armorClass", direct_armor_class),
    ("ac", short_armor_class),
    ("overrideArmorClass", override_armor_class),
    ("characterValues", armor_class_from_character_values),
];

fn armor_class_from_character_values(doc: &Value) -> Option<i32> {
    document::array_at(doc, &["characterValues"])
        .iter()
        .find_map(|cv| {
            let kind = ["type", "valueType"]
                .iter()
                .find_map(|key| document::at(cv, &[*key]))
                .or_else(|| document::at(cv, &["definition", "type"]));
            let kind = document::scalar_text(kind).to_lowercase();
            let is_ac = (kind.contains("armor") && kind.contains("class"))
                || matches!(kind.as_str(), "armor-class" | "armorclass" | "ac");
            if !is_ac {
                return None;
            }
            ["value", "calculatedValue", "valueInt", "valueNumber"]
                .iter()
                .find_map(|key| document::int_at(cv, &[*key]))
                .and_then(|v| positive(Some(v)))
        })
}

/// Explicit document values first, otherwise worn gear plus flat bonuses
/// that the gear evaluation has not already counted.
fn armor_class(doc: &Value, modifiers: &ModifierIndex, dex_mod: i32) -> (i32, &'static str) {
    if let Some((source, ac)) = document::first_present(doc, ARMOR_CLASS_PROBES) {
        return (ac, source);
    }

    let evaluation = armor::evaluate_armor(doc, dex_mod);
    let wearing_armor = evaluation.armor.is_some();
    let flat = modifiers.sum_bonus(|m| {
        let applies = m.sub_type_is("armor-class")
            || (wearing_armor && m.sub_type_is("armored-armor-class"))
            || (!wearing_armor && m.sub_type_is("unarmored-armor-class"));
        m.kind_is("bonus")
            && applies
            && !m.is_set_like()
            && !evaluation.already_counts(m.component_id, m.value)
    });
    ((evaluation.armor_class + flat).max(1), "computed")
}

fn saving_throw_key(ability: Ability) -> String {
    format!("{}-saving-throws", ability.full_name())
}

fn skill_proficiency(modifiers: &ModifierIndex, skill: Skill) -> ProficiencyLevel {
    let key = skill.ddb_key();
    if modifiers.has_flag(|m| m.sub_type_is(key), "expertise") {
        return ProficiencyLevel::Expertise;
    }
    if modifiers.has_flag(|m| m.sub_type_is(key), "proficiency") {
        return ProficiencyLevel::Proficient;
    }
    let ability_checks = format!("{}-ability-checks", skill.ability().full_name());
    let half = modifiers.has_flag(
        |m| m.sub_type_is("ability-checks") || m.sub_type_is(&ability_checks) || m.sub_type_is(key),
        "half-proficiency",
    );
    if half {
        ProficiencyLevel::Half
    } else {
        ProficiencyLevel::None
    }
}

fn skill_bonus(modifiers: &ModifierIndex, skill: Skill) -> i32 {
    let key = skill.ddb_key();
    let ability_checks = format!("{}-ability-checks", skill.ability().full_name());
    modifiers.sum_bonus(|m| {
        m.kind_is("bonus")
            && (m.sub_type_is(key)
                || m.sub_type_is("ability-checks")
                || m.sub_type_is(&ability_checks))
    })
}

fn is_spell_bonus(m: &Modifier) -> bool {
    m.value.is_some_and(|v| v != 0.0) && m.mentions("spell")
}

fn is_spell_attack(m: &Modifier) -> bool {
    let st = m.sub_type_key();
    st.contains("spell-attack")
        || st.contains("spellattack")
        || m.friendly_key().contains("spell attack")
}

fn is_spell_save_dc(m: &Modifier) -> bool {
    let st = m.sub_type_key();
    let friendly = m.friendly_key();
    st.contains("spell-save")
        || st.contains("spellsavedc")
        || friendly.contains("save dc")
        || friendly.contains("spell save")
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::diagnostics::{NoDiagnostics, RecordingDiagnostics};

    fn statblock(doc: &Value) -> Statblock {
        normalize_statblock(doc, &ModifierIndex::from_document(doc), &NoDiagnostics)
    }

    #[test]
    fn proficiency_tiers() {
        let expected = [(1, 2), (4, 2), (5, 3), (8, 3), (9, 4), (12, 4), (13, 5), (16, 5), (17, 6), (20, 6)];
        for (level, pb) in expected {
            assert_eq!(proficiency_bonus_for_level(level), pb, "level {level}");
        }
    }

    #[test]
    fn explicit_proficiency_modifier_wins() {
        let doc = json!({
            "classes": [{ "definition": { "name": "Fighter" }, "level": 1 }],
            "modifiers": [{ "type": "proficiency-bonus", "subType": "", "value": 4 }]
        });
        assert_eq!(statblock(&doc).proficiency_bonus, 4);
    }

    #[test]
    fn empty_document_degrades_to_defaults() {
        let sb = statblock(&json!({}));
        assert_eq!(sb.name, "Unnamed");
        assert_eq!(sb.level, 1);
        assert_eq!(sb.proficiency_bonus, 2);
        assert_eq!(sb.hp_max, 0);
        assert_eq!(sb.hp_current, 0);
        assert_eq!(sb.ac, 10);
        assert_eq!(sb.speed_feet, 30);
        assert_eq!(sb.initiative, 0);
        assert_eq!(sb.skills.len(), 18);
    }

    #[test]
    fn hit_points_from_parts_and_damage() {
        let doc = json!({
            "stats": [{ "id": 3, "value": 14 }],
            "classes": [{ "definition": { "name": "Fighter" }, "level": 3 }],
            "baseHitPoints": 20,
            "bonusHitPoints": 1,
            "removedHitPoints": 40,
            "temporaryHitPoints": 5,
            "modifiers": [{ "type": "bonus", "subType": "hit-points-per-level", "value": 1 }]
        });
        let sb = statblock(&doc);
        assert_eq!(sb.hp_max, 20 + 1 + 2 * 3 + 3);
        assert_eq!(sb.hp_current, 0);
    }

    #[test]
    fn positive_hit_point_override_wins() {
        let doc = json!({ "overrideHitPoints": 44, "baseHitPoints": 10, "removedHitPoints": 4 });
        let sb = statblock(&doc);
        assert_eq!(sb.hp_max, 44);
        assert_eq!(sb.hp_current, 40);
    }

    #[test]
    fn save_proficiency_and_bonus() {
        let doc = json!({
            "stats": [{ "id": 1, "value": 16 }, { "id": 3, "value": 12 }],
            "classes": [{ "definition": { "name": "Fighter" }, "level": 5 }],
            "modifiers": { "class": [
                { "type": "proficiency", "subType": "strength-saving-throws" },
                { "type": "bonus", "subType": "saving-throws", "value": 1 }
            ] }
        });
        let sb = statblock(&doc);
        assert_eq!(sb.save_modifiers.str, 3 + 3 + 1);
        assert_eq!(sb.save_modifiers.con, 1 + 1);
        assert_eq!(sb.save_proficiencies, vec![Ability::Strength]);
    }

    #[test]
    fn expertise_beats_proficiency_and_half_is_floored() {
        let doc = json!({
            "stats": [{ "id": 2, "value": 14 }, { "id": 4, "value": 10 }],
            "classes": [{ "definition": { "name": "Bard" }, "level": 5 }],
            "modifiers": [
                { "type": "proficiency", "subType": "stealth" },
                { "type": "expertise", "subType": "stealth" },
                { "type": "half-proficiency", "subType": "ability-checks" }
            ]
        });
        let sb = statblock(&doc);
        let stealth = sb.skill(Skill::Stealth).map(|s| (s.proficiency, s.modifier));
        assert_eq!(stealth, Some((ProficiencyLevel::Expertise, 2 + 6)));
        let arcana = sb.skill(Skill::Arcana).map(|s| (s.proficiency, s.modifier));
        assert_eq!(arcana, Some((ProficiencyLevel::Half, 1)));
    }

    #[test]
    fn speed_takes_first_positive_candidate() {
        let doc = json!({ "race": { "weightSpeeds": { "normal": { "walk": 0 } } }, "speed": 25 });
        assert_eq!(statblock(&doc).speed_feet, 25);
        let doc = json!({ "race": { "weightSpeeds": { "normal": { "walk": 35 } } }, "speed": 25 });
        assert_eq!(statblock(&doc).speed_feet, 35);
    }

    #[test]
    fn explicit_armor_class_beats_computation() {
        let doc = json!({
            "armorClass": 0,
            "characterValues": [{ "type": "Armor Class Override", "value": 19 }],
            "inventory": [{ "equipped": true, "definition": { "armorClass": 11 } }]
        });
        let sink = RecordingDiagnostics::new();
        let sb = normalize_statblock(&doc, &ModifierIndex::from_document(&doc), &sink);
        assert_eq!((sb.ac, sb.ac_source), (19, "characterValues"));
        assert!(sink.take().contains(&Diagnostic::ValueResolved {
            field: "ac",
            source: "characterValues",
            value: 19
        }));
    }

    #[test]
    fn flat_armor_class_bonus_is_added_without_double_counting() {
        let doc = json!({
            "stats": [{ "id": 2, "value": 12 }],
            "inventory": [
                { "equipped": true, "definition": { "id": 5, "name": "Chain Mail", "armorClass": 16, "armorTypeId": 3 } }
            ],
            "modifiers": { "item": [
                { "type": "bonus", "subType": "armor-class", "value": 16, "componentId": 5 },
                { "type": "bonus", "subType": "armor-class", "value": 1, "componentId": 9 },
                { "type": "bonus", "subType": "unarmored-armor-class", "value": 2 }
            ] }
        });
        let sb = statblock(&doc);
        assert_eq!((sb.ac, sb.ac_source), (17, "computed"));
    }

    #[test]
    fn spell_bonuses_from_rod_like_items() {
        let doc = json!({ "modifiers": [
            { "type": "bonus", "subType": "spell-attacks", "value": 1 },
            { "type": "bonus", "subType": "spell-save-dc", "value": 1 },
            { "type": "bonus", "subType": "warlock-spell-attacks", "value": 0 }
        ] });
        let sb = statblock(&doc);
        assert_eq!(sb.spell_attack_bonus_bonus, 1);
        assert_eq!(sb.spell_save_dc_bonus, 1);
    }

    #[test]
    fn class_summary_lists_every_class() {
        let doc = json!({ "classes": [
            { "definition": { "name": "Fighter" }, "level": 3, "subclassDefinition": { "name": "Battle Master" } },
            { "class": { "name": "Wizard" }, "level": 2 }
        ] });
        let sb = statblock(&doc);
        assert_eq!(sb.level, 5);
        assert_eq!(sb.class_summary(), "Fighter 3 / Wizard 2");
        assert_eq!(sb.classes[0].subclass_name.as_deref(), Some("Battle Master"));
    }
}
