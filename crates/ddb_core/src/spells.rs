//! Spell discovery and spellcasting math.
//!
//! Spells are gathered from three places: the per-class spell lists, the
//! by-source spell map (race, feat, item, background), and spell records
//! nested inside unlocked class and subclass features. Occurrences are
//! merged by display name. Leveled spells whose preparedness cannot be
//! established are kept in a separate bucket rather than dropped.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use serde_json::Value;

use crate::ability::Ability;
use crate::attacks::{class_feature_records, feature_required_level};
use crate::damage::DamageType;
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::dice;
use crate::document::{self, compact_key, normalize_text};
use crate::heuristics::{self, SpellRoll};
use crate::stats::{self, Statblock};

const EFFECT_MAX_CHARS: usize = 240;
const DEFAULT_SPELL_ABILITY: Ability = Ability::Charisma;

const PATH_CLASS_SPELLS: &str = "class_spells";
const PATH_BY_SOURCE: &str = "spells_by_source";
const PATH_CLASS_FEATURES: &str = "class_features";

static DESCRIPTION_DAMAGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d+d\d+)\s+([a-z]+)\s+damage").expect("valid regex"));

/// Where a spell was granted from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "source", content = "name", rename_all = "snake_case")]
pub enum SpellOrigin {
    Class(String),
    ClassFeature(String),
    Race,
    Feat,
    Item,
    Background,
    Other,
}

impl SpellOrigin {
    fn from_source_key(key: &str, default_class: &str) -> Self {
        match compact_key(key).as_str() {
            "race" => SpellOrigin::Race,
            "feat" => SpellOrigin::Feat,
            "item" => SpellOrigin::Item,
            "background" => SpellOrigin::Background,
            "class" => SpellOrigin::ClassFeature(default_class.to_string()),
            _ => SpellOrigin::Other,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivationUnit {
    Action,
    BonusAction,
    Reaction,
    Minute,
    Hour,
    Special,
}

impl ActivationUnit {
    fn from_ddb_id(id: i64) -> Self {
        match id {
            1 => ActivationUnit::Action,
            3 => ActivationUnit::BonusAction,
            4 => ActivationUnit::Reaction,
            6 => ActivationUnit::Minute,
            7 => ActivationUnit::Hour,
            _ => ActivationUnit::Special,
        }
    }

    fn from_label(raw: &str) -> Self {
        let lower = raw.to_lowercase();
        if lower.contains("bonus") {
            ActivationUnit::BonusAction
        } else if lower.contains("reaction") {
            ActivationUnit::Reaction
        } else if lower.contains("action") {
            ActivationUnit::Action
        } else if lower.contains("minute") {
            ActivationUnit::Minute
        } else if lower.contains("hour") {
            ActivationUnit::Hour
        } else {
            ActivationUnit::Special
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CastingTime {
    pub amount: i32,
    pub unit: ActivationUnit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DurationUnit {
    Round,
    Minute,
    Hour,
    Day,
}

impl DurationUnit {
    fn from_label(raw: &str) -> Option<Self> {
        let lower = raw.to_lowercase();
        if lower.contains("round") {
            Some(DurationUnit::Round)
        } else if lower.contains("minute") {
            Some(DurationUnit::Minute)
        } else if lower.contains("hour") {
            Some(DurationUnit::Hour)
        } else if lower.contains("day") {
            Some(DurationUnit::Day)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SpellDuration {
    Instantaneous,
    Special,
    Timed { amount: i32, unit: DurationUnit },
    Other { label: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SpellComponent {
    Verbal,
    Somatic,
    Material,
}

impl SpellComponent {
    const ALL: [SpellComponent; 3] = [
        SpellComponent::Verbal,
        SpellComponent::Somatic,
        SpellComponent::Material,
    ];

    fn ddb_id(self) -> i64 {
        match self {
            SpellComponent::Verbal => 1,
            SpellComponent::Somatic => 2,
            SpellComponent::Material => 3,
        }
    }

    pub fn letter(self) -> &'static str {
        match self {
            SpellComponent::Verbal => "V",
            SpellComponent::Somatic => "S",
            SpellComponent::Material => "M",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AreaOfEffect {
    pub shape: String,
    pub size_feet: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpellRange {
    /// `"Self"`, `"Touch"`, `"Ranged"` and similar, as the source names it.
    pub origin: Option<String>,
    pub feet: Option<i32>,
    pub area: Option<AreaOfEffect>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpellDetails {
    pub range: Option<SpellRange>,
    pub casting_time: Option<CastingTime>,
    pub duration: Option<SpellDuration>,
    pub components: Vec<SpellComponent>,
    pub concentration: bool,
    pub ritual: bool,
    pub effect: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum SpellKind {
    SpellAttack {
        to_hit_bonus: i32,
        damage: Option<String>,
        damage_type: Option<DamageType>,
    },
    SpellSave {
        dc: i32,
        save_ability: Option<Ability>,
        damage: Option<String>,
        damage_type: Option<DamageType>,
    },
    SpellOther {},
}

impl SpellKind {
    pub fn damage(&self) -> Option<(&str, Option<&DamageType>)> {
        match self {
            SpellKind::SpellAttack {
                damage: Some(dice),
                damage_type,
                ..
            }
            | SpellKind::SpellSave {
                damage: Some(dice),
                damage_type,
                ..
            } => Some((dice.as_str(), damage_type.as_ref())),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpellAction {
    pub name: String,
    pub level: i32,
    pub origin: SpellOrigin,
    pub prepared: bool,
    #[serde(flatten)]
    pub kind: SpellKind,
    pub details: SpellDetails,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassSpellcasting {
    pub class_name: String,
    pub ability: Ability,
    pub attack_bonus: i32,
    pub save_dc: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpellBook {
    pub spellcasting: Vec<ClassSpellcasting>,
    pub prepared: Vec<SpellAction>,
    pub unprepared: Vec<SpellAction>,
}

impl SpellBook {
    pub fn is_empty(&self) -> bool {
        self.spellcasting.is_empty() && self.prepared.is_empty() && self.unprepared.is_empty()
    }

    pub fn all(&self) -> impl Iterator<Item = &SpellAction> {
        self.prepared.iter().chain(&self.unprepared)
    }
}

struct Candidate<'a> {
    record: &'a Value,
    def: &'a Value,
    origin: SpellOrigin,
    ability: Ability,
    path: &'static str,
}

/// The castable spell actions of a character.
pub fn extract_spell_actions(
    doc: &Value,
    statblock: &Statblock,
    diag: &dyn Diagnostics,
) -> Vec<SpellAction> {
    extract_spell_book(doc, statblock, diag).prepared
}

pub fn extract_spell_book(doc: &Value, statblock: &Statblock, diag: &dyn Diagnostics) -> SpellBook {
    let candidates = discover(doc);
    tracing::debug!(count = candidates.len(), "discovered spell records");

    let mut merged: Vec<SpellAction> = Vec::new();
    let mut by_name: HashMap<String, usize> = HashMap::new();
    for candidate in &candidates {
        let Some(action) = build_action(candidate, statblock, diag) else {
            continue;
        };
        let key = normalize_text(&action.name);
        match by_name.get(&key) {
            Some(&slot) => {
                diag.record(Diagnostic::SpellMerged {
                    name: action.name.clone(),
                    path: candidate.path,
                });
                merged[slot].prepared |= action.prepared;
            }
            None => {
                diag.record(Diagnostic::SpellDiscovered {
                    name: action.name.clone(),
                    path: candidate.path,
                });
                by_name.insert(key, merged.len());
                merged.push(action);
            }
        }
    }

    let (mut prepared, mut unprepared): (Vec<_>, Vec<_>) =
        merged.into_iter().partition(|spell| spell.prepared);
    for spell in &unprepared {
        diag.record(Diagnostic::SpellUnprepared {
            name: spell.name.clone(),
        });
    }
    prepared.sort_by(|a, b| (a.level, &a.name).cmp(&(b.level, &b.name)));
    unprepared.sort_by(|a, b| (a.level, &a.name).cmp(&(b.level, &b.name)));

    SpellBook {
        spellcasting: class_spellcasting(doc, statblock),
        prepared,
        unprepared,
    }
}

/// Attack bonus and save DC for every class that casts spells.
pub fn class_spellcasting(doc: &Value, statblock: &Statblock) -> Vec<ClassSpellcasting> {
    let with_spell_lists: Vec<i64> = document::flatten_collection(document::at(doc, &["classSpells"]))
        .into_iter()
        .filter(|group| !document::array_at(group, &["spells"]).is_empty())
        .filter_map(|group| document::int_at(group, &["characterClassId"]))
        .collect();

    document::array_at(doc, &["classes"])
        .iter()
        .filter(|entry| {
            document::flag(entry, &["definition", "canCastSpells"])
                || document::flag(entry, &["subclassDefinition", "canCastSpells"])
                || explicit_spell_ability(entry).is_some()
                || document::int_at(entry, &["id"]).is_some_and(|id| with_spell_lists.contains(&id))
        })
        .filter_map(|entry| {
            let class_name = stats::class_name(entry)?.to_string();
            let ability = class_spell_ability(entry);
            let (attack_bonus, save_dc) = spell_math(statblock, ability);
            Some(ClassSpellcasting {
                class_name,
                ability,
                attack_bonus,
                save_dc,
            })
        })
        .collect()
}

/// Spell attack bonus and save DC for `ability`.
pub fn spell_math(statblock: &Statblock, ability: Ability) -> (i32, i32) {
    let base = statblock.proficiency_bonus + statblock.ability_modifier(ability);
    (
        base + statblock.spell_attack_bonus_bonus,
        8 + base + statblock.spell_save_dc_bonus,
    )
}

/// Explicit ability id on the class or subclass, then the class-name
/// keyword table, then charisma.
pub fn class_spell_ability(entry: &Value) -> Ability {
    explicit_spell_ability(entry)
        .or_else(|| stats::class_name(entry).and_then(heuristics::class_spell_ability))
        .unwrap_or(DEFAULT_SPELL_ABILITY)
}

fn explicit_spell_ability(entry: &Value) -> Option<Ability> {
    ["definition", "subclassDefinition"]
        .iter()
        .flat_map(|scope| {
            ["spellCastingAbilityId", "spellcastingAbilityId"]
                .map(|key| document::int_at(entry, &[*scope, key]))
        })
        .flatten()
        .find_map(Ability::from_ddb_id)
}

fn discover(doc: &Value) -> Vec<Candidate<'_>> {
    let classes = document::array_at(doc, &["classes"]);
    let default_class = classes.first();
    let default_class_name = default_class
        .and_then(stats::class_name)
        .unwrap_or_default();
    let default_ability = default_class.map_or(DEFAULT_SPELL_ABILITY, class_spell_ability);

    let mut found = Vec::new();

    for group in document::flatten_collection(document::at(doc, &["classSpells"])) {
        let class_id = document::int_at(group, &["characterClassId"]);
        let entry = classes
            .iter()
            .find(|c| class_id.is_some() && document::int_at(c, &["id"]) == class_id);
        let (origin, ability) = match entry {
            Some(entry) => (
                SpellOrigin::Class(stats::class_name(entry).unwrap_or_default().to_string()),
                class_spell_ability(entry),
            ),
            None => (SpellOrigin::Other, default_ability),
        };
        for record in document::array_at(group, &["spells"]) {
            found.push(candidate(record, origin.clone(), ability, PATH_CLASS_SPELLS));
        }
    }

    if let Some(Value::Object(by_source)) = document::at(doc, &["spells"]) {
        for (source, list) in by_source {
            let origin = SpellOrigin::from_source_key(source, default_class_name);
            for record in document::flatten_collection(Some(list)) {
                let ability = ["spellCastingAbilityId", "spellcastingAbilityId"]
                    .iter()
                    .find_map(|key| document::int_at(record, &[*key]))
                    .and_then(Ability::from_ddb_id)
                    .unwrap_or(default_ability);
                found.push(candidate(record, origin.clone(), ability, PATH_BY_SOURCE));
            }
        }
    }

    for entry in classes {
        let level = document::int_at(entry, &["level"]).unwrap_or(0);
        let origin =
            SpellOrigin::ClassFeature(stats::class_name(entry).unwrap_or_default().to_string());
        let ability = class_spell_ability(entry);
        for feature in class_feature_records(entry) {
            if feature_required_level(feature) > level {
                continue;
            }
            document::walk_objects(feature, &mut |node, key| {
                if key != "definition" && heuristics::looks_like_spell_record(node) {
                    found.push(candidate(node, origin.clone(), ability, PATH_CLASS_FEATURES));
                }
            });
        }
    }

    found
}

fn candidate<'a>(
    record: &'a Value,
    origin: SpellOrigin,
    ability: Ability,
    path: &'static str,
) -> Candidate<'a> {
    Candidate {
        record,
        def: document::at(record, &["definition"]).unwrap_or(record),
        origin,
        ability,
        path,
    }
}

fn build_action(
    candidate: &Candidate<'_>,
    statblock: &Statblock,
    diag: &dyn Diagnostics,
) -> Option<SpellAction> {
    let Candidate {
        record,
        def,
        ability,
        ..
    } = *candidate;
    let name = override_name(record)
        .or_else(|| document::text_at(def, &["name"]))
        .or_else(|| document::text_at(record, &["name"]))?
        .to_string();
    let level = document::int_at(def, &["level"])
        .or_else(|| document::int_at(def, &["spellLevel"]))
        .unwrap_or(0) as i32;
    let prepared = level == 0 || is_prepared(record, def);

    let (damage, damage_type) = match spell_damage(def, &name, level, statblock.level, diag) {
        Some((dice, kind)) => (Some(dice), kind),
        None => (None, None),
    };
    let (to_hit_bonus, dc) = spell_math(statblock, ability);
    let kind = match heuristics::classify_spell(def) {
        SpellRoll::Attack => SpellKind::SpellAttack {
            to_hit_bonus,
            damage,
            damage_type,
        },
        SpellRoll::Save => SpellKind::SpellSave {
            dc,
            save_ability: save_ability(def),
            damage,
            damage_type,
        },
        SpellRoll::Other => SpellKind::SpellOther {},
    };

    Some(SpellAction {
        name,
        level,
        origin: candidate.origin.clone(),
        prepared,
        kind,
        details: spell_details(record, def),
    })
}

fn override_name(record: &Value) -> Option<&str> {
    document::text_at(record, &["overrideName"]).or_else(|| document::text_at(record, &["customName"]))
}

const PREPARED_FLAGS: [&str; 13] = [
    "prepared",
    "alwaysPrepared",
    "countsAsKnownSpell",
    "active",
    "isActive",
    "granted",
    "isGranted",
    "known",
    "isKnown",
    "userAdded",
    "isUserAdded",
    "isCustom",
    "isPrepared",
];

/// Any one positive signal is enough; the source flags these
/// inconsistently between builds.
fn is_prepared(record: &Value, def: &Value) -> bool {
    PREPARED_FLAGS.iter().any(|key| document::flag(record, &[*key]))
        || document::flag(def, &["alwaysPrepared"])
        || document::at(record, &["limitedUse"]).is_some()
        || has_non_default_preparation_mode(record)
        || override_name(record).is_some()
}

fn has_non_default_preparation_mode(record: &Value) -> bool {
    match document::at(record, &["preparationMode"]) {
        Some(Value::Number(n)) => n.as_i64().is_some_and(|mode| mode > 1),
        Some(Value::String(s)) => {
            !matches!(compact_key(s).as_str(), "" | "default" | "prepared" | "standard")
        }
        _ => false,
    }
}

fn save_ability(def: &Value) -> Option<Ability> {
    ["savingThrowType", "savingThrowAbility", "saveAbility", "saveStat"]
        .iter()
        .find_map(|key| document::text_at(def, &[*key]))
        .and_then(Ability::from_key)
        .or_else(|| {
            [
                "saveDcAbilityId",
                "savingThrowStatId",
                "saveStatId",
                "savingThrowAbilityId",
                "savingThrowId",
            ]
            .iter()
            .find_map(|key| document::int_at(def, &[*key]))
            .and_then(Ability::from_ddb_id)
        })
}

/// Structured damage modifiers first, then `NdM <type> damage` in the
/// description. Cantrip dice scale with character level either way.
fn spell_damage(
    def: &Value,
    name: &str,
    spell_level: i32,
    character_level: i32,
    diag: &dyn Diagnostics,
) -> Option<(String, Option<DamageType>)> {
    let (dice_expr, damage_type) = structured_damage(def).or_else(|| {
        let found = description_damage(def)?;
        diag.record(Diagnostic::DamageFromDescription {
            spell: name.to_string(),
            dice: found.0.clone(),
        });
        Some(found)
    })?;
    let dice_expr = if spell_level == 0 {
        dice::scale_dice(&dice_expr, dice::cantrip_multiplier(character_level))
    } else {
        dice_expr
    };
    Some((dice_expr, damage_type))
}

fn structured_damage(def: &Value) -> Option<(String, Option<DamageType>)> {
    document::array_at(def, &["modifiers"])
        .iter()
        .filter(|m| compact_key(&document::scalar_text(m.get("type"))) == "damage")
        .find_map(|m| {
            let die = document::at(m, &["die"]);
            let dice_expr = die
                .and_then(|d| document::text_at(d, &["diceString"]))
                .map(str::to_string)
                .or_else(|| die.map(dice::damage_from_record).filter(|s| !s.is_empty()))
                .or_else(|| {
                    document::int_at(m, &["fixedValue"])
                        .filter(|v| *v != 0)
                        .map(|v| v.to_string())
                })?;
            let damage_type = document::text_at(m, &["friendlySubtypeName"])
                .or_else(|| document::text_at(m, &["subType"]))
                .and_then(DamageType::from_label);
            Some((dice_expr, damage_type))
        })
}

/// First `NdM <type> damage` phrase naming a standard damage type, else the
/// first phrase with its type dropped.
fn description_damage(def: &Value) -> Option<(String, Option<DamageType>)> {
    let text = document::strip_html(&document::scalar_text(document::at(def, &["description"])));
    let mut first_untyped = None;
    for caps in DESCRIPTION_DAMAGE_RE.captures_iter(&text) {
        let dice_expr = caps[1].to_lowercase();
        match DamageType::from_label(&caps[2]) {
            Some(DamageType::Other(_)) | None => {
                first_untyped.get_or_insert(dice_expr);
            }
            known => return Some((dice_expr, known)),
        }
    }
    first_untyped.map(|dice_expr| (dice_expr, None))
}

fn spell_details(record: &Value, def: &Value) -> SpellDetails {
    let duration_type = document::scalar_text(document::at(def, &["duration", "durationType"]));
    SpellDetails {
        range: spell_range(def),
        casting_time: casting_time(def),
        duration: document::at(def, &["duration"]).and_then(spell_duration),
        components: components(def),
        concentration: document::flag(def, &["concentration"])
            || document::flag(def, &["isConcentration"])
            || duration_type.to_lowercase().contains("concentration"),
        ritual: document::flag(def, &["ritual"]) || document::flag(def, &["isRitual"]),
        effect: effect_text(record, def),
    }
}

fn spell_range(def: &Value) -> Option<SpellRange> {
    let raw = document::at(def, &["range"])?;
    if let Some(label) = raw.as_str() {
        let label = label.trim();
        return match document::int(raw) {
            Some(feet) if feet > 0 => Some(SpellRange {
                origin: None,
                feet: Some(feet as i32),
                area: None,
            }),
            _ => (!label.is_empty()).then(|| SpellRange {
                origin: Some(label.to_string()),
                feet: None,
                area: None,
            }),
        };
    }
    if let Some(feet) = document::int(raw) {
        return (feet > 0).then_some(SpellRange {
            origin: None,
            feet: Some(feet as i32),
            area: None,
        });
    }

    let origin = document::text_at(raw, &["origin"]).map(str::to_string);
    let feet = ["rangeValue", "range", "value"]
        .iter()
        .find_map(|key| document::int_at(raw, &[*key]))
        .filter(|feet| *feet > 0)
        .map(|feet| feet as i32);
    let area = document::text_at(raw, &["aoeType"]).map(|shape| AreaOfEffect {
        shape: shape.to_string(),
        size_feet: document::int_at(raw, &["aoeValue"])
            .filter(|size| *size > 0)
            .map(|size| size as i32),
    });
    if origin.is_none() && feet.is_none() && area.is_none() {
        return None;
    }
    Some(SpellRange { origin, feet, area })
}

fn casting_time(def: &Value) -> Option<CastingTime> {
    if let Some(kind) = document::int_at(def, &["activation", "activationType"]) {
        return Some(CastingTime {
            amount: document::int_at(def, &["activation", "activationTime"])
                .filter(|n| *n > 0)
                .unwrap_or(1) as i32,
            unit: ActivationUnit::from_ddb_id(kind),
        });
    }
    let label = document::text_at(def, &["castingTime"])?;
    let amount = label
        .split_whitespace()
        .next()
        .and_then(|word| word.parse::<i32>().ok())
        .filter(|n| *n > 0)
        .unwrap_or(1);
    Some(CastingTime {
        amount,
        unit: ActivationUnit::from_label(label),
    })
}

fn spell_duration(raw: &Value) -> Option<SpellDuration> {
    if let Some(label) = raw.as_str() {
        let label = label.trim();
        return (!label.is_empty()).then(|| SpellDuration::Other {
            label: label.to_string(),
        });
    }
    let kind = document::text_at(raw, &["durationType"]).unwrap_or_default();
    let lower = kind.to_lowercase();
    if lower.contains("instant") {
        return Some(SpellDuration::Instantaneous);
    }
    if lower.contains("special") {
        return Some(SpellDuration::Special);
    }
    let amount = document::int_at(raw, &["durationInterval"]).filter(|n| *n > 0);
    let unit = document::text_at(raw, &["durationUnit"]).and_then(DurationUnit::from_label);
    match (amount, unit) {
        (Some(amount), Some(unit)) => Some(SpellDuration::Timed {
            amount: amount as i32,
            unit,
        }),
        _ if !kind.is_empty() && !lower.contains("concentration") => Some(SpellDuration::Other {
            label: kind.to_string(),
        }),
        _ => None,
    }
}

fn components(def: &Value) -> Vec<SpellComponent> {
    let ids: Vec<i64> = document::array_at(def, &["components"])
        .iter()
        .filter_map(document::int)
        .collect();
    SpellComponent::ALL
        .into_iter()
        .filter(|c| ids.contains(&c.ddb_id()))
        .collect()
}

fn effect_text(record: &Value, def: &Value) -> Option<String> {
    [record, def]
        .into_iter()
        .flat_map(|node| ["snippet", "description"].map(|key| document::text_at(node, &[key])))
        .flatten()
        .map(document::strip_html)
        .find(|text| !text.is_empty())
        .map(|text| document::truncate_chars(&text, EFFECT_MAX_CHARS))
}
