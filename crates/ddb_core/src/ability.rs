use serde::Serialize;
use serde_json::Value;

use crate::document;
use crate::modifiers::{Modifier, ModifierIndex};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Ability {
    Strength,
    Dexterity,
    Constitution,
    Intelligence,
    Wisdom,
    Charisma,
}

impl Ability {
    pub const ALL: [Ability; 6] = [
        Ability::Strength,
        Ability::Dexterity,
        Ability::Constitution,
        Ability::Intelligence,
        Ability::Wisdom,
        Ability::Charisma,
    ];

    /// Position in the source's six-slot stat arrays.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Numeric id used by the source (1 = strength .. 6 = charisma).
    pub fn ddb_id(self) -> i64 {
        self.index() as i64 + 1
    }

    pub fn from_ddb_id(id: i64) -> Option<Self> {
        usize::try_from(id - 1)
            .ok()
            .and_then(|i| Self::ALL.get(i).copied())
    }

    pub fn key(self) -> &'static str {
        match self {
            Ability::Strength => "str",
            Ability::Dexterity => "dex",
            Ability::Constitution => "con",
            Ability::Intelligence => "int",
            Ability::Wisdom => "wis",
            Ability::Charisma => "cha",
        }
    }

    /// Lowercase full name as it appears in modifier subtypes.
    pub fn full_name(self) -> &'static str {
        match self {
            Ability::Strength => "strength",
            Ability::Dexterity => "dexterity",
            Ability::Constitution => "constitution",
            Ability::Intelligence => "intelligence",
            Ability::Wisdom => "wisdom",
            Ability::Charisma => "charisma",
        }
    }

    pub fn abbreviation(self) -> &'static str {
        match self {
            Ability::Strength => "STR",
            Ability::Dexterity => "DEX",
            Ability::Constitution => "CON",
            Ability::Intelligence => "INT",
            Ability::Wisdom => "WIS",
            Ability::Charisma => "CHA",
        }
    }

    /// Accepts `"str"`, `"STR"`, `"strength"` and friends.
    pub fn from_key(raw: &str) -> Option<Self> {
        let key = raw.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|a| key == a.key() || key == a.full_name())
    }
}

/// `floor((score - 10) / 2)`.
pub fn modifier(score: i32) -> i32 {
    (score - 10).div_euclid(2)
}

/// One value per ability, serialized with the short keys.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AbilityValues {
    pub str: i32,
    pub dex: i32,
    pub con: i32,
    pub int: i32,
    pub wis: i32,
    pub cha: i32,
}

impl AbilityValues {
    pub fn from_fn(mut f: impl FnMut(Ability) -> i32) -> Self {
        Self {
            str: f(Ability::Strength),
            dex: f(Ability::Dexterity),
            con: f(Ability::Constitution),
            int: f(Ability::Intelligence),
            wis: f(Ability::Wisdom),
            cha: f(Ability::Charisma),
        }
    }

    pub fn get(&self, ability: Ability) -> i32 {
        match ability {
            Ability::Strength => self.str,
            Ability::Dexterity => self.dex,
            Ability::Constitution => self.con,
            Ability::Intelligence => self.int,
            Ability::Wisdom => self.wis,
            Ability::Charisma => self.cha,
        }
    }

    pub fn set(&mut self, ability: Ability, value: i32) {
        match ability {
            Ability::Strength => self.str = value,
            Ability::Dexterity => self.dex = value,
            Ability::Constitution => self.con = value,
            Ability::Intelligence => self.int = value,
            Ability::Wisdom => self.wis = value,
            Ability::Charisma => self.cha = value,
        }
    }

    pub fn map(&self, f: impl Fn(i32) -> i32) -> Self {
        Self::from_fn(|a| f(self.get(a)))
    }
}

const DEFAULT_SCORE: i32 = 10;

/// Final score for every ability.
pub fn resolve_scores(doc: &Value, modifiers: &ModifierIndex) -> AbilityValues {
    AbilityValues::from_fn(|ability| resolve_score(doc, modifiers, ability))
}

/// An explicit override wins over base + bonuses; either result is then
/// raised (never lowered) to the best "set to at least N" effect.
pub fn resolve_score(doc: &Value, modifiers: &ModifierIndex, ability: Ability) -> i32 {
    let slot = ability.index();

    let computed = match slot_value(doc, "overrideStats", ability) {
        Some(overridden) => overridden,
        None => {
            let base = base_score(doc, ability).unwrap_or(DEFAULT_SCORE);
            let bonus = slot_value(doc, "bonusStats", ability).unwrap_or(0);
            let from_modifiers = modifiers
                .sum_bonus(|m| is_score_modifier(m, ability) && !m.is_set_like());
            base + bonus + from_modifiers
        }
    };

    let floor = modifiers.max_set_value(|m| is_score_modifier(m, ability) && m.is_set_like());
    let score = floor.map_or(computed, |set| computed.max(set));
    tracing::trace!(ability = ability.key(), slot, score, "resolved ability score");
    score
}

fn is_score_modifier(m: &Modifier, ability: Ability) -> bool {
    let full = ability.full_name();
    let st = m.sub_type_key();
    let friendly = m.friendly_key();
    st == format!("{full}-score")
        || st == format!("{full}-ability-score")
        || (st.contains(full) && st.contains("score"))
        || (friendly.contains(full) && friendly.contains("score"))
}

fn base_score(doc: &Value, ability: Ability) -> Option<i32> {
    slot_entry(doc, "stats", ability).and_then(entry_value)
}

fn slot_value(doc: &Value, key: &str, ability: Ability) -> Option<i32> {
    slot_entry(doc, key, ability)
        .and_then(|entry| document::int_at(entry, &["value"]))
        .map(|v| v as i32)
}

/// The entry whose `id` names `ability`, else the unlabelled entry at the
/// ability's position.
fn slot_entry<'a>(doc: &'a Value, key: &str, ability: Ability) -> Option<&'a Value> {
    let slots = document::array_at(doc, &[key]);
    slots
        .iter()
        .find(|entry| document::int_at(entry, &["id"]) == Some(ability.ddb_id()))
        .or_else(|| {
            slots
                .get(ability.index())
                .filter(|entry| document::at(entry, &["id"]).is_none())
        })
}

fn entry_value(entry: &Value) -> Option<i32> {
    document::int_at(entry, &["value"])
        .or_else(|| document::int(entry))
        .map(|v| v as i32)
}
