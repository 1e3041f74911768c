use serde::Serialize;
use serde_json::Value;

use crate::document;
use crate::heuristics::{self, ArmorCategory};

const DEFAULT_SHIELD_BONUS: i32 = 2;

/// An equipped armor or shield piece that contributed to armor class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WornGear {
    pub name: String,
    pub definition_id: Option<i64>,
    pub base: i32,
    pub category: ArmorCategory,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArmorEvaluation {
    pub armor: Option<WornGear>,
    pub shield: Option<WornGear>,
    pub armor_class: i32,
}

impl ArmorEvaluation {
    /// Whether a modifier granted by `component_id` with `value` is just the
    /// armor class of a piece already counted here.
    pub fn already_counts(&self, component_id: Option<i64>, value: Option<f64>) -> bool {
        let Some(id) = component_id else {
            return false;
        };
        [&self.armor, &self.shield].into_iter().flatten().any(|gear| {
            gear.definition_id == Some(id)
                && value.is_some_and(|v| v.trunc() as i32 == gear.base)
        })
    }
}

/// Armor class from the first equipped armor and the first equipped shield
/// in inventory order.
pub fn evaluate_armor(doc: &Value, dex_mod: i32) -> ArmorEvaluation {
    let mut armor: Option<WornGear> = None;
    let mut shield: Option<WornGear> = None;

    for item in document::array_at(doc, &["inventory"]) {
        if !document::is_equipped(item) {
            continue;
        }
        let Some(def) = document::item_definition(item) else {
            continue;
        };
        let Some(base) = heuristics::armor_base(def) else {
            continue;
        };
        let gear = WornGear {
            name: document::text_at(def, &["name"])
                .unwrap_or_default()
                .to_string(),
            definition_id: document::int_at(def, &["id"]),
            base,
            category: heuristics::armor_category(def),
        };
        let slot = if gear.category == ArmorCategory::Shield {
            &mut shield
        } else {
            &mut armor
        };
        if slot.is_none() {
            *slot = Some(gear);
        }
    }

    let mut armor_class = match &armor {
        Some(gear) => match gear.category {
            ArmorCategory::Heavy => gear.base,
            ArmorCategory::Medium => gear.base + dex_mod.min(2),
            _ => gear.base + dex_mod,
        },
        None => 10 + dex_mod,
    };
    if let Some(gear) = &shield {
        armor_class += if gear.base == 0 {
            DEFAULT_SHIELD_BONUS
        } else {
            gear.base
        };
    }

    ArmorEvaluation {
        armor,
        shield,
        armor_class: armor_class.max(1),
    }
}
