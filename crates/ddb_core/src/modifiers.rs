//! Flat index of the passive modifier records attached to a character.

use serde::Serialize;
use serde_json::Value;

use crate::document::{self, compact_key, normalize_text};

/// One passive effect: a bonus, a proficiency grant or a score override.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Modifier {
    #[serde(rename = "type")]
    pub kind: String,
    pub sub_type: String,
    pub friendly_subtype_name: Option<String>,
    pub value: Option<f64>,
    pub component_id: Option<i64>,
    #[serde(skip)]
    kind_key: String,
    #[serde(skip)]
    sub_type_key: String,
    #[serde(skip)]
    friendly_key: String,
}

impl Modifier {
    pub fn new(kind: &str, sub_type: &str, value: Option<f64>) -> Self {
        Self {
            kind: kind.to_string(),
            sub_type: sub_type.to_string(),
            friendly_subtype_name: None,
            value,
            component_id: None,
            kind_key: compact_key(kind),
            sub_type_key: compact_key(sub_type),
            friendly_key: String::new(),
        }
    }

    pub fn with_friendly_name(mut self, friendly: &str) -> Self {
        self.friendly_key = normalize_text(friendly);
        self.friendly_subtype_name = Some(friendly.to_string());
        self
    }

    pub fn with_component_id(mut self, id: i64) -> Self {
        self.component_id = Some(id);
        self
    }

    fn from_record(record: &Value) -> Option<Self> {
        if !record.is_object() {
            return None;
        }
        let kind = document::scalar_text(record.get("type"));
        let sub_type = document::scalar_text(record.get("subType").or(record.get("subtype")));
        let value = document::number_at(record, &["value"])
            .or_else(|| document::number_at(record, &["fixedValue"]));

        let mut modifier = Modifier::new(&kind, &sub_type, value);
        if let Some(friendly) = document::text_at(record, &["friendlySubtypeName"]) {
            modifier = modifier.with_friendly_name(friendly);
        }
        if let Some(id) = document::int_at(record, &["componentId"]) {
            modifier = modifier.with_component_id(id);
        }
        Some(modifier)
    }

    /// Lowercased type with whitespace removed.
    pub fn kind_key(&self) -> &str {
        &self.kind_key
    }

    /// Lowercased subtype with whitespace removed.
    pub fn sub_type_key(&self) -> &str {
        &self.sub_type_key
    }

    /// Lowercased friendly subtype name with whitespace collapsed.
    pub fn friendly_key(&self) -> &str {
        &self.friendly_key
    }

    pub fn kind_is(&self, kind: &str) -> bool {
        self.kind_key == kind
    }

    pub fn sub_type_is(&self, sub_type: &str) -> bool {
        self.sub_type_key == sub_type
    }

    /// True when either the subtype or the friendly name contains `needle`.
    pub fn mentions(&self, needle: &str) -> bool {
        self.sub_type_key.contains(needle) || self.friendly_key.contains(needle)
    }

    /// "Set", "override" and "minimum" style effects that replace a value
    /// instead of adding to it.
    pub fn is_set_like(&self) -> bool {
        let kind = &self.kind_key;
        kind.contains("set")
            || kind.contains("override")
            || kind.contains("replace")
            || self.sub_type_key.contains("set")
            || self.friendly_key.contains("set")
            || self.mentions("minimum")
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModifierIndex {
    records: Vec<Modifier>,
}

impl ModifierIndex {
    /// Flattens the document's `modifiers` collection. Both an array and an
    /// object of per-source arrays are accepted; anything else is empty.
    pub fn from_document(doc: &Value) -> Self {
        let records: Vec<Modifier> = document::flatten_collection(doc.get("modifiers"))
            .into_iter()
            .filter_map(Modifier::from_record)
            .collect();
        tracing::trace!(count = records.len(), "indexed modifiers");
        Self { records }
    }

    pub fn from_records(records: Vec<Modifier>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[Modifier] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn matching<'a>(
        &'a self,
        predicate: impl Fn(&Modifier) -> bool + 'a,
    ) -> impl Iterator<Item = &'a Modifier> + 'a {
        self.records.iter().filter(move |m| predicate(m))
    }

    /// Sum of `value` over matching records; records without a numeric
    /// value contribute nothing.
    pub fn sum_bonus(&self, predicate: impl Fn(&Modifier) -> bool) -> i32 {
        let total: f64 = self
            .records
            .iter()
            .filter(|m| predicate(m))
            .filter_map(|m| m.value)
            .sum();
        total.trunc() as i32
    }

    /// Highest proposed value among matching override records. Several
    /// "set to at least N" effects do not stack; the largest wins.
    pub fn max_set_value(&self, predicate: impl Fn(&Modifier) -> bool) -> Option<i32> {
        self.records
            .iter()
            .filter(|m| predicate(m))
            .filter_map(|m| m.value)
            .map(|v| v.trunc() as i32)
            .max()
    }

    /// Whether any record of `required_type` satisfies `predicate`.
    pub fn has_flag(&self, predicate: impl Fn(&Modifier) -> bool, required_type: &str) -> bool {
        let required = compact_key(required_type);
        self.records
            .iter()
            .any(|m| m.kind_key == required && predicate(m))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn keyed_modifier_collections_are_flattened() {
        let doc = json!({
            "modifiers": {
                "race": [{ "type": "bonus", "subType": "dexterity-score", "value": 2 }],
                "class": [
                    { "type": "proficiency", "subType": "stealth", "value": null },
                    { "type": "expertise", "subType": "stealth" }
                ],
                "item": [],
                "feat": null
            }
        });
        let index = ModifierIndex::from_document(&doc);
        assert_eq!(index.len(), 3);
    }

    #[test]
    fn array_modifier_collections_are_accepted() {
        let doc = json!({ "modifiers": [{ "type": "bonus", "subType": "armor-class", "value": 1 }] });
        assert_eq!(ModifierIndex::from_document(&doc).len(), 1);
    }

    #[test]
    fn malformed_modifier_data_yields_empty_index() {
        assert!(ModifierIndex::from_document(&json!({})).is_empty());
        assert!(ModifierIndex::from_document(&json!({ "modifiers": 7 })).is_empty());
        assert!(ModifierIndex::from_document(&json!({ "modifiers": [1, "x", null] })).is_empty());
    }

    #[test]
    fn matching_is_case_and_space_insensitive() {
        let doc = json!({
            "modifiers": [{ "type": " Bonus ", "subType": "Strength Score", "value": 1 }]
        });
        let index = ModifierIndex::from_document(&doc);
        assert_eq!(
            index.sum_bonus(|m| m.kind_is("bonus") && m.sub_type_is("strengthscore")),
            1
        );
    }

    #[test]
    fn sum_ignores_non_numeric_values() {
        let index = ModifierIndex::from_records(vec![
            Modifier::new("bonus", "saving-throws", Some(1.0)),
            Modifier::new("bonus", "saving-throws", None),
            Modifier::new("bonus", "saving-throws", Some(2.0)),
        ]);
        assert_eq!(index.sum_bonus(|m| m.sub_type_is("saving-throws")), 3);
    }

    #[test]
    fn max_set_value_takes_the_highest_not_the_sum() {
        let index = ModifierIndex::from_records(vec![
            Modifier::new("set", "strength-score", Some(19.0)),
            Modifier::new("set", "strength-score", Some(21.0)),
        ]);
        assert_eq!(index.max_set_value(|m| m.mentions("strength")), Some(21));
        assert_eq!(index.max_set_value(|m| m.mentions("wisdom")), None);
    }

    #[test]
    fn has_flag_requires_the_type() {
        let index = ModifierIndex::from_records(vec![Modifier::new(
            "proficiency",
            "stealth",
            None,
        )]);
        assert!(index.has_flag(|m| m.sub_type_is("stealth"), "proficiency"));
        assert!(!index.has_flag(|m| m.sub_type_is("stealth"), "expertise"));
    }

    #[test]
    fn fixed_value_backs_up_a_missing_value() {
        let doc = json!({ "modifiers": [{ "type": "bonus", "subType": "speed", "fixedValue": 10 }] });
        let index = ModifierIndex::from_document(&doc);
        assert_eq!(index.records()[0].value, Some(10.0));
    }

    #[test]
    fn set_like_detection_covers_type_and_subtype_hints() {
        assert!(Modifier::new("set", "strength-score", Some(19.0)).is_set_like());
        assert!(Modifier::new("bonus", "minimum-strength-score", Some(19.0)).is_set_like());
        assert!(
            Modifier::new("bonus", "x", Some(1.0))
                .with_friendly_name("Set Strength Score")
                .is_set_like()
        );
        assert!(!Modifier::new("bonus", "strength-score", Some(2.0)).is_set_like());
    }
}
