use std::collections::BTreeSet;

use serde::Serialize;
use serde_json::Value;

use crate::attacks::{class_feature_records, feature_required_level};
use crate::document;
use crate::heuristics;
use crate::stats;

/// Bookkeeping entries that the source lists as features but that carry no
/// information at the table.
const IGNORED_NAMES: [&str; 8] = [
    "Ability Score Improvement",
    "Dark Bargain",
    "Hero's Journey Boon",
    "Tortle Protector",
    "Primal Knowledge",
    "Optional Class Features",
    "Hit Points",
    "Proficiencies",
];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureLists {
    pub background: Option<String>,
    pub classes: Vec<String>,
    pub feats: Vec<String>,
    pub class_features: Vec<String>,
    pub maneuvers: Vec<String>,
}

impl FeatureLists {
    pub fn is_empty(&self) -> bool {
        self.background.is_none()
            && self.classes.is_empty()
            && self.feats.is_empty()
            && self.class_features.is_empty()
            && self.maneuvers.is_empty()
    }
}

pub fn extract_feature_lists(doc: &Value) -> FeatureLists {
    let mut classes = BTreeSet::new();
    let mut class_features = BTreeSet::new();

    for entry in document::array_at(doc, &["classes"]) {
        let Some(class_name) = stats::class_name(entry) else {
            continue;
        };
        let level = document::int_at(entry, &["level"]).unwrap_or(0);
        classes.insert(if level > 0 {
            format!("{class_name} {level}")
        } else {
            class_name.to_string()
        });

        class_features.extend(
            class_feature_records(entry)
                .into_iter()
                .filter(|feature| feature_required_level(feature) <= level)
                .filter_map(feature_name),
        );
    }

    let feats = document::array_at(doc, &["feats"])
        .iter()
        .filter_map(feature_name)
        .collect::<BTreeSet<_>>();

    let lists = FeatureLists {
        background: background_name(doc),
        classes: classes.into_iter().collect(),
        feats: feats.into_iter().collect(),
        class_features: class_features.into_iter().collect(),
        maneuvers: maneuver_names(doc),
    };
    tracing::debug!(
        class_features = lists.class_features.len(),
        feats = lists.feats.len(),
        maneuvers = lists.maneuvers.len(),
        "extracted feature lists"
    );
    lists
}

fn feature_name(node: &Value) -> Option<String> {
    let name = document::record_name(node)?;
    if name.chars().count() < 2 || IGNORED_NAMES.contains(&name) {
        return None;
    }
    Some(name.to_string())
}

fn background_name(doc: &Value) -> Option<String> {
    let background = document::at(doc, &["background"])?;
    feature_name(background).or_else(|| {
        document::at(background, &["customBackground"]).and_then(feature_name)
    })
}

/// Maneuvers are not typed in the source. A `"Maneuvers: "` name prefix
/// marks one anywhere in the document; text about superiority dice only
/// counts under a key or record that mentions maneuvers.
fn maneuver_names(doc: &Value) -> Vec<String> {
    let mut found = BTreeSet::new();
    collect_maneuvers(doc, "", false, &mut found);
    found.into_iter().collect()
}

fn collect_maneuvers(node: &Value, key: &str, in_context: bool, found: &mut BTreeSet<String>) {
    let in_context = in_context || key.to_lowercase().contains("maneuver");
    match node {
        Value::Array(items) => {
            for item in items {
                collect_maneuvers(item, key, in_context, found);
            }
        }
        Value::Object(map) => {
            if let Some(name) = document::record_name(node)
                && (heuristics::has_maneuver_prefix(name)
                    || (in_context && heuristics::mentions_superiority_die(node)))
            {
                found.extend(heuristics::maneuver_display_name(name));
            }
            let own_context = in_context || heuristics::mentions_maneuvers(node);
            for (child_key, child) in map {
                // `definition` is the same record, not a child of it.
                let context = if child_key == "definition" {
                    in_context
                } else {
                    own_context
                };
                collect_maneuvers(child, child_key, context, found);
            }
        }
        _ => {}
    }
}
