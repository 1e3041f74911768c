//! Lenient accessors over the raw character document.
//!
//! The source schema drifts between character builds, so every read here
//! degrades to `None` (or an empty slice) instead of failing. Callers pick a
//! default at the point of use.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

static HTML_BREAK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<br\s*/?>|</p>").expect("valid regex"));
static HTML_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]+>").expect("valid regex"));

/// A named accessor tried as part of an ordered probe list.
pub type Probe<T> = (&'static str, fn(&Value) -> Option<T>);

/// Runs `probes` in order and returns the first value produced, together
/// with the name of the probe that supplied it.
pub fn first_present<T>(doc: &Value, probes: &[Probe<T>]) -> Option<(&'static str, T)> {
    probes
        .iter()
        .find_map(|(name, probe)| probe(doc).map(|value| (*name, value)))
}

/// The character object inside an API envelope (`{ "data": { ... } }`), or
/// the value itself when it already looks like a character.
pub fn unwrap_envelope(value: Value) -> Value {
    if value.get("name").is_some() {
        return value;
    }
    match value {
        Value::Object(mut map) => match map.remove("data") {
            Some(inner @ Value::Object(_)) => unwrap_envelope(inner),
            Some(other) => {
                map.insert("data".to_string(), other);
                Value::Object(map)
            }
            None => Value::Object(map),
        },
        other => other,
    }
}

pub fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|n| n.is_finite()),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        _ => None,
    }
}

pub fn int(value: &Value) -> Option<i64> {
    number(value).map(|n| n.trunc() as i64)
}

/// Follows `path` through nested objects; JSON `null` counts as absent.
pub fn at<'a>(value: &'a Value, path: &[&str]) -> Option<&'a Value> {
    let mut current = value;
    for key in path {
        current = current.get(*key)?;
    }
    if current.is_null() {
        None
    } else {
        Some(current)
    }
}

pub fn int_at(value: &Value, path: &[&str]) -> Option<i64> {
    at(value, path).and_then(int)
}

pub fn number_at(value: &Value, path: &[&str]) -> Option<f64> {
    at(value, path).and_then(number)
}

/// Trimmed, non-empty string at `path`.
pub fn text_at<'a>(value: &'a Value, path: &[&str]) -> Option<&'a str> {
    at(value, path)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

pub fn bool_at(value: &Value, path: &[&str]) -> Option<bool> {
    at(value, path).and_then(Value::as_bool)
}

/// True only for an explicit JSON `true`.
pub fn flag(value: &Value, path: &[&str]) -> bool {
    bool_at(value, path) == Some(true)
}

pub fn array_at<'a>(value: &'a Value, path: &[&str]) -> &'a [Value] {
    at(value, path)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// Entries of a collection that may be stored either as an array or as an
/// object whose values are arrays (or single entries).
pub fn flatten_collection(value: Option<&Value>) -> Vec<&Value> {
    match value {
        Some(Value::Array(items)) => items.iter().collect(),
        Some(Value::Object(map)) => map
            .values()
            .flat_map(|v| match v {
                Value::Array(items) => items.iter().collect::<Vec<_>>(),
                Value::Null => Vec::new(),
                other => vec![other],
            })
            .collect(),
        _ => Vec::new(),
    }
}

/// String form of a scalar, used for loosely typed label fields.
pub fn scalar_text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

/// Lowercase with all whitespace removed: `"Strength Score"` -> `"strengthscore"`.
pub fn compact_key(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Lowercase with whitespace runs collapsed to one space and trimmed.
pub fn normalize_text(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

pub fn collapse_whitespace(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn strip_html(raw: &str) -> String {
    let without_breaks = HTML_BREAK_RE.replace_all(raw, " ");
    let without_tags = HTML_TAG_RE.replace_all(&without_breaks, " ");
    collapse_whitespace(&decode_entities(&without_tags))
}

fn decode_entities(raw: &str) -> String {
    raw.replace("&nbsp;", " ")
        .replace("&rsquo;", "'")
        .replace("&lsquo;", "'")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

/// Cuts `text` to at most `max_chars` characters, appending an ellipsis when
/// anything was removed.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max_chars).collect();
    out.push('…');
    out
}

/// The definition record of an inventory item, whichever key carries it.
pub fn item_definition(item: &Value) -> Option<&Value> {
    ["definition", "itemDefinition", "definitionData", "def"]
        .iter()
        .find_map(|key| item.get(*key).filter(|v| v.is_object()))
}

/// Items without an equip flag are treated as equipped.
pub fn is_equipped(item: &Value) -> bool {
    equipped_flag(item).unwrap_or(true)
}

/// The item's own equip flag, if it carries one under any known key.
pub fn equipped_flag(item: &Value) -> Option<bool> {
    ["equipped", "isEquipped", "isEquippedItem"]
        .iter()
        .find_map(|key| at(item, &[*key]))
        .map(truthy)
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Null => false,
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Display name of a record: `definition.name`, then `name`, then `label`.
pub fn record_name(node: &Value) -> Option<&str> {
    text_at(node, &["definition", "name"])
        .or_else(|| text_at(node, &["name"]))
        .or_else(|| text_at(node, &["label"]))
}

/// Calls `visit` for every object in the tree rooted at `root`, passing the
/// object key it was reached through (array elements inherit the key of
/// their array; the root gets an empty key).
pub fn walk_objects<'a>(root: &'a Value, visit: &mut dyn FnMut(&'a Value, &str)) {
    walk_inner(root, "", visit);
}

fn walk_inner<'a>(node: &'a Value, key: &str, visit: &mut dyn FnMut(&'a Value, &str)) {
    match node {
        Value::Array(items) => {
            for item in items {
                walk_inner(item, key, visit);
            }
        }
        Value::Object(map) => {
            visit(node, key);
            for (child_key, child) in map {
                walk_inner(child, child_key, visit);
            }
        }
        _ => {}
    }
}
