use std::fmt;

use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::document;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DamageType {
    Bludgeoning,
    Piercing,
    Slashing,
    Necrotic,
    Acid,
    Cold,
    Fire,
    Lightning,
    Thunder,
    Poison,
    Psychic,
    Radiant,
    Force,
    Other(String),
}

impl DamageType {
    const KNOWN: [DamageType; 13] = [
        DamageType::Bludgeoning,
        DamageType::Piercing,
        DamageType::Slashing,
        DamageType::Necrotic,
        DamageType::Acid,
        DamageType::Cold,
        DamageType::Fire,
        DamageType::Lightning,
        DamageType::Thunder,
        DamageType::Poison,
        DamageType::Psychic,
        DamageType::Radiant,
        DamageType::Force,
    ];

    pub fn from_ddb_id(id: i64) -> Option<Self> {
        usize::try_from(id - 1)
            .ok()
            .and_then(|i| Self::KNOWN.get(i).cloned())
    }

    /// Case-insensitive substring match against the standard names; any
    /// other non-empty label is kept as [`DamageType::Other`].
    pub fn from_label(raw: &str) -> Option<Self> {
        let label = raw.trim();
        if label.is_empty() {
            return None;
        }
        let lower = label.to_lowercase();
        Self::KNOWN
            .iter()
            .find(|known| lower.contains(known.name()))
            .cloned()
            .or_else(|| Some(DamageType::Other(label.to_string())))
    }

    /// A label string, a numeric id, or an object carrying either.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Self::from_label(s),
            Value::Number(_) => document::int(value).and_then(Self::from_ddb_id),
            Value::Object(_) => document::at(value, &["name"])
                .or_else(|| document::at(value, &["type"]))
                .and_then(Self::from_value)
                .or_else(|| document::int_at(value, &["id"]).and_then(Self::from_ddb_id)),
            _ => None,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            DamageType::Bludgeoning => "bludgeoning",
            DamageType::Piercing => "piercing",
            DamageType::Slashing => "slashing",
            DamageType::Necrotic => "necrotic",
            DamageType::Acid => "acid",
            DamageType::Cold => "cold",
            DamageType::Fire => "fire",
            DamageType::Lightning => "lightning",
            DamageType::Thunder => "thunder",
            DamageType::Poison => "poison",
            DamageType::Psychic => "psychic",
            DamageType::Radiant => "radiant",
            DamageType::Force => "force",
            DamageType::Other(label) => label,
        }
    }
}

impl fmt::Display for DamageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for DamageType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}
