use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use crate::document;

const UNKNOWN_ITEM: &str = "Unknown";

/// Coin counts; denominations at zero or below read as zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Currency {
    pub cp: i64,
    pub sp: i64,
    pub ep: i64,
    pub gp: i64,
    pub pp: i64,
}

impl Currency {
    pub fn from_document(doc: &Value) -> Self {
        let coin = |key: &str| {
            document::int_at(doc, &["currencies", key])
                .unwrap_or(0)
                .max(0)
        };
        Self {
            cp: coin("cp"),
            sp: coin("sp"),
            ep: coin("ep"),
            gp: coin("gp"),
            pp: coin("pp"),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.denominations().iter().all(|(_, amount)| *amount == 0)
    }

    /// Highest denomination first.
    pub fn denominations(&self) -> [(&'static str, i64); 5] {
        [
            ("pp", self.pp),
            ("gp", self.gp),
            ("ep", self.ep),
            ("sp", self.sp),
            ("cp", self.cp),
        ]
    }
}

/// All stacks of one item name folded together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemStack {
    pub name: String,
    pub total_quantity: i64,
    pub any_equipped: bool,
    pub any_attuned: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InventorySummary {
    pub currency: Currency,
    pub items: Vec<ItemStack>,
}

impl InventorySummary {
    pub fn equipped(&self) -> impl Iterator<Item = &ItemStack> {
        self.items.iter().filter(|item| item.any_equipped)
    }

    pub fn carried(&self) -> impl Iterator<Item = &ItemStack> {
        self.items.iter().filter(|item| !item.any_equipped)
    }

    pub fn is_empty(&self) -> bool {
        self.currency.is_empty() && self.items.is_empty()
    }
}

pub fn summarize_inventory(doc: &Value) -> InventorySummary {
    let mut stacks: BTreeMap<String, ItemStack> = BTreeMap::new();
    for item in document::array_at(doc, &["inventory"]) {
        let quantity = document::int_at(item, &["quantity"]).unwrap_or(1);
        if quantity <= 0 {
            continue;
        }
        let name = document::item_definition(item)
            .and_then(|def| document::text_at(def, &["name"]))
            .or_else(|| document::text_at(item, &["name"]))
            .unwrap_or(UNKNOWN_ITEM);
        let stack = stacks.entry(name.to_string()).or_insert_with(|| ItemStack {
            name: name.to_string(),
            total_quantity: 0,
            any_equipped: false,
            any_attuned: false,
        });
        stack.total_quantity += quantity;
        // Unlike armor class, a missing equip flag means carried here.
        stack.any_equipped |= document::equipped_flag(item).unwrap_or(false);
        stack.any_attuned |= document::flag(item, &["isAttuned"]);
    }

    let summary = InventorySummary {
        currency: Currency::from_document(doc),
        items: stacks.into_values().collect(),
    };
    tracing::debug!(items = summary.items.len(), "summarized inventory");
    summary
}
