use serde::Serialize;

use crate::attacks::NormalizedAttack;
use crate::features::FeatureLists;
use crate::inventory::InventorySummary;
use crate::spells::SpellBook;
use crate::stats::Statblock;

/// Every pipeline result for one character, in one serializable value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversion {
    pub statblock: Statblock,
    pub attacks: Vec<NormalizedAttack>,
    pub spells: SpellBook,
    pub features: FeatureLists,
    pub inventory: InventorySummary,
}
