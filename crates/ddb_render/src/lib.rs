//! Display panels, CCFOLIA output documents and the guarded conversion
//! boundary for normalized D&D Beyond characters.

mod attacks;
mod ccfolia;
mod convert;
mod labels;
mod sheet;
mod spells;

use ddb_core::core_api::Conversion;
use serde_json::{Map as JsonMap, Value as JsonValue};

pub use attacks::{AttackPanelOptions, attack_notes, render_attack_panel};
pub use ccfolia::{
    CharacterData, DisplayTexts, MemoExtras, OutputDocument, ParamEntry, StatusEntry,
    assemble_output_document,
};
pub use convert::{
    ConvertError, ConvertOptions, Rendered, convert_bytes, convert_guarded, convert_session,
    convert_value,
};
pub use labels::{Heading, Locale, Term, UnknownLocale};
pub use sheet::{render_feature_panel, render_inventory_panel, render_statblock_text};
pub use spells::{render_spell_panel, spell_notes};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SectionSelection {
    pub statblock: bool,
    pub attacks: bool,
    pub spells: bool,
    pub features: bool,
    pub inventory: bool,
}

impl SectionSelection {
    pub fn all() -> Self {
        Self {
            statblock: true,
            attacks: true,
            spells: true,
            features: true,
            inventory: true,
        }
    }

    pub fn is_any_selected(&self) -> bool {
        self.statblock || self.attacks || self.spells || self.features || self.inventory
    }
}

/// The normalized results of the selected sections, keyed in a fixed order.
pub fn render_json_selected(
    conversion: &Conversion,
    sections: &SectionSelection,
) -> Result<JsonValue, serde_json::Error> {
    let mut out = JsonMap::new();
    if sections.statblock {
        out.insert(
            "statblock".to_string(),
            serde_json::to_value(&conversion.statblock)?,
        );
    }
    if sections.attacks {
        out.insert("attacks".to_string(), serde_json::to_value(&conversion.attacks)?);
    }
    if sections.spells {
        out.insert("spells".to_string(), serde_json::to_value(&conversion.spells)?);
    }
    if sections.features {
        out.insert("features".to_string(), serde_json::to_value(&conversion.features)?);
    }
    if sections.inventory {
        out.insert(
            "inventory".to_string(),
            serde_json::to_value(&conversion.inventory)?,
        );
    }
    Ok(JsonValue::Object(out))
}

/// The selected text panels, separated by blank lines. Sections with nothing
/// to show are skipped.
pub fn render_text_selected(rendered: &Rendered, sections: &SectionSelection) -> String {
    let panels = [
        (sections.statblock, rendered.statblock_text.as_str()),
        (sections.attacks, rendered.texts.attacks.as_str()),
        (sections.spells, rendered.texts.spells.as_str()),
        (sections.features, rendered.texts.features.as_str()),
        (sections.inventory, rendered.texts.inventory.as_str()),
    ];
    panels
        .into_iter()
        .filter(|(selected, text)| *selected && !text.is_empty())
        .map(|(_, text)| text)
        .collect::<Vec<_>>()
        .join("\n\n")
}
