use serde_json::Value;

use crate::attacks::{self, NormalizedAttack};
use crate::diagnostics::{Diagnostics, NoDiagnostics};
use crate::document;
use crate::features::{self, FeatureLists};
use crate::inventory::{self, InventorySummary};
use crate::modifiers::ModifierIndex;
use crate::spells::{self, SpellBook};
use crate::stats::{self, Statblock};

use super::error::{CoreError, CoreErrorCode};
use super::types::Conversion;

#[derive(Debug, Default, Clone, Copy)]
pub struct Engine;

/// A loaded character. The modifier index and statblock are computed once
/// on open; every extractor reads them from here.
#[derive(Debug)]
pub struct Session {
    document: Value,
    modifiers: ModifierIndex,
    statblock: Statblock,
}

impl Engine {
    pub fn new() -> Self {
        Self
    }

    pub fn open_bytes<B: AsRef<[u8]>>(&self, bytes: B) -> Result<Session, CoreError> {
        let value: Value = serde_json::from_slice(bytes.as_ref()).map_err(|e| {
            CoreError::new(
                CoreErrorCode::InvalidJson,
                format!("failed to parse character JSON: {e}"),
            )
        })?;
        self.open_value(value)
    }

    pub fn open_value(&self, value: Value) -> Result<Session, CoreError> {
        self.open_value_with(value, &NoDiagnostics)
    }

    /// Accepts a bare character object or one wrapped in a `data` envelope.
    pub fn open_value_with(
        &self,
        value: Value,
        diag: &dyn Diagnostics,
    ) -> Result<Session, CoreError> {
        let document = document::unwrap_envelope(value);
        if !document.is_object() {
            return Err(CoreError::new(
                CoreErrorCode::NotAnObject,
                "character document must be a JSON object",
            ));
        }
        if document::text_at(&document, &["name"]).is_none() {
            return Err(CoreError::new(
                CoreErrorCode::MissingName,
                "character document has no name",
            ));
        }

        let modifiers = ModifierIndex::from_document(&document);
        let statblock = stats::normalize_statblock(&document, &modifiers, diag);
        tracing::debug!(
            name = %statblock.name,
            modifiers = modifiers.len(),
            "opened character"
        );
        Ok(Session {
            document,
            modifiers,
            statblock,
        })
    }
}

impl Session {
    pub fn document(&self) -> &Value {
        &self.document
    }

    pub fn modifiers(&self) -> &ModifierIndex {
        &self.modifiers
    }

    pub fn statblock(&self) -> &Statblock {
        &self.statblock
    }

    pub fn attacks(&self) -> Vec<NormalizedAttack> {
        self.attacks_with(&NoDiagnostics)
    }

    pub fn attacks_with(&self, diag: &dyn Diagnostics) -> Vec<NormalizedAttack> {
        attacks::extract_attacks(&self.document, &self.statblock, diag)
    }

    pub fn spell_book(&self) -> SpellBook {
        self.spell_book_with(&NoDiagnostics)
    }

    pub fn spell_book_with(&self, diag: &dyn Diagnostics) -> SpellBook {
        spells::extract_spell_book(&self.document, &self.statblock, diag)
    }

    pub fn feature_lists(&self) -> FeatureLists {
        features::extract_feature_lists(&self.document)
    }

    pub fn inventory_summary(&self) -> InventorySummary {
        inventory::summarize_inventory(&self.document)
    }

    pub fn conversion(&self, diag: &dyn Diagnostics) -> Conversion {
        Conversion {
            statblock: self.statblock.clone(),
            attacks: self.attacks_with(diag),
            spells: self.spell_book_with(diag),
            features: self.feature_lists(),
            inventory: self.inventory_summary(),
        }
    }
}
