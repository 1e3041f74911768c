//! The guarded conversion entrypoint shared by the front ends.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use ddb_core::core_api::{Conversion, CoreError, Engine, Session};
use ddb_core::diagnostics::Diagnostics;
use serde::Deserialize;
use serde_json::Value as JsonValue;
use thiserror::Error;

use crate::attacks::{AttackPanelOptions, render_attack_panel};
use crate::ccfolia::{DisplayTexts, MemoExtras, OutputDocument, assemble_output_document};
use crate::labels::Locale;
use crate::sheet::{render_feature_panel, render_inventory_panel, render_statblock_text};
use crate::spells::render_spell_panel;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ConvertOptions {
    pub locale: Locale,
    pub memo: Option<String>,
    pub player_name: Option<String>,
    pub include_attack_notes: bool,
}

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error("failed to serialize output document: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("conversion failed: {0}")]
    Panicked(String),
}

/// Everything one conversion produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub conversion: Conversion,
    pub statblock_text: String,
    pub texts: DisplayTexts,
    pub output: OutputDocument,
}

impl Rendered {
    pub fn output_json(&self) -> Result<String, ConvertError> {
        Ok(self.output.to_pretty_json()?)
    }
}

pub fn convert_bytes(
    bytes: &[u8],
    options: &ConvertOptions,
    diag: &dyn Diagnostics,
) -> Result<Rendered, ConvertError> {
    let session = Engine::new().open_bytes(bytes)?;
    convert_guarded(&session, options, diag)
}

pub fn convert_value(
    value: JsonValue,
    options: &ConvertOptions,
    diag: &dyn Diagnostics,
) -> Result<Rendered, ConvertError> {
    let session = Engine::new().open_value_with(value, diag)?;
    convert_guarded(&session, options, diag)
}

/// Runs every extractor and renderer. A panic anywhere in the pipeline is
/// reported as [`ConvertError::Panicked`] instead of unwinding further.
pub fn convert_guarded(
    session: &Session,
    options: &ConvertOptions,
    diag: &dyn Diagnostics,
) -> Result<Rendered, ConvertError> {
    panic::catch_unwind(AssertUnwindSafe(|| convert_session(session, options, diag))).map_err(
        |payload| {
            let message = panic_message(payload.as_ref());
            tracing::error!(%message, "conversion panicked");
            ConvertError::Panicked(message)
        },
    )
}

pub fn convert_session(
    session: &Session,
    options: &ConvertOptions,
    diag: &dyn Diagnostics,
) -> Rendered {
    let conversion = session.conversion(diag);
    let locale = options.locale;
    let texts = DisplayTexts {
        attacks: render_attack_panel(
            &conversion.attacks,
            locale,
            AttackPanelOptions {
                include_notes: options.include_attack_notes,
            },
        ),
        spells: render_spell_panel(&conversion.spells, &conversion.statblock, locale),
        features: render_feature_panel(&conversion.features, locale),
        inventory: render_inventory_panel(&conversion.inventory, locale),
    };
    let output = assemble_output_document(
        &conversion.statblock,
        &texts,
        MemoExtras {
            player_name: options.player_name.as_deref(),
            custom_memo: options.memo.as_deref(),
        },
        locale,
    );
    tracing::debug!(
        name = %conversion.statblock.name,
        attacks = conversion.attacks.len(),
        spells = conversion.spells.prepared.len(),
        locale = %locale,
        "converted character"
    );

    Rendered {
        statblock_text: render_statblock_text(&conversion.statblock, locale),
        conversion,
        texts,
        output,
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unexpected failure while converting".to_string()
    }
}

#[cfg(test)]
mod tests {
    use ddb_core::core_api::CoreErrorCode;
    use ddb_core::diagnostics::NoDiagnostics;
    use serde_json::json;

    use super::*;

    #[test]
    fn missing_name_is_a_core_error() {
        let err = convert_value(json!({ "stats": [] }), &ConvertOptions::default(), &NoDiagnostics)
            .unwrap_err();
        match err {
            ConvertError::Core(core) => assert_eq!(core.code, CoreErrorCode::MissingName),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn panic_payloads_become_messages() {
        let payload = panic::catch_unwind(|| panic!("boom")).unwrap_err();
        assert_eq!(panic_message(payload.as_ref()), "boom");
        let payload = panic::catch_unwind(|| panic!("{} {}", "formatted", 1)).unwrap_err();
        assert_eq!(panic_message(payload.as_ref()), "formatted 1");
    }

    #[test]
    fn options_deserialize_from_partial_objects() {
        let options: ConvertOptions =
            serde_json::from_value(json!({ "locale": "ko", "player_name": "Jun" }))
                .expect("options should parse");
        assert_eq!(options.locale, Locale::Korean);
        assert_eq!(options.player_name.as_deref(), Some("Jun"));
        assert_eq!(options.memo, None);
        assert!(!options.include_attack_notes);
    }
}
