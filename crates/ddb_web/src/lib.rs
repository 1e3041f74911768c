use ddb_core::diagnostics::TracingDiagnostics;
use ddb_render::{ConvertError, ConvertOptions, Locale, Rendered, convert_value};
use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct WebConvertOptions {
    pub locale: Option<String>,
    pub memo: Option<String>,
    pub player_name: Option<String>,
    pub include_attack_notes: bool,
}

/// Panels and the output document, as handed to the page.
#[derive(Debug, Clone, Serialize)]
pub struct WebConversion {
    pub status: String,
    pub statblock: String,
    pub attacks: String,
    pub spells: String,
    pub features: String,
    pub inventory: String,
    pub output: String,
}

#[derive(Debug, Clone)]
struct WebError {
    code: &'static str,
    message: String,
}

#[derive(Debug, Clone, Serialize)]
struct WebErrorPayload {
    code: String,
    message: String,
}

impl WebError {
    fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    fn to_js_value(&self) -> JsValue {
        let payload = WebErrorPayload {
            code: self.code.to_string(),
            message: self.message.clone(),
        };
        serde_wasm_bindgen::to_value(&payload).unwrap_or_else(|_| {
            JsValue::from_str(&format!("{}: {}", payload.code, payload.message))
        })
    }
}

#[wasm_bindgen(start)]
pub fn start() {
    #[cfg(target_arch = "wasm32")]
    {
        console_error_panic_hook::set_once();
        tracing_wasm::set_as_global_default();
    }
}

#[wasm_bindgen]
pub fn convert_character(source_json: &str, options: JsValue) -> Result<JsValue, JsValue> {
    let parsed_options = parse_options(options).map_err(|err| err.to_js_value())?;
    let conversion =
        convert_character_impl(source_json, &parsed_options).map_err(|err| err.to_js_value())?;
    serde_wasm_bindgen::to_value(&conversion).map_err(|err| {
        WebError::new(
            "conversion_failed",
            format!("failed to hand conversion to the page: {err}"),
        )
        .to_js_value()
    })
}

fn convert_character_impl(
    source_json: &str,
    options: &WebConvertOptions,
) -> Result<WebConversion, WebError> {
    if source_json.trim().is_empty() {
        return Err(WebError::new(
            "empty_input",
            "Paste the character JSON from D&D Beyond first.",
        ));
    }

    let convert_options = to_convert_options(options)?;
    let document: serde_json::Value = serde_json::from_str(source_json).map_err(|err| {
        WebError::new(
            "invalid_document",
            format!("The pasted text is not valid JSON: {err}"),
        )
    })?;

    let rendered = convert_value(document, &convert_options, &TracingDiagnostics)
        .map_err(conversion_error)?;
    let output = rendered.output_json().map_err(conversion_error)?;
    Ok(web_conversion(&rendered, output, convert_options.locale))
}

fn to_convert_options(options: &WebConvertOptions) -> Result<ConvertOptions, WebError> {
    let locale = match options.locale.as_deref().map(str::trim) {
        None | Some("") => Locale::default(),
        Some(raw) => raw
            .parse::<Locale>()
            .map_err(|err| WebError::new("invalid_options", err.to_string()))?,
    };
    Ok(ConvertOptions {
        locale,
        memo: options.memo.clone().filter(|m| !m.trim().is_empty()),
        player_name: options.player_name.clone().filter(|p| !p.trim().is_empty()),
        include_attack_notes: options.include_attack_notes,
    })
}

fn conversion_error(err: ConvertError) -> WebError {
    match err {
        ConvertError::Core(core) => WebError::new("invalid_document", core.message),
        other => WebError::new("conversion_failed", other.to_string()),
    }
}

fn web_conversion(rendered: &Rendered, output: String, locale: Locale) -> WebConversion {
    let name = &rendered.conversion.statblock.name;
    let status = match locale {
        Locale::English => format!("Converted {name}."),
        Locale::Korean => format!("{name} 변환 완료!"),
    };
    WebConversion {
        status,
        statblock: rendered.statblock_text.clone(),
        attacks: rendered.texts.attacks.clone(),
        spells: rendered.texts.spells.clone(),
        features: rendered.texts.features.clone(),
        inventory: rendered.texts.inventory.clone(),
        output,
    }
}

fn parse_options(options: JsValue) -> Result<WebConvertOptions, WebError> {
    if options.is_null() || options.is_undefined() {
        return Ok(WebConvertOptions::default());
    }

    serde_wasm_bindgen::from_value(options).map_err(|err| {
        WebError::new(
            "invalid_options",
            format!("Failed to parse conversion options: {err}"),
        )
    })
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;

    use super::{WebConvertOptions, convert_character_impl, to_convert_options};
    use ddb_render::Locale;

    #[test]
    fn options_accept_locale_aliases_and_blank_values() {
        let options = WebConvertOptions {
            locale: Some("Korean".to_string()),
            memo: Some("   ".to_string()),
            player_name: Some("Jun".to_string()),
            ..WebConvertOptions::default()
        };
        let parsed = to_convert_options(&options).expect("options should parse");
        assert_eq!(parsed.locale, Locale::Korean);
        assert_eq!(parsed.memo, None);
        assert_eq!(parsed.player_name.as_deref(), Some("Jun"));

        let blank = WebConvertOptions {
            locale: Some(" ".to_string()),
            ..WebConvertOptions::default()
        };
        assert_eq!(
            to_convert_options(&blank).expect("blank locale").locale,
            Locale::English
        );
    }

    #[test]
    fn options_reject_unknown_locale() {
        let options = WebConvertOptions {
            locale: Some("de".to_string()),
            ..WebConvertOptions::default()
        };
        let err = to_convert_options(&options).expect_err("unknown locale should fail");
        assert_eq!(err.code, "invalid_options");
        assert!(err.message.contains("`de`"));
    }

    #[test]
    fn converts_cleric_fixture() {
        let source = fixture_text("life_cleric.json");
        let options = WebConvertOptions {
            locale: Some("ko".to_string()),
            ..WebConvertOptions::default()
        };
        let conversion =
            convert_character_impl(&source, &options).expect("fixture should convert");
        assert_eq!(conversion.status, "Sister Maren 변환 완료!");
        assert!(conversion.spells.contains("[주문 시전] Cleric"));
        assert!(conversion.attacks.starts_with("[무기 공격]"));

        let output: serde_json::Value =
            serde_json::from_str(&conversion.output).expect("output should parse");
        assert_eq!(output["kind"], "character");
        assert_eq!(output["data"]["name"], "Sister Maren");
    }

    #[test]
    fn rejects_empty_and_malformed_input() {
        let options = WebConvertOptions::default();
        let err = convert_character_impl("  \n", &options).expect_err("empty input");
        assert_eq!(err.code, "empty_input");

        let err = convert_character_impl("{ not json", &options).expect_err("bad json");
        assert_eq!(err.code, "invalid_document");

        let err = convert_character_impl(r#"{ "success": true, "data": { "id": 1 } }"#, &options)
            .expect_err("nameless character");
        assert_eq!(err.code, "invalid_document");
        assert!(err.message.contains("no name"));
    }

    fn fixture_text(name: &str) -> String {
        let full_path = Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("../ddb_core/tests/fixtures")
            .join(name);
        fs::read_to_string(full_path).expect("fixture should be readable")
    }
}
