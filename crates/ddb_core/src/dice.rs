use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use crate::document;

static DICE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(\d+)d(\d+)\s*(?:([+-])\s*(\d+))?\s*$").expect("valid regex"));

/// `"+3"`, `"-1"`, or empty for zero.
pub fn signed_suffix(n: i32) -> String {
    match n {
        0 => String::new(),
        n if n > 0 => format!("+{n}"),
        n => n.to_string(),
    }
}

/// Always-signed form used for bonuses: `"+0"`, `"+3"`, `"-1"`.
pub fn signed(n: i32) -> String {
    if n >= 0 {
        format!("+{n}")
    } else {
        n.to_string()
    }
}

/// `NdM` plus a signed fixed part, or the fixed part alone when there are no
/// dice. Empty when there is nothing to roll.
pub fn format_damage(count: i64, faces: i64, fixed: i64) -> String {
    if count > 0 && faces > 0 {
        format!("{count}d{faces}{}", signed_suffix(fixed as i32))
    } else if fixed != 0 {
        fixed.to_string()
    } else {
        String::new()
    }
}

/// Damage expression from a dice record such as
/// `{ diceCount, diceValue, fixedValue }` or `{ diceString }`.
pub fn damage_from_record(record: &Value) -> String {
    let count = document::int_at(record, &["diceCount"]).unwrap_or(0);
    let faces = document::int_at(record, &["diceValue"]).unwrap_or(0);
    let fixed = document::int_at(record, &["fixedValue"])
        .or_else(|| document::int_at(record, &["value"]))
        .unwrap_or(0);
    let formatted = format_damage(count, faces, fixed);
    if !formatted.is_empty() {
        return formatted;
    }
    document::text_at(record, &["diceString"])
        .map(str::to_string)
        .unwrap_or_default()
}

/// Multiplies the dice count of `NdM[+K]`; other expressions pass through.
pub fn scale_dice(expr: &str, multiplier: i64) -> String {
    if multiplier <= 1 {
        return expr.to_string();
    }
    let Some(caps) = DICE_RE.captures(expr) else {
        return expr.to_string();
    };
    let Ok(count) = caps[1].parse::<i64>() else {
        return expr.to_string();
    };
    let faces = &caps[2];
    let fixed = match (caps.get(3), caps.get(4)) {
        (Some(sign), Some(n)) => format!("{}{}", sign.as_str(), n.as_str()),
        _ => String::new(),
    };
    format!("{}d{faces}{fixed}", count * multiplier)
}

/// Cantrip damage multiplier for a total character level.
pub fn cantrip_multiplier(level: i32) -> i64 {
    match level {
        l if l >= 17 => 4,
        l if l >= 11 => 3,
        l if l >= 5 => 2,
        _ => 1,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn damage_formatting() {
        assert_eq!(format_damage(1, 8, 3), "1d8+3");
        assert_eq!(format_damage(2, 6, -1), "2d6-1");
        assert_eq!(format_damage(1, 4, 0), "1d4");
        assert_eq!(format_damage(0, 0, 5), "5");
        assert_eq!(format_damage(0, 0, 0), "");
    }

    #[test]
    fn records_fall_back_to_dice_string() {
        assert_eq!(
            damage_from_record(&json!({ "diceCount": 1, "diceValue": 6, "fixedValue": 2 })),
            "1d6+2"
        );
        assert_eq!(damage_from_record(&json!({ "diceString": "3d8" })), "3d8");
        assert_eq!(damage_from_record(&json!({})), "");
    }

    #[test]
    fn scaling_multiplies_only_the_count() {
        assert_eq!(scale_dice("1d10", 2), "2d10");
        assert_eq!(scale_dice("1d8+2", 3), "3d8+2");
        assert_eq!(scale_dice("12", 3), "12");
        assert_eq!(scale_dice("1d6", 1), "1d6");
        assert_eq!(
            scale_dice("99999999999999999999d8", 2),
            "99999999999999999999d8"
        );
    }

    #[test]
    fn cantrip_tiers() {
        assert_eq!(cantrip_multiplier(4), 1);
        assert_eq!(cantrip_multiplier(5), 2);
        assert_eq!(cantrip_multiplier(11), 3);
        assert_eq!(cantrip_multiplier(17), 4);
    }

    #[test]
    fn signs() {
        assert_eq!(signed(0), "+0");
        assert_eq!(signed(-2), "-2");
        assert_eq!(signed_suffix(0), "");
        assert_eq!(signed_suffix(4), "+4");
    }
}
