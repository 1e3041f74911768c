use ddb_core::ability::{self, Ability};
use ddb_core::modifiers::{Modifier, ModifierIndex};
use ddb_core::stats::proficiency_bonus_for_level;
use proptest::prelude::*;
use serde_json::json;

fn strength_with(base: i32, set_values: &[i32]) -> i32 {
    let doc = json!({ "stats": [{ "id": 1, "value": base }] });
    let records = set_values
        .iter()
        .map(|v| Modifier::new("set", "strength-score", Some(f64::from(*v))))
        .collect();
    ability::resolve_score(&doc, &ModifierIndex::from_records(records), Ability::Strength)
}

#[test]
fn known_modifier_values() {
    assert_eq!(ability::modifier(17), 3);
    assert_eq!(ability::modifier(8), -1);
    assert_eq!(ability::modifier(1), -5);
    assert_eq!(ability::modifier(30), 10);
}

#[test]
fn simultaneous_set_effects_take_the_maximum() {
    assert_eq!(strength_with(15, &[19, 21]), 21);
    assert_eq!(strength_with(22, &[19, 21]), 22);
}

proptest! {
    #[test]
    fn modifier_is_floored_half_distance_from_ten(score in 1i32..=30) {
        let expected = ((f64::from(score) - 10.0) / 2.0).floor() as i32;
        prop_assert_eq!(ability::modifier(score), expected);
    }

    #[test]
    fn set_effects_never_lower_a_score(base in 1i32..=30, set in 1i32..=30) {
        let resolved = strength_with(base, &[set]);
        prop_assert!(resolved >= base);
        prop_assert_eq!(resolved, base.max(set));
    }

    #[test]
    fn proficiency_bonus_follows_the_tier_table(level in 1i32..=20) {
        let expected = match level {
            1..=4 => 2,
            5..=8 => 3,
            9..=12 => 4,
            13..=16 => 5,
            _ => 6,
        };
        prop_assert_eq!(proficiency_bonus_for_level(level), expected);
    }
}
