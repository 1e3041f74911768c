use std::fmt::Write as _;

use ddb_core::ability::Ability;
use ddb_core::dice;
use ddb_core::features::FeatureLists;
use ddb_core::inventory::{InventorySummary, ItemStack};
use ddb_core::skills::ProficiencyLevel;
use ddb_core::stats::Statblock;

use crate::labels::{Heading, Locale, Term};

const ABILITY_COL_WIDTH: usize = 14;

/// Plain-text character sheet: header, vitals, abilities with saves, skills.
pub fn render_statblock_text(statblock: &Statblock, locale: Locale) -> String {
    let mut out = String::new();
    writeln!(&mut out, "{}", statblock.name).expect("writing to String cannot fail");
    let level = format!("{} {}", locale.heading(Heading::Level), statblock.level);
    let classes = statblock.class_summary();
    if classes.is_empty() {
        writeln!(&mut out, "{level}").expect("writing to String cannot fail");
    } else {
        writeln!(&mut out, "{classes} | {level}").expect("writing to String cannot fail");
    }
    writeln!(
        &mut out,
        "{} {}/{} | {} {} | {} {} | {} {} | {} {}",
        locale.term(Term::Hp),
        statblock.hp_current,
        statblock.hp_max,
        locale.term(Term::Ac),
        statblock.ac,
        locale.term(Term::Speed),
        locale.feet(statblock.speed_feet),
        locale.term(Term::Initiative),
        dice::signed(statblock.initiative),
        locale.term(Term::ProficiencyBonus),
        dice::signed(statblock.proficiency_bonus)
    )
    .expect("writing to String cannot fail");
    out.push('\n');

    for ability in Ability::ALL {
        let marker = if statblock.save_proficiencies.contains(&ability) {
            " *"
        } else {
            ""
        };
        writeln!(
            &mut out,
            "{:<width$}{:>3} ({})  {} {}{marker}",
            locale.ability(ability),
            statblock.ability_scores.get(ability),
            dice::signed(statblock.ability_modifiers.get(ability)),
            locale.term(Term::Save),
            dice::signed(statblock.save_modifiers.get(ability)),
            width = ABILITY_COL_WIDTH
        )
        .expect("writing to String cannot fail");
    }

    if !statblock.skills.is_empty() {
        writeln!(&mut out, "\n[{}]", locale.term(Term::Skills))
            .expect("writing to String cannot fail");
        for skill in &statblock.skills {
            let marker = match skill.proficiency {
                ProficiencyLevel::None => "",
                ProficiencyLevel::Half => " (½)",
                ProficiencyLevel::Proficient => " *",
                ProficiencyLevel::Expertise => " **",
            };
            writeln!(
                &mut out,
                "{} {}{marker}",
                locale.skill(skill.skill),
                dice::signed(skill.modifier)
            )
            .expect("writing to String cannot fail");
        }
    }

    out.trim_end().to_string()
}

/// Bracketed sections for background, classes, feats, maneuvers and class
/// features. Empty sections are left out.
pub fn render_feature_panel(features: &FeatureLists, locale: Locale) -> String {
    let background: Vec<String> = features.background.iter().cloned().collect();
    let sections: [(Heading, &[String]); 5] = [
        (Heading::Background, background.as_slice()),
        (Heading::Classes, features.classes.as_slice()),
        (Heading::Feats, features.feats.as_slice()),
        (Heading::Maneuvers, features.maneuvers.as_slice()),
        (Heading::ClassFeatures, features.class_features.as_slice()),
    ];

    let mut out = String::new();
    for (heading, items) in sections {
        write_section(&mut out, locale.heading(heading), items.iter().map(String::as_str));
    }
    out.trim_end().to_string()
}

/// Currency line, then equipped and carried items, each sorted by name.
/// All-zero currency is left out.
pub fn render_inventory_panel(inventory: &InventorySummary, locale: Locale) -> String {
    let mut out = String::new();

    if !inventory.currency.is_empty() {
        let coins = inventory
            .currency
            .denominations()
            .into_iter()
            .filter(|(_, amount)| *amount > 0)
            .map(|(unit, amount)| format!("{amount}{unit}"))
            .collect::<Vec<_>>()
            .join(" / ");
        write_section(
            &mut out,
            locale.heading(Heading::Currency),
            std::iter::once(coins.as_str()),
        );
    }

    let equipped: Vec<String> = inventory.equipped().map(item_line).collect();
    let carried: Vec<String> = inventory.carried().map(item_line).collect();
    write_section(
        &mut out,
        locale.heading(Heading::Equipped),
        equipped.iter().map(String::as_str),
    );
    write_section(
        &mut out,
        locale.heading(Heading::Carried),
        carried.iter().map(String::as_str),
    );

    out.trim_end().to_string()
}

fn item_line(item: &ItemStack) -> String {
    let mut line = String::new();
    if item.any_attuned {
        line.push_str("(A) ");
    }
    line.push_str(&item.name);
    if item.total_quantity > 1 {
        line.push_str(&format!(" (x{})", item.total_quantity));
    }
    line
}

fn write_section<'a>(out: &mut String, title: &str, items: impl IntoIterator<Item = &'a str>) {
    let mut items = items.into_iter().peekable();
    if items.peek().is_none() {
        return;
    }
    writeln!(out, "[{title}]").expect("writing to String cannot fail");
    for item in items {
        writeln!(out, "{item}").expect("writing to String cannot fail");
    }
    out.push('\n');
}
