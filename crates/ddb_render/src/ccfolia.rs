//! The CCFOLIA character clipboard document.

use std::fmt::Write as _;

use ddb_core::ability::Ability;
use ddb_core::dice;
use ddb_core::skills::Skill;
use ddb_core::stats::Statblock;
use serde::Serialize;

use crate::labels::{Heading, Locale, Term};

const KIND_CHARACTER: &str = "character";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputDocument {
    pub kind: &'static str,
    pub data: CharacterData,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterData {
    pub name: String,
    pub memo: String,
    pub initiative: i32,
    pub status: Vec<StatusEntry>,
    pub params: Vec<ParamEntry>,
    pub active: bool,
    pub secret: bool,
    pub invisible: bool,
    pub hide_status: bool,
    pub commands: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusEntry {
    pub label: String,
    pub value: i32,
    pub max: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParamEntry {
    pub label: String,
    pub value: String,
}

/// Rendered panels that feed the memo and command fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DisplayTexts {
    pub attacks: String,
    pub spells: String,
    pub features: String,
    pub inventory: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemoExtras<'a> {
    pub player_name: Option<&'a str>,
    pub custom_memo: Option<&'a str>,
}

impl OutputDocument {
    pub fn to_pretty_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

pub fn assemble_output_document(
    statblock: &Statblock,
    texts: &DisplayTexts,
    extras: MemoExtras<'_>,
    locale: Locale,
) -> OutputDocument {
    let status = vec![
        StatusEntry {
            label: locale.term(Term::Hp).to_string(),
            value: statblock.hp_current,
            max: statblock.hp_max,
        },
        StatusEntry {
            label: locale.term(Term::Ac).to_string(),
            value: statblock.ac,
            max: statblock.ac,
        },
    ];

    let mut params = vec![
        param(locale.term(Term::Initiative), statblock.initiative),
        param(locale.term(Term::Speed), statblock.speed_feet),
        param(locale.term(Term::ProficiencyBonus), statblock.proficiency_bonus),
    ];
    params.extend(
        Ability::ALL
            .into_iter()
            .map(|ability| param(locale.ability(ability), statblock.ability_scores.get(ability))),
    );

    OutputDocument {
        kind: KIND_CHARACTER,
        data: CharacterData {
            name: statblock.name.clone(),
            memo: build_memo(statblock, texts, extras, locale),
            initiative: statblock.initiative,
            status,
            params,
            active: true,
            secret: false,
            invisible: false,
            hide_status: false,
            commands: build_commands(statblock, texts, locale),
        },
    }
}

fn param(label: &str, value: i32) -> ParamEntry {
    ParamEntry {
        label: label.to_string(),
        value: value.to_string(),
    }
}

fn build_memo(
    statblock: &Statblock,
    texts: &DisplayTexts,
    extras: MemoExtras<'_>,
    locale: Locale,
) -> String {
    let mut header = String::new();
    if let Some(player) = extras.player_name.map(str::trim).filter(|p| !p.is_empty()) {
        writeln!(&mut header, "[{}] {player}", locale.heading(Heading::Player))
            .expect("writing to String cannot fail");
    }
    let classes = statblock.class_summary();
    if !classes.is_empty() {
        writeln!(&mut header, "[{}] {classes}", locale.heading(Heading::Class))
            .expect("writing to String cannot fail");
    }
    writeln!(
        &mut header,
        "[{}] {}",
        locale.heading(Heading::Level),
        statblock.level
    )
    .expect("writing to String cannot fail");

    let custom = extras.custom_memo.unwrap_or_default();
    join_blocks([
        header.as_str(),
        custom,
        texts.features.as_str(),
        texts.inventory.as_str(),
    ])
}

fn build_commands(statblock: &Statblock, texts: &DisplayTexts, locale: Locale) -> String {
    let mut rolls = String::new();
    writeln!(
        &mut rolls,
        "1d20{} {}",
        dice::signed(statblock.initiative),
        locale.term(Term::Initiative)
    )
    .expect("writing to String cannot fail");

    let mut checks = String::new();
    for ability in Ability::ALL {
        writeln!(
            &mut checks,
            "1d20{} {} {}",
            dice::signed(statblock.ability_modifiers.get(ability)),
            locale.ability(ability),
            locale.term(Term::Check)
        )
        .expect("writing to String cannot fail");
    }

    let mut saves = String::new();
    for ability in Ability::ALL {
        writeln!(
            &mut saves,
            "1d20{} {} {}",
            dice::signed(statblock.save_modifiers.get(ability)),
            locale.ability(ability),
            locale.term(Term::Save)
        )
        .expect("writing to String cannot fail");
    }

    let mut skills = String::new();
    for skill in Skill::ALL {
        writeln!(
            &mut skills,
            "1d20{} {}",
            dice::signed(statblock.skill_modifier(skill)),
            locale.skill(skill)
        )
        .expect("writing to String cannot fail");
    }

    join_blocks([
        rolls.as_str(),
        checks.as_str(),
        saves.as_str(),
        skills.as_str(),
        texts.attacks.as_str(),
        texts.spells.as_str(),
    ])
}

/// Trimmed non-empty blocks separated by one blank line.
fn join_blocks<'a>(blocks: impl IntoIterator<Item = &'a str>) -> String {
    blocks
        .into_iter()
        .map(str::trim)
        .filter(|block| !block.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}
